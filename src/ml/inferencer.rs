// ============================================================
// Layer 5 — Inference Engine
// ============================================================
// Loads a snapshot and serves `predict(state) -> action`.
//
// The engine runs on the plain (non-autodiff) backend, where
// dropout is structurally a no-op — there is no eval flag to
// forget. Normalization constants come from the snapshot, never
// from ambient configuration, so a deployed engine extracts
// features exactly the way its training run did.
//
// predict takes &self and mutates nothing, so one engine behind
// an Arc can serve any number of connections concurrently.

use anyhow::Result;

use crate::data::features::FeatureConfig;
use crate::domain::action::Action;
use crate::domain::error::MalformedFrameError;
use crate::domain::telemetry::CarState;
use crate::domain::traits::ActionPolicy;
use crate::infra::snapshot::SnapshotStore;
use crate::ml::model::{PolicyNetConfig, PolicyNetwork};

use burn::prelude::*;

type InferBackend = burn::backend::NdArray;

#[derive(Debug)]
pub struct InferenceEngine {
    model:    PolicyNetwork<InferBackend>,
    features: FeatureConfig,
    device:   burn::backend::ndarray::NdArrayDevice,
}

impl InferenceEngine {
    /// Rebuild the network a snapshot describes and load its
    /// weights. Fails with IncompatibleSnapshotError when the
    /// snapshot's feature width does not match the recorded
    /// network's input width — serving with mismatched dimensions
    /// would silently produce garbage.
    pub fn from_snapshot(store: &SnapshotStore, stem: &str) -> Result<Self> {
        let meta = store.load_meta(stem)?;
        meta.validate()?;

        let device = burn::backend::ndarray::NdArrayDevice::default();
        let model_cfg =
            PolicyNetConfig::new(meta.network.input_size, meta.network.hidden_sizes.clone())
                .with_dropout(meta.network.dropout);
        let model: PolicyNetwork<InferBackend> = model_cfg.init(&device);
        let model = store.load_model(model, stem, &device)?;

        tracing::info!(
            "Inference engine ready: '{}' snapshot, {} features, '{}' mode",
            stem,
            meta.features.feature_len(),
            meta.features.mode.name()
        );

        Ok(Self { model, features: meta.features, device })
    }

    /// Decide steering and throttle for one state.
    ///
    /// The outputs are returned exactly as the heads produced
    /// them — tanh and sigmoid already bound the ranges, so there
    /// is nothing to clamp.
    pub fn predict(&self, state: &CarState) -> Result<Action, MalformedFrameError> {
        let features = self.features.extract(state)?;
        let input = Tensor::<InferBackend, 1>::from_floats(features.as_slice(), &self.device)
            .reshape([1, features.len()]);

        let output = self.model.forward(input);

        Ok(Action {
            steering: output.steering.into_scalar().elem::<f32>(),
            throttle: output.throttle.into_scalar().elem::<f32>(),
        })
    }

    pub fn feature_config(&self) -> &FeatureConfig {
        &self.features
    }
}

impl ActionPolicy for InferenceEngine {
    fn predict(&self, state: &CarState) -> Result<Action, MalformedFrameError> {
        InferenceEngine::predict(self, state)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::features::FeatureMode;
    use crate::domain::error::IncompatibleSnapshotError;
    use crate::infra::metrics::TrainingHistory;
    use crate::infra::snapshot::{NetworkMeta, SnapshotMeta};

    fn ray_features(count: usize) -> FeatureConfig {
        FeatureConfig {
            canvas_width:  1024.0,
            canvas_height: 768.0,
            max_speed:     300.0,
            mode:          FeatureMode::Rays { count },
        }
    }

    fn state() -> CarState {
        CarState {
            x: 512.0,
            y: 384.0,
            vx: 150.0,
            vy: -20.0,
            angle: 0.4,
            ray_distances: Some(vec![0.8, 0.6, 1.0]),
            nearest_checkpoint: None,
        }
    }

    #[test]
    fn snapshot_round_trip_reproduces_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().to_str().unwrap()).unwrap();

        let features = ray_features(3);
        let network = NetworkMeta {
            input_size:   features.feature_len(),
            hidden_sizes: vec![16, 8],
            dropout:      0.2,
        };

        // A freshly initialized (untrained) model is enough — the
        // property under test is save → load → identical outputs.
        let device = burn::backend::ndarray::NdArrayDevice::default();
        InferBackend::seed(3);
        let model = PolicyNetConfig::new(network.input_size, network.hidden_sizes.clone())
            .init::<InferBackend>(&device);

        let direct = {
            let vec = features.extract(&state()).unwrap();
            let input = Tensor::<InferBackend, 1>::from_floats(vec.as_slice(), &device)
                .reshape([1, vec.len()]);
            let out = model.forward(input);
            (
                out.steering.into_scalar().elem::<f32>(),
                out.throttle.into_scalar().elem::<f32>(),
            )
        };

        let meta = SnapshotMeta::new(features, network, TrainingHistory::default());
        store.save(&model, "best", &meta).unwrap();

        let engine = InferenceEngine::from_snapshot(&store, "best").unwrap();
        let action = engine.predict(&state()).unwrap();

        // The recorder stores half precision, so allow a small gap.
        assert!((action.steering - direct.0).abs() < 1e-2);
        assert!((action.throttle - direct.1).abs() < 1e-2);
    }

    #[test]
    fn mismatched_feature_width_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().to_str().unwrap()).unwrap();

        // Feature config says 6 rays → 12 features, but the
        // recorded network takes 9 inputs.
        let meta = SnapshotMeta::new(
            ray_features(6),
            NetworkMeta { input_size: 9, hidden_sizes: vec![16], dropout: 0.0 },
            TrainingHistory::default(),
        );
        store.save_meta("best", &meta).unwrap();

        let err = InferenceEngine::from_snapshot(&store, "best").unwrap_err();
        let err = err.downcast_ref::<IncompatibleSnapshotError>().unwrap();
        assert_eq!(err.expected, 9);
        assert_eq!(err.declared, 12);
    }

    #[test]
    fn predict_reports_missing_cues_per_request() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().to_str().unwrap()).unwrap();

        let features = ray_features(3);
        let network = NetworkMeta {
            input_size:   features.feature_len(),
            hidden_sizes: vec![8],
            dropout:      0.0,
        };
        let device = burn::backend::ndarray::NdArrayDevice::default();
        let model = PolicyNetConfig::new(network.input_size, network.hidden_sizes.clone())
            .init::<InferBackend>(&device);
        let meta = SnapshotMeta::new(features, network, TrainingHistory::default());
        store.save(&model, "best", &meta).unwrap();

        let engine = InferenceEngine::from_snapshot(&store, "best").unwrap();
        let mut s = state();
        s.ray_distances = None;
        assert!(engine.predict(&s).is_err());
        // The engine itself stays serviceable for the next request
        assert!(engine.predict(&state()).is_ok());
    }
}
