// ============================================================
// Layer 4 — Telemetry Corpus
// ============================================================
// The flat, randomly-indexable view over every loaded frame.
// Each access produces one training triple:
//
//   (feature vector, steering label, throttle label)
//
// Features are computed lazily through FeatureConfig on every
// access — nothing is materialized up front. Labels come from
// the keys the player held in that frame.
//
// Construction validates every frame against the configured
// feature mode once: frames missing the required cue are
// dropped with a warning, and a corpus that ends up empty is a
// hard error — training on nothing is never allowed to start.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

use std::sync::Arc;

use burn::data::dataset::Dataset;

use crate::data::features::{FeatureConfig, FeatureMode};
use crate::data::splitter::split_indices;
use crate::domain::error::EmptyCorpusError;
use crate::domain::telemetry::TelemetryFrame;

// ─── PolicySample ─────────────────────────────────────────────────────────────
/// One supervised example: what the car saw and what the player
/// did about it. Steering is {-1, 0, 1}, throttle is {0, 1}.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicySample {
    pub features: Vec<f32>,
    pub steering: f32,
    pub throttle: f32,
}

// ─── TelemetryCorpus ──────────────────────────────────────────────────────────
/// All usable frames plus the feature configuration that turns
/// them into samples. Immutable after construction.
pub struct TelemetryCorpus {
    frames: Vec<TelemetryFrame>,
    config: FeatureConfig,
}

impl TelemetryCorpus {
    /// Validate frames against the feature mode and build the
    /// corpus. Frames lacking the required cue are skipped with a
    /// warning; zero surviving frames is fatal.
    pub fn new(
        frames: Vec<TelemetryFrame>,
        config: FeatureConfig,
    ) -> Result<Self, EmptyCorpusError> {
        // An empty checkpoint table makes every frame inextractable,
        // so judge it before extraction gets a chance to divide by
        // the table length.
        if let FeatureMode::Checkpoints { positions } = &config.mode {
            if positions.is_empty() {
                tracing::error!("Checkpoint table is empty — no frame can produce features");
                return Err(EmptyCorpusError);
            }
        }

        let total = frames.len();
        let frames: Vec<TelemetryFrame> = frames
            .into_iter()
            .filter(|f| match config.extract(&f.state) {
                Ok(_) => true,
                Err(e) => {
                    tracing::debug!("Dropping frame: {}", e);
                    false
                }
            })
            .collect();

        let dropped = total - frames.len();
        if dropped > 0 {
            tracing::warn!(
                "Dropped {} of {} frames that lack the '{}' cue",
                dropped,
                total,
                config.mode.name()
            );
        }

        if frames.is_empty() {
            return Err(EmptyCorpusError);
        }

        tracing::info!(
            "Corpus ready: {} frames, {} features each",
            frames.len(),
            config.feature_len()
        );
        Ok(Self { frames, config })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    pub fn frames(&self) -> &[TelemetryFrame] {
        &self.frames
    }

    /// The training triple for frame `index`, computed on demand.
    /// Returns None past the end. Extraction cannot fail here —
    /// every frame was validated at construction.
    pub fn sample(&self, index: usize) -> Option<PolicySample> {
        let frame = self.frames.get(index)?;
        let features = self.config.extract(&frame.state).ok()?;
        Some(PolicySample {
            features,
            steering: frame.input.steering_label(),
            throttle: frame.input.throttle_label(),
        })
    }

    /// Partition the corpus into train and validation views by a
    /// seeded shuffle. Every index lands in exactly one side.
    pub fn split(self, train_fraction: f64, seed: u64) -> (CorpusView, CorpusView) {
        let (train_idx, val_idx) = split_indices(self.len(), train_fraction, seed);
        let corpus = Arc::new(self);
        (
            CorpusView { corpus: Arc::clone(&corpus), indices: train_idx },
            CorpusView { corpus, indices: val_idx },
        )
    }
}

// ─── CorpusView ───────────────────────────────────────────────────────────────
/// One side of a train/validation partition. Implements Burn's
/// Dataset trait so the DataLoader can feed it to the trainer.
pub struct CorpusView {
    corpus:  Arc<TelemetryCorpus>,
    indices: Vec<usize>,
}

impl CorpusView {
    /// Number of samples on this side of the partition.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl Dataset<PolicySample> for CorpusView {
    fn get(&self, index: usize) -> Option<PolicySample> {
        self.corpus.sample(*self.indices.get(index)?)
    }

    fn len(&self) -> usize {
        self.indices.len()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::features::FeatureMode;
    use crate::domain::telemetry::{CarState, InputFlags};

    fn frame(x: f32, left: bool, forward: bool) -> TelemetryFrame {
        TelemetryFrame {
            state: CarState {
                x,
                y: 100.0,
                vx: 10.0,
                vy: 0.0,
                angle: 0.0,
                ray_distances: Some(vec![1.0, 1.0, 1.0]),
                nearest_checkpoint: None,
            },
            input: InputFlags { forward, left, right: false },
        }
    }

    fn config() -> FeatureConfig {
        FeatureConfig {
            canvas_width:  1024.0,
            canvas_height: 768.0,
            max_speed:     300.0,
            mode:          FeatureMode::Rays { count: 3 },
        }
    }

    #[test]
    fn empty_corpus_is_fatal() {
        assert!(TelemetryCorpus::new(Vec::new(), config()).is_err());
    }

    #[test]
    fn empty_checkpoint_table_is_fatal_not_a_panic() {
        let mut f = frame(1.0, false, true);
        f.state.nearest_checkpoint = Some(0);
        let cfg = FeatureConfig {
            canvas_width:  1024.0,
            canvas_height: 768.0,
            max_speed:     300.0,
            mode:          FeatureMode::Checkpoints { positions: Vec::new() },
        };
        assert!(TelemetryCorpus::new(vec![f], cfg).is_err());
    }

    #[test]
    fn frames_without_the_required_cue_are_dropped() {
        let mut bad = frame(0.0, false, false);
        bad.state.ray_distances = None;
        let corpus =
            TelemetryCorpus::new(vec![frame(1.0, false, true), bad], config()).unwrap();
        assert_eq!(corpus.len(), 1);
    }

    #[test]
    fn samples_carry_labels_from_held_keys() {
        let corpus = TelemetryCorpus::new(
            vec![frame(1.0, true, true), frame(2.0, false, false)],
            config(),
        )
        .unwrap();

        let first = corpus.sample(0).unwrap();
        assert_eq!(first.steering, -1.0);
        assert_eq!(first.throttle, 1.0);
        assert_eq!(first.features.len(), 9);

        let second = corpus.sample(1).unwrap();
        assert_eq!(second.steering, 0.0);
        assert_eq!(second.throttle, 0.0);
    }

    #[test]
    fn split_views_cover_the_corpus_without_overlap() {
        let frames: Vec<TelemetryFrame> =
            (0..10).map(|i| frame(i as f32, false, true)).collect();
        let corpus = TelemetryCorpus::new(frames, config()).unwrap();
        let (train, val) = corpus.split(0.8, 7);

        assert_eq!(Dataset::len(&train), 8);
        assert_eq!(Dataset::len(&val), 2);

        // Every original frame appears exactly once across the views,
        // identified by its unique x coordinate.
        let mut seen: Vec<f32> = (0..Dataset::len(&train))
            .filter_map(|i| train.get(i))
            .chain((0..Dataset::len(&val)).filter_map(|i| val.get(i)))
            .map(|s| s.features[0] * 1024.0)
            .collect();
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let expected: Vec<f32> = (0..10).map(|i| i as f32).collect();
        for (got, want) in seen.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-3);
        }
    }
}
