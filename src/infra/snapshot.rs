// ============================================================
// Layer 6 — Snapshot Store
// ============================================================
// Persists trained models as self-describing snapshots.
//
// A snapshot is a pair of files sharing a stem:
//   {stem}.mpk  — the weights, via Burn's CompactRecorder
//   {stem}.json — the metadata sidecar
//
// The sidecar is what makes a snapshot self-describing: it
// carries the feature configuration (normalization constants,
// feature mode, any checkpoint table), the network architecture
// needed to rebuild the model before loading weights into it,
// the training-history curves, and an ISO-8601 creation
// timestamp. An engine rehydrates everything from the sidecar —
// never from ambient configuration — so serving is reproducible
// wherever the pair of files lands.
//
// Two stems have fixed meanings:
//   best  — the epoch with the lowest validation loss
//   final — the end-of-training model, saved unconditionally
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{bail, Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::data::features::{FeatureConfig, FeatureMode};
use crate::domain::error::IncompatibleSnapshotError;
use crate::infra::metrics::TrainingHistory;
use crate::ml::model::PolicyNetwork;

/// Stem of the lowest-validation-loss snapshot.
pub const BEST_STEM: &str = "best";

/// Stem of the unconditional end-of-training snapshot.
pub const FINAL_STEM: &str = "final";

// ─── SnapshotMeta ─────────────────────────────────────────────────────────────
/// The architecture needed to rebuild the network before its
/// weights can be loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkMeta {
    pub input_size:   usize,
    pub hidden_sizes: Vec<usize>,
    pub dropout:      f64,
}

/// The metadata sidecar stored next to every weights file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// ISO-8601 creation timestamp
    pub created_at: String,

    /// Normalization constants and feature mode in effect at
    /// training time
    pub features: FeatureConfig,

    pub network: NetworkMeta,

    /// Per-epoch loss curves up to the moment this snapshot was
    /// written
    pub history: TrainingHistory,
}

impl SnapshotMeta {
    pub fn new(features: FeatureConfig, network: NetworkMeta, history: TrainingHistory) -> Self {
        Self {
            created_at: Utc::now().to_rfc3339(),
            features,
            network,
            history,
        }
    }

    /// A snapshot is only loadable when the width its feature
    /// config produces matches the recorded network's input
    /// width, and the feature config itself can extract — a
    /// checkpoint table with no entries satisfies the width check
    /// but cannot produce a single vector. Anything else must
    /// fail loudly — truncating or padding the input would serve
    /// garbage.
    pub fn validate(&self) -> Result<()> {
        if let FeatureMode::Checkpoints { positions } = &self.features.mode {
            if positions.is_empty() {
                bail!("snapshot declares the checkpoints mode but its checkpoint table is empty");
            }
        }

        let declared = self.features.feature_len();
        if declared != self.network.input_size {
            return Err(IncompatibleSnapshotError {
                expected: self.network.input_size,
                declared,
            }
            .into());
        }
        Ok(())
    }
}

// ─── SnapshotStore ────────────────────────────────────────────────────────────
/// Manages the snapshot files under one directory.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Create a store, creating the directory if needed.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create snapshot directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Path of the weights file for a stem (recorder adds .mpk).
    pub fn weights_path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}.mpk"))
    }

    pub fn meta_path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}.json"))
    }

    /// Save a snapshot pair: weights plus metadata sidecar.
    /// Generic over the backend so the trainer can hand in the
    /// autodiff model directly.
    pub fn save<B: Backend>(
        &self,
        model: &PolicyNetwork<B>,
        stem:  &str,
        meta:  &SnapshotMeta,
    ) -> Result<()> {
        let path = self.dir.join(stem);
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save weights to '{}'", path.display()))?;

        self.save_meta(stem, meta)?;
        tracing::debug!("Saved '{}' snapshot", stem);
        Ok(())
    }

    /// Write just the metadata sidecar.
    pub fn save_meta(&self, stem: &str, meta: &SnapshotMeta) -> Result<()> {
        let path = self.meta_path(stem);
        let json = serde_json::to_string_pretty(meta)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write metadata to '{}'", path.display()))?;
        Ok(())
    }

    pub fn load_meta(&self, stem: &str) -> Result<SnapshotMeta> {
        let path = self.meta_path(stem);
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read snapshot metadata '{}'. Have you trained a model first?",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Load weights into a freshly built model of the matching
    /// architecture. load_record returns a new model with the
    /// restored parameters.
    pub fn load_model<B: Backend>(
        &self,
        model:  PolicyNetwork<B>,
        stem:   &str,
        device: &B::Device,
    ) -> Result<PolicyNetwork<B>> {
        let path = self.dir.join(stem);
        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load weights from '{}'", path.display()))?;
        Ok(model.load_record(record))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::features::FeatureMode;

    fn meta(ray_count: usize, input_size: usize) -> SnapshotMeta {
        SnapshotMeta::new(
            FeatureConfig {
                canvas_width:  1024.0,
                canvas_height: 768.0,
                max_speed:     300.0,
                mode:          FeatureMode::Rays { count: ray_count },
            },
            NetworkMeta { input_size, hidden_sizes: vec![32, 16], dropout: 0.2 },
            TrainingHistory::default(),
        )
    }

    #[test]
    fn consistent_meta_validates() {
        assert!(meta(3, 9).validate().is_ok());
    }

    #[test]
    fn width_mismatch_fails_validation() {
        let err = meta(6, 9).validate().unwrap_err();
        let err = err.downcast_ref::<IncompatibleSnapshotError>().unwrap();
        assert_eq!(err.expected, 9);
        assert_eq!(err.declared, 12);
    }

    #[test]
    fn empty_checkpoint_table_fails_validation() {
        // 2*3 checkpoint cues → width 12 matches the network, but
        // an empty table can never produce a vector.
        let m = SnapshotMeta::new(
            FeatureConfig {
                canvas_width:  1024.0,
                canvas_height: 768.0,
                max_speed:     300.0,
                mode:          FeatureMode::Checkpoints { positions: Vec::new() },
            },
            NetworkMeta { input_size: 12, hidden_sizes: vec![16], dropout: 0.2 },
            TrainingHistory::default(),
        );
        let err = m.validate().unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn unwritable_store_directory_is_an_error() {
        // A path under a regular file cannot become a directory.
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("occupied");
        std::fs::write(&blocker, b"not a directory").unwrap();
        assert!(SnapshotStore::new(blocker.join("snapshots").to_str().unwrap()).is_err());
    }

    #[test]
    fn meta_sidecar_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().to_str().unwrap()).unwrap();

        let mut original = meta(3, 9);
        original.history.val_loss = vec![0.9, 0.7, 0.6];
        store.save_meta(BEST_STEM, &original).unwrap();

        let loaded = store.load_meta(BEST_STEM).unwrap();
        assert_eq!(loaded.created_at, original.created_at);
        assert_eq!(loaded.features, original.features);
        assert_eq!(loaded.network, original.network);
        assert_eq!(loaded.history.val_loss, original.history.val_loss);
    }

    #[test]
    fn missing_snapshot_is_a_clear_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().to_str().unwrap()).unwrap();
        assert!(store.load_meta("best").is_err());
    }

    #[test]
    fn timestamp_is_iso8601() {
        let m = meta(3, 9);
        assert!(chrono::DateTime::parse_from_rfc3339(&m.created_at).is_ok());
    }
}
