// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load telemetry frames     (Layer 4 - data)
//   Step 2: Resolve feature mode      (Layer 4 - data)
//   Step 3: Build the corpus          (Layer 4 - data)
//   Step 4: Analyze the labels        (Layer 4 - data)
//   Step 5: Split train/validation    (Layer 4 - data)
//   Step 6: Open the snapshot store   (Layer 6 - infra)
//   Step 7: Run training loop         (Layer 5 - ml)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    analysis,
    corpus::TelemetryCorpus,
    features::{FeatureConfig, FeatureMode},
    loader::JsonTelemetryLoader,
    track,
};
use crate::domain::traits::TelemetrySource;
use crate::infra::snapshot::SnapshotStore;
use crate::ml::trainer::run_training;

// ─── Feature Mode Choice ─────────────────────────────────────────────────────
// Which spatial cue family the run trains on. The checkpoint
// variant still needs a position table, resolved in Step 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureModeChoice {
    Rays,
    Checkpoints,
}

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters and data settings for a training run.
// The #[derive(Serialize, Deserialize)] macros from serde handle
// reading/writing this struct to JSON automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:     String,
    pub snapshot_dir: String,

    pub epochs:      usize,
    pub batch_size:  usize,
    pub patience:    usize,
    pub lr:          f64,
    pub seed:        u64,
    pub train_split: f64,

    pub hidden:  Vec<usize>,
    pub dropout: f64,

    pub canvas_width:  f32,
    pub canvas_height: f32,
    pub max_speed:     f32,

    pub feature_mode:     FeatureModeChoice,
    pub ray_count:        usize,
    pub track_file:       Option<String>,
    pub checkpoint_count: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:     "telemetry_data".to_string(),
            snapshot_dir: "snapshots".to_string(),

            epochs:      50,
            batch_size:  64,
            patience:    10,
            lr:          1e-3,
            seed:        42,
            train_split: 0.8,

            hidden:  vec![128, 64, 32],
            dropout: 0.2,

            canvas_width:  1024.0,
            canvas_height: 768.0,
            max_speed:     300.0,

            feature_mode:     FeatureModeChoice::Rays,
            ray_count:        3,
            track_file:       None,
            checkpoint_count: 4,
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
// Owns the config and runs the full training pipeline.
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    /// Create a new TrainUseCase with the given configuration
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Load telemetry recordings ─────────────────────────────────
        // JsonTelemetryLoader walks the directory and parses each
        // .json recording; unreadable sources are skipped.
        tracing::info!("Loading telemetry from '{}'", cfg.data_dir);
        let loader = JsonTelemetryLoader::new(&cfg.data_dir);
        let frames = loader.load_all()?;
        tracing::info!("Loaded {} frames", frames.len());

        // ── Step 2: Resolve the feature configuration ─────────────────────────
        // The rays mode is self-contained; the checkpoints mode
        // needs a position table, from a track file when given and
        // from seeded clustering of the corpus otherwise.
        let mode = match cfg.feature_mode {
            FeatureModeChoice::Rays => FeatureMode::Rays { count: cfg.ray_count },
            FeatureModeChoice::Checkpoints => {
                let positions = match &cfg.track_file {
                    Some(path) => track::load_track_file(path)?,
                    None => {
                        if cfg.checkpoint_count == 0 {
                            bail!("--checkpoint-count must be at least 1 to auto-detect a table");
                        }
                        tracing::info!(
                            "No track file — clustering positions into {} checkpoints",
                            cfg.checkpoint_count
                        );
                        track::auto_detect_checkpoints(&frames, cfg.checkpoint_count, cfg.seed)
                    }
                };
                FeatureMode::Checkpoints { positions }
            }
        };
        let features = FeatureConfig {
            canvas_width:  cfg.canvas_width,
            canvas_height: cfg.canvas_height,
            max_speed:     cfg.max_speed,
            mode,
        };
        tracing::info!(
            "Feature mode '{}': {} features per frame",
            features.mode.name(),
            features.feature_len()
        );

        // ── Step 3: Build the corpus ──────────────────────────────────────────
        // Frames missing the mode's cues are dropped here; an empty
        // corpus refuses to train.
        let corpus = TelemetryCorpus::new(frames, features.clone())?;

        // ── Step 4: Label statistics and data-quality warnings ────────────────
        analysis::analyze(&corpus);

        // ── Step 5: Train / validation split ──────────────────────────────────
        // Seeded shuffle so the partition is reproducible run to run
        let corpus_len = corpus.len();
        let (train_view, val_view) = corpus.split(cfg.train_split, cfg.seed);
        tracing::info!(
            "Split {} frames: {} train, {} validation",
            corpus_len,
            train_view.len(),
            val_view.len()
        );

        // Early stopping and best-snapshot selection are driven by
        // validation loss; with nothing to validate on, every epoch
        // would score NaN and no best snapshot would ever be saved.
        if val_view.is_empty() {
            bail!(
                "train split {} leaves no validation frames ({} total) — lower --train-split",
                cfg.train_split,
                corpus_len
            );
        }

        // ── Step 6: Open the snapshot store ───────────────────────────────────
        let store = SnapshotStore::new(&cfg.snapshot_dir)?;

        // ── Step 7: Run training loop (Layer 5) ───────────────────────────────
        let report = run_training(cfg, train_view, val_view, &store, features)?;

        println!();
        println!("Training finished:");
        println!("  epochs run:    {}", report.epochs_run);
        println!("  best val loss: {:.4}", report.best_val_loss);
        if report.early_stopped {
            println!("  stopped early (no improvement for {} epochs)", cfg.patience);
        }
        println!("  snapshots:     '{}/best.mpk' and '{}/final.mpk'", cfg.snapshot_dir, cfg.snapshot_dir);

        Ok(())
    }
}
