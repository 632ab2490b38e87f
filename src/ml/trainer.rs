// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full train + validation loop using Burn's DataLoader and Adam.
//
// Backend discipline:
//   - Training uses MyBackend (Autodiff<NdArray>) — dropout live
//   - model.valid() returns the model on MyInnerBackend, where
//     dropout is structurally inert, for validation
//   - The validation batcher must also use MyInnerBackend
//
// Per epoch: one Adam step per minibatch on the summed
// (MSE steering + BCE throttle) objective, then both losses over
// the full validation partition with no updates. The best
// validation epoch is snapshotted as it happens; a final
// snapshot is always written when the loop ends.
//
// A non-finite training loss aborts the run immediately — the
// best snapshot so far is already on disk, and continuing to
// step a diverged model would only bury it.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::PolicyBatcher,
    corpus::CorpusView,
    features::FeatureConfig,
};
use crate::domain::error::NonFiniteLossError;
use crate::infra::metrics::{EpochMetrics, MetricsLogger, TrainingHistory};
use crate::infra::snapshot::{NetworkMeta, SnapshotMeta, SnapshotStore, BEST_STEM, FINAL_STEM};
use crate::ml::model::{PolicyNetConfig, PolicyNetwork};

type MyBackend      = burn::backend::Autodiff<burn::backend::NdArray>;
type MyInnerBackend = burn::backend::NdArray;

// ─── Early Stopping ───────────────────────────────────────────────────────────
/// What to do after observing one epoch's validation loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopDecision {
    /// New best validation loss — snapshot this model
    Improved,
    /// No improvement, but patience remains
    Stalled,
    /// Patience exhausted — halt training
    Halt,
}

/// Tracks the best-seen validation loss and how many epochs have
/// passed without beating it.
pub struct EarlyStopping {
    patience: usize,
    best:     f64,
    stalled:  usize,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self { patience, best: f64::INFINITY, stalled: 0 }
    }

    pub fn best(&self) -> f64 {
        self.best
    }

    pub fn observe(&mut self, metrics: &EpochMetrics) -> StopDecision {
        if metrics.is_improvement(self.best) {
            self.best = metrics.val_loss;
            self.stalled = 0;
            return StopDecision::Improved;
        }
        self.stalled += 1;
        if self.stalled >= self.patience {
            StopDecision::Halt
        } else {
            StopDecision::Stalled
        }
    }
}

// ─── Training Report ──────────────────────────────────────────────────────────
/// What a finished (or halted) run looked like.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub epochs_run:    usize,
    pub best_val_loss: f64,
    pub early_stopped: bool,
}

// ─── Training Entry Point ─────────────────────────────────────────────────────
pub fn run_training(
    cfg:        &TrainConfig,
    train_view: CorpusView,
    val_view:   CorpusView,
    store:      &SnapshotStore,
    features:   FeatureConfig,
) -> Result<TrainingReport> {
    let device = burn::backend::ndarray::NdArrayDevice::default();
    MyBackend::seed(cfg.seed);

    // ── Build model ───────────────────────────────────────────────────────────
    let input_size = features.feature_len();
    let model_cfg = PolicyNetConfig::new(input_size, cfg.hidden.clone())
        .with_dropout(cfg.dropout);
    let mut model: PolicyNetwork<MyBackend> = model_cfg.init(&device);
    tracing::info!(
        "Model ready: {} inputs, trunk {:?}, dropout {}",
        input_size,
        cfg.hidden,
        cfg.dropout
    );

    let network_meta = NetworkMeta {
        input_size,
        hidden_sizes: cfg.hidden.clone(),
        dropout: cfg.dropout,
    };

    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let optim_cfg = AdamConfig::new().with_epsilon(1e-8);
    let mut optim = optim_cfg.init();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_batcher = PolicyBatcher::<MyBackend>::new(device.clone());
    let train_loader  = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(train_view);

    // ── Validation data loader (InnerBackend — no autodiff overhead) ──────────
    let val_batcher = PolicyBatcher::<MyInnerBackend>::new(device.clone());
    let val_loader  = DataLoaderBuilder::new(val_batcher)
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_view);

    let logger  = MetricsLogger::new(&cfg.snapshot_dir)?;
    let mut history = TrainingHistory::default();
    let mut stopper = EarlyStopping::new(cfg.patience);
    let mut epochs_run = 0;
    let mut early_stopped = false;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        epochs_run = epoch;

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum    = 0.0f64;
        let mut steering_loss_sum = 0.0f64;
        let mut throttle_loss_sum = 0.0f64;
        let mut train_batches     = 0usize;

        for (batch_idx, batch) in train_loader.iter().enumerate() {
            let (losses, _) = model.forward_loss(
                batch.features,
                batch.steering_targets,
                batch.throttle_targets,
            );

            let loss_val: f64 = losses.total.clone().into_scalar().elem::<f64>();
            if !loss_val.is_finite() {
                return Err(NonFiniteLossError { epoch, batch: batch_idx }.into());
            }

            train_loss_sum    += loss_val;
            steering_loss_sum += losses.steering.into_scalar().elem::<f64>();
            throttle_loss_sum += losses.throttle.into_scalar().elem::<f64>();
            train_batches     += 1;

            // Backward pass + Adam update
            let grads = losses.total.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };
        let avg_steering_loss = if train_batches > 0 {
            steering_loss_sum / train_batches as f64
        } else { f64::NAN };
        let avg_throttle_loss = if train_batches > 0 {
            throttle_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        // model.valid() → PolicyNetwork<MyInnerBackend>, dropout inert
        let model_valid = model.valid();

        let mut val_loss_sum = 0.0f64;
        let mut val_batches  = 0usize;

        for batch in val_loader.iter() {
            let (losses, _) = model_valid.forward_loss(
                batch.features,
                batch.steering_targets,
                batch.throttle_targets,
            );
            val_loss_sum += losses.total.into_scalar().elem::<f64>();
            val_batches  += 1;
        }

        let avg_val_loss = if val_batches > 0 {
            val_loss_sum / val_batches as f64
        } else { f64::NAN };

        // ── Metrics and checkpoint selection ──────────────────────────────────
        let metrics = EpochMetrics::new(
            epoch,
            avg_train_loss,
            avg_val_loss,
            avg_steering_loss,
            avg_throttle_loss,
        );
        history.push(&metrics);
        logger.log(&metrics)?;

        println!(
            "Epoch {:>3}/{} | train={:.4} | val={:.4} | steer={:.4} | throttle={:.4}",
            epoch, cfg.epochs, avg_train_loss, avg_val_loss,
            avg_steering_loss, avg_throttle_loss,
        );

        match stopper.observe(&metrics) {
            StopDecision::Improved => {
                let meta = SnapshotMeta::new(
                    features.clone(),
                    network_meta.clone(),
                    history.clone(),
                );
                store.save(&model, BEST_STEM, &meta)?;
                tracing::debug!("New best val loss {:.4} at epoch {}", avg_val_loss, epoch);
            }
            StopDecision::Stalled => {}
            StopDecision::Halt => {
                tracing::info!(
                    "Early stopping after {} epochs; best val loss {:.4}",
                    epoch,
                    stopper.best()
                );
                early_stopped = true;
                break;
            }
        }
    }

    // The final snapshot is written unconditionally — it is the
    // end-of-training model, which is not necessarily the best one.
    let meta = SnapshotMeta::new(features, network_meta, history);
    store.save(&model, FINAL_STEM, &meta)?;

    tracing::info!("Training complete: {} epochs", epochs_run);
    Ok(TrainingReport {
        epochs_run,
        best_val_loss: stopper.best(),
        early_stopped,
    })
}
