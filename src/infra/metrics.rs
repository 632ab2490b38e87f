// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics after each epoch, twice over:
//
//   - MetricsLogger appends one row per epoch to a CSV file
//     under the snapshot directory, for plotting and post-run
//     analysis in any spreadsheet.
//
//   - TrainingHistory accumulates the same numbers as in-memory
//     curves that travel inside every snapshot, so a model file
//     always carries the story of how it was trained.
//
// Metrics recorded per epoch:
//   - epoch:         the epoch number (1, 2, 3, ...)
//   - train_loss:    average summed objective on training batches
//   - val_loss:      average summed objective on validation batches
//   - steering_loss: average MSE component (training)
//   - throttle_loss: average BCE component (training)
//
// How to read the metrics:
//   - Loss should decrease each epoch (model is learning)
//   - If val_loss rises while train_loss falls → overfitting,
//     which is exactly what early stopping watches for
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

// ─── EpochMetrics ─────────────────────────────────────────────────────────────
/// One row of metrics data for a single training epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Average summed (MSE + BCE) objective over training batches
    pub train_loss: f64,

    /// The same objective averaged over the validation partition
    pub val_loss: f64,

    /// Steering (MSE) component of the training loss
    pub steering_loss: f64,

    /// Throttle (BCE) component of the training loss
    pub throttle_loss: f64,
}

impl EpochMetrics {
    pub fn new(
        epoch:         usize,
        train_loss:    f64,
        val_loss:      f64,
        steering_loss: f64,
        throttle_loss: f64,
    ) -> Self {
        Self { epoch, train_loss, val_loss, steering_loss, throttle_loss }
    }

    /// True if this epoch beat the previous best validation loss.
    /// A NaN validation loss is never an improvement.
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

// ─── TrainingHistory ──────────────────────────────────────────────────────────
/// Per-epoch curves, one entry per completed epoch. Serialized
/// into the snapshot sidecar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub loss:          Vec<f64>,
    pub steering_loss: Vec<f64>,
    pub throttle_loss: Vec<f64>,
    pub val_loss:      Vec<f64>,
}

impl TrainingHistory {
    pub fn push(&mut self, m: &EpochMetrics) {
        self.loss.push(m.train_loss);
        self.steering_loss.push(m.steering_loss);
        self.throttle_loss.push(m.throttle_loss);
        self.val_loss.push(m.val_loss);
    }

    /// Number of epochs recorded so far.
    pub fn epochs(&self) -> usize {
        self.val_loss.len()
    }
}

// ─── MetricsLogger ────────────────────────────────────────────────────────────
/// Appends epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger.
    /// Writes the CSV header only if the file doesn't exist yet,
    /// so successive runs append to one log.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,train_loss,val_loss,steering_loss,throttle_loss")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6}",
            m.epoch, m.train_loss, m.val_loss, m.steering_loss, m.throttle_loss,
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, 2.5, 2.3, 1.0, 1.3);
        // 2.3 < 3.0 → this is an improvement
        assert!(m.is_improvement(3.0));
        // 2.3 is NOT less than 2.0 → not an improvement
        assert!(!m.is_improvement(2.0));
    }

    #[test]
    fn nan_val_loss_is_never_an_improvement() {
        let m = EpochMetrics::new(1, 1.0, f64::NAN, 0.5, 0.5);
        assert!(!m.is_improvement(f64::INFINITY));
    }

    #[test]
    fn history_tracks_all_four_curves() {
        let mut history = TrainingHistory::default();
        history.push(&EpochMetrics::new(1, 2.0, 2.2, 0.8, 1.2));
        history.push(&EpochMetrics::new(2, 1.5, 1.9, 0.6, 0.9));

        assert_eq!(history.epochs(), 2);
        assert_eq!(history.loss, vec![2.0, 1.5]);
        assert_eq!(history.val_loss, vec![2.2, 1.9]);
        assert_eq!(history.steering_loss, vec![0.8, 0.6]);
        assert_eq!(history.throttle_loss, vec![1.2, 0.9]);
    }

    #[test]
    fn csv_rows_append_under_one_header() {
        let dir = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path().to_str().unwrap()).unwrap();
        logger.log(&EpochMetrics::new(1, 2.0, 2.2, 0.8, 1.2)).unwrap();
        logger.log(&EpochMetrics::new(2, 1.5, 1.9, 0.6, 0.9)).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("epoch,"));
        assert!(lines[1].starts_with("1,2.000000"));
        assert!(lines[2].starts_with("2,1.500000"));
    }
}
