// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the four subcommands: `train`, `drive`, `serve`,
// and `export`, and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::train_use_case::{FeatureModeChoice, TrainConfig};

/// The four top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a control policy on recorded telemetry
    Train(TrainArgs),

    /// Run a trained snapshot against fixed sanity scenarios
    Drive(DriveArgs),

    /// Serve a trained snapshot over WebSocket to a running game
    Serve(ServeArgs),

    /// Package a snapshot pair for deployment
    Export(ExportArgs),
}

/// CLI spelling of the feature mode.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum FeatureModeArg {
    /// Forward ray-cast clearances as spatial cues
    Rays,
    /// Offsets to upcoming track checkpoints as spatial cues
    Checkpoints,
}

impl From<FeatureModeArg> for FeatureModeChoice {
    fn from(a: FeatureModeArg) -> Self {
        match a {
            FeatureModeArg::Rays => FeatureModeChoice::Rays,
            FeatureModeArg::Checkpoints => FeatureModeChoice::Checkpoints,
        }
    }
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory containing .json telemetry recordings
    #[arg(long, default_value = "telemetry_data")]
    pub data_dir: String,

    /// Directory to save model snapshots and the metrics CSV
    #[arg(long, default_value = "snapshots")]
    pub snapshot_dir: String,

    /// Maximum number of full passes through the training data
    #[arg(long, default_value_t = 50)]
    pub epochs: usize,

    /// Number of frames processed together in one forward pass
    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Epochs without validation improvement before stopping early
    #[arg(long, default_value_t = 10)]
    pub patience: usize,

    /// How fast the model learns — too high causes instability,
    /// too low causes slow convergence
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Seed for weight init, shuffling, splitting, and clustering
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Fraction of the corpus used for training (rest validates)
    #[arg(long, default_value_t = 0.8)]
    pub train_split: f64,

    /// Trunk layer widths, widest first
    #[arg(long, value_delimiter = ',', default_values_t = [128, 64, 32])]
    pub hidden: Vec<usize>,

    /// Dropout probability — randomly zeroes activations during training
    /// to prevent overfitting
    #[arg(long, default_value_t = 0.2)]
    pub dropout: f64,

    /// Game canvas width in pixels, for position normalization
    #[arg(long, default_value_t = 1024.0)]
    pub canvas_width: f32,

    /// Game canvas height in pixels
    #[arg(long, default_value_t = 768.0)]
    pub canvas_height: f32,

    /// Top speed in pixels per second, for velocity normalization
    #[arg(long, default_value_t = 300.0)]
    pub max_speed: f32,

    /// Which spatial cues to train on
    #[arg(long, value_enum, default_value_t = FeatureModeArg::Rays)]
    pub feature_mode: FeatureModeArg,

    /// How many leading rays to use in rays mode
    #[arg(long, default_value_t = 3)]
    pub ray_count: usize,

    /// JSON checkpoint table for checkpoints mode; auto-detected
    /// from the corpus when omitted
    #[arg(long)]
    pub track_file: Option<String>,

    /// Number of checkpoints to auto-detect (k for the clustering)
    #[arg(long, default_value_t = 4)]
    pub checkpoint_count: usize,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:     a.data_dir,
            snapshot_dir: a.snapshot_dir,

            epochs:      a.epochs,
            batch_size:  a.batch_size,
            patience:    a.patience,
            lr:          a.lr,
            seed:        a.seed,
            train_split: a.train_split,

            hidden:  a.hidden,
            dropout: a.dropout,

            canvas_width:  a.canvas_width,
            canvas_height: a.canvas_height,
            max_speed:     a.max_speed,

            feature_mode:     a.feature_mode.into(),
            ray_count:        a.ray_count,
            track_file:       a.track_file,
            checkpoint_count: a.checkpoint_count,
        }
    }
}

/// All arguments for the `drive` command
#[derive(Args, Debug)]
pub struct DriveArgs {
    /// Directory where snapshots were saved during training
    #[arg(long, default_value = "snapshots")]
    pub snapshot_dir: String,

    /// Which snapshot to load: best (lowest validation loss)
    /// or final (end of training)
    #[arg(long, default_value = "best")]
    pub snapshot: String,
}

/// All arguments for the `serve` command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Directory where snapshots were saved during training
    #[arg(long, default_value = "snapshots")]
    pub snapshot_dir: String,

    /// Which snapshot to serve: best or final
    #[arg(long, default_value = "best")]
    pub snapshot: String,

    /// Listen address for the WebSocket server
    #[arg(long, default_value = "127.0.0.1:8765")]
    pub bind: String,
}

/// All arguments for the `export` command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Directory where snapshots were saved during training
    #[arg(long, default_value = "snapshots")]
    pub snapshot_dir: String,

    /// Which snapshot to package: best or final
    #[arg(long, default_value = "best")]
    pub snapshot: String,

    /// Directory to write the deployment package into
    #[arg(long, default_value = "deployment")]
    pub output: String,
}
