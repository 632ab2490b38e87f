// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Four commands are supported:
//   1. `train`  — trains a policy on recorded telemetry
//   2. `drive`  — smoke-tests a snapshot against fixed scenarios
//   3. `serve`  — serves a snapshot over WebSocket
//   4. `export` — packages a snapshot pair for deployment
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, DriveArgs, ExportArgs, ServeArgs, TrainArgs};

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "racing-pilot",
    version = "0.1.0",
    about = "Train a driving policy on game telemetry, then check, serve, or ship it."
)]
pub struct Cli {
    /// The subcommand to run (train, drive, serve, or export)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// This keeps the CLI layer thin — it only routes, never computes.
    ///
    /// The handlers are associated functions, not methods: the
    /// match moves the args out of `self`, so a `&self` receiver
    /// would borrow a partially moved value.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => Self::run_train(args),
            Commands::Drive(args) => Self::run_drive(args),
            Commands::Serve(args) => Self::run_serve(args),
            Commands::Export(args) => Self::run_export(args),
        }
    }

    /// Handles the `train` subcommand.
    /// Converts CLI args into a TrainConfig and hands off to Layer 2.
    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        tracing::info!("Starting training on telemetry in: {}", args.data_dir);

        // Convert CLI args → application config (separates presentation from domain)
        let use_case = TrainUseCase::new(args.into());
        use_case.execute()
    }

    /// Handles the `drive` subcommand.
    /// Loads the snapshot and prints the scenario-table verdicts.
    fn run_drive(args: DriveArgs) -> Result<()> {
        use crate::application::drive_use_case::DriveUseCase;

        let use_case = DriveUseCase::new(args.snapshot_dir, args.snapshot);
        use_case.execute()
    }

    /// Handles the `serve` subcommand.
    /// Loads the snapshot into an engine and runs the WebSocket
    /// loop until killed.
    fn run_serve(args: ServeArgs) -> Result<()> {
        use crate::infra::snapshot::SnapshotStore;
        use crate::ml::inferencer::InferenceEngine;

        let store = SnapshotStore::new(&args.snapshot_dir)?;
        let engine = Arc::new(InferenceEngine::from_snapshot(&store, &args.snapshot)?);
        crate::server::run(&args.bind, engine)
    }

    /// Handles the `export` subcommand.
    fn run_export(args: ExportArgs) -> Result<()> {
        use crate::application::export_use_case::ExportUseCase;

        let use_case = ExportUseCase::new(args.snapshot_dir, args.snapshot, args.output);
        use_case.execute()
    }
}
