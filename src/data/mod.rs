// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from raw telemetry .json files
// all the way to tensor batches.
//
// The pipeline flows in this order:
//
//   telemetry .json files
//       │
//       ▼
//   JsonTelemetryLoader → reads files, yields TelemetryFrames
//       │
//       ▼
//   FeatureConfig       → frame → fixed-length feature vector
//       │
//       ▼
//   TelemetryCorpus     → indexable (features, labels) triples
//       │
//       ▼
//   split_indices       → seeded train/validation partition
//       │
//       ▼
//   PolicyBatcher       → stacks samples into tensor batches
//       │
//       ▼
//   DataLoader          → feeds batches to the training loop
//
// Each module is responsible for exactly one step.
// This makes each step independently testable and replaceable.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Loads telemetry .json recordings from a directory
pub mod loader;

/// Frame → normalized feature vector, plus the feature mode
pub mod features;

/// Indexable corpus of (features, steering, throttle) triples
pub mod corpus;

/// Seeded, reproducible train/validation index partition
pub mod splitter;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Checkpoint tables: track files and k-means auto-detection
pub mod track;

/// Pre-training label statistics and data-quality warnings
pub mod analysis;
