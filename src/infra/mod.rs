// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles all cross-cutting concerns that don't belong in
// any specific business layer:
//
//   snapshot.rs — Model snapshot persistence
//                 Saves and loads {stem}.mpk weights (via
//                 Burn's CompactRecorder) together with a
//                 {stem}.json metadata sidecar carrying the
//                 feature config, network architecture, and
//                 training history. Inference rebuilds the
//                 model purely from the sidecar.
//
//   metrics.rs  — Training metrics logging
//                 Writes epoch-level metrics (train/val loss,
//                 per-head components) to a CSV file for later
//                 analysis and plotting, and accumulates the
//                 in-memory history stored inside snapshots.
//
// Why is this a separate layer?
//   These concerns are used by multiple other layers but
//   don't belong to any one of them. Keeping them here:
//   - Prevents duplication across layers
//   - Makes it easy to swap implementations
//     (e.g. swap file snapshots for S3 cloud storage)
//   - Keeps other layers focused on their core logic
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model snapshot saving and loading (weights + metadata sidecar)
pub mod snapshot;

/// Training metrics CSV logger and per-epoch history curves
pub mod metrics;
