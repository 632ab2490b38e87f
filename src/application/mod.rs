// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (training, checking, or packaging a policy).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No argument parsing here (that's Layer 1)
//   - No direct tensor or network access (that's Layer 5)
//   - Only workflow coordination
//
// Think of this layer as the "director" — it tells other
// layers what to do but doesn't do the work itself.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training workflow: telemetry → corpus → trained snapshots
pub mod train_use_case;

// The snapshot smoke-test workflow: fixed scenarios, printed verdicts
pub mod drive_use_case;

// The deployment-packaging workflow: snapshot pair + README
pub mod export_use_case;
