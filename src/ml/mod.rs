// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code.
// No other layer imports from burn directly — only this one
// and the two data-pipeline modules that produce tensors.
//
// Why isolate Burn code here?
//   - If Burn's API changes, we only update this layer
//   - Other layers are testable without a tensor backend
//   - The model architecture is clearly separated from
//     data loading and application logic
//
// What's in this layer:
//
//   model.rs      — The policy network architecture
//                   Shared fully-connected trunk with:
//                   • ReLU activations
//                   • Dropout after every trunk layer
//                   and two independent output heads:
//                   • steering  → tanh    → [-1, 1]
//                   • throttle  → sigmoid → [0, 1]
//
//   trainer.rs    — The training loop
//                   Forward pass, MSE + BCE objective,
//                   backward pass, Adam step, validation,
//                   early stopping, best/final snapshots
//
//   inferencer.rs — The inference engine
//                   Loads a snapshot, extracts features with
//                   the snapshot's own constants, runs the
//                   model on the plain backend
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Policy network architecture: trunk + two bounded heads
pub mod model;

/// Full training loop with validation and early stopping
pub mod trainer;

/// Inference engine — loads a snapshot and predicts actions
pub mod inferencer;
