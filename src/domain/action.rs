// ============================================================
// Layer 3 - Action Domain Types
// ============================================================
// The policy's output and the ground-truth labels it is trained
// against. Labels are derived from the keys the player held:
// discrete {-1, 0, 1} steering and {0, 1} throttle. The trained
// network predicts continuous values in the same ranges.

use serde::{Deserialize, Serialize};

use crate::domain::telemetry::InputFlags;

/// A control decision: steering in [-1,1] (negative is left),
/// throttle in [0,1]. This is the JSON object sent back over the
/// serving channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub steering: f32,
    pub throttle: f32,
}

impl InputFlags {
    /// Steering label for supervision. Left wins when both turn
    /// keys are held, matching how the recorder resolved them.
    pub fn steering_label(&self) -> f32 {
        if self.left {
            -1.0
        } else if self.right {
            1.0
        } else {
            0.0
        }
    }

    /// Throttle label for supervision: 1.0 while the forward key
    /// is held, 0.0 otherwise.
    pub fn throttle_label(&self) -> f32 {
        if self.forward {
            1.0
        } else {
            0.0
        }
    }
}
