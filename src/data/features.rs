// ============================================================
// Layer 4 — Feature Extraction
// ============================================================
// Turns one CarState into the fixed-length normalized vector
// the network consumes. The same code runs at training and at
// serving time, and the constants it needs (canvas size, max
// speed, feature mode) travel inside every snapshot — so the
// two paths cannot drift apart.
//
// Vector layout, in order:
//   [0] x / canvas_width
//   [1] y / canvas_height
//   [2] vx / max_speed
//   [3] vy / max_speed
//   [4] angle / π
//   [5] sqrt(vx² + vy²) / max_speed
//   [6..] spatial cues for the configured mode:
//     Checkpoints — (dx, dy) to each of the next 3 checkpoints
//                   in track order, wrapping past the last one
//     Rays        — the first `count` forward ray clearances,
//                   padded with 1.0 (an open ray) when short
//
// The mode is explicit, tagged configuration. It is never
// inferred from which cue fields happen to be present in a
// frame — a frame carrying both cues is extracted under
// exactly one schema.

use serde::{Deserialize, Serialize};

use crate::domain::error::MalformedFrameError;
use crate::domain::telemetry::{CarState, TrackPoint};

/// Features every frame contributes regardless of mode:
/// position (2), velocity (2), heading (1), speed (1).
pub const BASE_FEATURES: usize = 6;

/// How many upcoming checkpoints feed the checkpoint cues.
pub const CHECKPOINTS_AHEAD: usize = 3;

// ─── FeatureMode ──────────────────────────────────────────────────────────────
/// Which spatial cues ride along with the base features.
/// Serialized into the snapshot, so a loaded engine always
/// extracts exactly the way its training run did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FeatureMode {
    /// Relative offsets to upcoming track checkpoints.
    /// `positions` is the full checkpoint table in track order.
    Checkpoints { positions: Vec<TrackPoint> },

    /// Leading forward ray-cast clearances.
    Rays { count: usize },
}

impl FeatureMode {
    pub fn name(&self) -> &'static str {
        match self {
            FeatureMode::Checkpoints { .. } => "checkpoints",
            FeatureMode::Rays { .. } => "rays",
        }
    }

    /// How many feature slots this mode's cues occupy.
    pub fn cue_len(&self) -> usize {
        match self {
            FeatureMode::Checkpoints { .. } => 2 * CHECKPOINTS_AHEAD,
            FeatureMode::Rays { count } => *count,
        }
    }
}

// ─── FeatureConfig ────────────────────────────────────────────────────────────
/// Normalization constants plus the feature mode. This struct is
/// data, not code: it is created once per training run and then
/// stored verbatim in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Canvas extent in pixels
    pub canvas_width:  f32,
    pub canvas_height: f32,

    /// Speed scale for velocity normalization, pixels per second
    pub max_speed: f32,

    pub mode: FeatureMode,
}

impl FeatureConfig {
    /// Length of every vector this config produces. Fixed for the
    /// lifetime of a trained model and recorded in its snapshot.
    pub fn feature_len(&self) -> usize {
        BASE_FEATURES + self.mode.cue_len()
    }

    /// Extract the feature vector for one state.
    ///
    /// Pure: identical state in, identical vector out. Fails only
    /// when the state lacks the cue field this config's mode
    /// requires.
    pub fn extract(&self, state: &CarState) -> Result<Vec<f32>, MalformedFrameError> {
        let mut features = Vec::with_capacity(self.feature_len());

        features.push(state.x / self.canvas_width);
        features.push(state.y / self.canvas_height);
        features.push(state.vx / self.max_speed);
        features.push(state.vy / self.max_speed);
        features.push(state.angle / std::f32::consts::PI);
        features.push(state.speed() / self.max_speed);

        match &self.mode {
            FeatureMode::Checkpoints { positions } => {
                let nearest = state.nearest_checkpoint.ok_or(MalformedFrameError {
                    mode:    "checkpoints",
                    missing: "nearestCheckpoint",
                })?;

                // Offsets to the next CHECKPOINTS_AHEAD checkpoints,
                // wrapping back to the start of the table.
                for i in 0..CHECKPOINTS_AHEAD {
                    let cp = positions[(nearest + i) % positions.len()];
                    features.push((cp.x - state.x) / self.canvas_width);
                    features.push((cp.y - state.y) / self.canvas_height);
                }
            }
            FeatureMode::Rays { count } => {
                let rays = state.ray_distances.as_ref().ok_or(MalformedFrameError {
                    mode:    "rays",
                    missing: "rayDistances",
                })?;

                // A missing trailing reading means nothing was in
                // range of that ray, so pad with 1.0, not 0.0 —
                // zero would fabricate a wall dead ahead.
                for i in 0..*count {
                    features.push(rays.get(i).copied().unwrap_or(1.0));
                }
            }
        }

        Ok(features)
    }
}
