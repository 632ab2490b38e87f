// ============================================================
// Layer 3 - Telemetry Domain Types
// ============================================================
// A telemetry recording is a sequence of frames, each one a
// sampled instant of gameplay: where the car was, how it was
// moving, and which keys the player was holding.
//
// Two kinds of spatial cue can ride along with a frame:
//   - the index of the nearest track checkpoint, or
//   - a set of forward ray-cast distances (normalized, 1.0
//     meaning "nothing in range").
// Which one the pipeline consumes is decided by the feature
// mode in the data layer, never guessed from the frame itself.
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};

/// The kinematic state of the car at one instant.
///
/// This is the exact shape the inference server receives as JSON
/// (`{"x": .., "y": .., "vx": .., "vy": .., "angle": ..,
/// "rayDistances": [..]}`), and the shape every recorded frame is
/// normalized into. Training and serving share it, so feature
/// extraction runs on identical input in both paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarState {
    /// Position in canvas pixels, origin top-left
    pub x: f32,
    pub y: f32,

    /// Velocity in pixels per second
    pub vx: f32,
    pub vy: f32,

    /// Heading in radians, 0 pointing along +x
    pub angle: f32,

    /// Forward ray-cast clearances in [0,1], nearest ray first.
    /// Absent when the recorder does not ray-cast.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ray_distances: Option<Vec<f32>>,

    /// Index into the track's checkpoint table of the checkpoint
    /// closest to the car. Absent when the recorder does not track
    /// checkpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nearest_checkpoint: Option<usize>,
}

impl CarState {
    /// Speed magnitude in pixels per second.
    pub fn speed(&self) -> f32 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }
}

/// The player's held control keys at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFlags {
    #[serde(default)]
    pub forward: bool,
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
}

/// One recorded instant of gameplay: state plus the inputs that
/// were held while in that state. Immutable once read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    pub state: CarState,
    pub input: InputFlags,
}

/// A fixed track waypoint, used as a spatial reference feature.
/// Not to be confused with a model checkpoint (snapshot).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub x: f32,
    pub y: f32,
}
