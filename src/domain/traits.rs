// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// By programming against traits instead of concrete types we
// can swap implementations without changing the code that uses
// them. For example:
//   - JsonTelemetryLoader implements TelemetrySource
//   - a future replay-capture loader could implement it too
//   - the application layer only sees TelemetrySource
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)
//            Rust Book §17 (Object Oriented Patterns)

use anyhow::Result;

use crate::domain::action::Action;
use crate::domain::error::MalformedFrameError;
use crate::domain::telemetry::{CarState, TelemetryFrame};

// ─── TelemetrySource ──────────────────────────────────────────────────────────
/// Any component that can produce recorded telemetry frames.
///
/// Implementations:
///   - JsonTelemetryLoader → reads a directory of .json recordings
pub trait TelemetrySource {
    /// Load every available frame, in source order then
    /// within-source order. Unreadable sources are skipped, so an
    /// empty Vec is a legal (if useless) result; emptiness is the
    /// corpus constructor's problem, not the loader's.
    fn load_all(&self) -> Result<Vec<TelemetryFrame>>;
}

// ─── ActionPolicy ─────────────────────────────────────────────────────────────
/// Any component that can map a car state to a control decision.
///
/// Implementations:
///   - InferenceEngine → runs the trained network
///
/// The serving loop and the scenario runner depend on this trait,
/// which keeps them testable with a canned policy.
pub trait ActionPolicy {
    /// Decide steering and throttle for one state. Fails only when
    /// the state lacks the cues the policy's feature mode needs.
    fn predict(&self, state: &CarState) -> Result<Action, MalformedFrameError>;
}
