// ============================================================
// Layer 2 — DriveUseCase
// ============================================================
// Smoke-tests a trained snapshot against a fixed table of
// driving situations and prints what the policy would do in
// each. This is the quickest way to tell a usable model from a
// degenerate one before wiring it into a live game: a policy
// that floors the throttle into a wall, or steers hard on an
// open straight, needs more data, not a server.
//
// Every scenario carries both cue families (ray distances and a
// nearest-checkpoint index) so the same table works against a
// snapshot trained in either feature mode.

use anyhow::Result;

use crate::domain::action::Action;
use crate::domain::telemetry::CarState;
use crate::domain::traits::ActionPolicy;
use crate::infra::snapshot::SnapshotStore;
use crate::ml::inferencer::InferenceEngine;

/// Interpretation thresholds: above these, a prediction reads as
/// a deliberate turn / full throttle rather than noise.
const TURN_THRESHOLD: f32 = 0.3;
const FULL_THROTTLE: f32 = 0.7;
const MODERATE_THROTTLE: f32 = 0.3;

// ─── Scenario Table ───────────────────────────────────────────────────────────
struct Scenario {
    label: &'static str,
    state: CarState,
}

fn scenarios() -> Vec<Scenario> {
    let state = |x, y, vx, vy, angle, rays: &[f32]| CarState {
        x,
        y,
        vx,
        vy,
        angle,
        ray_distances: Some(rays.to_vec()),
        nearest_checkpoint: Some(0),
    };

    vec![
        Scenario {
            label: "center, straight, cruising",
            state: state(512.0, 384.0, 200.0, 0.0, 0.0, &[1.0, 1.0, 1.0, 1.0, 1.0]),
        },
        Scenario {
            label: "wall close on the left",
            state: state(150.0, 384.0, 150.0, 0.0, 0.0, &[0.15, 0.5, 1.0, 1.0, 1.0]),
        },
        Scenario {
            label: "wall close on the right",
            state: state(900.0, 384.0, 150.0, 0.0, 0.0, &[1.0, 1.0, 1.0, 0.5, 0.15]),
        },
        Scenario {
            label: "standing start",
            state: state(512.0, 600.0, 0.0, 0.0, 0.0, &[1.0, 1.0, 1.0, 1.0, 1.0]),
        },
        Scenario {
            label: "fast into a corner",
            state: state(800.0, 200.0, 250.0, 80.0, 0.8, &[0.6, 0.3, 0.2, 0.4, 0.9]),
        },
    ]
}

// ─── DriveUseCase ─────────────────────────────────────────────────────────────
pub struct DriveUseCase {
    snapshot_dir: String,
    stem:         String,
}

impl DriveUseCase {
    pub fn new(snapshot_dir: String, stem: String) -> Self {
        Self { snapshot_dir, stem }
    }

    pub fn execute(&self) -> Result<()> {
        let store = SnapshotStore::new(&self.snapshot_dir)?;
        let engine = InferenceEngine::from_snapshot(&store, &self.stem)?;

        println!(
            "Policy check — '{}' snapshot from '{}':",
            self.stem, self.snapshot_dir
        );
        println!("{:<30} {:>9} {:>9}   verdict", "scenario", "steering", "throttle");

        for scenario in scenarios() {
            match engine.predict(&scenario.state) {
                Ok(action) => println!(
                    "{:<30} {:>+9.3} {:>9.3}   {}",
                    scenario.label,
                    action.steering,
                    action.throttle,
                    interpret(&action)
                ),
                Err(e) => tracing::warn!("Scenario '{}' skipped: {}", scenario.label, e),
            }
        }

        Ok(())
    }
}

/// Human-readable reading of one prediction.
fn interpret(action: &Action) -> String {
    let steering = if action.steering < -TURN_THRESHOLD {
        "turn left"
    } else if action.steering > TURN_THRESHOLD {
        "turn right"
    } else {
        "hold straight"
    };

    let throttle = if action.throttle > FULL_THROTTLE {
        "full throttle"
    } else if action.throttle > MODERATE_THROTTLE {
        "moderate throttle"
    } else {
        "slow"
    };

    format!("{steering}, {throttle}")
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpretation_matches_thresholds() {
        let read = |steering, throttle| interpret(&Action { steering, throttle });
        assert_eq!(read(-0.8, 0.95), "turn left, full throttle");
        assert_eq!(read(0.5, 0.5), "turn right, moderate throttle");
        assert_eq!(read(0.1, 0.1), "hold straight, slow");
    }

    #[test]
    fn every_scenario_carries_both_cue_families() {
        // The table must work for either feature mode, so no
        // scenario may omit a cue.
        for scenario in scenarios() {
            assert!(scenario.state.ray_distances.is_some(), "{}", scenario.label);
            assert!(scenario.state.nearest_checkpoint.is_some(), "{}", scenario.label);
        }
    }
}
