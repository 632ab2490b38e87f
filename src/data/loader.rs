// ============================================================
// Layer 4 — Telemetry Loader
// ============================================================
// Loads telemetry recordings (.json) from a directory.
//
// Two recorder generations exist in the wild and both are
// accepted:
//
//   nested — {"playerPos": {"x":..,"y":..},
//             "playerVel": {"x":..,"y":..},
//             "playerAngle": ..,
//             "input": {"forward":..,"left":..,"right":..},
//             "nearestCheckpoint": ..}
//
//   flat   — {"playerX":.., "playerY":..,
//             "playerVelX":.., "playerVelY":..,
//             "playerAngle":..,
//             "inputUp":.., "inputLeft":.., "inputRight":..,
//             "playerRayDistances": [..]}
//
// A document is either a bare array of frames or an object
// wrapping a "frames" array. Every accepted shape converges on
// the one domain TelemetryFrame, so nothing downstream knows
// which recorder produced a frame.
//
// Files are visited in sorted path order so the corpus — and
// therefore any seeded shuffle over it — is reproducible.
//
// Reference: Rust Book §9 (Error Handling)
//            serde documentation (untagged enums)

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};

use crate::domain::telemetry::{CarState, InputFlags, TelemetryFrame};
use crate::domain::traits::TelemetrySource;

/// Loads all .json telemetry files from a given directory.
/// Implements the TelemetrySource trait from Layer 3.
pub struct JsonTelemetryLoader {
    /// Path to the directory containing telemetry recordings
    dir: String,
}

impl JsonTelemetryLoader {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: dir.into() }
    }
}

impl TelemetrySource for JsonTelemetryLoader {
    fn load_all(&self) -> Result<Vec<TelemetryFrame>> {
        let dir = Path::new(&self.dir);

        // A missing directory yields an empty corpus rather than an
        // I/O error; emptiness is judged once, by the corpus.
        if !dir.exists() {
            tracing::warn!(
                "Telemetry directory '{}' does not exist — returning empty corpus",
                self.dir
            );
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("Cannot read directory '{}'", self.dir))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();

        // Directory iteration order is filesystem-dependent; sort so
        // source order is stable across machines and runs.
        paths.sort();

        let mut frames = Vec::new();
        for path in &paths {
            match load_single_file(path) {
                Ok(file_frames) => {
                    tracing::debug!("Loaded {}: {} frames", path.display(), file_frames.len());
                    frames.extend(file_frames);
                }
                // Log a warning but continue — one bad recording must
                // not abort the whole corpus load.
                Err(e) => {
                    tracing::warn!("Skipping '{}': {}", path.display(), e);
                }
            }
        }

        tracing::info!("Loaded {} frames from {} files", frames.len(), paths.len());
        Ok(frames)
    }
}

// ─── Wire Shapes ──────────────────────────────────────────────────────────────
// The raw serde shapes live here, private to the loader. They
// exist only long enough to be converted into TelemetryFrame.

/// A telemetry document: a bare frame array, or `{"frames": [..]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum TelemetryDocument {
    Frames(Vec<RawFrame>),
    Wrapped { frames: Vec<RawFrame> },
}

impl TelemetryDocument {
    fn into_frames(self) -> Vec<RawFrame> {
        match self {
            TelemetryDocument::Frames(frames) => frames,
            TelemetryDocument::Wrapped { frames } => frames,
        }
    }
}

#[derive(Deserialize)]
struct RawVec2 {
    x: f32,
    y: f32,
}

/// One recorded frame in either recorder generation. Untagged:
/// the nested shape requires `playerPos`/`input`, which the flat
/// shape never carries, so the variants cannot collide.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawFrame {
    Nested {
        #[serde(rename = "playerPos")]
        pos: RawVec2,
        #[serde(rename = "playerVel")]
        vel: RawVec2,
        #[serde(rename = "playerAngle")]
        angle: f32,
        input: InputFlags,
        #[serde(rename = "nearestCheckpoint", default)]
        nearest_checkpoint: Option<usize>,
    },
    Flat {
        #[serde(rename = "playerX")]
        x: f32,
        #[serde(rename = "playerY")]
        y: f32,
        #[serde(rename = "playerVelX")]
        vx: f32,
        #[serde(rename = "playerVelY")]
        vy: f32,
        #[serde(rename = "playerAngle")]
        angle: f32,
        #[serde(rename = "inputUp", default)]
        input_up: bool,
        #[serde(rename = "inputLeft", default)]
        input_left: bool,
        #[serde(rename = "inputRight", default)]
        input_right: bool,
        #[serde(rename = "playerRayDistances", default)]
        ray_distances: Option<Vec<f32>>,
    },
}

impl From<RawFrame> for TelemetryFrame {
    fn from(raw: RawFrame) -> Self {
        match raw {
            RawFrame::Nested { pos, vel, angle, input, nearest_checkpoint } => TelemetryFrame {
                state: CarState {
                    x: pos.x,
                    y: pos.y,
                    vx: vel.x,
                    vy: vel.y,
                    angle,
                    ray_distances: None,
                    nearest_checkpoint,
                },
                input,
            },
            RawFrame::Flat { x, y, vx, vy, angle, input_up, input_left, input_right, ray_distances } => {
                TelemetryFrame {
                    state: CarState {
                        x,
                        y,
                        vx,
                        vy,
                        angle,
                        ray_distances,
                        nearest_checkpoint: None,
                    },
                    input: InputFlags {
                        forward: input_up,
                        left:    input_left,
                        right:   input_right,
                    },
                }
            }
        }
    }
}

/// Parse a single telemetry file into domain frames.
fn load_single_file(path: &Path) -> Result<Vec<TelemetryFrame>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;

    let document: TelemetryDocument = serde_json::from_str(&text)
        .with_context(|| format!("Cannot parse '{}'", path.display()))?;

    Ok(document.into_frames().into_iter().map(TelemetryFrame::from).collect())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut f = fs::File::create(dir.join(name)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    const NESTED: &str = r#"[{
        "playerPos": {"x": 100.0, "y": 200.0},
        "playerVel": {"x": 50.0, "y": -10.0},
        "playerAngle": 0.5,
        "input": {"forward": true, "left": true, "right": false},
        "nearestCheckpoint": 2
    }]"#;

    const FLAT_WRAPPED: &str = r#"{"frames": [{
        "playerX": 300.0, "playerY": 400.0,
        "playerVelX": 0.0, "playerVelY": 0.0,
        "playerAngle": -1.0,
        "inputUp": true, "inputLeft": false, "inputRight": true,
        "playerRayDistances": [1.0, 0.5, 0.25]
    }]}"#;

    #[test]
    fn loads_both_recorder_shapes_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "b_flat.json", FLAT_WRAPPED);
        write_file(dir.path(), "a_nested.json", NESTED);

        let loader = JsonTelemetryLoader::new(dir.path().to_str().unwrap());
        let frames = loader.load_all().unwrap();

        assert_eq!(frames.len(), 2);
        // a_nested.json sorts first regardless of creation order
        assert_eq!(frames[0].state.x, 100.0);
        assert_eq!(frames[0].state.nearest_checkpoint, Some(2));
        assert!(frames[0].input.forward && frames[0].input.left);
        // flat shape converges on the same domain type
        assert_eq!(frames[1].state.ray_distances.as_deref(), Some(&[1.0, 0.5, 0.25][..]));
        assert!(frames[1].input.right);
    }

    #[test]
    fn unreadable_file_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "good.json", NESTED);
        write_file(dir.path(), "bad.json", "this is not json");

        let loader = JsonTelemetryLoader::new(dir.path().to_str().unwrap());
        let frames = loader.load_all().unwrap();
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn missing_directory_yields_empty_corpus() {
        let loader = JsonTelemetryLoader::new("no/such/directory");
        assert!(loader.load_all().unwrap().is_empty());
    }

    #[test]
    fn non_json_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "notes.txt", "not telemetry");
        let loader = JsonTelemetryLoader::new(dir.path().to_str().unwrap());
        assert!(loader.load_all().unwrap().is_empty());
    }
}
