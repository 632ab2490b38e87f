// ============================================================
// Layer 4 — Track Checkpoint Tables
// ============================================================
// The checkpoint feature mode needs a table of track waypoints.
// It comes from one of two places:
//
//   1. A track file: a JSON array of {x, y} objects, written by
//      hand or exported by the game's track editor.
//
//   2. Auto-detection: seeded k-means over the player positions
//      recorded in the corpus. Where a player spends time is
//      where the track is, so cluster centers make serviceable
//      waypoints when no real table exists.
//
// Auto-detection is deterministic for a given seed: centroids
// are initialized from sampled positions, refined for a fixed
// number of iterations, and a cluster that loses all members
// keeps its previous centroid rather than being re-seeded.

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::{fs, path::Path};

use crate::domain::telemetry::{TelemetryFrame, TrackPoint};

/// Refinement budget for auto-detection.
const KMEANS_ITERATIONS: usize = 20;

/// Only every n-th frame feeds the clustering — consecutive
/// frames are near-duplicates and add nothing but work.
const POSITION_STRIDE: usize = 10;

/// Load and validate a checkpoint table from a JSON track file.
pub fn load_track_file(path: impl AsRef<Path>) -> Result<Vec<TrackPoint>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read track file '{}'", path.display()))?;

    let points: Vec<TrackPoint> = serde_json::from_str(&text)
        .with_context(|| format!("Cannot parse track file '{}'", path.display()))?;

    if points.is_empty() {
        bail!("Track file '{}' contains no checkpoints", path.display());
    }
    if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        bail!("Track file '{}' contains non-finite coordinates", path.display());
    }

    tracing::info!("Loaded {} checkpoints from '{}'", points.len(), path.display());
    Ok(points)
}

/// Cluster recorded player positions into `count` checkpoints.
///
/// Falls back to a rectangular default table when the corpus
/// holds too few distinct positions to cluster.
pub fn auto_detect_checkpoints(
    frames: &[TelemetryFrame],
    count: usize,
    seed: u64,
) -> Vec<TrackPoint> {
    let positions: Vec<TrackPoint> = frames
        .iter()
        .step_by(POSITION_STRIDE)
        .map(|f| TrackPoint { x: f.state.x, y: f.state.y })
        .collect();

    if positions.len() < count {
        tracing::warn!(
            "Only {} sampled positions for {} checkpoints — using the default table",
            positions.len(),
            count
        );
        return default_checkpoints();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids: Vec<TrackPoint> = rand::seq::index::sample(&mut rng, positions.len(), count)
        .iter()
        .map(|i| positions[i])
        .collect();

    for _ in 0..KMEANS_ITERATIONS {
        // Assign every position to its nearest centroid
        let mut sums = vec![(0.0f64, 0.0f64, 0usize); count];
        for p in &positions {
            let nearest = nearest_centroid(&centroids, p);
            sums[nearest].0 += p.x as f64;
            sums[nearest].1 += p.y as f64;
            sums[nearest].2 += 1;
        }

        // Move centroids to their cluster means. An empty cluster
        // keeps its previous centroid.
        for (centroid, (sx, sy, n)) in centroids.iter_mut().zip(sums) {
            if n > 0 {
                centroid.x = (sx / n as f64) as f32;
                centroid.y = (sy / n as f64) as f32;
            }
        }
    }

    for (i, cp) in centroids.iter().enumerate() {
        tracing::info!("Checkpoint {}: ({:.1}, {:.1})", i, cp.x, cp.y);
    }
    centroids
}

fn nearest_centroid(centroids: &[TrackPoint], p: &TrackPoint) -> usize {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let dist = (c.x - p.x).powi(2) + (c.y - p.y).powi(2);
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best
}

/// A rectangle of waypoints roughly matching the default canvas.
fn default_checkpoints() -> Vec<TrackPoint> {
    vec![
        TrackPoint { x: 200.0, y: 300.0 },
        TrackPoint { x: 800.0, y: 300.0 },
        TrackPoint { x: 800.0, y: 600.0 },
        TrackPoint { x: 200.0, y: 600.0 },
    ]
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::telemetry::{CarState, InputFlags};
    use std::io::Write;

    fn frame_at(x: f32, y: f32) -> TelemetryFrame {
        TelemetryFrame {
            state: CarState {
                x,
                y,
                vx: 0.0,
                vy: 0.0,
                angle: 0.0,
                ray_distances: None,
                nearest_checkpoint: None,
            },
            input: InputFlags::default(),
        }
    }

    #[test]
    fn track_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.json");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(br#"[{"x": 10.0, "y": 20.0}, {"x": 30.0, "y": 40.0}]"#)
            .unwrap();

        let points = load_track_file(&path).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1], TrackPoint { x: 30.0, y: 40.0 });
    }

    #[test]
    fn empty_track_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.json");
        fs::write(&path, "[]").unwrap();
        assert!(load_track_file(&path).is_err());
    }

    #[test]
    fn detection_is_deterministic_and_bounded() {
        // Four tight clusters of positions, one per corner
        let corners = [(200.0, 300.0), (800.0, 300.0), (800.0, 600.0), (200.0, 600.0)];
        let mut frames = Vec::new();
        for step in 0..250 {
            let (cx, cy) = corners[step % 4];
            let jitter = (step % 7) as f32;
            frames.push(frame_at(cx + jitter, cy - jitter));
        }

        let a = auto_detect_checkpoints(&frames, 4, 42);
        let b = auto_detect_checkpoints(&frames, 4, 42);
        assert_eq!(a, b);
        assert_eq!(a.len(), 4);
        for cp in &a {
            assert!(cp.x.is_finite() && cp.y.is_finite());
            assert!(cp.x >= 0.0 && cp.x <= 1024.0);
            assert!(cp.y >= 0.0 && cp.y <= 768.0);
        }
    }

    #[test]
    fn too_few_positions_fall_back_to_defaults() {
        let frames = vec![frame_at(1.0, 2.0)];
        let detected = auto_detect_checkpoints(&frames, 4, 42);
        assert_eq!(detected, default_checkpoints());
    }
}
