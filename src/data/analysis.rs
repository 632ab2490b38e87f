// ============================================================
// Layer 4 — Corpus Analysis
// ============================================================
// Computes label statistics over a corpus before training and
// flags degenerate data. A model trained on 95% straight-line
// driving will not learn to corner, and that is much cheaper to
// discover here than after fifty epochs.
//
// Warnings are advisory: they go to the log and never stop a
// run. The statistics block goes to stdout, where the operator
// is watching.

use crate::data::corpus::TelemetryCorpus;

/// Degenerate-corpus thresholds.
const MOSTLY_STRAIGHT: f64 = 0.8;
const ALWAYS_THROTTLE: f64 = 0.95;
const TURN_IMBALANCE: f64 = 0.3;

/// At most this many frames feed the statistics; beyond that a
/// strided sample is representative enough.
const MAX_SAMPLED: usize = 1000;

// ─── LabelStats ───────────────────────────────────────────────────────────────
/// Aggregate label statistics for one corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelStats {
    pub steering_mean: f64,
    pub steering_std:  f64,
    pub steering_min:  f64,
    pub steering_max:  f64,

    /// Fractions of frames turning left / going straight / turning right
    pub left_fraction:     f64,
    pub straight_fraction: f64,
    pub right_fraction:    f64,

    pub throttle_mean: f64,
    /// Fraction of frames with the forward key held
    pub full_throttle_fraction: f64,
    /// Fraction of frames coasting (no forward key)
    pub coasting_fraction: f64,
}

/// Compute label statistics over (a strided sample of) the corpus.
pub fn label_stats(corpus: &TelemetryCorpus) -> LabelStats {
    let stride = (corpus.len() / MAX_SAMPLED).max(1);

    let mut steering = Vec::new();
    let mut throttle = Vec::new();
    for frame in corpus.frames().iter().step_by(stride) {
        steering.push(frame.input.steering_label() as f64);
        throttle.push(frame.input.throttle_label() as f64);
    }

    let n = steering.len() as f64;
    let steering_mean = steering.iter().sum::<f64>() / n;
    let variance = steering
        .iter()
        .map(|s| (s - steering_mean).powi(2))
        .sum::<f64>()
        / n;

    let count = |pred: &dyn Fn(f64) -> bool, values: &[f64]| {
        values.iter().filter(|v| pred(**v)).count() as f64 / n
    };

    LabelStats {
        steering_mean,
        steering_std: variance.sqrt(),
        steering_min: steering.iter().copied().fold(f64::INFINITY, f64::min),
        steering_max: steering.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        left_fraction:     count(&|s| s < -0.5, &steering),
        straight_fraction: count(&|s| s.abs() < 0.5, &steering),
        right_fraction:    count(&|s| s > 0.5, &steering),
        throttle_mean: throttle.iter().sum::<f64>() / n,
        full_throttle_fraction: count(&|t| t > 0.9, &throttle),
        coasting_fraction:      count(&|t| t < 0.1, &throttle),
    }
}

/// Print the statistics block and log data-quality warnings.
pub fn analyze(corpus: &TelemetryCorpus) -> LabelStats {
    let stats = label_stats(corpus);

    println!("Corpus analysis ({} frames):", corpus.len());
    println!(
        "  steering: mean={:+.3} std={:.3} min={:+.1} max={:+.1}",
        stats.steering_mean, stats.steering_std, stats.steering_min, stats.steering_max,
    );
    println!(
        "  turns:    left={:.1}% straight={:.1}% right={:.1}%",
        stats.left_fraction * 100.0,
        stats.straight_fraction * 100.0,
        stats.right_fraction * 100.0,
    );
    println!(
        "  throttle: mean={:.3} full={:.1}% coasting={:.1}%",
        stats.throttle_mean,
        stats.full_throttle_fraction * 100.0,
        stats.coasting_fraction * 100.0,
    );

    if stats.straight_fraction > MOSTLY_STRAIGHT {
        tracing::warn!(
            "Corpus is {:.0}% straight driving — the policy may not learn to turn; record more corners",
            stats.straight_fraction * 100.0
        );
    }
    if stats.full_throttle_fraction > ALWAYS_THROTTLE {
        tracing::warn!(
            "Forward key held in {:.0}% of frames — the policy may not learn speed control",
            stats.full_throttle_fraction * 100.0
        );
    }
    if (stats.left_fraction - stats.right_fraction).abs() > TURN_IMBALANCE {
        tracing::warn!(
            "Unbalanced turning: {:.0}% left vs {:.0}% right — record laps in both directions",
            stats.left_fraction * 100.0,
            stats.right_fraction * 100.0
        );
    }

    stats
}
