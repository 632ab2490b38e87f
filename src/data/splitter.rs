// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Shuffles corpus indices and splits them into two sets:
//   - Training set:   used to update model weights
//   - Validation set: used to measure performance on unseen data
//
// Why split on indices instead of samples?
//   The corpus computes samples lazily, so the split only needs
//   to decide which index goes where. The views hand indices
//   back to the corpus at access time.
//
// Why a seeded RNG instead of thread_rng?
//   The same corpus, ratio and seed must always produce the
//   same partition — otherwise a re-run trains on a different
//   slice of the data and results stop being comparable.
//
// The partition is exact: every index appears in exactly one
// side, with round(fraction * N) indices on the training side.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom,
// the standard unbiased shuffle algorithm.
//
// Reference: rand crate documentation

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Shuffle the indices 0..total with the given seed and split
/// them into (train, validation).
///
/// # Arguments
/// * `total`          - Corpus size N
/// * `train_fraction` - Proportion for training, e.g. 0.8 = 80%
/// * `seed`           - Shuffle seed; same seed, same partition
pub fn split_indices(
    total: usize,
    train_fraction: f64,
    seed: u64,
) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..total).collect();

    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    // e.g. 100 indices * 0.8 = 80 → first 80 are training.
    // Clamp to the valid range to avoid panics on tiny corpora.
    let split_at = ((total as f64) * train_fraction).round() as usize;
    let split_at = split_at.min(total);

    let val = indices.split_off(split_at);

    tracing::debug!(
        "Corpus split: {} training, {} validation",
        indices.len(),
        val.len(),
    );

    (indices, val)
}
