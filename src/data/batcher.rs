// ============================================================
// Layer 4 — Policy Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<PolicySample>
// into tensors for the model forward pass.
//
// How batching works here:
//   Input:  Vec of N PolicySamples, each with F features
//   Output: PolicyBatch with a feature tensor of shape [N, F]
//
//   We flatten all feature vectors into one long Vec, then
//   reshape: [s1_f1, .., s1_fF, s2_f1, .., sN_fF] → [N, F]
//
// Target shapes follow the two losses:
//   - steering targets stay float [N, 1] for mean-squared error
//   - throttle targets become int [N] (0/1 classes) for binary
//     cross-entropy
//
// Why is flattening safe here?
//   Every sample in one corpus has the same feature length —
//   the feature config fixes it for the lifetime of the model.
//
// Reference: Burn Book §4 (Batcher)

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::corpus::PolicySample;

// ─── PolicyBatch ──────────────────────────────────────────────────────────────
/// A batch of samples ready for the model forward pass.
/// All tensors have batch_size as their first dimension.
///
/// B is the Burn Backend — generic so the same batcher serves
/// the autodiff training backend and the plain validation one.
#[derive(Debug, Clone)]
pub struct PolicyBatch<B: Backend> {
    /// Feature vectors — shape: [batch_size, feature_len]
    pub features: Tensor<B, 2>,

    /// Steering labels in {-1, 0, 1} — shape: [batch_size, 1]
    pub steering_targets: Tensor<B, 2>,

    /// Throttle labels in {0, 1} — shape: [batch_size]
    pub throttle_targets: Tensor<B, 1, Int>,
}

// ─── PolicyBatcher ────────────────────────────────────────────────────────────
/// Holds the target device so tensors are created in the right
/// place.
#[derive(Clone, Debug)]
pub struct PolicyBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> PolicyBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<PolicySample, PolicyBatch<B>> for PolicyBatcher<B> {
    fn batch(&self, items: Vec<PolicySample>) -> PolicyBatch<B> {
        let batch_size = items.len();
        let feature_len = items[0].features.len();

        let features_flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.features.iter().copied())
            .collect();

        let steering: Vec<f32> = items.iter().map(|s| s.steering).collect();

        // Throttle labels are exact 0/1 values, so the cast to an
        // integer class index is lossless.
        let throttle: Vec<i32> = items.iter().map(|s| s.throttle as i32).collect();

        let features = Tensor::<B, 1>::from_floats(features_flat.as_slice(), &self.device)
            .reshape([batch_size, feature_len]);

        let steering_targets = Tensor::<B, 1>::from_floats(steering.as_slice(), &self.device)
            .reshape([batch_size, 1]);

        let throttle_targets =
            Tensor::<B, 1, Int>::from_ints(throttle.as_slice(), &self.device);

        PolicyBatch { features, steering_targets, throttle_targets }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    fn sample(features: Vec<f32>, steering: f32, throttle: f32) -> PolicySample {
        PolicySample { features, steering, throttle }
    }

    #[test]
    fn batch_has_expected_shapes_and_values() {
        let batcher = PolicyBatcher::<TestBackend>::new(Default::default());
        let batch = batcher.batch(vec![
            sample(vec![0.1, 0.2, 0.3], -1.0, 1.0),
            sample(vec![0.4, 0.5, 0.6], 0.0, 0.0),
        ]);

        assert_eq!(batch.features.dims(), [2, 3]);
        assert_eq!(batch.steering_targets.dims(), [2, 1]);
        assert_eq!(batch.throttle_targets.dims(), [2]);

        let feats: Vec<f32> = batch.features.into_data().to_vec().unwrap();
        assert_eq!(feats, vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);

        let throttle: Vec<i64> = batch.throttle_targets.into_data().to_vec().unwrap();
        assert_eq!(throttle, vec![1, 0]);
    }
}
