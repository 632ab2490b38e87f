// ============================================================
// Layer 5 — Policy Network
// ============================================================
// Shared fully-connected trunk (ReLU + dropout) feeding two
// independent heads:
//   steering → tanh    → [-1, 1]
//   throttle → sigmoid → [0, 1]
//
// Reference: Burn Book §3 (Building Blocks)

use burn::{
    nn::{
        loss::{BinaryCrossEntropyLossConfig, MseLoss, Reduction},
        Dropout, DropoutConfig, Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation,
};

/// Hidden width of each output head.
const HEAD_HIDDEN: usize = 16;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct PolicyNetConfig {
    /// Feature vector length — fixed by the feature config
    pub input_size: usize,

    /// Trunk layer widths, widest first (e.g. 128→64→32)
    pub hidden_sizes: Vec<usize>,

    #[config(default = 0.2)]
    pub dropout: f64,
}

impl PolicyNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> PolicyNetwork<B> {
        let mut trunk = Vec::with_capacity(self.hidden_sizes.len());
        let mut prev = self.input_size;
        for &width in &self.hidden_sizes {
            trunk.push(LinearConfig::new(prev, width).init(device));
            prev = width;
        }

        PolicyNetwork {
            trunk,
            dropout: DropoutConfig::new(self.dropout).init(),
            steering_hidden: LinearConfig::new(prev, HEAD_HIDDEN).init(device),
            steering_out:    LinearConfig::new(HEAD_HIDDEN, 1).init(device),
            throttle_hidden: LinearConfig::new(prev, HEAD_HIDDEN).init(device),
            throttle_out:    LinearConfig::new(HEAD_HIDDEN, 1).init(device),
        }
    }
}

/// The control policy: a shared fully-connected trunk feeding two
/// independent heads. The steering head saturates through tanh to
/// [-1, 1]; the throttle head through sigmoid to [0, 1]. The
/// ranges are properties of the architecture, not of post-hoc
/// clamping — even an untrained network respects them.
///
/// Dropout sits after every trunk layer and is only live on an
/// autodiff backend; on the plain inference backend it is
/// structurally a no-op, so there is no train/eval flag to forget.
#[derive(Module, Debug)]
pub struct PolicyNetwork<B: Backend> {
    pub trunk:           Vec<Linear<B>>,
    pub dropout:         Dropout,
    pub steering_hidden: Linear<B>,
    pub steering_out:    Linear<B>,
    pub throttle_hidden: Linear<B>,
    pub throttle_out:    Linear<B>,
}

pub struct PolicyOutput<B: Backend> {
    /// Steering in [-1, 1] — shape: [batch, 1]
    pub steering: Tensor<B, 2>,
    /// Throttle in [0, 1] — shape: [batch, 1]
    pub throttle: Tensor<B, 2>,
}

/// Per-head loss terms plus their sum, the training objective.
pub struct PolicyLosses<B: Backend> {
    pub total:    Tensor<B, 1>,
    pub steering: Tensor<B, 1>,
    pub throttle: Tensor<B, 1>,
}

impl<B: Backend> PolicyNetwork<B> {
    /// Trunk and heads up to the saturation point: bounded
    /// steering, raw throttle logits. The loss path needs the
    /// logits — feeding an exactly-saturated sigmoid output into
    /// a probability-space BCE turns `log(1-p)` into `log(0)`.
    fn forward_raw(&self, features: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let mut x = features;
        for layer in &self.trunk {
            x = self.dropout.forward(activation::relu(layer.forward(x)));
        }

        let steering = self
            .steering_out
            .forward(activation::relu(self.steering_hidden.forward(x.clone())))
            .tanh();
        let throttle_logits = self
            .throttle_out
            .forward(activation::relu(self.throttle_hidden.forward(x)));

        (steering, throttle_logits)
    }

    /// features: [batch, input_size] → steering, throttle: [batch, 1]
    pub fn forward(&self, features: Tensor<B, 2>) -> PolicyOutput<B> {
        let (steering, throttle_logits) = self.forward_raw(features);
        PolicyOutput { steering, throttle: activation::sigmoid(throttle_logits) }
    }

    /// Forward pass plus both supervised losses:
    /// mean-squared error on steering, binary cross-entropy on
    /// throttle. The objective is their plain sum.
    ///
    /// BCE runs in logit space, which stays finite even when the
    /// sigmoid would round to exactly 0 or 1 — on a corpus where
    /// the forward key is always held, the throttle head saturates
    /// within a few epochs.
    pub fn forward_loss(
        &self,
        features:         Tensor<B, 2>,
        steering_targets: Tensor<B, 2>,
        throttle_targets: Tensor<B, 1, Int>,
    ) -> (PolicyLosses<B>, PolicyOutput<B>) {
        let (steering, throttle_logits) = self.forward_raw(features);

        let steering_loss =
            MseLoss::new().forward(steering.clone(), steering_targets, Reduction::Mean);

        let bce = BinaryCrossEntropyLossConfig::new()
            .with_logits(true)
            .init(&throttle_logits.device());
        let throttle_loss =
            bce.forward(throttle_logits.clone().flatten::<1>(0, 1), throttle_targets);

        let losses = PolicyLosses {
            total:    steering_loss.clone() + throttle_loss.clone(),
            steering: steering_loss,
            throttle: throttle_loss,
        };
        let output = PolicyOutput { steering, throttle: activation::sigmoid(throttle_logits) };
        (losses, output)
    }
}
