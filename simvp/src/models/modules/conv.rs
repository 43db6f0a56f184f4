//! # Strided Convolution Blocks
//!
//! `BasicConv2d` is a single (optionally transposed) convolution followed by an
//! optional `GroupNorm` + `LeakyRelu` pair. `ConvSc` fixes it to the 3x3 kernel used by
//! every spatial encoder and decoder stage.

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig},
        GroupNorm, GroupNormConfig, LeakyRelu, LeakyReluConfig, PaddingConfig2d,
    },
    prelude::*,
};

/// Negative slope shared by every `LeakyRelu` in the network.
pub const LEAKY_RELU_SLOPE: f64 = 0.2;

/// The convolution chosen at construction time.
#[derive(Module, Debug)]
pub enum ConvLayer<B: Backend> {
    /// Regular (downsampling or same-size) convolution
    Forward(Conv2d<B>),
    /// Transposed (upsampling) convolution
    Transposed(ConvTranspose2d<B>),
}

impl<B: Backend> ConvLayer<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            Self::Forward(conv) => conv.forward(x),
            Self::Transposed(conv) => conv.forward(x),
        }
    }

    /// Whether this is a transposed (upsampling) convolution.
    pub fn is_transposed(&self) -> bool {
        matches!(self, Self::Transposed(_))
    }
}

/// Configuration for the `BasicConv2d` module.
#[derive(Config, Debug)]
pub struct BasicConv2dConfig {
    /// Input and output channels.
    pub channels: [usize; 2],
    pub kernel_size: usize,
    #[config(default = "1")]
    pub stride: usize,
    #[config(default = "0")]
    pub padding: usize,
    /// Build a transposed convolution with `stride / 2` output padding.
    #[config(default = "false")]
    pub transpose: bool,
    /// Append `GroupNorm(2, out)` and `LeakyRelu(0.2)`.
    #[config(default = "false")]
    pub act_norm: bool,
}

impl BasicConv2dConfig {
    /// Initializes a new `BasicConv2d` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> BasicConv2d<B> {
        let [_, channels_out] = self.channels;
        let kernel = [self.kernel_size, self.kernel_size];
        let stride = [self.stride, self.stride];

        let conv = if self.transpose {
            let padding_out = self.stride / 2;
            ConvLayer::Transposed(
                ConvTranspose2dConfig::new(self.channels, kernel)
                    .with_stride(stride)
                    .with_padding([self.padding, self.padding])
                    .with_padding_out([padding_out, padding_out])
                    .init(device),
            )
        } else {
            ConvLayer::Forward(
                Conv2dConfig::new(self.channels, kernel)
                    .with_stride(stride)
                    .with_padding(PaddingConfig2d::Explicit(self.padding, self.padding))
                    .init(device),
            )
        };

        let (norm, act) = if self.act_norm {
            (
                Some(GroupNormConfig::new(2, channels_out).init(device)),
                Some(
                    LeakyReluConfig::new()
                        .with_negative_slope(LEAKY_RELU_SLOPE)
                        .init(),
                ),
            )
        } else {
            (None, None)
        };

        BasicConv2d { conv, norm, act }
    }
}

/// Convolution with optional normalization and activation.
#[derive(Module, Debug)]
pub struct BasicConv2d<B: Backend> {
    pub conv: ConvLayer<B>,
    pub norm: Option<GroupNorm<B>>,
    pub act: Option<LeakyRelu>,
}

impl<B: Backend> BasicConv2d<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = match &self.norm {
            Some(norm) => norm.forward(x),
            None => x,
        };
        match &self.act {
            Some(act) => act.forward(x),
            None => x,
        }
    }
}

/// Configuration for the `ConvSc` module.
#[derive(Config, Debug)]
pub struct ConvScConfig {
    /// Input and output channels.
    pub channels: [usize; 2],
    pub stride: usize,
    /// Upsample with a transposed convolution. Ignored at stride 1.
    #[config(default = "false")]
    pub transpose: bool,
    #[config(default = "true")]
    pub act_norm: bool,
}

impl ConvScConfig {
    /// Initializes a new `ConvSc` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> ConvSc<B> {
        let block = BasicConv2dConfig::new(self.channels, 3)
            .with_stride(self.stride)
            .with_padding(1)
            .with_transpose(self.transpose && self.stride != 1)
            .with_act_norm(self.act_norm)
            .init(device);

        ConvSc { block }
    }
}

/// A 3x3 spatial stage of the encoder or decoder.
#[derive(Module, Debug)]
pub struct ConvSc<B: Backend> {
    pub block: BasicConv2d<B>,
}

impl<B: Backend> ConvSc<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.block.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{backend::NdArray, tensor::Distribution};

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_stride_one_never_transposes() {
        let device = Default::default();
        let block = ConvScConfig::new([8, 8], 1)
            .with_transpose(true)
            .init::<TestBackend>(&device);

        assert!(!block.block.conv.is_transposed());

        let x = Tensor::<TestBackend, 4>::random([1, 8, 11, 13], Distribution::Default, &device);
        assert_eq!(block.forward(x).dims(), [1, 8, 11, 13]);
    }

    #[test]
    fn test_downsampling_stage() {
        let device = Default::default();
        let block = ConvScConfig::new([4, 16], 2).init::<TestBackend>(&device);

        let x = Tensor::<TestBackend, 4>::random([2, 4, 64, 64], Distribution::Default, &device);
        assert_eq!(block.forward(x).dims(), [2, 16, 32, 32]);

        // Odd sides round up
        let x = Tensor::<TestBackend, 4>::random([1, 4, 279, 193], Distribution::Default, &device);
        assert_eq!(block.forward(x).dims(), [1, 16, 140, 97]);
    }

    #[test]
    fn test_upsampling_stage() {
        let device = Default::default();
        let block = ConvScConfig::new([16, 16], 2)
            .with_transpose(true)
            .init::<TestBackend>(&device);

        assert!(block.block.conv.is_transposed());

        let x = Tensor::<TestBackend, 4>::random([2, 16, 32, 32], Distribution::Default, &device);
        assert_eq!(block.forward(x).dims(), [2, 16, 64, 64]);
    }

    #[test]
    fn test_plain_conv_has_no_norm() {
        let device = Default::default();
        let block = BasicConv2dConfig::new([3, 5], 1).init::<TestBackend>(&device);

        assert!(block.norm.is_none());
        assert!(block.act.is_none());

        let x = Tensor::<TestBackend, 4>::random([1, 3, 7, 7], Distribution::Default, &device);
        assert_eq!(block.forward(x).dims(), [1, 5, 7, 7]);
    }
}
