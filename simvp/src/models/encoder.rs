//! # Spatial Encoder
//!
//! Maps each frame to a low-resolution latent with a stack of 3x3 stages whose strides
//! alternate between 1 and 2. The output of the first stage is returned alongside the
//! latent and later feeds the decoder's final stage.

use burn::prelude::*;

use super::modules::{stride_schedule, ConvSc, ConvScConfig};
use crate::config::StrideReversal;

/// A resolved spatial stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpatialStage {
    /// Input and output channels.
    pub channels: [usize; 2],
    pub stride: usize,
    /// Whether a transposed convolution was requested. Stride-1 stages ignore it.
    pub transpose: bool,
}

impl SpatialStage {
    pub(crate) fn init<B: Backend>(&self, device: &Device<B>) -> ConvSc<B> {
        ConvScConfig::new(self.channels, self.stride)
            .with_transpose(self.transpose)
            .init(device)
    }
}

/// Configuration for the `SpatialEncoder` module.
#[derive(Config, Debug)]
pub struct SpatialEncoderConfig {
    pub channels_in: usize,
    pub channels_hidden: usize,
    pub num_stages: usize,
}

impl SpatialEncoderConfig {
    /// The stages the encoder is built from, first stage first.
    #[must_use]
    pub fn stages(&self) -> Vec<SpatialStage> {
        stride_schedule(self.num_stages, false, &StrideReversal::Mirror)
            .into_iter()
            .enumerate()
            .map(|(i, stride)| SpatialStage {
                channels: if i == 0 {
                    [self.channels_in, self.channels_hidden]
                } else {
                    [self.channels_hidden, self.channels_hidden]
                },
                stride,
                transpose: false,
            })
            .collect()
    }

    /// Initializes a new `SpatialEncoder` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> SpatialEncoder<B> {
        let layers = self.stages().iter().map(|stage| stage.init(device)).collect();

        SpatialEncoder { layers }
    }
}

#[derive(Module, Debug)]
pub struct SpatialEncoder<B: Backend> {
    pub layers: Vec<ConvSc<B>>,
}

impl<B: Backend> SpatialEncoder<B> {
    /// # Shapes
    /// - input: `[N, C_in, H, W]`
    /// - output: (latent `[N, C_hid, H', W']`, skip `[N, C_hid, H, W]`)
    pub fn forward(&self, x: Tensor<B, 4>) -> (Tensor<B, 4>, Tensor<B, 4>) {
        let mut layers = self.layers.iter();
        let skip = match layers.next() {
            Some(first) => first.forward(x),
            None => x,
        };
        let latent = layers.fold(skip.clone(), |latent, layer| layer.forward(latent));

        (latent, skip)
    }
}
