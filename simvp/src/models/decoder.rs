//! # Spatial Decoder
//!
//! Mirrors the spatial encoder with transposed 3x3 stages. The final stage sees the
//! upsampled latent concatenated with the encoder's first-stage output, and a 1x1
//! readout maps back to frame channels.

use burn::{
    nn::conv::{Conv2d, Conv2dConfig},
    prelude::*,
};
use burn_extra_ops::FeatureMapOps;

use super::{
    encoder::SpatialStage,
    modules::{stride_schedule, ConvSc},
};
use crate::config::StrideReversal;

/// Configuration for the `SpatialDecoder` module.
#[derive(Config, Debug)]
pub struct SpatialDecoderConfig {
    pub channels_hidden: usize,
    pub channels_out: usize,
    pub num_stages: usize,
    #[config(default = "StrideReversal::Mirror")]
    pub reversal: StrideReversal,
}

impl SpatialDecoderConfig {
    /// The stages the decoder is built from, first stage first.
    ///
    /// All stages request a transposed convolution; the last one takes twice the hidden
    /// channels because of the skip concatenation.
    #[must_use]
    pub fn stages(&self) -> Vec<SpatialStage> {
        let hidden = self.channels_hidden;
        stride_schedule(self.num_stages, true, &self.reversal)
            .into_iter()
            .enumerate()
            .map(|(i, stride)| SpatialStage {
                channels: if i + 1 == self.num_stages {
                    [2 * hidden, hidden]
                } else {
                    [hidden, hidden]
                },
                stride,
                transpose: true,
            })
            .collect()
    }

    /// Initializes a new `SpatialDecoder` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> SpatialDecoder<B> {
        let layers = self.stages().iter().map(|stage| stage.init(device)).collect();
        let readout =
            Conv2dConfig::new([self.channels_hidden, self.channels_out], [1, 1]).init(device);

        SpatialDecoder { layers, readout }
    }
}

#[derive(Module, Debug)]
pub struct SpatialDecoder<B: Backend> {
    pub layers: Vec<ConvSc<B>>,
    pub readout: Conv2d<B>,
}

impl<B: Backend> SpatialDecoder<B> {
    /// # Shapes
    /// - hidden: `[N, C_hid, H', W']`
    /// - skip: `[N, C_hid, H, W]`
    /// - output: `[N, C_out, H, W]`
    pub fn forward(&self, hidden: Tensor<B, 4>, skip: Tensor<B, 4>) -> Tensor<B, 4> {
        let Some((last, upsampling)) = self.layers.split_last() else {
            return self.readout.forward(hidden);
        };

        let hidden = upsampling
            .iter()
            .fold(hidden, |hidden, layer| layer.forward(hidden));
        // Transposed stages round odd sides up
        let hidden = hidden.crop_spatial(skip.spatial_dims());

        let y = last.forward(Tensor::cat(vec![hidden, skip], 1));
        self.readout.forward(y)
    }
}
