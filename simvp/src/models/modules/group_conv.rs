//! # Grouped Convolution Block
//!
//! A grouped `Conv2d` with an optional `GroupNorm` + `LeakyRelu` pair, used for every
//! branch of the inception module.

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        GroupNorm, GroupNormConfig, LeakyRelu, LeakyReluConfig, PaddingConfig2d,
    },
    prelude::*,
};

use super::conv::LEAKY_RELU_SLOPE;

/// Configuration for the `GroupConv2d` module.
#[derive(Config, Debug)]
pub struct GroupConv2dConfig {
    /// Input and output channels.
    pub channels: [usize; 2],
    pub kernel_size: usize,
    #[config(default = "1")]
    pub stride: usize,
    #[config(default = "0")]
    pub padding: usize,
    /// Requested group count. See [`GroupConv2dConfig::effective_groups`].
    pub groups: usize,
    /// Append `GroupNorm(groups, out)` and `LeakyRelu(0.2)`.
    #[config(default = "false")]
    pub act_norm: bool,
}

impl GroupConv2dConfig {
    /// The group count the block is actually built with.
    ///
    /// Falls back to a single group when the requested count is zero or does not divide
    /// both channel counts.
    #[must_use]
    pub fn effective_groups(&self) -> usize {
        let [channels_in, channels_out] = self.channels;
        if self.groups == 0 || channels_in % self.groups != 0 || channels_out % self.groups != 0 {
            1
        } else {
            self.groups
        }
    }

    /// Initializes a new `GroupConv2d` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> GroupConv2d<B> {
        let [_, channels_out] = self.channels;
        let groups = self.effective_groups();
        if groups != self.groups {
            tracing::debug!(
                requested = self.groups,
                channels = ?self.channels,
                "group count does not divide channels, using a single group"
            );
        }

        let conv = Conv2dConfig::new(self.channels, [self.kernel_size, self.kernel_size])
            .with_stride([self.stride, self.stride])
            .with_padding(PaddingConfig2d::Explicit(self.padding, self.padding))
            .with_groups(groups)
            .init(device);

        let (norm, act) = if self.act_norm {
            (
                Some(GroupNormConfig::new(groups, channels_out).init(device)),
                Some(
                    LeakyReluConfig::new()
                        .with_negative_slope(LEAKY_RELU_SLOPE)
                        .init(),
                ),
            )
        } else {
            (None, None)
        };

        GroupConv2d {
            conv,
            norm,
            act,
            groups,
        }
    }
}

/// Grouped convolution with optional normalization and activation.
#[derive(Module, Debug)]
pub struct GroupConv2d<B: Backend> {
    pub conv: Conv2d<B>,
    pub norm: Option<GroupNorm<B>>,
    pub act: Option<LeakyRelu>,
    groups: usize,
}

impl<B: Backend> GroupConv2d<B> {
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

    /// Number of groups the convolution was built with.
    pub const fn groups(&self) -> usize {
        self.groups
    }
}
