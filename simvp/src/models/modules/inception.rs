//! # Inception Module
//!
//! A 1x1 bottleneck followed by parallel grouped convolutions of different kernel
//! sizes whose outputs are summed.

use burn::{
    nn::conv::{Conv2d, Conv2dConfig},
    prelude::*,
};

use super::group_conv::{GroupConv2d, GroupConv2dConfig};
use crate::error::{SimVpError, SimVpResult};

/// Configuration for the `Inception` module.
#[derive(Config, Debug)]
pub struct InceptionConfig {
    pub channels_in: usize,
    /// Channels after the 1x1 bottleneck.
    pub channels_hidden: usize,
    pub channels_out: usize,
    #[config(default = "vec![3, 5, 7, 11]")]
    pub kernel_sizes: Vec<usize>,
    #[config(default = "8")]
    pub groups: usize,
}

impl InceptionConfig {
    /// Initializes a new `Inception` module.
    ///
    /// # Errors
    ///
    /// Returns `Err(SimVpError::InvalidConfiguration)` if `kernel_sizes` is empty.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> SimVpResult<Inception<B>> {
        if self.kernel_sizes.is_empty() {
            return Err(SimVpError::InvalidConfiguration {
                reason: "Inception module needs at least one kernel size".to_string(),
            });
        }

        let conv1 = Conv2dConfig::new([self.channels_in, self.channels_hidden], [1, 1]).init(device);

        let branches = self
            .kernel_sizes
            .iter()
            .map(|&kernel_size| {
                GroupConv2dConfig::new(
                    [self.channels_hidden, self.channels_out],
                    kernel_size,
                    self.groups,
                )
                .with_padding(kernel_size / 2)
                .with_act_norm(true)
                .init(device)
            })
            .collect();

        Ok(Inception { conv1, branches })
    }
}

#[derive(Module, Debug)]
pub struct Inception<B: Backend> {
    pub conv1: Conv2d<B>,
    pub branches: Vec<GroupConv2d<B>>,
}

impl<B: Backend> Inception<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv1.forward(x);

        let mut branches = self.branches.iter();
        // `init` guarantees at least one branch
        let first = match branches.next() {
            Some(branch) => branch.forward(x.clone()),
            None => return x,
        };
        branches.fold(first, |acc, branch| acc + branch.forward(x.clone()))
    }
}
