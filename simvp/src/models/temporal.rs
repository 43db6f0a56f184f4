//! # Time-Conditioned Translator
//!
//! Wraps the plain translator and injects an embedding of per-step auxiliary features
//! (time of day, day of year) before every encoder stage.
//!
//! The embedding of all `T` steps is flattened to `T * hid` values per sample. Each
//! encoder stage owns a linear projection from that vector to its own input width, so
//! the first stage (which sees `T * hid_s` stacked latent channels) and the later stages
//! (which see `hid` channels) are both conditioned on the full time context.

use burn::{
    nn::{Linear, LinearConfig, Relu},
    prelude::*,
};
use burn_extra_ops::{broadcast_spatial, FeatureMapOps, FrameOps};

use super::translator::{Translator, TranslatorConfig};
use crate::error::{SimVpError, SimVpResult};

/// Configuration for the `TimeEmbedding` module.
#[derive(Config, Debug)]
pub struct TimeEmbeddingConfig {
    /// Auxiliary features per time step.
    #[config(default = "4")]
    pub features: usize,
    pub channels_hidden: usize,
}

impl TimeEmbeddingConfig {
    /// Initializes a new `TimeEmbedding` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> TimeEmbedding<B> {
        TimeEmbedding {
            fc1: LinearConfig::new(self.features, self.channels_hidden).init(device),
            act: Relu::new(),
            fc2: LinearConfig::new(self.channels_hidden, self.channels_hidden).init(device),
        }
    }
}

/// Two-layer MLP applied independently to every time step.
#[derive(Module, Debug)]
pub struct TimeEmbedding<B: Backend> {
    pub fc1: Linear<B>,
    pub act: Relu,
    pub fc2: Linear<B>,
}

impl<B: Backend> TimeEmbedding<B> {
    /// # Shapes
    /// - input: `[B, T, F]`
    /// - output: `[B, T, hid]`
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let x = self.fc1.forward(x);
        let x = self.act.forward(x);
        self.fc2.forward(x)
    }
}

/// Configuration for the `TemporalTranslator` module.
#[derive(Config, Debug)]
pub struct TemporalTranslatorConfig {
    pub translator: TranslatorConfig,
    /// Number of time steps the features are given for.
    pub history_len: usize,
    #[config(default = "4")]
    pub time_features: usize,
}

impl TemporalTranslatorConfig {
    /// Initializes a new `TemporalTranslator` module.
    ///
    /// # Errors
    ///
    /// Returns `Err(SimVpError::InvalidConfiguration)` if the inner translator is invalid
    /// or there are no time steps or features.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> SimVpResult<TemporalTranslator<B>> {
        if self.history_len == 0 || self.time_features == 0 {
            return Err(SimVpError::InvalidConfiguration {
                reason: format!(
                    "Time conditioning needs at least one step and one feature, got {} steps and {} features",
                    self.history_len, self.time_features
                ),
            });
        }

        let translator = self.translator.init(device)?;
        let hidden = self.translator.channels_hidden;
        let time_embedding = TimeEmbeddingConfig::new(hidden)
            .with_features(self.time_features)
            .init(device);

        let flattened = self.history_len * hidden;
        let projections = self
            .translator
            .encoder_stages()
            .iter()
            .map(|stage| LinearConfig::new(flattened, stage.channels_in).init(device))
            .collect();

        Ok(TemporalTranslator {
            translator,
            time_embedding,
            projections,
        })
    }
}

#[derive(Module, Debug)]
pub struct TemporalTranslator<B: Backend> {
    pub translator: Translator<B>,
    pub time_embedding: TimeEmbedding<B>,
    /// One projection per encoder stage.
    pub projections: Vec<Linear<B>>,
}

impl<B: Backend> TemporalTranslator<B> {
    /// # Shapes
    /// - x: `[B, T, C, H, W]`
    /// - time_features: `[B, T, F]`
    /// - output: `[B, T, C, H, W]`
    pub fn forward(&self, x: Tensor<B, 5>, time_features: Tensor<B, 3>) -> Tensor<B, 5> {
        let [_, time, _, height, width] = x.dims();
        let conditioning = self.conditioning(time_features, [height, width]);

        self.translator
            .forward_flat(x.stack_time(), &conditioning)
            .unstack_time(time)
    }

    /// Per-stage additive terms, each `[B, C_i, H, W]`.
    fn conditioning(&self, time_features: Tensor<B, 3>, size: [usize; 2]) -> Vec<Tensor<B, 4>> {
        let [batch, time, _] = time_features.dims();
        let embedding = self.time_embedding.forward(time_features);
        let [_, _, hidden] = embedding.dims();
        let embedding = embedding.reshape([batch, time * hidden]);

        self.projections
            .iter()
            .map(|projection| broadcast_spatial(projection.forward(embedding.clone()), size))
            .collect()
    }

    /// Number of encoder activations the wrapped translator keeps for its decoder.
    pub fn skip_count(&self) -> usize {
        self.translator.skip_count()
    }
}
