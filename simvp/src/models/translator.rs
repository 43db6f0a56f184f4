//! # Temporal Translator
//!
//! Mixes information across frames. The per-frame latents are stacked along the channel
//! axis and passed through a U-shaped stack of inception modules: every encoder output
//! except the last is kept and concatenated, newest first, into the decoder stages after
//! the first one.

use burn::prelude::*;
use burn_extra_ops::{FeatureMapOps, FrameOps};

use super::modules::{Inception, InceptionConfig};
use crate::error::{SimVpError, SimVpResult};

/// A resolved translator stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatorStage {
    pub channels_in: usize,
    pub channels_out: usize,
    /// Whether the stage input is the previous output concatenated with a skip.
    pub concat_skip: bool,
}

/// Configuration for the `Translator` module.
#[derive(Config, Debug)]
pub struct TranslatorConfig {
    /// Stacked channels of all frames, `time * hid_s`.
    pub channels_in: usize,
    pub channels_hidden: usize,
    /// Number of encoder stages, and of decoder stages. At least 2.
    pub num_stages: usize,
    #[config(default = "vec![3, 5, 7, 11]")]
    pub kernel_sizes: Vec<usize>,
    #[config(default = "8")]
    pub groups: usize,
}

impl TranslatorConfig {
    /// Encoder stages: `in -> hid`, then `hid -> hid`.
    #[must_use]
    pub fn encoder_stages(&self) -> Vec<TranslatorStage> {
        (0..self.num_stages)
            .map(|i| TranslatorStage {
                channels_in: if i == 0 {
                    self.channels_in
                } else {
                    self.channels_hidden
                },
                channels_out: self.channels_hidden,
                concat_skip: false,
            })
            .collect()
    }

    /// Decoder stages: `hid -> hid`, then `2 hid -> hid`, with the last `2 hid -> in`.
    #[must_use]
    pub fn decoder_stages(&self) -> Vec<TranslatorStage> {
        (0..self.num_stages)
            .map(|i| TranslatorStage {
                channels_in: if i == 0 {
                    self.channels_hidden
                } else {
                    2 * self.channels_hidden
                },
                channels_out: if i + 1 == self.num_stages {
                    self.channels_in
                } else {
                    self.channels_hidden
                },
                concat_skip: i > 0,
            })
            .collect()
    }

    /// Initializes a new `Translator` module.
    ///
    /// # Errors
    ///
    /// Returns `Err(SimVpError::InvalidConfiguration)` if there are fewer than two stages
    /// or the kernel ensemble is empty.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> SimVpResult<Translator<B>> {
        if self.num_stages < 2 {
            return Err(SimVpError::InvalidConfiguration {
                reason: format!(
                    "Translator needs at least 2 stages, got {}",
                    self.num_stages
                ),
            });
        }

        let build = |stages: Vec<TranslatorStage>| -> SimVpResult<Vec<Inception<B>>> {
            stages
                .iter()
                .map(|stage| {
                    InceptionConfig::new(
                        stage.channels_in,
                        self.channels_hidden / 2,
                        stage.channels_out,
                    )
                    .with_kernel_sizes(self.kernel_sizes.clone())
                    .with_groups(self.groups)
                    .init(device)
                })
                .collect()
        };

        Ok(Translator {
            encoder: build(self.encoder_stages())?,
            decoder: build(self.decoder_stages())?,
        })
    }
}

#[derive(Module, Debug)]
pub struct Translator<B: Backend> {
    pub encoder: Vec<Inception<B>>,
    pub decoder: Vec<Inception<B>>,
}

impl<B: Backend> Translator<B> {
    /// # Shapes
    /// - input: `[B, T, C, H, W]`
    /// - output: `[B, T, C, H, W]`
    pub fn forward(&self, x: Tensor<B, 5>) -> Tensor<B, 5> {
        let [_, time, _, _, _] = x.dims();
        self.forward_flat(x.stack_time(), &[]).unstack_time(time)
    }

    /// Runs the U-shaped inception stack on time-stacked latents.
    ///
    /// `conditioning[i]`, when present, is added to the input of encoder stage `i`.
    ///
    /// # Shapes
    /// - z: `[B, T * C, H, W]`
    /// - output: `[B, T * C, H, W]`
    pub fn forward_flat(&self, z: Tensor<B, 4>, conditioning: &[Tensor<B, 4>]) -> Tensor<B, 4> {
        let last = self.encoder.len().saturating_sub(1);
        let mut skips = Vec::with_capacity(last);

        let mut z = z;
        for (i, stage) in self.encoder.iter().enumerate() {
            if let Some(offset) = conditioning.get(i) {
                z = z + offset.clone();
            }
            z = stage.forward(z);
            if i < last {
                skips.push(z.clone());
            }
        }

        let mut decoder = self.decoder.iter();
        if let Some(first) = decoder.next() {
            z = first.forward(z);
        }
        for (stage, skip) in decoder.zip(skips.into_iter().rev()) {
            z = stage.forward(Tensor::cat(vec![z, skip], 1));
        }

        z
    }

    /// Number of encoder activations retained for the decoder.
    pub fn skip_count(&self) -> usize {
        self.encoder.len().saturating_sub(1)
    }

    pub fn num_stages(&self) -> usize {
        self.encoder.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{
        backend::NdArray,
        tensor::{Distribution, Tolerance},
    };

    type TestBackend = NdArray<f32>;

    fn small_config() -> TranslatorConfig {
        // T = 2 frames of 4 latent channels
        TranslatorConfig::new(8, 16, 3)
            .with_kernel_sizes(vec![3, 5])
            .with_groups(4)
    }

    #[test]
    fn test_stage_descriptors() {
        let config = small_config();

        let encoder = config.encoder_stages();
        assert_eq!(encoder.len(), 3);
        assert_eq!((encoder[0].channels_in, encoder[0].channels_out), (8, 16));
        assert!(encoder[1..]
            .iter()
            .all(|s| s.channels_in == 16 && s.channels_out == 16 && !s.concat_skip));

        let decoder = config.decoder_stages();
        assert_eq!(decoder.len(), 3);
        assert_eq!((decoder[0].channels_in, decoder[0].channels_out), (16, 16));
        assert!(!decoder[0].concat_skip);
        assert_eq!((decoder[1].channels_in, decoder[1].channels_out), (32, 16));
        assert_eq!((decoder[2].channels_in, decoder[2].channels_out), (32, 8));
    }

    #[test]
    fn test_skip_accounting() {
        let device = Default::default();
        let config = small_config();
        let translator = config.init::<TestBackend>(&device).unwrap();

        let concatenating = config
            .decoder_stages()
            .iter()
            .filter(|s| s.concat_skip)
            .count();
        assert_eq!(translator.skip_count(), 2);
        assert_eq!(translator.skip_count(), concatenating);
        assert_eq!(translator.num_stages(), 3);
    }

    #[test]
    fn test_channel_preservation() {
        let device = Default::default();
        let translator = small_config().init::<TestBackend>(&device).unwrap();

        let x = Tensor::<TestBackend, 5>::random([2, 2, 4, 8, 8], Distribution::Default, &device);
        assert_eq!(translator.forward(x).dims(), [2, 2, 4, 8, 8]);
    }

    #[test]
    fn test_conditioning_reaches_later_stages() {
        let device = Default::default();
        let translator = small_config().init::<TestBackend>(&device).unwrap();

        let z = Tensor::<TestBackend, 4>::random([1, 8, 8, 8], Distribution::Default, &device);
        let plain = translator.forward_flat(z.clone(), &[]);

        // A zero offset on the first stage is a no-op
        let zero_first = vec![Tensor::<TestBackend, 4>::zeros([1, 8, 8, 8], &device)];
        translator
            .forward_flat(z.clone(), &zero_first)
            .into_data()
            .assert_approx_eq::<f32>(&plain.clone().into_data(), Tolerance::default());

        // Only the second encoder stage receives a nonzero offset
        let second_only = vec![
            Tensor::<TestBackend, 4>::zeros([1, 8, 8, 8], &device),
            Tensor::<TestBackend, 4>::ones([1, 16, 8, 8], &device),
            Tensor::<TestBackend, 4>::zeros([1, 16, 8, 8], &device),
        ];
        let conditioned = translator.forward_flat(z, &second_only);
        let diff = (conditioned - plain).abs().max().into_scalar();
        assert!(diff > 0.0);
    }

    #[test]
    fn test_too_few_stages() {
        let device = Default::default();
        let result = TranslatorConfig::new(8, 16, 1).init::<TestBackend>(&device);

        match result {
            Err(SimVpError::InvalidConfiguration { reason }) => {
                assert!(reason.contains("at least 2 stages"));
            }
            _ => panic!("Expected InvalidConfiguration error"),
        }
    }
}
