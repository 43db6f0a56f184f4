//! Core configuration structure for SimVP.
//!
//! `SimVpConfig` describes the whole network: the frame geometry it is built for, the
//! widths and depths of the spatial and temporal parts, and the inception ensemble.
//! The sub-module configurations are derived from it rather than stored in it, so a
//! serialized config stays a flat list of hyperparameters.

use burn::prelude::*;

use super::enums::StrideReversal;
use crate::error::{SimVpError, SimVpResult};
use crate::models::{
    modules::{check_schedules, stride_schedule},
    SpatialDecoderConfig, SpatialEncoderConfig, TemporalTranslatorConfig, TranslatorConfig,
};

/// Main configuration for the SimVP model.
#[derive(Config, Debug)]
pub struct SimVpConfig {
    /// Number of channels of every input and output frame.
    pub num_channels: usize,
    /// Number of past frames fed to the network.
    pub history_len: usize,
    /// Forecast horizon. Carried for bookkeeping; the network emits `history_len` frames.
    pub forecast_len: usize,
    /// Frame size as `[height, width]`.
    #[config(default = "[279, 386]")]
    pub spatial_size: [usize; 2],
    /// Channels of the spatial encoder/decoder.
    #[config(default = "16")]
    pub hid_s: usize,
    /// Channels of the temporal translator.
    #[config(default = "256")]
    pub hid_t: usize,
    /// Number of spatial encoder stages (and decoder stages).
    #[config(default = "4")]
    pub n_s: usize,
    /// Number of translator encoder stages (and decoder stages).
    #[config(default = "8")]
    pub n_t: usize,
    /// Kernel sizes of the parallel inception branches.
    #[config(default = "vec![3, 5, 7, 11]")]
    pub kernel_sizes: Vec<usize>,
    /// Requested group count of the inception branches.
    #[config(default = "8")]
    pub groups: usize,
    /// How the decoder stride schedule is derived.
    #[config(default = "StrideReversal::Mirror")]
    pub stride_reversal: StrideReversal,
    /// Auxiliary scalar features per time step for the time-conditioned network.
    #[config(default = "4")]
    pub time_features: usize,
}

impl SimVpConfig {
    /// Validate the configuration and return appropriate errors for invalid settings.
    ///
    /// # Errors
    ///
    /// Returns `Err(SimVpError::InvalidConfiguration)` if a size is zero, a width cannot
    /// be normalized, or the kernel ensemble is unusable.
    /// Returns `Err(SimVpError::StrideScheduleMismatch)` if the decoder strides do not
    /// undo the encoder strides.
    pub fn validate(&self) -> SimVpResult<()> {
        let positive = [
            ("num_channels", self.num_channels),
            ("history_len", self.history_len),
            ("n_s", self.n_s),
            ("groups", self.groups),
            ("time_features", self.time_features),
            ("spatial height", self.spatial_size[0]),
            ("spatial width", self.spatial_size[1]),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(SimVpError::InvalidConfiguration {
                reason: format!("{name} must be greater than zero"),
            });
        }

        // GroupNorm(2, hid_s) after every spatial stage
        if self.hid_s == 0 || self.hid_s % 2 != 0 {
            return Err(SimVpError::InvalidConfiguration {
                reason: format!("hid_s must be a positive even number, got {}", self.hid_s),
            });
        }

        // Inception blocks use hid_t / 2 bottleneck channels
        if self.hid_t < 2 {
            return Err(SimVpError::InvalidConfiguration {
                reason: format!("hid_t must be at least 2, got {}", self.hid_t),
            });
        }

        if self.n_t < 2 {
            return Err(SimVpError::InvalidConfiguration {
                reason: format!("n_t must be at least 2, got {}", self.n_t),
            });
        }

        if self.kernel_sizes.is_empty() {
            return Err(SimVpError::InvalidConfiguration {
                reason: "kernel_sizes must not be empty".to_string(),
            });
        }
        if let Some(k) = self.kernel_sizes.iter().find(|k| **k % 2 == 0) {
            return Err(SimVpError::InvalidConfiguration {
                reason: format!("Inception kernel sizes must be odd, got {k}"),
            });
        }

        check_schedules(&self.encoder_strides(), &self.decoder_strides())
    }

    /// Channels seen by the translator: every history frame's latent stacked together.
    #[must_use]
    pub const fn translator_channels(&self) -> usize {
        self.history_len * self.hid_s
    }

    /// Strides of the spatial encoder stages, first stage first.
    #[must_use]
    pub fn encoder_strides(&self) -> Vec<usize> {
        stride_schedule(self.n_s, false, &self.stride_reversal)
    }

    /// Strides of the spatial decoder stages, first stage first.
    #[must_use]
    pub fn decoder_strides(&self) -> Vec<usize> {
        stride_schedule(self.n_s, true, &self.stride_reversal)
    }

    /// Spatial `[height, width]` of the latent produced by the encoder.
    ///
    /// Each 3x3 stage with padding 1 maps a side `n` to `(n - 1) / stride + 1`, i.e.
    /// `ceil(n / 2)` for stride 2.
    #[must_use]
    pub fn latent_size(&self) -> [usize; 2] {
        self.encoder_strides()
            .iter()
            .fold(self.spatial_size, |[h, w], &s| {
                [h.saturating_sub(1) / s + 1, w.saturating_sub(1) / s + 1]
            })
    }

    /// Configuration of the spatial encoder.
    #[must_use]
    pub fn encoder_config(&self) -> SpatialEncoderConfig {
        SpatialEncoderConfig::new(self.num_channels, self.hid_s, self.n_s)
    }

    /// Configuration of the spatial decoder.
    #[must_use]
    pub fn decoder_config(&self) -> SpatialDecoderConfig {
        SpatialDecoderConfig::new(self.hid_s, self.num_channels, self.n_s)
            .with_reversal(self.stride_reversal.clone())
    }

    /// Configuration of the plain temporal translator.
    #[must_use]
    pub fn translator_config(&self) -> TranslatorConfig {
        TranslatorConfig::new(self.translator_channels(), self.hid_t, self.n_t)
            .with_kernel_sizes(self.kernel_sizes.clone())
            .with_groups(self.groups)
    }

    /// Configuration of the time-conditioned temporal translator.
    #[must_use]
    pub fn temporal_translator_config(&self) -> TemporalTranslatorConfig {
        TemporalTranslatorConfig::new(self.translator_config(), self.history_len)
            .with_time_features(self.time_features)
    }
}
