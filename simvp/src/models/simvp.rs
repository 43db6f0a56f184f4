//! # SimVP Model Implementation
//!
//! This module defines the top-level `SimVp` network and its time-conditioned variant
//! `SimVpTemporal`.
//!
//! ## Data flow
//!
//! 1. `[B, C, T, H, W]` frames are permuted to `[B, T, C, H, W]` and every frame is
//!    encoded independently by the spatial encoder.
//! 2. The latents of all frames are translated jointly by the temporal translator.
//! 3. Every translated latent is decoded, together with the skip connection of its
//!    source frame, back to `[C, H, W]`, and the output is permuted back.
//!
//! The output always has the same shape as the input. In particular it contains
//! `history_len` frames whatever `forecast_len` is configured to.

use burn::prelude::*;
use burn_extra_ops::{FeatureMapOps, FrameOps};

use super::{SpatialDecoder, SpatialEncoder, TemporalTranslator, Translator};
use crate::{
    config::SimVpConfig,
    error::{SimVpError, SimVpResult},
};

impl SimVpConfig {
    /// Initializes a `SimVp` model with this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails [`SimVpConfig::validate`].
    pub fn init<B: Backend>(&self, device: &Device<B>) -> SimVpResult<SimVp<B>> {
        self.validate()?;
        self.log_construction("SimVP");

        Ok(SimVp {
            encoder: self.encoder_config().init(device),
            translator: self.translator_config().init(device)?,
            decoder: self.decoder_config().init(device),
            num_channels: self.num_channels,
            history_len: self.history_len,
            forecast_len: self.forecast_len,
            spatial_size: self.spatial_size,
            latent_size: self.latent_size(),
        })
    }

    /// Initializes a time-conditioned `SimVpTemporal` model with this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails [`SimVpConfig::validate`].
    pub fn init_temporal<B: Backend>(&self, device: &Device<B>) -> SimVpResult<SimVpTemporal<B>> {
        self.validate()?;
        self.log_construction("SimVPTemporal");

        Ok(SimVpTemporal {
            encoder: self.encoder_config().init(device),
            translator: self.temporal_translator_config().init(device)?,
            decoder: self.decoder_config().init(device),
            num_channels: self.num_channels,
            history_len: self.history_len,
            forecast_len: self.forecast_len,
            spatial_size: self.spatial_size,
            latent_size: self.latent_size(),
            time_features: self.time_features,
        })
    }

    fn log_construction(&self, name: &str) {
        tracing::debug!(
            model = name,
            encoder_strides = ?self.encoder_strides(),
            decoder_strides = ?self.decoder_strides(),
            latent_size = ?self.latent_size(),
            translator_channels = self.translator_channels(),
            hid_t = self.hid_t,
            "building network"
        );
        if self.forecast_len != self.history_len {
            tracing::warn!(
                history_len = self.history_len,
                forecast_len = self.forecast_len,
                "output has history_len frames; forecast_len is not used by the network"
            );
        }
    }
}

/// Checks `[C, T, H, W]` of a frame batch against the expected geometry.
fn check_frames<B: Backend>(
    x: &Tensor<B, 5>,
    num_channels: usize,
    history_len: usize,
    [height, width]: [usize; 2],
) -> SimVpResult<()> {
    let [_, c, t, h, w] = x.dims();
    if [c, t, h, w] == [num_channels, history_len, height, width] {
        Ok(())
    } else {
        Err(SimVpError::InvalidTensorShape {
            expected: format!("[batch, {num_channels}, {history_len}, {height}, {width}]"),
            actual: format!("{:?}", x.dims()),
        })
    }
}

/// Encodes every frame, returning stacked latents and the per-frame skips.
fn encode<B: Backend>(
    encoder: &SpatialEncoder<B>,
    x: Tensor<B, 5>,
) -> (Tensor<B, 5>, Tensor<B, 4>) {
    let [batch, _, _, _, _] = x.dims();
    // (B, C, T, H, W) -> (B * T, C, H, W)
    let frames = x.swap_channel_time().fold_time();
    let (latent, skip) = encoder.forward(frames);

    (latent.unfold_time(batch), skip)
}

/// Decodes translated latents back to `(B, C, T, H, W)` frames.
fn decode<B: Backend>(
    decoder: &SpatialDecoder<B>,
    hidden: Tensor<B, 5>,
    skip: Tensor<B, 4>,
) -> Tensor<B, 5> {
    let [batch, _, _, _, _] = hidden.dims();
    decoder
        .forward(hidden.fold_time(), skip)
        .unfold_time(batch)
        .swap_channel_time()
}

/// The SimVP network.
#[derive(Module, Debug)]
pub struct SimVp<B: Backend> {
    pub encoder: SpatialEncoder<B>,
    pub translator: Translator<B>,
    pub decoder: SpatialDecoder<B>,
    num_channels: usize,
    history_len: usize,
    forecast_len: usize,
    spatial_size: [usize; 2],
    latent_size: [usize; 2],
}

impl<B: Backend> SimVp<B> {
    /// # Shapes
    /// - input: `[B, C, T, H, W]`
    /// - output: `[B, C, T, H, W]`
    pub fn forward(&self, x: Tensor<B, 5>) -> Tensor<B, 5> {
        let (latent, skip) = encode(&self.encoder, x);
        let hidden = self.translator.forward(latent);
        decode(&self.decoder, hidden, skip)
    }

    /// Checks `x` against the frame geometry the network was built for.
    ///
    /// # Errors
    ///
    /// Returns `Err(SimVpError::InvalidTensorShape)` describing the mismatch.
    pub fn check_input(&self, x: &Tensor<B, 5>) -> SimVpResult<()> {
        check_frames(x, self.num_channels, self.history_len, self.spatial_size)
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn history_len(&self) -> usize {
        self.history_len
    }

    pub fn forecast_len(&self) -> usize {
        self.forecast_len
    }

    pub fn spatial_size(&self) -> [usize; 2] {
        self.spatial_size
    }

    pub fn latent_size(&self) -> [usize; 2] {
        self.latent_size
    }
}

/// The SimVP network with time-of-day and day-of-year conditioning in the translator.
#[derive(Module, Debug)]
pub struct SimVpTemporal<B: Backend> {
    pub encoder: SpatialEncoder<B>,
    pub translator: TemporalTranslator<B>,
    pub decoder: SpatialDecoder<B>,
    num_channels: usize,
    history_len: usize,
    forecast_len: usize,
    spatial_size: [usize; 2],
    latent_size: [usize; 2],
    time_features: usize,
}

impl<B: Backend> SimVpTemporal<B> {
    /// # Shapes
    /// - x: `[B, C, T, H, W]`
    /// - time_features: `[B, T, F]`
    /// - output: `[B, C, T, H, W]`
    pub fn forward(&self, x: Tensor<B, 5>, time_features: Tensor<B, 3>) -> Tensor<B, 5> {
        let (latent, skip) = encode(&self.encoder, x);
        let hidden = self.translator.forward(latent, time_features);
        decode(&self.decoder, hidden, skip)
    }

    /// Checks `x` against the frame geometry the network was built for.
    ///
    /// # Errors
    ///
    /// Returns `Err(SimVpError::InvalidTensorShape)` describing the mismatch.
    pub fn check_input(&self, x: &Tensor<B, 5>) -> SimVpResult<()> {
        check_frames(x, self.num_channels, self.history_len, self.spatial_size)
    }

    /// Checks that `time_features` has one row of features per history step.
    ///
    /// # Errors
    ///
    /// Returns `Err(SimVpError::InvalidTensorShape)` describing the mismatch.
    pub fn check_time_features(&self, time_features: &Tensor<B, 3>) -> SimVpResult<()> {
        let [_, t, f] = time_features.dims();
        if t == self.history_len && f == self.time_features {
            Ok(())
        } else {
            Err(SimVpError::InvalidTensorShape {
                expected: format!("[batch, {}, {}]", self.history_len, self.time_features),
                actual: format!("{:?}", time_features.dims()),
            })
        }
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn history_len(&self) -> usize {
        self.history_len
    }

    pub fn forecast_len(&self) -> usize {
        self.forecast_len
    }

    pub fn spatial_size(&self) -> [usize; 2] {
        self.spatial_size
    }

    pub fn latent_size(&self) -> [usize; 2] {
        self.latent_size
    }

    pub fn time_features(&self) -> usize {
        self.time_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{backend::NdArray, tensor::Distribution};

    type TestBackend = NdArray<f32>;

    /// Eleven channels, four steps, 128x128 frames, default spatial widths and a
    /// reduced translator.
    fn test_config() -> SimVpConfig {
        SimVpConfig::new(11, 4, 4)
            .with_spatial_size([128, 128])
            .with_hid_s(16)
            .with_n_s(4)
            .with_hid_t(32)
            .with_n_t(2)
    }

    #[test]
    fn test_end_to_end_shape() {
        let device = Default::default();
        let model = test_config().init::<TestBackend>(&device).unwrap();
        assert_eq!(model.latent_size(), [32, 32]);

        let x = Tensor::<TestBackend, 5>::random([2, 11, 4, 128, 128], Distribution::Default, &device);
        assert!(model.check_input(&x).is_ok());
        assert_eq!(model.forward(x).dims(), [2, 11, 4, 128, 128]);
    }

    #[test]
    fn test_temporal_end_to_end_shape() {
        let device = Default::default();
        let model = test_config().init_temporal::<TestBackend>(&device).unwrap();

        let x = Tensor::<TestBackend, 5>::random([2, 11, 4, 128, 128], Distribution::Default, &device);
        let t = Tensor::<TestBackend, 3>::random([2, 4, 4], Distribution::Default, &device);
        assert!(model.check_input(&x).is_ok());
        assert!(model.check_time_features(&t).is_ok());
        assert_eq!(model.forward(x, t).dims(), [2, 11, 4, 128, 128]);
    }

    #[test]
    fn test_temporal_shape_matches_plain() {
        let device = Default::default();
        let config = SimVpConfig::new(3, 4, 4)
            .with_spatial_size([32, 24])
            .with_hid_s(4)
            .with_hid_t(16)
            .with_n_t(3)
            .with_kernel_sizes(vec![3, 5])
            .with_groups(4);

        let plain = config.init::<TestBackend>(&device).unwrap();
        let temporal = config.init_temporal::<TestBackend>(&device).unwrap();

        let x = Tensor::<TestBackend, 5>::random([2, 3, 4, 32, 24], Distribution::Default, &device);
        let t = Tensor::<TestBackend, 3>::random([2, 4, 4], Distribution::Default, &device);
        assert!(temporal.check_time_features(&t).is_ok());

        let expected = plain.forward(x.clone()).dims();
        assert_eq!(temporal.forward(x, t).dims(), expected);
        assert_eq!(expected, [2, 3, 4, 32, 24]);
    }

    #[test]
    fn test_odd_frame_size() {
        let device = Default::default();
        let model = SimVpConfig::new(2, 3, 3)
            .with_spatial_size([45, 37])
            .with_hid_s(4)
            .with_hid_t(8)
            .with_n_t(2)
            .with_kernel_sizes(vec![3])
            .with_groups(2)
            .init::<TestBackend>(&device)
            .unwrap();
        assert_eq!(model.latent_size(), [12, 10]);

        let x = Tensor::<TestBackend, 5>::random([1, 2, 3, 45, 37], Distribution::Default, &device);
        assert_eq!(model.forward(x).dims(), [1, 2, 3, 45, 37]);
    }

    #[test]
    fn test_check_input_reports_mismatch() {
        let device = Default::default();
        let model = test_config().init::<TestBackend>(&device).unwrap();

        let x = Tensor::<TestBackend, 5>::zeros([1, 11, 3, 128, 128], &device);
        match model.check_input(&x) {
            Err(SimVpError::InvalidTensorShape { expected, actual }) => {
                assert_eq!(expected, "[batch, 11, 4, 128, 128]");
                assert!(actual.contains("3"));
            }
            _ => panic!("Expected InvalidTensorShape error"),
        }
    }

    #[test]
    fn test_check_time_features_reports_mismatch() {
        let device = Default::default();
        let model = test_config().init_temporal::<TestBackend>(&device).unwrap();

        let t = Tensor::<TestBackend, 3>::zeros([2, 4, 3], &device);
        assert!(matches!(
            model.check_time_features(&t),
            Err(SimVpError::InvalidTensorShape { .. })
        ));
    }

    #[test]
    fn test_forecast_len_does_not_change_output() {
        let device = Default::default();
        let model = SimVpConfig::new(1, 2, 6)
            .with_spatial_size([16, 16])
            .with_hid_s(2)
            .with_hid_t(4)
            .with_n_t(2)
            .with_kernel_sizes(vec![3])
            .init::<TestBackend>(&device)
            .unwrap();
        assert_eq!(model.forecast_len(), 6);

        let x = Tensor::<TestBackend, 5>::zeros([1, 1, 2, 16, 16], &device);
        assert_eq!(model.forward(x).dims(), [1, 1, 2, 16, 16]);
    }

    #[test]
    #[ignore = "full-width translator is slow on the ndarray backend"]
    fn test_default_width_end_to_end() {
        let device = Default::default();
        let model = SimVpConfig::new(11, 4, 4)
            .with_spatial_size([128, 128])
            .init::<TestBackend>(&device)
            .unwrap();
        assert_eq!((model.num_channels(), model.history_len()), (11, 4));

        let x = Tensor::<TestBackend, 5>::random([2, 11, 4, 128, 128], Distribution::Default, &device);
        assert_eq!(model.forward(x).dims(), [2, 11, 4, 128, 128]);
    }
}
