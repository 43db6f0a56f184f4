//! Synthetic inputs for exercising the network without a dataset.

use std::f32::consts::TAU;

use burn::{prelude::*, tensor::Distribution};
use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use simvp_burn::SimVpConfig;

/// Number of values produced per step by [`time_features`].
pub const TIME_FEATURES: usize = 4;

/// Random frames in `[0, 1)` shaped `[batch, C, T, H, W]` for `config`.
pub fn random_frames<B: Backend>(
    config: &SimVpConfig,
    batch: usize,
    device: &B::Device,
) -> Tensor<B, 5> {
    let [height, width] = config.spatial_size;
    Tensor::random(
        [batch, config.num_channels, config.history_len, height, width],
        Distribution::Uniform(0.0, 1.0),
        device,
    )
}

/// Cyclic encodings of the time of day and the day of year of `steps` timestamps.
///
/// Each row is `[sin, cos]` of the fraction of the day elapsed followed by `[sin, cos]`
/// of the fraction of the year elapsed.
pub fn time_features(
    start: DateTime<Utc>,
    step: Duration,
    steps: usize,
) -> Vec<[f32; TIME_FEATURES]> {
    (0..steps)
        .map(|i| {
            let time = start + step * i as i32;
            let day = time.num_seconds_from_midnight() as f32 / 86_400.0;
            let days_in_year = if time.date_naive().leap_year() { 366.0 } else { 365.0 };
            let year = time.ordinal0() as f32 / days_in_year;
            [
                (TAU * day).sin(),
                (TAU * day).cos(),
                (TAU * year).sin(),
                (TAU * year).cos(),
            ]
        })
        .collect()
}

/// Stacks `features` into a `[batch, steps, 4]` tensor, repeated for every sample.
pub fn time_features_tensor<B: Backend>(
    features: &[[f32; TIME_FEATURES]],
    batch: usize,
    device: &B::Device,
) -> Tensor<B, 3> {
    let values: Vec<f32> = features.iter().flatten().copied().collect();
    Tensor::<B, 3>::from_data(
        TensorData::new(values, [1, features.len(), TIME_FEATURES]),
        device,
    )
    .repeat_dim(0, batch)
}
