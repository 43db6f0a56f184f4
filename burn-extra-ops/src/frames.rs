//! # Frame Folding
//!
//! Moves tensors between the rank-5 frame layout `[batch, time, channels, height, width]`
//! and the rank-4 layouts consumed by 2D convolutions.

use burn::prelude::*;

/// Merges the batch and time axes.
///
/// # Shapes
/// - input: `[B, T, C, H, W]`
/// - output: `[B * T, C, H, W]`
pub fn fold_time<B: Backend>(x: Tensor<B, 5>) -> Tensor<B, 4> {
    let [b, t, c, h, w] = x.dims();
    x.reshape([b * t, c, h, w])
}

/// Splits the leading axis back into batch and time.
///
/// # Shapes
/// - input: `[B * T, C, H, W]`
/// - output: `[B, T, C, H, W]`
///
/// # Panics
///
/// If `batch` is zero or does not divide the leading axis.
pub fn unfold_time<B: Backend>(x: Tensor<B, 4>, batch: usize) -> Tensor<B, 5> {
    let [n, c, h, w] = x.dims();
    assert!(
        batch > 0 && n % batch == 0,
        "Leading axis ({n}) is not a multiple of the batch size ({batch})"
    );
    x.reshape([batch, n / batch, c, h, w])
}

/// Stacks the time axis into the channel axis.
///
/// # Shapes
/// - input: `[B, T, C, H, W]`
/// - output: `[B, T * C, H, W]`
pub fn stack_time<B: Backend>(x: Tensor<B, 5>) -> Tensor<B, 4> {
    let [b, t, c, h, w] = x.dims();
    x.reshape([b, t * c, h, w])
}

/// Inverse of [`stack_time`].
///
/// # Shapes
/// - input: `[B, T * C, H, W]`
/// - output: `[B, T, C, H, W]`
///
/// # Panics
///
/// If `time` is zero or does not divide the channel axis.
pub fn unstack_time<B: Backend>(x: Tensor<B, 4>, time: usize) -> Tensor<B, 5> {
    let [b, tc, h, w] = x.dims();
    assert!(
        time > 0 && tc % time == 0,
        "Channel axis ({tc}) is not a multiple of the time steps ({time})"
    );
    x.reshape([b, time, tc / time, h, w])
}

/// Swaps the channel and time axes. Applying it twice is the identity.
///
/// `[B, C, T, H, W]` <-> `[B, T, C, H, W]`
pub fn swap_channel_time<B: Backend>(x: Tensor<B, 5>) -> Tensor<B, 5> {
    x.permute([0, 2, 1, 3, 4])
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{
        backend::NdArray,
        tensor::{Distribution, Tolerance},
    };

    type TestBackend = NdArray<f32>;

    #[test]
    fn fold_then_unfold_restores_frames() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 5>::random([2, 3, 4, 5, 6], Distribution::Default, &device);

        let folded = fold_time(x.clone());
        assert_eq!(folded.dims(), [6, 4, 5, 6]);

        let restored = unfold_time(folded, 2);
        restored
            .into_data()
            .assert_approx_eq::<f32>(&x.into_data(), Tolerance::default());
    }

    #[test]
    fn stack_time_orders_channels_time_major() {
        let device = Default::default();
        // [B=1, T=2, C=2, H=1, W=1] with values t * 10 + c.
        let x = Tensor::<TestBackend, 1>::from_floats([0.0, 1.0, 10.0, 11.0], &device)
            .reshape([1, 2, 2, 1, 1]);

        let stacked = stack_time(x);
        assert_eq!(stacked.dims(), [1, 4, 1, 1]);
        stacked.into_data().assert_approx_eq::<f32>(
            &TensorData::from([[[[0.0f32]], [[1.0]], [[10.0]], [[11.0]]]]),
            Tolerance::default(),
        );
    }

    #[test]
    fn unstack_time_inverts_stack_time() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 5>::random([2, 3, 4, 2, 2], Distribution::Default, &device);

        let restored = unstack_time(stack_time(x.clone()), 3);
        assert_eq!(restored.dims(), [2, 3, 4, 2, 2]);
        restored
            .into_data()
            .assert_approx_eq::<f32>(&x.into_data(), Tolerance::default());
    }

    #[test]
    fn swap_channel_time_is_an_involution() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 5>::random([1, 3, 2, 4, 4], Distribution::Default, &device);

        let swapped = swap_channel_time(x.clone());
        assert_eq!(swapped.dims(), [1, 2, 3, 4, 4]);
        swap_channel_time(swapped)
            .into_data()
            .assert_approx_eq::<f32>(&x.into_data(), Tolerance::default());
    }

    #[test]
    #[should_panic(expected = "not a multiple of the batch size")]
    fn unfold_time_rejects_uneven_batches() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 4>::zeros([5, 1, 2, 2], &device);
        let _ = unfold_time(x, 2);
    }
}
