//! Frame and feature-map operations for the Burn deep learning framework
//!
//! Video-style models run 2D convolutions over every frame of a sequence and then
//! mix information across frames. This crate provides the reshaping steps between
//! those two views, plus a couple of spatial helpers that are not yet available in
//! the core Burn framework.

use burn::prelude::*;

mod frames;
mod spatial;

// Convenient re-exports
pub use frames::{fold_time, stack_time, swap_channel_time, unfold_time, unstack_time};
pub use spatial::{broadcast_spatial, crop_spatial};

/// Additional operations for rank-5 frame tensors `[B, T, C, H, W]`
pub trait FrameOps<B: Backend> {
    /// Merge batch and time into one leading axis
    fn fold_time(self) -> Tensor<B, 4>;

    /// Stack the time axis into the channel axis
    fn stack_time(self) -> Tensor<B, 4>;

    /// Swap the channel and time axes
    fn swap_channel_time(self) -> Self;
}

impl<B: Backend> FrameOps<B> for Tensor<B, 5> {
    fn fold_time(self) -> Tensor<B, 4> {
        fold_time(self)
    }

    fn stack_time(self) -> Tensor<B, 4> {
        stack_time(self)
    }

    fn swap_channel_time(self) -> Self {
        swap_channel_time(self)
    }
}

/// Additional operations for rank-4 feature maps `[N, C, H, W]`
pub trait FeatureMapOps<B: Backend> {
    /// Split the leading axis into `[batch, time]`
    fn unfold_time(self, batch: usize) -> Tensor<B, 5>;

    /// Split the channel axis into `[time, channels]`
    fn unstack_time(self, time: usize) -> Tensor<B, 5>;

    /// Truncate the spatial axes to at most `size`
    fn crop_spatial(self, size: [usize; 2]) -> Self;

    /// Spatial `[height, width]` of the feature map
    fn spatial_dims(&self) -> [usize; 2];
}

impl<B: Backend> FeatureMapOps<B> for Tensor<B, 4> {
    fn unfold_time(self, batch: usize) -> Tensor<B, 5> {
        unfold_time(self, batch)
    }

    fn unstack_time(self, time: usize) -> Tensor<B, 5> {
        unstack_time(self, time)
    }

    fn crop_spatial(self, size: [usize; 2]) -> Self {
        crop_spatial(self, size)
    }

    fn spatial_dims(&self) -> [usize; 2] {
        let [_, _, h, w] = self.dims();
        [h, w]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{
        backend::{ndarray::NdArray, Autodiff},
        tensor::Tensor,
    };

    type TestBackend = Autodiff<NdArray<f32>>;

    #[test]
    fn test_frame_ops_chain() {
        let device = Default::default();
        let frames = Tensor::<TestBackend, 5>::random(
            [2, 4, 3, 9, 7],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );

        // (B, C, T, H, W) -> (B, T, C, H, W) -> per-frame maps and back
        let per_frame = frames.clone().swap_channel_time().fold_time();
        assert_eq!(per_frame.dims(), [6, 4, 9, 7]);
        assert_eq!(per_frame.spatial_dims(), [9, 7]);

        let restored = per_frame.unfold_time(2).swap_channel_time();
        assert_eq!(restored.dims(), frames.dims());
    }

    #[test]
    fn test_feature_map_ops_chain() {
        let device = Default::default();
        let frames = Tensor::<TestBackend, 5>::zeros([1, 3, 2, 8, 8], &device);

        let stacked = frames.stack_time().crop_spatial([5, 6]);
        assert_eq!(stacked.dims(), [1, 6, 5, 6]);
        assert_eq!(stacked.unstack_time(3).dims(), [1, 3, 2, 5, 6]);
    }
}
