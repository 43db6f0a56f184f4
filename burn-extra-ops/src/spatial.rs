//! # Spatial Helpers
//!
//! Cropping and broadcasting over the trailing `[height, width]` axes of NCHW feature maps.

use burn::prelude::*;

/// Truncates the trailing two axes to at most `size`.
///
/// Axes that are already no larger than the target are left untouched; the
/// tensor is never padded.
pub fn crop_spatial<B: Backend>(x: Tensor<B, 4>, size: [usize; 2]) -> Tensor<B, 4> {
    let [n, c, h, w] = x.dims();
    let [target_h, target_w] = size;
    if h <= target_h && w <= target_w {
        return x;
    }

    x.slice([0..n, 0..c, 0..h.min(target_h), 0..w.min(target_w)])
}

/// Replicates per-channel values across a spatial grid.
///
/// # Shapes
/// - input: `[B, C]`
/// - output: `[B, C, H, W]` with `[H, W] = size`
pub fn broadcast_spatial<B: Backend>(x: Tensor<B, 2>, size: [usize; 2]) -> Tensor<B, 4> {
    let [b, c] = x.dims();
    let [h, w] = size;
    x.reshape([b, c, 1, 1]).expand([b, c, h, w])
}
