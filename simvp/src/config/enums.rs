//! Enumeration types used in SimVP configurations.

use burn::prelude::*;

/// How the decoder's stride schedule is derived from the encoder's.
///
/// Both definitions agree for an even number of stages. For an odd number they differ:
/// `Mirror` still undoes the encoder's downsampling, while `SwapStart` upsamples more
/// often than the encoder downsampled and is rejected at validation time.
#[derive(Config, Debug, PartialEq)]
pub enum StrideReversal {
    /// Reverse the encoder schedule element by element.
    Mirror,
    /// Alternate `[2, 1]` from the first stage onwards.
    SwapStart,
}
