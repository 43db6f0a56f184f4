//! # SimVP-Burn
//!
//! A Burn implementation of SimVP for satellite frame prediction.
//!
//! The network encodes every past frame with a strided convolutional encoder, mixes
//! the latents of all frames with an inception-based translator, and decodes them back
//! to frames with a mirrored decoder that reuses the first encoder stage as a skip
//! connection. A time-conditioned variant injects embedded time-of-day and day-of-year
//! features into the translator.
//!
//! ```no_run
//! use burn::backend::NdArray;
//! use burn::prelude::*;
//! use simvp_burn::SimVpConfig;
//!
//! let device = Default::default();
//! let model = SimVpConfig::new(11, 12, 12)
//!     .init::<NdArray>(&device)
//!     .expect("valid configuration");
//!
//! let frames = Tensor::<NdArray, 5>::zeros([1, 11, 12, 279, 386], &device);
//! let predicted = model.forward(frames);
//! assert_eq!(predicted.dims(), [1, 11, 12, 279, 386]);
//! ```

mod config;
mod error;
mod models;
mod weights;

pub use config::{SimVpConfig, StrideReversal};
pub use error::{SimVpError, SimVpResult};
pub use models::*;
pub use weights::PYTORCH_KEY_REMAPS;

#[cfg(feature = "pretrained")]
pub use weights::{load_pytorch_record, CheckpointFormat};
