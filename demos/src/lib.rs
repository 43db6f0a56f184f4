//! SimVP Tools
//!
//! Command-line helpers around the `simvp-burn` library: inspecting a model
//! configuration, running a forward pass on synthetic frames, and converting PyTorch
//! checkpoints.
//!
//! ## Usage
//!
//! ```bash
//! # Write a config for 11-channel 279x386 frames with 12 history steps
//! cargo run --bin simvp -- init-config --output simvp.json --channels 11 --history 12
//!
//! # Print schedules, latent size and parameter count
//! cargo run --bin simvp -- info --config simvp.json
//!
//! # Time a forward pass of the time-conditioned network
//! cargo run --release --bin simvp -- -v forward --config simvp.json --temporal
//!
//! # Convert a PyTorch Lightning checkpoint
//! cargo run --features pretrained --bin simvp -- convert \
//!     --input epoch=9.ckpt --output simvp --config simvp.json --lightning
//! ```

pub mod backend;
pub mod config;
pub mod synthetic;

pub use backend::{create_device, get_backend_name, SelectedBackend, SelectedDevice};
pub use config::RunConfig;
pub use synthetic::{random_frames, time_features, time_features_tensor};
