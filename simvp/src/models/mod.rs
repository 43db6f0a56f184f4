//! # Model Architectures
//!
//! This module aggregates the components of the SimVP network:
//!
//! - `modules`: Building blocks such as strided and grouped convolutions, the inception
//!   module and the stride schedules.
//! - `encoder` / `decoder`: The per-frame spatial encoder and decoder.
//! - `translator` / `temporal`: The cross-frame translator, plain and time-conditioned.
//! - `simvp`: The top-level networks that tie the parts together.
//!
//! The components are re-exported for easy access from the parent `models` module.

pub mod decoder;
pub mod encoder;
pub mod modules;
pub mod simvp;
pub mod temporal;
pub mod translator;

pub use decoder::{SpatialDecoder, SpatialDecoderConfig};
pub use encoder::{SpatialEncoder, SpatialEncoderConfig, SpatialStage};
pub use simvp::{SimVp, SimVpRecord, SimVpTemporal, SimVpTemporalRecord};
pub use temporal::{TemporalTranslator, TemporalTranslatorConfig, TimeEmbedding, TimeEmbeddingConfig};
pub use translator::{Translator, TranslatorConfig, TranslatorStage};
