//! Configuration module for SimVP.
//!
//! This module provides the configuration structure and enums for the SimVP model.
//! It is organized into two submodules:
//! - `core`: Contains the main configuration structure and its validation
//! - `enums`: Contains the enumeration types used in the configuration

pub mod core;
pub mod enums;

pub use self::core::SimVpConfig;
pub use self::enums::StrideReversal;
