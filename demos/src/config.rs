//! Run configuration for the SimVP tools.
//!
//! A `RunConfig` bundles the model hyperparameters with the settings of a synthetic
//! forward pass. It is stored as JSON; the `model` section has the same layout as a
//! config written by `SimVpConfig::save`.

use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use simvp_burn::SimVpConfig;

/// Configuration for `simvp forward` and friends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Model configuration.
    pub model: SimVpConfig,
    /// Number of samples per forward pass.
    pub batch_size: usize,
    /// Run the time-conditioned network.
    pub temporal: bool,
    /// Timestamp of the first history frame.
    pub start_time: DateTime<Utc>,
    /// Minutes between consecutive frames.
    pub step_minutes: i64,
    /// Seed for the backend random number generator.
    pub seed: u64,
    /// Burn record to load before running, if any.
    pub weights: Option<PathBuf>,
}

impl RunConfig {
    /// Wraps a model configuration with default run settings.
    pub fn for_model(model: SimVpConfig) -> Self {
        Self {
            model,
            batch_size: 1,
            temporal: false,
            start_time: Utc
                .with_ymd_and_hms(2022, 6, 21, 12, 0, 0)
                .single()
                .unwrap_or_default(),
            step_minutes: 15,
            seed: 42,
            weights: None,
        }
    }

    /// Reads a run configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Writes the configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).with_context(|| format!("failed to write config {}", path.display()))
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        // 11 SEVIRI channels, 12 frames of history, 12 frames of forecast
        Self::for_model(SimVpConfig::new(11, 12, 12))
    }
}
