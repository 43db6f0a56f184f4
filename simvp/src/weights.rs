//! # PyTorch Weight Import
//!
//! Maps checkpoints of the PyTorch SimVP implementation onto this crate's module tree.
//!
//! PyTorch keys follow the original `nn.Sequential` nesting, e.g.
//! `enc.encoder_layers.1.model.model.0.weight`, while the Burn modules name their
//! fields, e.g. `encoder.layers.1.block.conv.weight`. [`PYTORCH_KEY_REMAPS`] rewrites
//! one into the other. Patterns are applied in order, each to the result of the
//! previous ones.
//!
//! Only the plain network can be imported. Checkpoints of the time-conditioned variant
//! have no per-stage projections to map from.

/// Regex key remaps `(pattern, replacement)` from PyTorch to Burn names.
pub const PYTORCH_KEY_REMAPS: &[(&str, &str)] = &[
    // LightningModule wrapper
    (r"^model\.(.+)", "$1"),
    // Spatial encoder
    (
        r"^enc\.encoder_layers\.([0-9]+)\.model\.model\.0\.(.+)",
        "encoder.layers.$1.block.conv.$2",
    ),
    (
        r"^enc\.encoder_layers\.([0-9]+)\.model\.model\.1\.(.+)",
        "encoder.layers.$1.block.norm.$2",
    ),
    // Spatial decoder
    (
        r"^dec\.decoder_layers\.([0-9]+)\.model\.model\.0\.(.+)",
        "decoder.layers.$1.block.conv.$2",
    ),
    (
        r"^dec\.decoder_layers\.([0-9]+)\.model\.model\.1\.(.+)",
        "decoder.layers.$1.block.norm.$2",
    ),
    (r"^dec\.readout\.(.+)", "decoder.readout.$1"),
    // Translator
    (
        r"^hid\.enc\.([0-9]+)\.conv1\.(.+)",
        "translator.encoder.$1.conv1.$2",
    ),
    (
        r"^hid\.enc\.([0-9]+)\.layers\.([0-9]+)\.model\.0\.(.+)",
        "translator.encoder.$1.branches.$2.conv.$3",
    ),
    (
        r"^hid\.enc\.([0-9]+)\.layers\.([0-9]+)\.model\.1\.(.+)",
        "translator.encoder.$1.branches.$2.norm.$3",
    ),
    (
        r"^hid\.dec\.([0-9]+)\.conv1\.(.+)",
        "translator.decoder.$1.conv1.$2",
    ),
    (
        r"^hid\.dec\.([0-9]+)\.layers\.([0-9]+)\.model\.0\.(.+)",
        "translator.decoder.$1.branches.$2.conv.$3",
    ),
    (
        r"^hid\.dec\.([0-9]+)\.layers\.([0-9]+)\.model\.1\.(.+)",
        "translator.decoder.$1.branches.$2.norm.$3",
    ),
];

#[cfg(feature = "pretrained")]
mod pytorch {
    use std::path::Path;

    use burn::{
        prelude::*,
        record::{FullPrecisionSettings, Recorder},
    };
    use burn_import::pytorch::{LoadArgs, PyTorchFileRecorder};

    use super::PYTORCH_KEY_REMAPS;
    use crate::{
        error::{SimVpError, SimVpResult},
        models::{SimVp, SimVpRecord},
    };

    /// Layout of a PyTorch checkpoint file.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum CheckpointFormat {
        /// A bare `state_dict` saved with `torch.save(model.state_dict())`.
        StateDict,
        /// A PyTorch Lightning checkpoint with the weights under `state_dict`.
        Lightning,
    }

    /// Loads a `SimVp` record from a PyTorch checkpoint.
    ///
    /// # Errors
    ///
    /// Returns `Err(SimVpError::WeightLoadingFailed)` if the file cannot be read or its
    /// tensors do not fit the module tree.
    pub fn load_pytorch_record<B: Backend>(
        path: &Path,
        format: CheckpointFormat,
        device: &B::Device,
    ) -> SimVpResult<SimVpRecord<B>> {
        let mut load_args = LoadArgs::new(path.to_path_buf());
        if format == CheckpointFormat::Lightning {
            load_args = load_args.with_top_level_key("state_dict");
        }
        for (pattern, replacement) in PYTORCH_KEY_REMAPS {
            load_args = load_args.with_key_remap(pattern, replacement);
        }

        PyTorchFileRecorder::<FullPrecisionSettings>::default()
            .load(load_args, device)
            .map_err(|e| SimVpError::WeightLoadingFailed {
                reason: format!("PyTorch checkpoint {}: {e}", path.display()),
            })
    }

    impl<B: Backend> SimVp<B> {
        /// Replaces the parameters with those of a PyTorch checkpoint.
        ///
        /// # Errors
        ///
        /// Returns `Err(SimVpError::WeightLoadingFailed)` if the checkpoint cannot be loaded.
        pub fn load_pytorch(
            self,
            path: &Path,
            format: CheckpointFormat,
            device: &B::Device,
        ) -> SimVpResult<Self> {
            let record = load_pytorch_record(path, format, device)?;
            tracing::info!(checkpoint = %path.display(), ?format, "loaded PyTorch weights");
            Ok(self.load_record(record))
        }
    }
}

#[cfg(feature = "pretrained")]
pub use pytorch::{load_pytorch_record, CheckpointFormat};

#[cfg(test)]
mod tests {
    use super::PYTORCH_KEY_REMAPS;
    use regex::Regex;

    fn remap(key: &str) -> String {
        PYTORCH_KEY_REMAPS
            .iter()
            .fold(key.to_string(), |key, (pattern, replacement)| {
                let pattern = Regex::new(pattern).unwrap();
                pattern.replace_all(&key, *replacement).into_owned()
            })
    }

    #[test]
    fn test_all_patterns_compile() {
        for (pattern, _) in PYTORCH_KEY_REMAPS {
            assert!(Regex::new(pattern).is_ok(), "{pattern}");
        }
    }

    #[test]
    fn test_spatial_keys() {
        assert_eq!(
            remap("enc.encoder_layers.0.model.model.0.weight"),
            "encoder.layers.0.block.conv.weight"
        );
        assert_eq!(
            remap("enc.encoder_layers.3.model.model.1.bias"),
            "encoder.layers.3.block.norm.bias"
        );
        assert_eq!(
            remap("dec.decoder_layers.2.model.model.0.bias"),
            "decoder.layers.2.block.conv.bias"
        );
        assert_eq!(remap("dec.readout.weight"), "decoder.readout.weight");
    }

    #[test]
    fn test_translator_keys() {
        assert_eq!(
            remap("hid.enc.0.conv1.weight"),
            "translator.encoder.0.conv1.weight"
        );
        assert_eq!(
            remap("hid.enc.7.layers.3.model.0.weight"),
            "translator.encoder.7.branches.3.conv.weight"
        );
        assert_eq!(
            remap("hid.dec.1.layers.0.model.1.weight"),
            "translator.decoder.1.branches.0.norm.weight"
        );
        assert_eq!(
            remap("hid.dec.10.conv1.bias"),
            "translator.decoder.10.conv1.bias"
        );
    }

    #[test]
    fn test_lightning_prefix() {
        assert_eq!(
            remap("model.hid.enc.2.layers.1.model.0.bias"),
            "translator.encoder.2.branches.1.conv.bias"
        );
        assert_eq!(remap("model.dec.readout.bias"), "decoder.readout.bias");
    }
}
