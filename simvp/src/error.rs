use thiserror::Error;

/// The error type for `SimVP-Burn` operations.
///
/// Construction of the network is fallible; the forward pass is not. Shape checks that
/// would otherwise surface as a panic inside the tensor engine are available through
/// `SimVp::check_input` and report [`SimVpError::InvalidTensorShape`].
#[derive(Error, Debug)]
pub enum SimVpError {
    /// Error for when an invalid model configuration is provided.
    /// This can happen if configuration parameters are zero, odd where an even value is
    /// needed, or logically inconsistent.
    #[error("Invalid model configuration: {reason}")]
    InvalidConfiguration {
        /// The reason why the configuration is invalid.
        reason: String,
    },

    /// Error for when the encoder and decoder stride schedules do not undo each other.
    #[error("Stride schedules do not compose: encoder {encoder:?}, decoder {decoder:?}")]
    StrideScheduleMismatch {
        /// Strides of the spatial encoder, first stage first.
        encoder: Vec<usize>,
        /// Strides of the spatial decoder, first stage first.
        decoder: Vec<usize>,
    },

    /// Error for when an input tensor has an invalid shape.
    #[error("Invalid input tensor shape: expected {expected}, got {actual}")]
    InvalidTensorShape {
        /// The expected tensor shape.
        expected: String,
        /// The actual tensor shape.
        actual: String,
    },

    /// Error for when loading model weights fails.
    #[error("Failed to load weights: {reason}")]
    WeightLoadingFailed {
        /// The reason for the weight loading failure.
        reason: String,
    },
}

/// A specialized `Result` type for `SimVP-Burn` operations.
pub type SimVpResult<T> = Result<T, SimVpError>;
