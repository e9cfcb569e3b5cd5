//! Error handling for audiorec
//!
//! Every fallible operation in the crate returns [`Result`]. Variants carry
//! enough context to be shown to a user directly, and each one maps to a
//! stable error code plus a short list of recovery suggestions.

use thiserror::Error;

/// Result type alias for audiorec operations
pub type Result<T> = std::result::Result<T, AudiorecError>;

/// Main error type for audiorec operations
#[derive(Error, Debug)]
pub enum AudiorecError {
    // Argument Errors
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    // File Errors
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // Device Errors
    #[error("Audio device error: {reason}")]
    Device { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AudiorecError {
    /// Shorthand for building an [`AudiorecError::InvalidInput`]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        AudiorecError::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Shorthand for building an [`AudiorecError::Device`]
    pub fn device(reason: impl std::fmt::Display) -> Self {
        AudiorecError::Device {
            reason: reason.to_string(),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            AudiorecError::InvalidInput { .. } => "INVALID_INPUT",
            AudiorecError::FileNotFound { .. } => "FILE_NOT_FOUND",
            AudiorecError::InvalidAudio { .. } => "INVALID_AUDIO",
            AudiorecError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            AudiorecError::Device { .. } => "DEVICE_ERROR",
            AudiorecError::Io(_) => "IO_ERROR",
            AudiorecError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            AudiorecError::InvalidInput { .. } => vec![
                "Sample rates, durations and channel counts must be positive",
                "Resampling needs at least two samples per channel",
            ],
            AudiorecError::FileNotFound { .. } => vec![
                "Check the file path is correct",
                "Verify the file hasn't been moved or deleted",
            ],
            AudiorecError::InvalidAudio { .. } => vec![
                "Check if the file plays in another application",
                "The file may be corrupted - try re-recording it",
            ],
            AudiorecError::UnsupportedFormat { .. } => vec![
                "Supported output formats: wav, npy",
                "Supported WAV input: 8/16/24/32-bit integer or 32-bit float",
            ],
            AudiorecError::Device { .. } => vec![
                "Check that a microphone is connected",
                "Run 'audiorec devices' to see available inputs",
                "Try a sample rate the device supports natively (44100 or 48000)",
            ],
            _ => vec![],
        }
    }
}

impl From<hound::Error> for AudiorecError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(io) => AudiorecError::Io(io),
            other => AudiorecError::InvalidAudio {
                reason: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}
