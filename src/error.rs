//! Error handling for the enhancement pipeline
//!
//! Every stage fails fast: errors propagate to `main` and abort the run.

use thiserror::Error;

use crate::neural::SchemaReport;

/// Result type alias for enhancement operations
pub type Result<T> = std::result::Result<T, EnhanceError>;

/// Main error type for enhancement operations
#[derive(Error, Debug)]
pub enum EnhanceError {
    // File Errors
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid audio file {path}: {reason}")]
    InvalidAudio {
        path: String,
        reason: String,
        #[source]
        source: Option<hound::Error>,
    },

    #[error("Failed to write audio file: {path}")]
    AudioWrite {
        path: String,
        #[source]
        source: hound::Error,
    },

    // Model Errors
    #[error("Invalid checkpoint {path}: {reason}")]
    InvalidCheckpoint { path: String, reason: String },

    #[error("Checkpoint does not match model structure: {report}")]
    SchemaMismatch { report: SchemaReport },

    #[error("Model backend unavailable: {backend}")]
    BackendUnavailable { backend: String },

    #[error("Inference failed: {reason}")]
    Inference { reason: String },

    // Signal Errors
    #[error("Precondition failed: {reason}")]
    PreconditionFailed { reason: String },

    #[error("Signal too short: {samples} samples (minimum {minimum})")]
    SignalTooShort { samples: usize, minimum: usize },

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Window envelope vanishes at sample {index} (overlap-add is not invertible)")]
    InvalidWindow { index: usize },

    // Library Errors
    #[error("Tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl EnhanceError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            EnhanceError::FileNotFound { .. } => "FILE_NOT_FOUND",
            EnhanceError::InvalidAudio { .. } => "INVALID_AUDIO",
            EnhanceError::AudioWrite { .. } => "IO_ERROR",
            EnhanceError::InvalidCheckpoint { .. } => "INVALID_CHECKPOINT",
            EnhanceError::SchemaMismatch { .. } => "SCHEMA_MISMATCH",
            EnhanceError::BackendUnavailable { .. } => "BACKEND_UNAVAILABLE",
            EnhanceError::Inference { .. } => "INFERENCE_ERROR",
            EnhanceError::PreconditionFailed { .. } => "PRECONDITION_FAILED",
            EnhanceError::SignalTooShort { .. } => "SIGNAL_TOO_SHORT",
            EnhanceError::ShapeMismatch { .. } => "SHAPE_MISMATCH",
            EnhanceError::InvalidWindow { .. } => "INVALID_WINDOW",
            EnhanceError::Tensor(_) => "TENSOR_ERROR",
            EnhanceError::Io(_) => "IO_ERROR",
            EnhanceError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            EnhanceError::FileNotFound { .. } => vec![
                "Check the file path is correct",
                "Paths are resolved relative to the working directory",
            ],
            EnhanceError::PreconditionFailed { .. } => vec![
                "Convert the input to mono 16 kHz before enhancing",
                "Resampling is not performed automatically",
            ],
            EnhanceError::SchemaMismatch { .. } => vec![
                "Make sure the checkpoint was trained for this model",
                "Run 'speech-enhance inspect <checkpoint>' to list its parameters",
            ],
            EnhanceError::BackendUnavailable { .. } => vec![
                "Rebuild with '--features onnx' to enable the ONNX backend",
                "Use '--backend passthrough' to verify the signal path",
            ],
            EnhanceError::AudioWrite { .. } | EnhanceError::Io(_) => vec![
                "Check the output directory exists and is writable",
            ],
            _ => vec![],
        }
    }
}

#[cfg(feature = "onnx")]
impl From<ort::Error> for EnhanceError {
    fn from(err: ort::Error) -> Self {
        EnhanceError::Inference {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = EnhanceError::FileNotFound {
            path: "mix.wav".to_string(),
        };
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");

        let err = EnhanceError::PreconditionFailed {
            reason: "sample rate 8000 Hz".to_string(),
        };
        assert_eq!(err.error_code(), "PRECONDITION_FAILED");
    }

    #[test]
    fn test_write_failures_share_io_code() {
        let err = EnhanceError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        ));
        assert_eq!(err.error_code(), "IO_ERROR");
        assert!(!err.recovery_suggestions().is_empty());
    }

    #[test]
    fn test_schema_mismatch_message() {
        let report = SchemaReport {
            missing: vec!["encoder.weight".to_string()],
            ..Default::default()
        };
        let err = EnhanceError::SchemaMismatch { report };
        assert!(err.to_string().contains("encoder.weight"));
        assert_eq!(err.error_code(), "SCHEMA_MISMATCH");
    }
}
