//! Error types for the rich text engine.

use std::path::PathBuf;

use horizon_richtext_core::{TimerError, WorkerError};

/// Result type alias for rich text operations.
pub type Result<T> = std::result::Result<T, RichTextError>;

/// Errors surfaced by the document model, codecs and editor plumbing.
///
/// Position inputs are never an error: out-of-range positions are clamped
/// into the document. Undo or redo with an empty history is a no-op.
#[derive(Debug, thiserror::Error)]
pub enum RichTextError {
    /// Negative index or offset, or an otherwise malformed argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An edit was attempted on a model that is not writable.
    #[error("The model is not writable")]
    NotWritable,

    /// A text operation was invoked on a control without a model.
    #[error("No model is attached")]
    NoModel,

    /// The requested data format has no registered handler.
    #[error("Data format not supported: {0}")]
    NotSupported(String),

    /// Malformed serialized input. Nothing was materialized.
    #[error("Decode error at offset {offset}: {message}")]
    Decode { offset: usize, message: String },

    /// Editor configuration could not be parsed or serialized.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// File I/O error while loading or saving configuration.
    #[error("Failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Timer bookkeeping error.
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    /// Background worker error.
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),
}

impl RichTextError {
    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a decode error at a char offset of the input.
    pub fn decode(offset: usize, message: impl Into<String>) -> Self {
        Self::Decode {
            offset,
            message: message.into(),
        }
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_carries_offset() {
        let err = RichTextError::decode(17, "bad hex escape");
        assert_eq!(err.to_string(), "Decode error at offset 17: bad hex escape");
        assert!(matches!(err, RichTextError::Decode { offset: 17, .. }));
    }

    #[test]
    fn test_timer_error_converts() {
        let err: RichTextError = TimerError::InvalidTimerId.into();
        assert!(matches!(err, RichTextError::Timer(_)));
    }
}
