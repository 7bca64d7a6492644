//! Error types for pipeline operations.

use thiserror::Error;

/// Error type shared by every pipeline stage.
///
/// Stages fail fast and hand the first error to the caller. The variants map
/// one-to-one onto the stage that raised them so callers can decide whether a
/// fresh upload, a different target column or a different model is needed.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed delimited text (missing header, ragged row).
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Dataset is empty or does not contain the requested column.
    #[error("Schema error: {0}")]
    Schema(String),

    /// A value could not be mapped during target or feature encoding.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Tensor shapes cannot be reconciled.
    #[error("Shape error ({context}): expected {expected}, got {got}")]
    Shape {
        expected: String,
        got: String,
        context: String,
    },

    /// Failure surfaced by the external training collaborator.
    #[error("Training error: {0}")]
    Training(String),

    /// Invalid configuration or hyperparameter value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PipelineError {
    /// Shorthand for a [`PipelineError::Shape`] error.
    pub fn shape(
        context: impl Into<String>,
        expected: impl Into<String>,
        got: impl Into<String>,
    ) -> Self {
        PipelineError::Shape {
            expected: expected.into(),
            got: got.into(),
            context: context.into(),
        }
    }

    /// Wraps an opaque collaborator failure with the pipeline step it happened in.
    pub fn training(step: &str, source: impl std::fmt::Display) -> Self {
        PipelineError::Training(format!("{}: {}", step, source))
    }
}

impl From<bincode::Error> for PipelineError {
    fn from(err: bincode::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        let line = err
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or_default();
        PipelineError::Parse {
            line,
            message: err.to_string(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_parse() {
        let err = PipelineError::Parse {
            line: 3,
            message: "expected 3 fields, got 2".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Parse error"));
        assert!(msg.contains("line 3"));
    }

    #[test]
    fn test_error_display_shape_names_both_shapes() {
        let err = PipelineError::shape("model output", "[n, 3]", "[n, 1]");
        let msg = err.to_string();
        assert!(msg.contains("[n, 3]"));
        assert!(msg.contains("[n, 1]"));
        assert!(msg.contains("model output"));
    }

    #[test]
    fn test_error_training_wraps_context() {
        let err = PipelineError::training("fit", "NaN loss");
        assert_eq!(err.to_string(), "Training error: fit: NaN loss");
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: PipelineError = io_err.into();
        assert!(matches!(err, PipelineError::Io(_)));
    }

    #[test]
    fn test_error_from_bincode_error() {
        let bad_bytes: &[u8] = &[0xff, 0xff, 0xff, 0xff];
        let bincode_result: std::result::Result<String, bincode::Error> =
            bincode::deserialize(bad_bytes);
        if let Err(e) = bincode_result {
            let err: PipelineError = e.into();
            assert!(matches!(err, PipelineError::Serialization(_)));
        }
    }

    #[test]
    fn test_error_is_std_error() {
        let err = PipelineError::Schema("test".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
