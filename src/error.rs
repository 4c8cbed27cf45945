// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed CSV: {0}")]
    MalformedCsv(String),

    #[error("Oracle returned {actual} rows for a batch of {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Transient oracle failure: {0}")]
    OracleTransient(String),

    #[error("Oracle throttled the request")]
    Throttled { retry_after: Option<Duration> },

    #[error("Unparseable oracle response: {0}")]
    OracleFormat(String),

    #[error("Oracle rejected request: {0}")]
    OracleRejected(String),

    #[error("Redaction failed after {attempts} attempt(s): {last}")]
    RedactionFailed {
        attempts: u32,
        last: Box<PipelineError>,
    },

    #[error("Storage operation failed for {bucket}/{key}: {message}")]
    Storage {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invocation deadline exceeded: {0}")]
    DeadlineExceeded(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Coarse error classification reported in per-object results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Config,
    MalformedCsv,
    ShapeMismatch,
    OracleTransient,
    OracleFormat,
    OracleRejected,
    Storage,
    Validation,
    DeadlineExceeded,
    Io,
    Serialization,
}

impl PipelineError {
    pub fn storage(bucket: &str, key: &str, message: impl Into<String>) -> Self {
        Self::Storage {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message: message.into(),
        }
    }

    /// Exhausted redactions report the kind of the error that ended the last attempt.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::MalformedCsv(_) => ErrorKind::MalformedCsv,
            Self::ShapeMismatch { .. } => ErrorKind::ShapeMismatch,
            Self::OracleTransient(_) | Self::Throttled { .. } => ErrorKind::OracleTransient,
            Self::OracleFormat(_) => ErrorKind::OracleFormat,
            Self::OracleRejected(_) => ErrorKind::OracleRejected,
            Self::RedactionFailed { last, .. } => last.kind(),
            Self::Storage { .. } | Self::FileOperation { .. } => ErrorKind::Storage,
            Self::Validation(_) => ErrorKind::Validation,
            Self::DeadlineExceeded(_) => ErrorKind::DeadlineExceeded,
            Self::Io(_) => ErrorKind::Io,
            Self::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// Whether the redaction client may spend another attempt on this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::OracleTransient(_)
                | Self::Throttled { .. }
                | Self::ShapeMismatch { .. }
                | Self::OracleFormat(_)
        )
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redaction_failed_reports_underlying_kind() {
        let err = PipelineError::RedactionFailed {
            attempts: 3,
            last: Box::new(PipelineError::ShapeMismatch {
                expected: 2,
                actual: 1,
            }),
        };

        assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("3 attempt(s)"));
    }

    #[test]
    fn test_retry_classification() {
        assert!(PipelineError::OracleTransient("503".into()).is_retryable());
        assert!(PipelineError::Throttled { retry_after: None }.is_retryable());
        assert!(PipelineError::OracleFormat("bad quote".into()).is_retryable());
        assert!(!PipelineError::OracleRejected("401".into()).is_retryable());
        assert!(!PipelineError::MalformedCsv("ragged".into()).is_retryable());
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::DeadlineExceeded).unwrap();
        assert_eq!(json, "\"deadline_exceeded\"");
    }
}
