//! Error types for rule-catalog loading.

use thiserror::Error;

/// Errors from reading and parsing rule files.
#[derive(Debug, Error)]
pub enum RuleError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse/deserialization error.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result alias for loader operations.
pub type Result<T> = std::result::Result<T, RuleError>;
