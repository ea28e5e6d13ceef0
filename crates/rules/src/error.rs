//! Error types for rule loading and evaluation.

use simwatch_storage::StoreError;

/// Errors that can occur while loading or evaluating rules.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse/deserialization error.
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Rule validation error (bad pattern, zero consecutive count, duplicate names).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Message template failed to parse or render.
    #[error("Template error: {0}")]
    Template(String),

    /// Last-value query failed.
    #[error("Store query failed: {0}")]
    Store(#[from] StoreError),

    #[error("Unknown rule: {0}")]
    UnknownRule(String),
}

/// Result alias for rule operations.
pub type Result<T> = std::result::Result<T, RuleError>;
