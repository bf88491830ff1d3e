//! Error types for flag evaluation.

use std::time::Duration;

use thiserror::Error;

/// Errors produced while evaluating flags.
///
/// Per-flag failures (`Evaluation`, `Timeout`, `Panicked`) only reach the
/// caller of `evaluate_flags` under `fail_fast`. The remaining variants are
/// call-site misuse and are always returned.
#[derive(Error, Debug)]
pub enum FlagError {
    /// The flag's evaluation function returned an error.
    #[error("Flag '{key}' evaluation failed: {source}")]
    Evaluation {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// The flag did not settle before its deadline.
    #[error("Flag '{key}' timed out after {timeout:?}")]
    Timeout { key: String, timeout: Duration },

    /// The flag's evaluation task panicked.
    #[error("Flag '{0}' panicked during evaluation")]
    Panicked(String),

    /// The same key was passed twice in one batch.
    #[error("Flag '{0}' appears more than once in the batch")]
    DuplicateKey(String),

    /// Evaluation options are unusable.
    #[error("Invalid evaluation options: {0}")]
    InvalidOptions(String),
}

impl FlagError {
    /// Key of the flag that failed, if the error is about one flag.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Evaluation { key, .. } | Self::Timeout { key, .. } => Some(key),
            Self::Panicked(key) | Self::DuplicateKey(key) => Some(key),
            Self::InvalidOptions(_) => None,
        }
    }

    /// Whether this is a timeout rather than an outright failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type for flag operations.
pub type Result<T> = std::result::Result<T, FlagError>;
