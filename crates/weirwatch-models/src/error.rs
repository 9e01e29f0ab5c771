//! Error types for model parsing and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while parsing or validating model data.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid duration string: {0:?}")]
    DurationFormat(String),

    #[error("detection interval ends ({end}) before it starts ({start})")]
    IntervalOrder { start: String, end: String },

    #[error("invalid {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("detection file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl ModelError {
    /// Create a config validation error.
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
