//! Linter error types.

use thiserror::Error;

/// Errors that can occur while resolving configuration or building a tree.
#[derive(Debug, Error)]
pub enum LinterError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O error with context.
    #[error("File error: {0}")]
    File(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LinterError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a file error.
    pub fn file(message: impl Into<String>) -> Self {
        Self::File(message.into())
    }
}
