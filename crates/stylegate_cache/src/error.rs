//! Cache error types.

use thiserror::Error;

/// Errors that can occur in the cache system.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Cache is corrupted.
    #[error("Corrupted cache: {0}")]
    Corrupted(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CacheError {
    /// Creates a corrupted cache error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }
}
