//! Cache entry types.

use serde::{Deserialize, Serialize};

/// A cache entry for a single processed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Hash of the source content.
    pub content_hash: String,

    /// Fingerprint of the tree configuration used.
    pub config_hash: String,

    /// Relative path of the produced output file.
    pub output_path: String,

    /// Produced output content.
    pub output: String,

    /// Lines reported through the error log while processing this file.
    #[serde(default)]
    pub log_lines: Vec<String>,

    /// Timestamp when this entry was created.
    pub created_at: u64,
}

impl CacheEntry {
    /// Creates a new cache entry.
    pub fn new(
        content_hash: String,
        config_hash: String,
        output_path: String,
        output: String,
        log_lines: Vec<String>,
    ) -> Self {
        Self {
            content_hash,
            config_hash,
            output_path,
            output,
            log_lines,
            created_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }

    /// Checks if this entry still describes the given content and configuration.
    pub fn is_valid(&self, content_hash: &str, config_hash: &str) -> bool {
        self.content_hash == content_hash && self.config_hash == config_hash
    }
}
