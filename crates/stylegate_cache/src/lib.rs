//! # stylegate_cache
//!
//! Persistent output cache for stylegate builds.
//!
//! When a tree is built with `persist` enabled, every processed file is
//! recorded here together with the log lines it produced. A later build
//! reuses the entry when both the file content and the tree configuration
//! are unchanged, replaying the log lines instead of re-running the checker.
//!
//! ## Storage
//!
//! Entries are stored as a single JSON document (`cache.json`) inside the
//! cache directory.

mod entry;
mod error;
mod manager;

pub use entry::CacheEntry;
pub use error::CacheError;
pub use manager::CacheManager;
