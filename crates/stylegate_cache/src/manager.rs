//! Cache manager for file-level output caching.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::{CacheEntry, CacheError};

const CACHE_FILE: &str = "cache.json";

/// Manages the persisted outputs of a tree.
pub struct CacheManager {
    /// Directory where the cache file is stored.
    cache_dir: PathBuf,
    /// In-memory cache entries, keyed by relative source path.
    entries: HashMap<String, CacheEntry>,
}

impl CacheManager {
    /// Creates a new cache manager.
    ///
    /// # Arguments
    ///
    /// * `cache_dir` - Directory to store the cache file
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            entries: HashMap::new(),
        }
    }

    /// Computes the BLAKE3 hash of content.
    pub fn hash_content(content: &str) -> String {
        blake3::hash(content.as_bytes()).to_hex().to_string()
    }

    /// Returns the entry for `relative_path` if it matches the given hashes.
    pub fn lookup(
        &self,
        relative_path: &str,
        content_hash: &str,
        config_hash: &str,
    ) -> Option<&CacheEntry> {
        match self.entries.get(relative_path) {
            Some(entry) if entry.is_valid(content_hash, config_hash) => {
                debug!("Cache hit for {}", relative_path);
                Some(entry)
            }
            Some(_) => {
                debug!("Stale cache entry for {}", relative_path);
                None
            }
            None => None,
        }
    }

    /// Stores a cache entry for a file.
    pub fn set(&mut self, relative_path: impl Into<String>, entry: CacheEntry) {
        self.entries.insert(relative_path.into(), entry);
    }

    /// Drops entries whose source no longer exists in the tree.
    pub fn retain_paths<'a>(&mut self, live: impl IntoIterator<Item = &'a str>) {
        let live: std::collections::HashSet<&str> = live.into_iter().collect();
        self.entries.retain(|path, _| live.contains(path.as_str()));
    }

    /// Clears all cache entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Loads cache from disk.
    pub fn load(&mut self) -> Result<(), CacheError> {
        let cache_file = self.cache_dir.join(CACHE_FILE);

        if !cache_file.exists() {
            debug!("No cache file found at {}", cache_file.display());
            return Ok(());
        }

        let content = fs::read_to_string(&cache_file)?;
        let entries: HashMap<String, CacheEntry> =
            serde_json::from_str(&content).map_err(|e| CacheError::corrupted(e.to_string()))?;

        info!("Loaded {} cache entries", entries.len());
        self.entries = entries;

        Ok(())
    }

    /// Saves cache to disk.
    pub fn save(&self) -> Result<(), CacheError> {
        fs::create_dir_all(&self.cache_dir)?;

        let cache_file = self.cache_dir.join(CACHE_FILE);
        let json = serde_json::to_string(&self.entries)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;

        fs::write(&cache_file, json)?;

        info!(
            "Saved {} cache entries to {}",
            self.entries.len(),
            cache_file.display()
        );

        Ok(())
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn entry(content_hash: &str) -> CacheEntry {
        CacheEntry::new(
            content_hash.to_string(),
            "config".to_string(),
            "a.stylegate-test.js".to_string(),
            "ok(true);".to_string(),
            vec!["a.js: 1 Illegal trailing whitespace".to_string()],
        )
    }

    #[test]
    fn test_cache_manager_new() {
        let manager = CacheManager::new("/tmp/test-cache");
        assert!(manager.is_empty());
    }

    #[test]
    fn test_cache_manager_set_lookup() {
        let mut manager = CacheManager::new("/tmp/test-cache");
        manager.set("a.js", entry("hash"));

        assert!(manager.lookup("a.js", "hash", "config").is_some());
        assert!(manager.lookup("a.js", "changed", "config").is_none());
        assert!(manager.lookup("b.js", "hash", "config").is_none());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_cache_manager_retain_paths() {
        let mut manager = CacheManager::new("/tmp/test-cache");
        manager.set("a.js", entry("hash"));
        manager.set("b.js", entry("hash"));

        manager.retain_paths(["b.js"]);

        assert!(manager.lookup("a.js", "hash", "config").is_none());
        assert!(manager.lookup("b.js", "hash", "config").is_some());
    }

    #[test]
    fn test_cache_manager_save_and_load() {
        let dir = tempdir().unwrap();
        let mut manager = CacheManager::new(dir.path());
        manager.set("a.js", entry("hash"));
        manager.save().unwrap();

        let mut reloaded = CacheManager::new(dir.path());
        reloaded.load().unwrap();

        let cached = reloaded.lookup("a.js", "hash", "config").unwrap();
        assert_eq!(cached.log_lines, vec!["a.js: 1 Illegal trailing whitespace"]);
    }

    #[test]
    fn test_cache_manager_load_missing_file() {
        let dir = tempdir().unwrap();
        let mut manager = CacheManager::new(dir.path().join("nope"));
        assert!(manager.load().is_ok());
        assert!(manager.is_empty());
    }

    #[test]
    fn test_cache_manager_load_corrupted() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CACHE_FILE), "{ not json").unwrap();

        let mut manager = CacheManager::new(dir.path());
        let err = manager.load().unwrap_err();
        assert!(matches!(err, CacheError::Corrupted(_)));
    }

    #[test]
    fn test_hash_content() {
        let hash1 = CacheManager::hash_content("hello");
        let hash2 = CacheManager::hash_content("hello");
        let hash3 = CacheManager::hash_content("world");

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
    }
}
