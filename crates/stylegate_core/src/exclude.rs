//! Exclude patterns and the per-path exclusion cache.

use std::collections::{BTreeMap, HashMap, HashSet};

use globset::{Glob, GlobSet, GlobSetBuilder};
use parking_lot::Mutex;
use tracing::debug;

use crate::LinterError;

/// Decides whether a relative path is excluded from linting.
pub trait PathMatcher: Send + Sync {
    /// Returns true if `relative_path` matches any exclude pattern.
    fn matches(&self, relative_path: &str) -> bool;
}

/// Matches relative paths against exact paths and glob patterns.
#[derive(Debug, Default)]
pub struct ExcludeMatcher {
    exact: HashSet<String>,
    globs: Option<GlobSet>,
}

impl ExcludeMatcher {
    /// Compiles `patterns`. Every pattern is tried both as an exact path
    /// and as a glob.
    pub fn new(patterns: &[String]) -> Result<Self, LinterError> {
        let exact = patterns
            .iter()
            .map(|p| normalize(p).to_string())
            .collect();

        Ok(Self {
            exact,
            globs: Self::build_globset(patterns)?,
        })
    }

    fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>, LinterError> {
        if patterns.is_empty() {
            return Ok(None);
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(normalize(pattern)).map_err(|e| {
                LinterError::config(format!("Invalid exclude pattern '{}': {}", pattern, e))
            })?;
            builder.add(glob);
        }

        let globset = builder
            .build()
            .map_err(|e| LinterError::config(format!("Failed to build globset: {}", e)))?;

        Ok(Some(globset))
    }
}

impl PathMatcher for ExcludeMatcher {
    fn matches(&self, relative_path: &str) -> bool {
        let path = normalize(relative_path);
        self.exact.contains(path)
            || self
                .globs
                .as_ref()
                .is_some_and(|globs| globs.is_match(path))
    }
}

fn normalize(path: &str) -> &str {
    path.strip_prefix("./").unwrap_or(path)
}

/// Memoizes exclusion decisions per relative path.
///
/// A decision is computed at most once per path for the lifetime of the
/// cache. The lock is held while a missing decision is computed, so
/// concurrent lookups of the same path still evaluate the matcher once.
#[derive(Debug, Default)]
pub struct ExcludeCache {
    entries: Mutex<HashMap<String, bool>>,
}

impl ExcludeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached decision for `relative_path`, computing it with
    /// `matcher` on first use.
    pub fn is_excluded(&self, relative_path: &str, matcher: &dyn PathMatcher) -> bool {
        let mut entries = self.entries.lock();
        if let Some(&excluded) = entries.get(relative_path) {
            return excluded;
        }

        let excluded = matcher.matches(relative_path);
        debug!("Exclusion of {} computed: {}", relative_path, excluded);
        entries.insert(relative_path.to_string(), excluded);
        excluded
    }

    /// Returns the cached decision without computing it.
    pub fn get(&self, relative_path: &str) -> Option<bool> {
        self.entries.lock().get(relative_path).copied()
    }

    /// Returns a sorted copy of every cached decision.
    pub fn snapshot(&self) -> BTreeMap<String, bool> {
        self.entries
            .lock()
            .iter()
            .map(|(path, excluded)| (path.clone(), *excluded))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn matcher(patterns: &[&str]) -> ExcludeMatcher {
        let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        ExcludeMatcher::new(&patterns).unwrap()
    }

    #[rstest]
    #[case("excluded-file.js", true)]
    #[case("./excluded-file.js", true)]
    #[case("some-excluded-thing.js", true)]
    #[case("lib/excluded/deep.js", true)]
    #[case("included.js", false)]
    fn test_exact_and_glob(#[case] path: &str, #[case] expected: bool) {
        let matcher = matcher(&["excluded-file.js", "*excluded*"]);
        assert_eq!(matcher.matches(path), expected);
    }

    #[test]
    fn test_empty_matcher_matches_nothing() {
        assert!(!matcher(&[]).matches("anything.js"));
    }

    #[test]
    fn test_exact_path_with_glob_metacharacters() {
        let matcher = matcher(&["vendor/[legacy].js"]);
        assert!(matcher.matches("vendor/[legacy].js"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = ExcludeMatcher::new(&["[invalid".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Invalid exclude pattern"));
    }

    struct Counting {
        calls: Arc<AtomicUsize>,
    }

    impl PathMatcher for Counting {
        fn matches(&self, relative_path: &str) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            relative_path.starts_with("skip")
        }
    }

    #[test]
    fn test_cache_computes_once_per_path() {
        let calls = Arc::new(AtomicUsize::new(0));
        let matcher = Counting {
            calls: Arc::clone(&calls),
        };
        let cache = ExcludeCache::new();

        for _ in 0..3 {
            assert!(cache.is_excluded("skip.js", &matcher));
            assert!(!cache.is_excluded("keep.js", &matcher));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.get("skip.js"), Some(true));
        assert_eq!(cache.get("other.js"), None);
        assert_eq!(
            cache.snapshot().into_iter().collect::<Vec<_>>(),
            vec![("keep.js".to_string(), false), ("skip.js".to_string(), true)]
        );
    }

    #[test]
    fn test_cache_concurrent_lookups() {
        let calls = Arc::new(AtomicUsize::new(0));
        let matcher = Arc::new(Counting {
            calls: Arc::clone(&calls),
        });
        let cache = Arc::new(ExcludeCache::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let matcher = Arc::clone(&matcher);
                std::thread::spawn(move || cache.is_excluded("skip.js", matcher.as_ref()))
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
