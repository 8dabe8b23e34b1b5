//! Minimal host that drives a [`StyleTree`] over a directory.
//!
//! Every build walks the whole input tree; there is no incremental diffing.
//! With `persist` enabled, outputs are cached on disk and reused while the
//! source content and tree fingerprint are unchanged.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use stylegate_cache::{CacheEntry, CacheManager};
use tempfile::TempDir;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::tree::{ProcessedFile, StyleTree, TreeState};
use crate::{CheckerConfig, LinterError};

/// Summary of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
    /// Directory holding the output tree.
    pub directory: PathBuf,
    /// Output paths written, relative to `directory`, sorted.
    pub files: Vec<String>,
    /// Number of lines reported through the error log.
    pub problems: usize,
    /// Number of files served from the persisted cache.
    pub cache_hits: usize,
}

enum OutputTarget {
    Temporary(Vec<TempDir>),
    Fixed(PathBuf),
}

enum Entry {
    Source { relative: String, content: String },
    Copy { relative: String, path: PathBuf },
}

/// Builds output trees for a [`StyleTree`].
pub struct Builder<'a> {
    tree: &'a StyleTree,
    target: OutputTarget,
    cache: Option<CacheManager>,
    cache_loaded: bool,
}

impl<'a> Builder<'a> {
    /// Creates a builder writing each build to a fresh temporary directory.
    pub fn new(tree: &'a StyleTree) -> Self {
        Self {
            tree,
            target: OutputTarget::Temporary(Vec::new()),
            cache: Self::cache_for(tree),
            cache_loaded: false,
        }
    }

    /// Creates a builder writing into `directory`, which is emptied at the
    /// start of every build.
    pub fn with_output_dir(tree: &'a StyleTree, directory: impl Into<PathBuf>) -> Self {
        Self {
            tree,
            target: OutputTarget::Fixed(directory.into()),
            cache: Self::cache_for(tree),
            cache_loaded: false,
        }
    }

    fn cache_for(tree: &StyleTree) -> Option<CacheManager> {
        if !tree.options().persist {
            return None;
        }
        let dir = tree
            .options()
            .cache_dir
            .clone()
            .unwrap_or_else(|| default_cache_dir(tree.root()));
        Some(CacheManager::new(dir))
    }

    /// Runs one build pass.
    pub fn build(&mut self) -> Result<BuildResult, LinterError> {
        self.tree.set_state(TreeState::Processing);

        let directory = self.next_output_dir()?;
        let entries = self.collect_entries(&directory)?;
        self.load_cache();

        let fingerprint = self.tree.fingerprint();
        let tree = self.tree;
        let cache = self.cache.as_ref();

        let rendered: Vec<(String, String, ProcessedFile, bool)> = entries
            .par_iter()
            .filter_map(|entry| match entry {
                Entry::Source { relative, content } => Some((relative, content)),
                Entry::Copy { .. } => None,
            })
            .map(|(relative, content)| {
                let content_hash = CacheManager::hash_content(content);
                if let Some(hit) =
                    cache.and_then(|c| c.lookup(relative, &content_hash, &fingerprint))
                {
                    let processed = ProcessedFile {
                        output_path: hit.output_path.clone(),
                        content: hit.output.clone(),
                        log_lines: hit.log_lines.clone(),
                    };
                    return (relative.clone(), content_hash, processed, true);
                }
                let processed = tree.render(relative, content);
                (relative.clone(), content_hash, processed, false)
            })
            .collect();

        let mut files = Vec::with_capacity(entries.len());
        let mut problems = 0;
        let mut cache_hits = 0;

        for entry in &entries {
            if let Entry::Copy { relative, path } = entry {
                let destination = directory.join(relative);
                ensure_parent(&destination)?;
                fs::copy(path, &destination)?;
                files.push(relative.clone());
            }
        }

        for (relative, content_hash, processed, hit) in rendered {
            for line in &processed.log_lines {
                self.tree.log_error(line);
            }
            problems += processed.log_lines.len();

            let destination = directory.join(&processed.output_path);
            ensure_parent(&destination)?;
            fs::write(&destination, &processed.content)?;
            files.push(processed.output_path.clone());

            if hit {
                cache_hits += 1;
            } else if let Some(cache) = self.cache.as_mut() {
                cache.set(
                    relative,
                    CacheEntry::new(
                        content_hash,
                        fingerprint.clone(),
                        processed.output_path,
                        processed.content,
                        processed.log_lines,
                    ),
                );
            }
        }

        if let Some(cache) = self.cache.as_mut() {
            cache.retain_paths(entries.iter().filter_map(|entry| match entry {
                Entry::Source { relative, .. } => Some(relative.as_str()),
                Entry::Copy { .. } => None,
            }));
            if let Err(e) = cache.save() {
                warn!("Failed to save cache: {}", e);
            }
        }

        files.sort();
        info!(
            "Built {} files into {} ({} problems, {} cached)",
            files.len(),
            directory.display(),
            problems,
            cache_hits
        );

        self.tree.set_state(TreeState::OutputReady);

        Ok(BuildResult {
            directory,
            files,
            problems,
            cache_hits,
        })
    }

    /// Removes temporary output directories created by earlier builds.
    pub fn cleanup(&mut self) {
        if let OutputTarget::Temporary(dirs) = &mut self.target {
            dirs.clear();
        }
    }

    fn next_output_dir(&mut self) -> Result<PathBuf, LinterError> {
        match &mut self.target {
            OutputTarget::Temporary(dirs) => {
                let dir = tempfile::Builder::new().prefix("stylegate-out").tempdir()?;
                let path = dir.path().to_path_buf();
                dirs.push(dir);
                Ok(path)
            }
            OutputTarget::Fixed(path) => {
                reset_output_dir(path, self.tree.root())?;
                Ok(path.clone())
            }
        }
    }

    fn load_cache(&mut self) {
        if self.cache_loaded {
            return;
        }
        self.cache_loaded = true;
        if let Some(cache) = self.cache.as_mut()
            && let Err(e) = cache.load()
        {
            warn!("Failed to load cache: {}", e);
            cache.clear();
        }
    }

    fn collect_entries(&self, output_dir: &Path) -> Result<Vec<Entry>, LinterError> {
        let root = self.tree.root();
        if !root.is_dir() {
            return Err(LinterError::file(format!(
                "Input tree {} is not a directory",
                root.display()
            )));
        }

        let output_dir = output_dir.canonicalize().ok();
        let mut entries = Vec::new();

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                output_dir
                    .as_ref()
                    .is_none_or(|out| entry.path().canonicalize().ok().as_ref() != Some(out))
            });

        for entry in walker {
            let entry = entry.map_err(|e| LinterError::file(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let relative = relative_string(relative);

            if is_config_file(&relative) {
                debug!("Skipping config file {}", relative);
                continue;
            }

            if self.tree.handles(&relative) {
                let content = fs::read_to_string(entry.path())?;
                entries.push(Entry::Source { relative, content });
            } else {
                entries.push(Entry::Copy {
                    relative,
                    path: entry.path().to_path_buf(),
                });
            }
        }

        Ok(entries)
    }
}

/// Per-tree cache location under the system temp dir, keyed by the
/// absolute tree root.
fn default_cache_dir(root: &Path) -> PathBuf {
    let key = blake3::hash(root.to_string_lossy().as_bytes()).to_hex();
    std::env::temp_dir()
        .join("stylegate-cache")
        .join(&key.as_str()[..16])
}

/// Empties `dir` so it only ever holds the outputs of the current build.
fn reset_output_dir(dir: &Path, root: &Path) -> Result<(), LinterError> {
    if dir.exists() {
        let dir_canonical = dir.canonicalize()?;
        if root
            .canonicalize()
            .is_ok_and(|root| root.starts_with(&dir_canonical))
        {
            return Err(LinterError::file(format!(
                "Output directory {} contains the input tree {}",
                dir.display(),
                root.display()
            )));
        }
        debug!("Clearing output directory {}", dir.display());
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

fn relative_string(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_config_file(relative: &str) -> bool {
    CheckerConfig::CONFIG_FILES
        .iter()
        .any(|name| relative == *name || relative.ends_with(&format!("/{}", name)))
}

fn ensure_parent(path: &Path) -> Result<(), LinterError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TreeOptions;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_relative_string_uses_forward_slashes() {
        let path = Path::new("lib").join("nested").join("a.js");
        assert_eq!(relative_string(&path), "lib/nested/a.js");
    }

    #[test]
    fn test_is_config_file() {
        assert!(is_config_file(".stylegaterc"));
        assert!(is_config_file("nested/.stylegaterc.json"));
        assert!(!is_config_file("stylegaterc.js"));
    }

    #[test]
    fn test_build_copies_unhandled_files() {
        let input = tempdir().unwrap();
        fs::write(input.path().join("a.js"), "var a;\n").unwrap();
        fs::write(input.path().join("README.md"), "# readme").unwrap();

        let tree = StyleTree::new(input.path(), TreeOptions::new().config(json!({}))).unwrap();
        let mut builder = Builder::new(&tree);
        let result = builder.build().unwrap();

        assert_eq!(result.files, vec!["README.md", "a.stylegate-test.js"]);
        assert_eq!(
            fs::read_to_string(result.directory.join("README.md")).unwrap(),
            "# readme"
        );
        assert_eq!(tree.state(), TreeState::OutputReady);
    }

    #[test]
    fn test_cleanup_removes_temporary_output() {
        let input = tempdir().unwrap();
        fs::write(input.path().join("a.js"), "var a;\n").unwrap();

        let tree = StyleTree::new(input.path(), TreeOptions::new()).unwrap();
        let mut builder = Builder::new(&tree);
        let result = builder.build().unwrap();
        assert!(result.directory.exists());

        builder.cleanup();
        assert!(!result.directory.exists());
    }

    #[test]
    fn test_fixed_output_dir_inside_root_is_skipped() {
        let input = tempdir().unwrap();
        fs::write(input.path().join("a.js"), "var a;\n").unwrap();
        let out = input.path().join("dist");

        let tree = StyleTree::new(
            input.path(),
            TreeOptions::new().config(json!({})).disable_test_generator(true),
        )
        .unwrap();
        let mut builder = Builder::with_output_dir(&tree, &out);
        builder.build().unwrap();
        let second = builder.build().unwrap();

        assert_eq!(second.files, vec!["a.js"]);
        assert!(!out.join("dist").exists());
    }

    fn files_on_disk(dir: &Path) -> Vec<String> {
        let mut files: Vec<String> = WalkDir::new(dir)
            .into_iter()
            .map(|entry| entry.unwrap())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| relative_string(entry.path().strip_prefix(dir).unwrap()))
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_fixed_output_dir_drops_stale_outputs() {
        let input = tempdir().unwrap();
        let out = tempdir().unwrap();
        fs::write(input.path().join("a.js"), "var a;\n").unwrap();
        fs::write(input.path().join("b.js"), "var b;\n").unwrap();

        let tree = StyleTree::new(input.path(), TreeOptions::new().config(json!({}))).unwrap();
        let mut builder = Builder::with_output_dir(&tree, out.path());
        let first = builder.build().unwrap();
        assert_eq!(first.files, vec!["a.stylegate-test.js", "b.stylegate-test.js"]);

        fs::remove_file(input.path().join("b.js")).unwrap();
        let second = builder.build().unwrap();

        assert_eq!(second.files, vec!["a.stylegate-test.js"]);
        assert_eq!(files_on_disk(out.path()), second.files);
    }

    #[test]
    fn test_fixed_output_dir_follows_mode_change() {
        let input = tempdir().unwrap();
        let out = tempdir().unwrap();
        fs::write(input.path().join("a.js"), "var a;\n").unwrap();

        let generating =
            StyleTree::new(input.path(), TreeOptions::new().config(json!({}))).unwrap();
        Builder::with_output_dir(&generating, out.path()).build().unwrap();

        let passing = StyleTree::new(
            input.path(),
            TreeOptions::new().config(json!({})).disable_test_generator(true),
        )
        .unwrap();
        Builder::with_output_dir(&passing, out.path()).build().unwrap();

        assert_eq!(files_on_disk(out.path()), vec!["a.js"]);
    }

    #[test]
    fn test_output_dir_containing_input_is_rejected() {
        let outer = tempdir().unwrap();
        let input = outer.path().join("src");
        fs::create_dir_all(&input).unwrap();
        fs::write(input.join("a.js"), "var a;\n").unwrap();

        let tree = StyleTree::new(&input, TreeOptions::new()).unwrap();
        let result = Builder::with_output_dir(&tree, outer.path()).build();

        assert!(matches!(result, Err(LinterError::File(_))));
        assert!(input.join("a.js").exists());
    }

    #[test]
    fn test_default_cache_dir_is_per_root() {
        let a = default_cache_dir(Path::new("/work/a"));
        let b = default_cache_dir(Path::new("/work/b"));
        assert_ne!(a, b);
        assert!(a.starts_with(std::env::temp_dir().join("stylegate-cache")));
    }

    #[test]
    fn test_default_cache_dir_uses_absolute_root() {
        let relative = StyleTree::new(".", TreeOptions::new()).unwrap();
        let absolute =
            StyleTree::new(std::env::current_dir().unwrap(), TreeOptions::new()).unwrap();
        assert_eq!(
            default_cache_dir(relative.root()),
            default_cache_dir(absolute.root())
        );
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let input = tempdir().unwrap();
        let tree = StyleTree::new(input.path().join("nope"), TreeOptions::new()).unwrap();
        assert!(Builder::new(&tree).build().is_err());
    }
}
