//! The style tree: one adapter instance wired into a build pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::checker::{Diagnostic, ParseError, StyleChecker};
use crate::exclude::{ExcludeCache, ExcludeMatcher, PathMatcher};
use crate::options::ErrorLogger;
use crate::resolver::{ConfigResolver, ResolvedConfig};
use crate::rules::BuiltinChecker;
use crate::test_generator::generate_test;
use crate::{CheckerConfig, LinterError, TreeOptions};

/// Lifecycle of a tree instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeState {
    Constructed,
    ConfigResolved,
    Processing,
    OutputReady,
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Linting is bypassed for the whole tree.
    Bypassed,
    /// The path matched an exclude pattern.
    Excluded,
    /// The checker could not analyze the file.
    Unparsable(ParseError),
    /// The checker ran; the list may be empty.
    Checked(Vec<Diagnostic>),
}

/// Output produced for one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedFile {
    /// Output path relative to the output root.
    pub output_path: String,
    /// Output content.
    pub content: String,
    /// Lines to report through the error log, in order.
    pub log_lines: Vec<String>,
}

/// Runs a style checker over the files of a tree and produces either the
/// original sources or proxy tests.
pub struct StyleTree {
    root: PathBuf,
    options: TreeOptions,
    resolved: ResolvedConfig,
    checker: Arc<dyn StyleChecker>,
    matcher: Box<dyn PathMatcher>,
    exclude_cache: ExcludeCache,
    logger: ErrorLogger,
    state: Mutex<TreeState>,
    target_extension: String,
    extensions: Vec<String>,
}

impl StyleTree {
    /// Creates a tree using the built-in checker.
    pub fn new(root: impl Into<PathBuf>, options: TreeOptions) -> Result<Self, LinterError> {
        Self::with_checker(root, options, Arc::new(BuiltinChecker::new()))
    }

    /// Creates a tree using `checker`.
    ///
    /// Configuration is resolved here, once; a malformed explicit config
    /// fails construction. A relative `root` is made absolute against the
    /// working directory.
    pub fn with_checker(
        root: impl Into<PathBuf>,
        options: TreeOptions,
        checker: Arc<dyn StyleChecker>,
    ) -> Result<Self, LinterError> {
        let root = std::path::absolute(root.into())?;
        let state = Mutex::new(TreeState::Constructed);

        let resolved = ConfigResolver::resolve(&root, &options)?;

        let mut patterns = options.exclude_files.clone();
        if let Some(config) = resolved.config() {
            checker.configure(config)?;
            patterns.extend(config.exclude_files.iter().cloned());
        }
        let matcher = Box::new(ExcludeMatcher::new(&patterns)?);

        let extensions = resolved
            .config()
            .map(|config| {
                config
                    .extensions()
                    .into_iter()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_else(|| {
                CheckerConfig::new()
                    .extensions()
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            })
            .into_iter()
            .collect();

        let target_extension = if options.disable_test_generator {
            "js".to_string()
        } else {
            format!("{}-test.js", checker.name())
        };

        *state.lock() = TreeState::ConfigResolved;

        Ok(Self {
            root,
            logger: options.logger(),
            options,
            resolved,
            checker,
            matcher,
            exclude_cache: ExcludeCache::new(),
            state,
            target_extension,
            extensions,
        })
    }

    /// Replaces the exclude matcher.
    pub fn with_matcher(mut self, matcher: impl PathMatcher + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    pub fn resolved_config(&self) -> &ResolvedConfig {
        &self.resolved
    }

    /// True when no config was found or linting is disabled.
    pub fn bypass(&self) -> bool {
        self.resolved.is_bypass()
    }

    /// Extension given to output files.
    pub fn target_extension(&self) -> &str {
        &self.target_extension
    }

    pub fn checker_name(&self) -> &str {
        self.checker.name()
    }

    pub fn exclude_cache(&self) -> &ExcludeCache {
        &self.exclude_cache
    }

    pub fn state(&self) -> TreeState {
        *self.state.lock()
    }

    pub(crate) fn set_state(&self, state: TreeState) {
        *self.state.lock() = state;
    }

    /// Returns true if `relative_path` has an extension this tree processes.
    pub fn handles(&self, relative_path: &str) -> bool {
        let Some(ext) = Path::new(relative_path)
            .extension()
            .and_then(|ext| ext.to_str())
        else {
            return false;
        };
        self.extensions
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(ext))
    }

    /// Returns true if `relative_path` is excluded from linting. Computed once
    /// per path and cached for the lifetime of the tree.
    pub fn should_exclude_file(&self, relative_path: &str) -> bool {
        self.exclude_cache
            .is_excluded(relative_path, self.matcher.as_ref())
    }

    /// Lints one file without producing output or logging.
    pub fn lint(&self, content: &str, relative_path: &str) -> FileOutcome {
        let ResolvedConfig::Active { config, esnext, .. } = &self.resolved else {
            return FileOutcome::Bypassed;
        };

        if self.should_exclude_file(relative_path) {
            debug!("Excluded {}", relative_path);
            return FileOutcome::Excluded;
        }

        match self.checker.check(content, relative_path, config, *esnext) {
            Ok(mut diagnostics) => {
                if let Some(max) = config.max_errors {
                    diagnostics.truncate(max);
                }
                FileOutcome::Checked(diagnostics)
            }
            Err(err) => {
                warn!("Could not check {}: {}", relative_path, err);
                FileOutcome::Unparsable(err)
            }
        }
    }

    /// Produces the output for one file without logging.
    pub fn render(&self, relative_path: &str, content: &str) -> ProcessedFile {
        let outcome = self.lint(content, relative_path);
        let log_lines: Vec<String> = match &outcome {
            FileOutcome::Checked(diagnostics) => diagnostics
                .iter()
                .map(|d| d.log_line(relative_path))
                .collect(),
            _ => Vec::new(),
        };

        let generate = !self.options.disable_test_generator;
        let output = match (&outcome, generate) {
            (FileOutcome::Checked(_), true) => {
                generate_test(self.checker.name(), relative_path, &log_lines)
            }
            (FileOutcome::Excluded | FileOutcome::Unparsable(_), true) => String::new(),
            _ => content.to_string(),
        };

        ProcessedFile {
            output_path: self.output_path(relative_path),
            content: output,
            log_lines,
        }
    }

    /// Processes one file, reporting its problems through the error log.
    pub fn process(&self, relative_path: &str, content: &str) -> ProcessedFile {
        let processed = self.render(relative_path, content);
        for line in &processed.log_lines {
            self.log_error(line);
        }
        processed
    }

    /// Processes one file and returns only the output content.
    pub fn process_string(&self, content: &str, relative_path: &str) -> String {
        self.process(relative_path, content).content
    }

    /// Sends one line to the error log.
    pub fn log_error(&self, line: &str) {
        (self.logger)(line);
    }

    /// Output path for `relative_path` under the current mode.
    pub fn output_path(&self, relative_path: &str) -> String {
        if self.options.disable_test_generator {
            return relative_path.to_string();
        }
        match relative_path.rfind('.') {
            Some(dot) if !relative_path[dot..].contains('/') => {
                format!("{}.{}", &relative_path[..dot], self.target_extension)
            }
            _ => format!("{}.{}", relative_path, self.target_extension),
        }
    }

    /// Fingerprint of everything that influences output, for persisted caches.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.checker.name().as_bytes());
        hasher.update(self.target_extension.as_bytes());
        match &self.resolved {
            ResolvedConfig::Active { config, esnext, .. } => {
                let mode: &[u8] = if *esnext { b"esnext" } else { b"es5" };
                hasher.update(config.hash().as_bytes());
                hasher.update(mode);
            }
            ResolvedConfig::Bypass(_) => {
                hasher.update(b"bypass");
            }
        }
        for pattern in &self.options.exclude_files {
            hasher.update(pattern.as_bytes());
            hasher.update(b"\0");
        }
        hasher.finalize().to_hex().to_string()
    }
}
