//! Tree construction options.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tracing::error;

/// Sink receiving one formatted line per reported problem.
pub type ErrorLogger = Arc<dyn Fn(&str) + Send + Sync>;

/// Options fixed when a tree is constructed.
#[derive(Clone)]
pub struct TreeOptions {
    /// Globally switches linting and logging on or off.
    pub enabled: bool,

    /// Parser mode. When unset the config's own `esnext` key applies.
    pub esnext: Option<bool>,

    /// Inline rule object. Takes precedence over any config file.
    pub config: Option<Value>,

    /// Explicit config file location.
    pub config_path: Option<PathBuf>,

    /// Emit the original sources instead of proxy tests.
    pub disable_test_generator: bool,

    /// Problem sink. Defaults to the `tracing` error level.
    pub log_error: Option<ErrorLogger>,

    /// Additional exclude patterns, merged with the config's `excludeFiles`.
    pub exclude_files: Vec<String>,

    /// Keep processed outputs on disk between builds.
    pub persist: bool,

    /// Where persisted outputs live.
    pub cache_dir: Option<PathBuf>,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            esnext: None,
            config: None,
            config_path: None,
            disable_test_generator: false,
            log_error: None,
            exclude_files: Vec::new(),
            persist: false,
            cache_dir: None,
        }
    }
}

impl TreeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn esnext(mut self, esnext: bool) -> Self {
        self.esnext = Some(esnext);
        self
    }

    pub fn config(mut self, config: Value) -> Self {
        self.config = Some(config);
        self
    }

    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn disable_test_generator(mut self, disable: bool) -> Self {
        self.disable_test_generator = disable;
        self
    }

    pub fn log_error(mut self, sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.log_error = Some(Arc::new(sink));
        self
    }

    pub fn exclude_files<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_files = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Returns the configured sink or the default one.
    pub(crate) fn logger(&self) -> ErrorLogger {
        self.log_error
            .clone()
            .unwrap_or_else(|| Arc::new(|message: &str| error!("{}", message)))
    }
}

impl fmt::Debug for TreeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeOptions")
            .field("enabled", &self.enabled)
            .field("esnext", &self.esnext)
            .field("config", &self.config)
            .field("config_path", &self.config_path)
            .field("disable_test_generator", &self.disable_test_generator)
            .field("log_error", &self.log_error.as_ref().map(|_| "<fn>"))
            .field("exclude_files", &self.exclude_files)
            .field("persist", &self.persist)
            .field("cache_dir", &self.cache_dir)
            .finish()
    }
}
