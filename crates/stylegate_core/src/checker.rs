//! The boundary to the style checking engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CheckerConfig, LinterError};

/// A single style violation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 1-based line number.
    pub line: usize,

    /// 1-based column number.
    pub column: usize,

    /// The rule that reported this diagnostic.
    pub rule: String,

    /// Human readable message.
    pub message: String,
}

impl Diagnostic {
    /// Creates a new diagnostic.
    pub fn new(
        rule: impl Into<String>,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            line,
            column,
            rule: rule.into(),
            message: message.into(),
        }
    }

    /// Formats the diagnostic as an error-log line for `relative_path`.
    pub fn log_line(&self, relative_path: &str) -> String {
        format!("{}: {} {}", relative_path, self.line, self.message)
    }
}

/// The checker could not make sense of the source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at line {line}")]
pub struct ParseError {
    /// Description of the failure.
    pub message: String,
    /// 1-based line where it was detected.
    pub line: usize,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}

/// A style checking engine.
///
/// Implementations must be pure with respect to their inputs: the same
/// source, path and config always produce the same diagnostics.
///
/// # Example
///
/// ```rust,ignore
/// struct NoTabs;
///
/// impl StyleChecker for NoTabs {
///     fn name(&self) -> &str {
///         "no-tabs"
///     }
///
///     fn check(&self, source: &str, _path: &str, _config: &CheckerConfig, _esnext: bool)
///         -> Result<Vec<Diagnostic>, ParseError>
///     {
///         Ok(source
///             .lines()
///             .enumerate()
///             .filter(|(_, line)| line.contains('\t'))
///             .map(|(i, _)| Diagnostic::new("noTabs", i + 1, 1, "Tab found"))
///             .collect())
///     }
/// }
/// ```
pub trait StyleChecker: Send + Sync {
    /// Returns the checker name, used in generated tests and file extensions.
    fn name(&self) -> &str;

    /// Validates the rule set before any file is checked.
    fn configure(&self, config: &CheckerConfig) -> Result<(), LinterError> {
        let _ = config;
        Ok(())
    }

    /// Checks one file.
    ///
    /// Returns diagnostics ordered by position, or a parse error when the
    /// source cannot be analyzed.
    fn check(
        &self,
        source: &str,
        relative_path: &str,
        config: &CheckerConfig,
        esnext: bool,
    ) -> Result<Vec<Diagnostic>, ParseError>;
}
