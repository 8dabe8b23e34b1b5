//! # stylegate_core
//!
//! Build-tree adapter that runs a JavaScript style checker over a directory.
//!
//! This crate provides:
//! - Config resolution (inline object, explicit file, discovery, bypass)
//! - The `StyleTree` file processor with a per-path exclusion cache
//! - Proxy test generation
//! - A built-in reference checker
//! - A minimal `Builder` that materializes output trees
//!
//! ## Example
//!
//! ```rust,ignore
//! use stylegate_core::{Builder, StyleTree, TreeOptions};
//!
//! let tree = StyleTree::new("app", TreeOptions::new().log_error(|line| eprintln!("{}", line)))?;
//! let mut builder = Builder::new(&tree);
//! let result = builder.build()?;
//! println!("{} problems in {}", result.problems, result.directory.display());
//! ```

mod builder;
pub mod checker;
mod config;
mod error;
pub mod exclude;
mod options;
pub mod resolver;
pub mod rules;
pub mod test_generator;
mod tree;

pub use builder::{BuildResult, Builder};
pub use checker::{Diagnostic, ParseError, StyleChecker};
pub use config::CheckerConfig;
pub use error::LinterError;
pub use exclude::{ExcludeCache, ExcludeMatcher, PathMatcher};
pub use options::{ErrorLogger, TreeOptions};
pub use resolver::{BypassReason, ConfigResolver, ConfigSource, ResolvedConfig};
pub use rules::BuiltinChecker;
pub use test_generator::{escape_error_string, generate_test};
pub use tree::{FileOutcome, ProcessedFile, StyleTree, TreeState};
