//! Config resolution.
//!
//! Precedence: inline rule object, then an explicit config file, then the
//! nearest conventional config file at or above the tree root. Finding
//! nothing is not an error; the tree bypasses linting instead.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::{CheckerConfig, LinterError, TreeOptions};

/// Where a configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// The options carried an in-memory rule object.
    Inline,
    /// The options named a config file.
    FileRef(PathBuf),
    /// A conventional config file was found near the tree root.
    Discovered(PathBuf),
    /// Nothing was found.
    Absent,
}

/// Why a tree does not lint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassReason {
    /// `enabled` was false.
    Disabled,
    /// No config source exists.
    NoConfig,
}

/// The configuration a tree runs with, fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedConfig {
    Bypass(BypassReason),
    Active {
        config: CheckerConfig,
        esnext: bool,
        source: ConfigSource,
    },
}

impl ResolvedConfig {
    pub fn is_bypass(&self) -> bool {
        matches!(self, ResolvedConfig::Bypass(_))
    }

    /// Returns the checker config when active.
    pub fn config(&self) -> Option<&CheckerConfig> {
        match self {
            ResolvedConfig::Active { config, .. } => Some(config),
            ResolvedConfig::Bypass(_) => None,
        }
    }

    pub fn source(&self) -> ConfigSource {
        match self {
            ResolvedConfig::Active { source, .. } => source.clone(),
            ResolvedConfig::Bypass(_) => ConfigSource::Absent,
        }
    }
}

pub struct ConfigResolver;

impl ConfigResolver {
    /// Determines which config source applies without loading it.
    pub fn locate(tree_root: &Path, options: &TreeOptions) -> ConfigSource {
        if options.config.is_some() {
            return ConfigSource::Inline;
        }
        if let Some(path) = &options.config_path {
            return ConfigSource::FileRef(path.clone());
        }
        match CheckerConfig::discover(tree_root) {
            Some(path) => ConfigSource::Discovered(path),
            None => ConfigSource::Absent,
        }
    }

    /// Resolves the configuration for a tree rooted at `tree_root`.
    pub fn resolve(tree_root: &Path, options: &TreeOptions) -> Result<ResolvedConfig, LinterError> {
        if !options.enabled {
            info!("Linting disabled");
            return Ok(ResolvedConfig::Bypass(BypassReason::Disabled));
        }

        let source = Self::locate(tree_root, options);
        let config = match &source {
            ConfigSource::Inline => {
                let value = options.config.clone().unwrap_or_default();
                CheckerConfig::from_value(value)?
            }
            ConfigSource::FileRef(path) | ConfigSource::Discovered(path) => {
                info!("Using config: {}", path.display());
                CheckerConfig::from_file(path)?
            }
            ConfigSource::Absent => {
                info!(
                    "No config file found for {}, bypassing",
                    tree_root.display()
                );
                return Ok(ResolvedConfig::Bypass(BypassReason::NoConfig));
            }
        };

        let esnext = options.esnext.or(config.esnext).unwrap_or(false);

        Ok(ResolvedConfig::Active {
            config,
            esnext,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_absent_config_bypasses() {
        let dir = tempdir().unwrap();
        let resolved = ConfigResolver::resolve(dir.path(), &TreeOptions::new()).unwrap();
        assert_eq!(resolved, ResolvedConfig::Bypass(BypassReason::NoConfig));
        assert!(resolved.is_bypass());
    }

    #[test]
    fn test_disabled_bypasses_even_with_config() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".stylegaterc"), r#"{ "validateIndentation": 2 }"#).unwrap();

        let options = TreeOptions::new().enabled(false);
        let resolved = ConfigResolver::resolve(dir.path(), &options).unwrap();
        assert_eq!(resolved, ResolvedConfig::Bypass(BypassReason::Disabled));
    }

    #[test]
    fn test_discovered_config() {
        let dir = tempdir().unwrap();
        let rc = dir.path().join(".stylegaterc");
        fs::write(&rc, r#"{ "validateIndentation": 2 }"#).unwrap();

        let resolved = ConfigResolver::resolve(dir.path(), &TreeOptions::new()).unwrap();
        assert_eq!(resolved.source(), ConfigSource::Discovered(rc));
        assert_eq!(resolved.config().unwrap().rules["validateIndentation"], 2);
    }

    #[test]
    fn test_inline_beats_file_and_discovery() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".stylegaterc"), r#"{ "validateIndentation": 2 }"#).unwrap();

        let options = TreeOptions::new()
            .config(json!({ "validateIndentation": 4 }))
            .config_path(dir.path().join("missing.json"));
        let resolved = ConfigResolver::resolve(dir.path(), &options).unwrap();

        assert_eq!(resolved.source(), ConfigSource::Inline);
        assert_eq!(resolved.config().unwrap().rules["validateIndentation"], 4);
    }

    #[test]
    fn test_explicit_path_beats_discovery() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".stylegaterc"), r#"{ "validateIndentation": 2 }"#).unwrap();
        let explicit = dir.path().join("custom.json");
        fs::write(&explicit, r#"{ "validateIndentation": 8 }"#).unwrap();

        let options = TreeOptions::new().config_path(&explicit);
        let resolved = ConfigResolver::resolve(dir.path(), &options).unwrap();

        assert_eq!(resolved.source(), ConfigSource::FileRef(explicit));
        assert_eq!(resolved.config().unwrap().rules["validateIndentation"], 8);
    }

    #[test]
    fn test_missing_explicit_path_is_fatal() {
        let dir = tempdir().unwrap();
        let options = TreeOptions::new().config_path(dir.path().join("missing.json"));
        assert!(ConfigResolver::resolve(dir.path(), &options).is_err());
    }

    #[test]
    fn test_malformed_explicit_path_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ \"validateIndentation\": ").unwrap();

        let options = TreeOptions::new().config_path(&path);
        assert!(ConfigResolver::resolve(dir.path(), &options).is_err());
    }

    #[test]
    fn test_inline_non_object_is_fatal() {
        let dir = tempdir().unwrap();
        let options = TreeOptions::new().config(json!(["validateIndentation"]));
        assert!(ConfigResolver::resolve(dir.path(), &options).is_err());
    }

    #[test]
    fn test_esnext_option_overrides_config() {
        let dir = tempdir().unwrap();
        let from_config = TreeOptions::new().config(json!({ "esnext": true }));
        let overridden = TreeOptions::new()
            .config(json!({ "esnext": true }))
            .esnext(false);

        let esnext = |options: &TreeOptions| match ConfigResolver::resolve(dir.path(), options).unwrap() {
            ResolvedConfig::Active { esnext, .. } => esnext,
            ResolvedConfig::Bypass(_) => panic!("expected active config"),
        };

        assert!(esnext(&from_config));
        assert!(!esnext(&overridden));
        assert!(!esnext(&TreeOptions::new().config(json!({}))));
    }
}
