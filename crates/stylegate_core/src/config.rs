//! Style checker configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use jsonc_parser::ParseOptions;
use jsonschema::Validator;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::LinterError;

const SCHEMA_JSON: &str = include_str!("../../../schemas/v1/config.json");
static CONFIG_SCHEMA: OnceLock<Validator> = OnceLock::new();

/// Extension processed when a config does not name any.
const DEFAULT_EXTENSION: &str = "js";

/// Configuration handed to the style checker.
///
/// Keys stylegate understands are lifted into fields; every other key is a
/// rule name and lands in `rules` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckerConfig {
    /// Paths or globs that are never linted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_files: Vec<String>,

    /// File extensions the tree processes, without the leading dot.
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub file_extensions: Vec<String>,

    /// Parser mode requested by the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub esnext: Option<bool>,

    /// Maximum diagnostics reported per file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_errors: Option<usize>,

    /// Rule name to rule value.
    #[serde(flatten)]
    pub rules: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(ext) => vec![ext],
        OneOrMany::Many(exts) => exts,
    };
    Ok(raw
        .into_iter()
        .map(|ext| ext.trim_start_matches('.').to_string())
        .collect())
}

impl CheckerConfig {
    /// Conventional config file names, in lookup order within a directory.
    pub const CONFIG_FILES: &'static [&'static str] = &[".stylegaterc", ".stylegaterc.json"];

    /// Key holding the config inside a `package.json`.
    pub const PACKAGE_JSON_KEY: &'static str = "stylegateConfig";

    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file.
    ///
    /// A `package.json` is read through its `stylegateConfig` key; any other
    /// file is parsed as JSON with comments.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LinterError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            LinterError::config(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        let value = parse_jsonc(&content)
            .map_err(|e| LinterError::config(format!("{} in {}", e, path.display())))?;

        if is_package_json(path) {
            let embedded = value.get(Self::PACKAGE_JSON_KEY).cloned().ok_or_else(|| {
                LinterError::config(format!(
                    "{} has no \"{}\" entry",
                    path.display(),
                    Self::PACKAGE_JSON_KEY
                ))
            })?;
            return Self::from_value(embedded);
        }

        Self::from_value(value)
    }

    /// Parses configuration from a JSON (or JSONC) string.
    pub fn from_json(json: &str) -> Result<Self, LinterError> {
        Self::from_value(parse_jsonc(json)?)
    }

    /// Builds configuration from an in-memory rule object.
    pub fn from_value(value: Value) -> Result<Self, LinterError> {
        if !value.is_object() {
            return Err(LinterError::config("Config must be a JSON object"));
        }

        let schema = CONFIG_SCHEMA.get_or_init(|| {
            let schema_json: Value =
                serde_json::from_str(SCHEMA_JSON).expect("Invalid embedded config schema");
            Validator::new(&schema_json).expect("Invalid config schema compilation")
        });

        if let Err(e) = schema.validate(&value) {
            return Err(LinterError::config(format!(
                "Config validation failed: {} at {}",
                e,
                e.instance_path()
            )));
        }

        serde_json::from_value(value)
            .map_err(|e| LinterError::config(format!("Invalid config: {}", e)))
    }

    /// Finds the nearest config file, starting at `start` and walking up
    /// through its ancestors. A relative `start` is resolved against the
    /// working directory first.
    pub fn discover(start: impl AsRef<Path>) -> Option<PathBuf> {
        let start = start.as_ref();
        let start = std::path::absolute(start).unwrap_or_else(|_| start.to_path_buf());

        for dir in start.ancestors() {
            for name in Self::CONFIG_FILES {
                let candidate = dir.join(name);
                if candidate.is_file() {
                    return Some(candidate);
                }
            }

            let package_json = dir.join("package.json");
            if package_json.is_file() && Self::package_json_has_config(&package_json) {
                return Some(package_json);
            }
        }

        None
    }

    fn package_json_has_config(path: &Path) -> bool {
        let parsed = fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str::<Value>(&content).ok());

        match parsed {
            Some(value) => value.get(Self::PACKAGE_JSON_KEY).is_some(),
            None => {
                debug!("Skipping unreadable {}", path.display());
                false
            }
        }
    }

    /// Returns the rules that are switched on (`null` and `false` mean off).
    pub fn enabled_rules(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.rules
            .iter()
            .filter(|(_, value)| !matches!(value, Value::Null | Value::Bool(false)))
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the processed extensions, falling back to `js`.
    pub fn extensions(&self) -> Vec<&str> {
        if self.file_extensions.is_empty() {
            vec![DEFAULT_EXTENSION]
        } else {
            self.file_extensions.iter().map(String::as_str).collect()
        }
    }

    /// Computes a hash of the configuration for cache invalidation.
    pub fn hash(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

fn parse_jsonc(content: &str) -> Result<Value, LinterError> {
    jsonc_parser::parse_to_serde_value(content, &ParseOptions::default())
        .map_err(|e| LinterError::config(format!("Invalid JSON: {}", e)))?
        .ok_or_else(|| LinterError::config("Config file is empty"))
}

fn is_package_json(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == "package.json")
}
