#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use stylegate_core::TreeOptions;
use tempfile::TempDir;

pub const INDENTATION_RC: &str = r#"{ "validateIndentation": 2 }"#;

pub const CLEAN_SOURCE: &str = "function add(a, b) {\n  return a + b;\n}\n";

pub const MISINDENTED_SOURCE: &str = "function misindented() {\n    return 1;\n}\n";

/// Writes `files` into a fresh temporary directory.
pub fn fixture(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    dir
}

pub fn no_config() -> TempDir {
    fixture(&[("index.js", MISINDENTED_SOURCE)])
}

pub fn issue_found() -> TempDir {
    fixture(&[(".stylegaterc", INDENTATION_RC), ("index.js", MISINDENTED_SOURCE)])
}

pub fn no_issues_found() -> TempDir {
    fixture(&[(".stylegaterc", INDENTATION_RC), ("index.js", CLEAN_SOURCE)])
}

pub fn esnext() -> TempDir {
    fixture(&[
        (".stylegaterc", INDENTATION_RC),
        (
            "index.js",
            "var double = (x) => x * 2;\nfunction a() {\n   return double(1);\n}\n",
        ),
    ])
}

pub fn esnext_parse_error() -> TempDir {
    fixture(&[
        (".stylegaterc", INDENTATION_RC),
        ("bad-file.js", "var f = () => {\n  return 1;\n};\n"),
        ("another-bad-file.js", "var s = `template ${1}`;\n"),
        ("good-file.js", CLEAN_SOURCE),
    ])
}

pub fn excludes() -> TempDir {
    fixture(&[
        (
            ".stylegaterc",
            r#"{
                "validateIndentation": 2,
                "excludeFiles": ["excluded-file.js", "*excluded*"]
            }"#,
        ),
        ("included.js", "function included() {\n    return 1;\n}\n"),
        ("excluded-file.js", "function excluded() {\n    return 1;\n}\n"),
        ("some-excluded-code.js", "function excluded() {\n    return 2;\n}\n"),
    ])
}

/// Collects everything a tree reports through its error log.
#[derive(Clone, Default)]
pub struct LogCapture {
    lines: Arc<Mutex<Vec<String>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns options whose error log feeds this capture.
    pub fn options(&self) -> TreeOptions {
        let lines = Arc::clone(&self.lines);
        TreeOptions::new().log_error(move |line| lines.lock().unwrap().push(line.to_string()))
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn joined(&self) -> String {
        self.lines().join("\n")
    }
}

pub fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}
