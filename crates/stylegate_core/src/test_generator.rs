//! Proxy test generation.
//!
//! A proxy test is a QUnit file asserting that one source file passed the
//! style checker. The assertion message embeds the reported problems so a
//! failing test run shows them.

use std::path::Path;

/// Escapes `text` for use inside a single-quoted JavaScript string.
///
/// Single quotes become `\'` and newlines become the two characters `\n`.
/// Every other character is left as is.
pub fn escape_error_string(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\'' => escaped.push_str("\\'"),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Generates the proxy test for `relative_path`.
///
/// `log_lines` are the formatted diagnostics for the file; an empty slice
/// produces a passing assertion.
pub fn generate_test(checker: &str, relative_path: &str, log_lines: &[String]) -> String {
    let module = Path::new(relative_path)
        .parent()
        .map(|dir| dir.to_string_lossy().replace('\\', "/"))
        .filter(|dir| !dir.is_empty())
        .unwrap_or_else(|| ".".to_string());

    let passed = log_lines.is_empty();
    let details = if passed {
        String::new()
    } else {
        escape_error_string(&format!("\n{}", log_lines.join("\n")))
    };

    let title = escape_error_string(&format!("{} should pass {}", relative_path, checker));

    format!(
        "module('{label} - {module}');\n\
         test('{title}', function() {{\n  \
         ok({passed}, '{title}.{details}');\n\
         }});\n",
        label = checker.to_uppercase(),
        module = escape_error_string(&module),
        title = title,
        passed = passed,
        details = details,
    )
}
