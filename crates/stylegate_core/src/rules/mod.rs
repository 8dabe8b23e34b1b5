//! Built-in reference checker.
//!
//! A small set of layout and token rules that lets a tree run without an
//! external engine. Any other engine plugs in through [`StyleChecker`].

mod layout;
mod scanner;
mod tokens;

use serde_json::Value;

use crate::checker::{Diagnostic, ParseError, StyleChecker};
use crate::{CheckerConfig, LinterError};

use layout::Indent;
use tokens::QuoteMark;

/// Names of the rules the built-in checker understands.
pub const RULE_NAMES: &[&str] = &[
    "validateIndentation",
    "disallowTrailingWhitespace",
    "requireLineFeedAtFileEnd",
    "maximumLineLength",
    "disallowMultipleLineBreaks",
    "validateQuoteMarks",
    "disallowKeywords",
];

/// The built-in reference checker.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinChecker;

impl BuiltinChecker {
    pub fn new() -> Self {
        Self
    }
}

impl StyleChecker for BuiltinChecker {
    fn name(&self) -> &str {
        "stylegate"
    }

    fn configure(&self, config: &CheckerConfig) -> Result<(), LinterError> {
        let (_, problems) = RuleSet::parse(config);
        if problems.is_empty() {
            Ok(())
        } else {
            Err(LinterError::config(problems.join("; ")))
        }
    }

    fn check(
        &self,
        source: &str,
        _relative_path: &str,
        config: &CheckerConfig,
        esnext: bool,
    ) -> Result<Vec<Diagnostic>, ParseError> {
        let scan = scanner::scan(source, esnext)?;
        let (rules, _) = RuleSet::parse(config);
        let lines: Vec<&str> = source.split('\n').collect();
        let mut out = Vec::new();

        if let Some(indent) = rules.indentation {
            layout::validate_indentation(&lines, &scan.lines, indent, &mut out);
        }
        if rules.trailing_whitespace {
            layout::disallow_trailing_whitespace(&lines, &mut out);
        }
        if rules.line_feed_at_end {
            layout::require_line_feed_at_file_end(source, &lines, &mut out);
        }
        if let Some(max) = rules.max_line_length {
            layout::maximum_line_length(&lines, max, &mut out);
        }
        if rules.multiple_line_breaks {
            layout::disallow_multiple_line_breaks(&lines, &scan.lines, &mut out);
        }
        if let Some(mark) = rules.quote_marks {
            tokens::validate_quote_marks(&scan.strings, mark, &mut out);
        }
        if !rules.keywords.is_empty() {
            tokens::disallow_keywords(&scan.words, &rules.keywords, &mut out);
        }

        out.sort();
        Ok(out)
    }
}

/// Rule values decoded from a config.
#[derive(Debug, Default)]
struct RuleSet {
    indentation: Option<Indent>,
    trailing_whitespace: bool,
    line_feed_at_end: bool,
    max_line_length: Option<usize>,
    multiple_line_breaks: bool,
    quote_marks: Option<QuoteMark>,
    keywords: Vec<String>,
}

impl RuleSet {
    /// Decodes every enabled rule, returning the usable set along with a
    /// description of each entry that could not be decoded.
    fn parse(config: &CheckerConfig) -> (Self, Vec<String>) {
        let mut rules = Self::default();
        let mut problems = Vec::new();

        for (name, value) in config.enabled_rules() {
            let decoded = match name {
                "validateIndentation" => indent(value).map(|v| rules.indentation = Some(v)),
                "disallowTrailingWhitespace" => flag(value).map(|v| rules.trailing_whitespace = v),
                "requireLineFeedAtFileEnd" => flag(value).map(|v| rules.line_feed_at_end = v),
                "maximumLineLength" => line_length(value).map(|v| rules.max_line_length = Some(v)),
                "disallowMultipleLineBreaks" => {
                    flag(value).map(|v| rules.multiple_line_breaks = v)
                }
                "validateQuoteMarks" => quote_mark(value).map(|v| rules.quote_marks = Some(v)),
                "disallowKeywords" => keywords(value).map(|v| rules.keywords = v),
                unknown => {
                    problems.push(format!("Unsupported rule: {}", unknown));
                    continue;
                }
            };

            if let Err(expected) = decoded {
                problems.push(format!(
                    "Invalid value for rule {}: expected {}",
                    name, expected
                ));
            }
        }

        (rules, problems)
    }
}

fn flag(value: &Value) -> Result<bool, &'static str> {
    value.as_bool().ok_or("true")
}

fn indent(value: &Value) -> Result<Indent, &'static str> {
    const EXPECTED: &str = "a positive integer or \"\\t\"";
    match value {
        Value::String(s) if s == "\t" => Ok(Indent::Tab),
        Value::Number(n) => match n.as_u64() {
            Some(width) if width > 0 => usize::try_from(width)
                .map(Indent::Spaces)
                .map_err(|_| EXPECTED),
            _ => Err(EXPECTED),
        },
        _ => Err(EXPECTED),
    }
}

fn line_length(value: &Value) -> Result<usize, &'static str> {
    const EXPECTED: &str = "a positive integer or {\"value\": integer}";
    let raw = match value {
        Value::Object(map) => map.get("value"),
        other => Some(other),
    };
    match raw.and_then(Value::as_u64) {
        Some(max) if max > 0 => usize::try_from(max).map_err(|_| EXPECTED),
        _ => Err(EXPECTED),
    }
}

fn quote_mark(value: &Value) -> Result<QuoteMark, &'static str> {
    match value {
        Value::String(s) if s == "'" => Ok(QuoteMark::Single),
        Value::String(s) if s == "\"" => Ok(QuoteMark::Double),
        Value::Bool(true) => Ok(QuoteMark::Consistent),
        _ => Err("\"'\", \"\\\"\" or true"),
    }
}

fn keywords(value: &Value) -> Result<Vec<String>, &'static str> {
    const EXPECTED: &str = "an array of strings";
    let items = value.as_array().ok_or(EXPECTED)?;
    items
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or(EXPECTED))
        .collect()
}
