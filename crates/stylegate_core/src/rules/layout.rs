//! Line layout rules.

use crate::checker::Diagnostic;

use super::scanner::LineFacts;

/// Indentation unit for `validateIndentation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indent {
    Spaces(usize),
    Tab,
}

impl Indent {
    fn unit(self) -> (char, usize) {
        match self {
            Indent::Spaces(width) => (' ', width),
            Indent::Tab => ('\t', 1),
        }
    }
}

/// Characters after which the next line starts a fresh statement or member.
const STATEMENT_ENDINGS: &[char] = &['{', '}', ';', ',', '[', ']'];

pub fn validate_indentation(
    lines: &[&str],
    facts: &[LineFacts],
    indent: Indent,
    out: &mut Vec<Diagnostic>,
) {
    let (unit_char, width) = indent.unit();
    let mut previous_end: Option<char> = None;
    let mut seen_code = false;

    for (index, (text, fact)) in lines.iter().zip(facts).enumerate() {
        if text.trim().is_empty() || fact.starts_in_literal || fact.starts_with_comment {
            continue;
        }

        let continuation = seen_code
            && fact.leading_closers == 0
            && previous_end.is_none_or(|c| !STATEMENT_ENDINGS.contains(&c));
        let inside_call = matches!(fact.innermost, Some('('));

        if !continuation && !inside_call {
            let expected = fact
                .depth
                .saturating_sub(fact.leading_closers)
                .saturating_mul(width);
            let leading: String = text.chars().take_while(|c| *c == ' ' || *c == '\t').collect();
            let matches = leading.chars().count() == expected && leading.chars().all(|c| c == unit_char);

            if !matches {
                out.push(Diagnostic::new(
                    "validateIndentation",
                    index + 1,
                    leading.chars().count() + 1,
                    format!("Expected indentation of {} characters", expected),
                ));
            }
        }

        if fact.last_code_char.is_some() {
            previous_end = fact.last_code_char;
            seen_code = true;
        }
    }
}

pub fn disallow_trailing_whitespace(lines: &[&str], out: &mut Vec<Diagnostic>) {
    for (index, text) in lines.iter().enumerate() {
        let trimmed = text.trim_end_matches([' ', '\t', '\r']);
        if trimmed.len() != text.trim_end_matches('\r').len() {
            out.push(Diagnostic::new(
                "disallowTrailingWhitespace",
                index + 1,
                trimmed.chars().count() + 1,
                "Illegal trailing whitespace",
            ));
        }
    }
}

pub fn require_line_feed_at_file_end(source: &str, lines: &[&str], out: &mut Vec<Diagnostic>) {
    if source.is_empty() || source.ends_with('\n') {
        return;
    }
    let last = lines.len().max(1);
    let column = lines.last().map_or(0, |l| l.chars().count()) + 1;
    out.push(Diagnostic::new(
        "requireLineFeedAtFileEnd",
        last,
        column,
        "Missing line feed at file end",
    ));
}

pub fn maximum_line_length(lines: &[&str], max: usize, out: &mut Vec<Diagnostic>) {
    for (index, text) in lines.iter().enumerate() {
        if text.trim_end_matches('\r').chars().count() > max {
            out.push(Diagnostic::new(
                "maximumLineLength",
                index + 1,
                max.saturating_add(1),
                format!("Line must be at most {} characters", max),
            ));
        }
    }
}

pub fn disallow_multiple_line_breaks(lines: &[&str], facts: &[LineFacts], out: &mut Vec<Diagnostic>) {
    let mut blank_run = 0;
    for (index, (text, fact)) in lines.iter().zip(facts).enumerate() {
        if text.trim().is_empty() && !fact.starts_in_literal {
            blank_run += 1;
            if blank_run == 2 {
                out.push(Diagnostic::new(
                    "disallowMultipleLineBreaks",
                    index + 1,
                    1,
                    "Multiple line breaks are not allowed",
                ));
            }
        } else {
            blank_run = 0;
        }
    }
}
