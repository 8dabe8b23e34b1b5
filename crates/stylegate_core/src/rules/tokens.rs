//! Token rules.

use crate::checker::Diagnostic;

use super::scanner::{StringToken, WordToken};

/// Accepted quote style for `validateQuoteMarks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteMark {
    Single,
    Double,
    /// Whatever the first string literal in the file uses.
    Consistent,
}

pub fn validate_quote_marks(strings: &[StringToken], mark: QuoteMark, out: &mut Vec<Diagnostic>) {
    let wanted = match mark {
        QuoteMark::Single => '\'',
        QuoteMark::Double => '"',
        QuoteMark::Consistent => match strings.first() {
            Some(first) => first.quote,
            None => return,
        },
    };

    for token in strings.iter().filter(|t| t.quote != wanted) {
        out.push(Diagnostic::new(
            "validateQuoteMarks",
            token.line,
            token.column,
            "Invalid quote mark found",
        ));
    }
}

pub fn disallow_keywords(words: &[WordToken], keywords: &[String], out: &mut Vec<Diagnostic>) {
    for word in words {
        if keywords.iter().any(|k| *k == word.text) {
            out.push(Diagnostic::new(
                "disallowKeywords",
                word.line,
                word.column,
                format!("Illegal keyword: {}", word.text),
            ));
        }
    }
}
