//! Lightweight structural scan of JavaScript source.
//!
//! This is not a parser. It tracks enough lexical state (strings, comments,
//! regular expressions, template literals and bracket nesting) for the
//! built-in rules to reason about lines and tokens, and it rejects sources
//! whose structure does not add up.

use crate::checker::ParseError;

/// Facts about a single source line, gathered at its start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineFacts {
    /// Number of open `{` and `[` brackets when the line starts.
    pub depth: usize,
    /// Innermost open bracket when the line starts, if any.
    pub innermost: Option<char>,
    /// Closing `}` or `]` brackets that lead the line.
    pub leading_closers: usize,
    /// The line starts inside a block comment or a literal.
    pub starts_in_literal: bool,
    /// The first token on the line is a comment.
    pub starts_with_comment: bool,
    /// Last character of code on the line (comments excluded).
    pub last_code_char: Option<char>,
}

/// A string literal token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringToken {
    pub line: usize,
    pub column: usize,
    pub quote: char,
}

/// An identifier or keyword token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordToken {
    pub line: usize,
    pub column: usize,
    pub text: String,
}

/// Result of scanning a source file.
#[derive(Debug, Default)]
pub struct Scan {
    pub lines: Vec<LineFacts>,
    pub strings: Vec<StringToken>,
    pub words: Vec<WordToken>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    LineComment,
    BlockComment,
    Str(char),
    Template,
    Regex { in_class: bool },
}

/// Marker pushed on the bracket stack for `${` inside a template literal.
const TEMPLATE_EXPR: char = '$';

/// Scans `source`, honouring `esnext` for template literals and arrows.
pub fn scan(source: &str, esnext: bool) -> Result<Scan, ParseError> {
    Scanner::new(esnext).run(source)
}

struct Scanner {
    esnext: bool,
    state: State,
    stack: Vec<(char, usize)>,
    out: Scan,
    line: usize,
    column: usize,
    at_line_start: bool,
    counting_closers: bool,
    prev_code: Option<char>,
    prev_word: Option<String>,
    /// The last code token was `++` or `--`.
    after_update: bool,
    word: Option<(usize, usize, String)>,
}

impl Scanner {
    fn new(esnext: bool) -> Self {
        Self {
            esnext,
            state: State::Code,
            stack: Vec::new(),
            out: Scan::default(),
            line: 0,
            column: 0,
            at_line_start: true,
            counting_closers: false,
            prev_code: None,
            prev_word: None,
            after_update: false,
            word: None,
        }
    }

    fn run(mut self, source: &str) -> Result<Scan, ParseError> {
        self.begin_line();
        let chars: Vec<char> = source.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            let next = chars.get(i + 1).copied();
            self.column += 1;

            if c == '\n' {
                self.flush_word();
                match self.state {
                    State::LineComment => self.state = State::Code,
                    State::Str(_) => {
                        return Err(ParseError::new("Unterminated string literal", self.line));
                    }
                    State::Regex { .. } => {
                        return Err(ParseError::new("Unterminated regular expression", self.line));
                    }
                    _ => {}
                }
                self.begin_line();
                i += 1;
                continue;
            }

            match self.state {
                State::Code => {
                    if self.code_char(c, next)? {
                        // two-character token consumed
                        self.column += 1;
                        i += 1;
                    }
                }
                State::LineComment => {}
                State::BlockComment => {
                    if c == '*' && next == Some('/') {
                        self.state = State::Code;
                        self.column += 1;
                        i += 1;
                    }
                }
                State::Str(quote) => {
                    if c == '\\' {
                        // escaped newlines continue the string on the next line
                        if next == Some('\n') {
                            i += 1;
                            self.begin_line();
                            self.current_line().starts_in_literal = true;
                        } else {
                            self.column += 1;
                            i += 1;
                        }
                    } else if c == quote {
                        self.state = State::Code;
                        self.prev_code = Some(c);
                        self.current_line().last_code_char = Some(c);
                    }
                }
                State::Template => {
                    if c == '\\' {
                        self.column += 1;
                        i += 1;
                        if next == Some('\n') {
                            self.begin_line();
                            self.current_line().starts_in_literal = true;
                        }
                    } else if c == '`' {
                        self.state = State::Code;
                        self.prev_code = Some(c);
                        self.current_line().last_code_char = Some(c);
                    } else if c == '$' && next == Some('{') {
                        self.stack.push((TEMPLATE_EXPR, self.line));
                        self.state = State::Code;
                        self.prev_code = Some('{');
                        self.column += 1;
                        i += 1;
                    }
                }
                State::Regex { in_class } => match c {
                    '\\' => {
                        self.column += 1;
                        i += 1;
                    }
                    '[' => self.state = State::Regex { in_class: true },
                    ']' if in_class => self.state = State::Regex { in_class: false },
                    '/' if !in_class => {
                        self.state = State::Code;
                        self.prev_code = Some(c);
                        self.current_line().last_code_char = Some(c);
                    }
                    _ => {}
                },
            }

            i += 1;
        }

        self.flush_word();

        match self.state {
            State::BlockComment => {
                return Err(ParseError::new("Unterminated comment", self.line));
            }
            State::Str(_) => {
                return Err(ParseError::new("Unterminated string literal", self.line));
            }
            State::Template => {
                return Err(ParseError::new("Unterminated template literal", self.line));
            }
            State::Regex { .. } => {
                return Err(ParseError::new("Unterminated regular expression", self.line));
            }
            State::Code | State::LineComment => {}
        }

        if let Some(&(open, line)) = self.stack.last() {
            let shown = if open == TEMPLATE_EXPR { '{' } else { open };
            return Err(ParseError::new(format!("Unclosed '{}'", shown), line));
        }

        Ok(self.out)
    }

    fn begin_line(&mut self) {
        self.line += 1;
        self.column = 0;
        self.at_line_start = true;
        self.counting_closers = false;

        let depth = self
            .stack
            .iter()
            .filter(|(open, _)| matches!(*open, '{' | '[' | TEMPLATE_EXPR))
            .count();
        let starts_in_literal = matches!(
            self.state,
            State::BlockComment | State::Template | State::Str(_)
        );

        self.out.lines.push(LineFacts {
            depth,
            innermost: self.stack.last().map(|(open, _)| *open),
            starts_in_literal,
            ..LineFacts::default()
        });
    }

    fn current_line(&mut self) -> &mut LineFacts {
        // begin_line runs before any character is processed
        let last = self.out.lines.len() - 1;
        &mut self.out.lines[last]
    }

    /// Handles one character in code state. Returns true when `next` was
    /// consumed as part of a two-character token.
    fn code_char(&mut self, c: char, next: Option<char>) -> Result<bool, ParseError> {
        if c.is_whitespace() {
            self.flush_word();
            if self.counting_closers {
                self.counting_closers = false;
            }
            return Ok(false);
        }

        let first_on_line = self.at_line_start;
        self.at_line_start = false;

        if c == '/' && next == Some('/') {
            self.flush_word();
            self.state = State::LineComment;
            if first_on_line {
                self.current_line().starts_with_comment = true;
            }
            return Ok(true);
        }

        if c == '/' && next == Some('*') {
            self.flush_word();
            self.state = State::BlockComment;
            if first_on_line {
                self.current_line().starts_with_comment = true;
            }
            return Ok(true);
        }

        if is_word_char(c) {
            match self.word.as_mut() {
                Some((_, _, text)) => text.push(c),
                None => self.word = Some((self.line, self.column, c.to_string())),
            }
            self.counting_closers = false;
            self.after_update = false;
            self.prev_code = Some(c);
            self.current_line().last_code_char = Some(c);
            return Ok(false);
        }

        self.flush_word();

        if first_on_line && matches!(c, '}' | ']') {
            self.counting_closers = true;
        }
        if self.counting_closers {
            if matches!(c, '}' | ']') {
                self.current_line().leading_closers += 1;
            } else {
                self.counting_closers = false;
            }
        }

        let mut consumed = false;
        match c {
            '\'' | '"' => {
                self.out.strings.push(StringToken {
                    line: self.line,
                    column: self.column,
                    quote: c,
                });
                self.state = State::Str(c);
            }
            '`' => {
                if !self.esnext {
                    return Err(ParseError::new("Unexpected character '`'", self.line));
                }
                self.state = State::Template;
            }
            '/' => {
                if self.regex_allowed() {
                    self.state = State::Regex { in_class: false };
                }
            }
            '=' if next == Some('>') => {
                if !self.esnext {
                    return Err(ParseError::new("Unexpected token =>", self.line));
                }
                consumed = true;
            }
            '+' | '-' if next == Some(c) => consumed = true,
            '{' | '[' | '(' => self.stack.push((c, self.line)),
            '}' | ']' | ')' => self.close(c)?,
            _ => {}
        }

        let last = if c == '=' && consumed { '>' } else { c };
        self.after_update = consumed && matches!(c, '+' | '-');
        self.prev_code = Some(last);
        self.prev_word = None;
        self.current_line().last_code_char = Some(last);
        Ok(consumed)
    }

    fn close(&mut self, c: char) -> Result<(), ParseError> {
        let expected = match c {
            '}' => '{',
            ']' => '[',
            _ => '(',
        };

        match self.stack.pop() {
            Some((TEMPLATE_EXPR, _)) if c == '}' => {
                self.state = State::Template;
                Ok(())
            }
            Some((open, _)) if open == expected => Ok(()),
            Some(_) | None => Err(ParseError::new(
                format!("Unexpected token '{}'", c),
                self.line,
            )),
        }
    }

    fn flush_word(&mut self) {
        if let Some((line, column, text)) = self.word.take() {
            let starts_with_digit = text.chars().next().is_some_and(|c| c.is_ascii_digit());
            if !starts_with_digit {
                self.out.words.push(WordToken {
                    line,
                    column,
                    text: text.clone(),
                });
            }
            self.prev_word = Some(text);
        }
    }

    fn regex_allowed(&self) -> bool {
        // `i++ / 2` divides
        if self.after_update {
            return false;
        }
        if let Some(word) = &self.prev_word {
            return matches!(
                word.as_str(),
                "return" | "typeof" | "case" | "do" | "else" | "in" | "instanceof" | "new"
                    | "delete" | "void" | "throw" | "yield"
            );
        }
        match self.prev_code {
            None => true,
            Some(c) => matches!(
                c,
                '(' | ',' | '=' | ':' | '[' | '!' | '&' | '|' | '?' | '{' | '}' | ';' | '+'
                    | '-' | '*' | '%' | '<' | '>' | '~' | '^'
            ),
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}
