//! Generic one-pass scanner
//!
//! Walks the content one char at a time, tracking line and column, and
//! produces tokens and diagnostics together. Everything language-specific
//! comes from a [`LanguageDescriptor`]; the state is rebuilt for every pass.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::language::LanguageDescriptor;
use crate::diagnostics::{Diagnostic, ScanIssue};

/// Token classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenClass {
    Keyword,
    Identifier,
    Number,
    String,
    Comment,
    Bracket,
    Operator,
}

impl TokenClass {
    /// CSS-style class name used by the renderer
    pub fn css_class(&self) -> &'static str {
        match self {
            TokenClass::Keyword => "tok-keyword",
            TokenClass::Identifier => "tok-ident",
            TokenClass::Number => "tok-number",
            TokenClass::String => "tok-string",
            TokenClass::Comment => "tok-comment",
            TokenClass::Bracket => "tok-bracket",
            TokenClass::Operator => "tok-operator",
        }
    }
}

/// A classified span of char offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token {
    pub start: usize,
    pub end: usize,
    pub class: TokenClass,
}

/// Tokens and diagnostics from one pass
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Copy)]
struct OpenBracket {
    ch: char,
    line: usize,
    col: usize,
}

/// Where something started: char offset plus 1-based line/col
#[derive(Debug, Clone, Copy, Default)]
struct Mark {
    offset: usize,
    line: usize,
    col: usize,
}

#[derive(Debug, Default)]
struct ScannerState {
    in_string: bool,
    string_delimiter: &'static str,
    string_start: Mark,
    raw_string: bool,
    escape_pending: bool,
    escape_at: Mark,
    in_comment: bool,
    comment_start: usize,
    bracket_stack: Vec<OpenBracket>,
    bracket_depth_at_line_end: BTreeMap<usize, usize>,
}

/// Per-line facts gathered for the post-pass
#[derive(Debug, Default, Clone, Copy)]
struct LineFacts {
    starts_in_literal: bool,
    /// The block-open char appeared in code at bracket depth 0
    opens_block: bool,
}

struct Pass<'a> {
    desc: &'a LanguageDescriptor,
    chars: Vec<char>,
    i: usize,
    line: usize,
    col: usize,
    state: ScannerState,
    lines: Vec<LineFacts>,
    output: ScanOutput,
}

/// Scan `content` with the given language descriptor
pub fn scan(content: &str, desc: &LanguageDescriptor) -> ScanOutput {
    let mut pass = Pass {
        desc,
        chars: content.chars().collect(),
        i: 0,
        line: 1,
        col: 1,
        state: ScannerState::default(),
        lines: vec![LineFacts::default()],
        output: ScanOutput::default(),
    };
    pass.run();
    pass.finish();
    pass.post_pass(content);

    debug!(
        "Scanned {} chars as {}: {} tokens, {} diagnostics",
        pass.chars.len(),
        desc.name,
        pass.output.tokens.len(),
        pass.output.diagnostics.len()
    );
    pass.output
}

impl<'a> Pass<'a> {
    fn run(&mut self) {
        while self.i < self.chars.len() {
            if self.state.in_string {
                self.step_string();
            } else if self.state.in_comment {
                self.step_block_comment();
            } else {
                self.step_code();
            }
        }
    }

    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.i + ahead).copied()
    }

    fn at(&self, marker: &str) -> bool {
        let mut offset = self.i;
        for ch in marker.chars() {
            if self.chars.get(offset) != Some(&ch) {
                return false;
            }
            offset += 1;
        }
        true
    }

    fn mark(&self) -> Mark {
        Mark {
            offset: self.i,
            line: self.line,
            col: self.col,
        }
    }

    /// Consume one char, updating line/col and line bookkeeping
    fn advance(&mut self) {
        let ch = self.chars[self.i];
        self.i += 1;
        if ch == '\n' {
            self.end_line();
            self.line += 1;
            self.col = 1;
            self.lines.push(LineFacts {
                starts_in_literal: self.state.in_string || self.state.in_comment,
                opens_block: false,
            });
        } else {
            self.col += 1;
        }
    }

    fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    fn end_line(&mut self) {
        self.state
            .bracket_depth_at_line_end
            .insert(self.line, self.state.bracket_stack.len());
    }

    fn emit(&mut self, line: usize, col: usize, issue: ScanIssue) {
        self.output.diagnostics.push(Diagnostic::new(line, col, issue));
    }

    fn token(&mut self, start: usize, end: usize, class: TokenClass) {
        if end > start {
            self.output.tokens.push(Token { start, end, class });
        }
    }

    /// Longest string delimiter starting at the current char
    fn delimiter_at(&self) -> Option<&'static str> {
        self.desc
            .string_delimiters
            .iter()
            .copied()
            .filter(|d| self.at(d))
            .max_by_key(|d| d.chars().count())
    }

    fn open_string(&mut self, start: Mark, delimiter: &'static str, raw: bool) {
        self.state.in_string = true;
        self.state.string_delimiter = delimiter;
        self.state.string_start = start;
        self.state.raw_string = raw;
        self.advance_by(delimiter.chars().count());
    }

    fn step_string(&mut self) {
        let ch = self.chars[self.i];

        if self.state.escape_pending {
            self.state.escape_pending = false;
            // Backslash-newline continues the string onto the next line.
            if ch != '\n' && !self.state.raw_string && !self.desc.is_allowed_escape(ch) {
                let at = self.state.escape_at;
                self.emit(at.line, at.col, ScanIssue::InvalidEscape(ch));
            }
            self.advance();
            return;
        }

        if ch == '\\' {
            self.state.escape_pending = true;
            self.state.escape_at = self.mark();
            self.advance();
            return;
        }

        let delimiter = self.state.string_delimiter;
        if self.at(delimiter) {
            self.advance_by(delimiter.chars().count());
            self.close_string(self.i);
        } else if ch == '\n' && !self.desc.is_multiline(delimiter) {
            self.emit(self.line, self.col, ScanIssue::EolInString);
            self.close_string(self.i);
            self.advance();
        } else {
            self.advance();
        }
    }

    fn close_string(&mut self, end: usize) {
        self.state.in_string = false;
        let start = self.state.string_start.offset;
        self.token(start, end, TokenClass::String);
    }

    /// Length of a single-char literal at the current quote, escapes included.
    /// `None` means the quote does not start one (a Rust lifetime, say).
    fn char_literal_len(&self, quote: char) -> Option<usize> {
        match self.peek(1)? {
            '\\' => {
                let escaped = self.peek(2)?;
                let mut len = 3;
                if escaped == 'u' && self.peek(3) == Some('{') {
                    len = 4;
                    while self.peek(len)? != '}' {
                        if len > 12 {
                            return None;
                        }
                        len += 1;
                    }
                    len += 1;
                } else if escaped == 'x' {
                    len = 5;
                }
                (self.peek(len)? == quote).then_some(len + 1)
            }
            '\n' => None,
            c if c == quote => None,
            _ => (self.peek(2)? == quote).then_some(3),
        }
    }

    fn step_block_comment(&mut self) {
        if let Some(block) = self.desc.block_comment {
            if self.at(block.close) {
                self.advance_by(block.close.chars().count());
                self.state.in_comment = false;
                let start = self.state.comment_start;
                self.token(start, self.i, TokenClass::Comment);
                return;
            }
        }
        self.advance();
    }

    fn step_code(&mut self) {
        let ch = self.chars[self.i];
        let start = self.i;

        if let Some(marker) = self.desc.line_comment {
            if self.at(marker) {
                while self.peek(0).is_some_and(|c| c != '\n') {
                    self.advance();
                }
                self.token(start, self.i, TokenClass::Comment);
                return;
            }
        }

        if let Some(block) = self.desc.block_comment {
            if self.at(block.open) {
                self.state.in_comment = true;
                self.state.comment_start = start;
                self.advance_by(block.open.chars().count());
                return;
            }
        }

        if let Some(delimiter) = self.delimiter_at() {
            self.open_string(self.mark(), delimiter, false);
            return;
        }

        if self.desc.char_quote == Some(ch) {
            match self.char_literal_len(ch) {
                Some(len) => {
                    if self.peek(1) == Some('\\') {
                        if let Some(escaped) = self.peek(2).filter(|c| !self.desc.is_allowed_escape(*c)) {
                            self.emit(self.line, self.col + 1, ScanIssue::InvalidEscape(escaped));
                        }
                    }
                    self.advance_by(len);
                    self.token(start, self.i, TokenClass::String);
                }
                None => {
                    self.advance();
                    self.token(start, self.i, TokenClass::Operator);
                }
            }
            return;
        }

        if self.desc.block_headers.is_some_and(|h| h.open == ch) && self.state.bracket_stack.is_empty() {
            if let Some(facts) = self.lines.last_mut() {
                facts.opens_block = true;
            }
        }

        if self.desc.is_opener(ch) {
            self.state.bracket_stack.push(OpenBracket {
                ch,
                line: self.line,
                col: self.col,
            });
            self.advance();
            self.token(start, self.i, TokenClass::Bracket);
        } else if self.desc.is_closer(ch) {
            self.close_bracket(ch);
            self.advance();
            self.token(start, self.i, TokenClass::Bracket);
        } else if ch.is_ascii_digit() {
            self.advance_while(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_');
            self.token(start, self.i, TokenClass::Number);
        } else if is_ident_start(ch) {
            let col = self.col;
            self.advance_while(is_ident_continue);
            let word: String = self.chars[start..self.i].iter().collect();

            if self.desc.is_string_prefix(&word) {
                if let Some(delimiter) = self.delimiter_at() {
                    let mark = Mark {
                        offset: start,
                        line: self.line,
                        col,
                    };
                    self.open_string(mark, delimiter, self.desc.is_raw_prefix(&word));
                    return;
                }
            }

            let class = if self.desc.is_keyword(&word) {
                TokenClass::Keyword
            } else {
                TokenClass::Identifier
            };
            self.token(start, self.i, class);
        } else if ch.is_whitespace() {
            self.advance();
        } else {
            self.advance();
            self.token(start, self.i, TokenClass::Operator);
        }
    }

    fn advance_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek(0) {
            if !pred(c) {
                break;
            }
            self.advance();
        }
    }

    fn close_bracket(&mut self, ch: char) {
        match self.state.bracket_stack.pop() {
            None => self.emit(self.line, self.col, ScanIssue::UnmatchedClosing(ch)),
            Some(open) if !self.desc.pairs(open.ch, ch) => self.emit(
                self.line,
                self.col,
                ScanIssue::MismatchedClosing {
                    found: ch,
                    open: open.ch,
                    line: open.line,
                    col: open.col,
                },
            ),
            Some(_) => {}
        }
    }

    /// End-of-input checks
    fn finish(&mut self) {
        self.end_line();

        if self.state.in_string {
            let start = self.state.string_start;
            self.emit(start.line, start.col, ScanIssue::UnclosedString);
            self.close_string(self.chars.len());
        }
        if self.state.in_comment {
            let start = self.state.comment_start;
            self.token(start, self.chars.len(), TokenClass::Comment);
        }
        while let Some(open) = self.state.bracket_stack.pop() {
            self.emit(open.line, open.col, ScanIssue::UnclosedBracket(open.ch));
        }
    }

    /// Per-line indentation and block-header checks.
    /// A header passes when its line opens a block at depth 0, so one-line
    /// bodies like `if (a) { b(); }` are fine.
    fn post_pass(&mut self, content: &str) {
        let headers = self.desc.block_headers;
        if !self.desc.check_indentation && headers.is_none() {
            return;
        }

        for (idx, text) in content.split('\n').enumerate() {
            let line = idx + 1;
            let facts = self.lines.get(idx).copied().unwrap_or_default();
            if facts.starts_in_literal {
                continue;
            }

            let indent: String = text.chars().take_while(|c| *c == ' ' || *c == '\t').collect();
            if self.desc.check_indentation && indent.contains(' ') && indent.contains('\t') {
                self.emit(line, 1, ScanIssue::MixedIndentation);
            }

            let Some(headers) = headers else { continue };
            let body = &text[indent.len()..];
            let word: String = body.chars().take_while(|c| is_ident_continue(*c)).collect();
            if word.is_empty() || !headers.keywords.contains(&word.as_str()) {
                continue;
            }
            let depth = self.state.bracket_depth_at_line_end.get(&line).copied().unwrap_or(0);
            if depth == 0 && !facts.opens_block {
                self.emit(line, indent.chars().count() + 1, ScanIssue::MissingBlockOpen(headers.open));
            }
        }
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}
