//! Diagnostics
//!
//! Advisory, line-addressed issues raised by a scan pass. A problems panel
//! reads `visible()`; muting a line hides its issues without touching the
//! buffer.

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::syntax::{self, Language};

/// Issues the scanner can raise. The messages are a fixed taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanIssue {
    #[error("EOL while scanning string literal")]
    EolInString,

    #[error("Invalid escape sequence \\{0}")]
    InvalidEscape(char),

    #[error("Unmatched closing '{0}'")]
    UnmatchedClosing(char),

    #[error("Mismatched closing '{found}'; expected closing for '{open}' from line {line}, col {col}")]
    MismatchedClosing {
        found: char,
        open: char,
        line: usize,
        col: usize,
    },

    #[error("Unclosed string literal")]
    UnclosedString,

    #[error("Unclosed '{0}'")]
    UnclosedBracket(char),

    #[error("Mixed tabs and spaces in indentation")]
    MixedIndentation,

    #[error("Missing '{0}' at end of block header")]
    MissingBlockOpen(char),
}

/// A single diagnostic; `line` and `col` are 1-based
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub line: usize,
    pub col: usize,
    pub message: String,
    pub muted: bool,
    #[serde(skip)]
    pub issue: ScanIssue,
}

impl Diagnostic {
    pub fn new(line: usize, col: usize, issue: ScanIssue) -> Self {
        Self {
            line,
            col,
            message: issue.to_string(),
            muted: false,
            issue,
        }
    }
}

/// Last computed diagnostics plus the set of muted lines
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsEngine {
    diagnostics: Vec<Diagnostic>,
    muted_lines: BTreeSet<usize>,
}

impl DiagnosticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rescan `content`; an unrecognized language yields no diagnostics
    pub fn refresh(&mut self, content: &str, language: Option<Language>) {
        let diagnostics = match language {
            Some(language) => syntax::scan(content, language.descriptor()).diagnostics,
            None => Vec::new(),
        };
        debug!("Diagnostics refreshed: {} issues", diagnostics.len());
        self.replace(diagnostics);
    }

    /// Install a freshly computed list, keeping the mute set
    pub fn replace(&mut self, diagnostics: Vec<Diagnostic>) {
        self.diagnostics = diagnostics;
        self.apply_mutes();
    }

    /// Every diagnostic, muted ones flagged
    pub fn all(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics on lines that are not muted
    pub fn visible(&self) -> Vec<Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.muted).cloned().collect()
    }

    pub fn visible_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| !d.muted).count()
    }

    pub fn mute_line(&mut self, line: usize) {
        self.muted_lines.insert(line);
        self.apply_mutes();
    }

    /// Clear the whole mute set in one step
    pub fn unmute_all(&mut self) {
        self.muted_lines.clear();
        self.apply_mutes();
    }

    pub fn is_muted(&self, line: usize) -> bool {
        self.muted_lines.contains(&line)
    }

    pub fn muted_lines(&self) -> impl Iterator<Item = usize> + '_ {
        self.muted_lines.iter().copied()
    }

    fn apply_mutes(&mut self) {
        for diagnostic in &mut self.diagnostics {
            diagnostic.muted = self.muted_lines.contains(&diagnostic.line);
        }
    }
}
