//! Text Buffer
//!
//! Owned, contiguous document text addressed by char offsets. Line/column
//! positions are always derived from a line-start table that is rebuilt lazily
//! after each change, never stored alongside the offset.

use once_cell::unsync::OnceCell;
use std::ops::Range;

/// Text position (line, column), both 0-based, columns counted in chars
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Char offsets at which each line begins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    /// Build the index for a piece of text
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        let mut len = 0;
        for ch in text.chars() {
            len += 1;
            if ch == '\n' {
                starts.push(len);
            }
        }
        Self { starts, len }
    }

    /// Number of lines (an empty text has one empty line)
    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// Offset of the first char of `line`, clamped to the last line
    pub fn line_start(&self, line: usize) -> usize {
        self.starts[line.min(self.starts.len() - 1)]
    }

    /// Length of `line` in chars, excluding its newline
    pub fn line_len(&self, line: usize) -> usize {
        let line = line.min(self.starts.len() - 1);
        let start = self.starts[line];
        match self.starts.get(line + 1) {
            Some(next) => next - start - 1,
            None => self.len - start,
        }
    }

    pub fn offset_to_position(&self, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = match self.starts.binary_search(&offset) {
            Ok(line) => line,
            Err(insert_at) => insert_at - 1,
        };
        Position::new(line, offset - self.starts[line])
    }

    pub fn position_to_offset(&self, pos: Position) -> usize {
        let line = pos.line.min(self.starts.len() - 1);
        self.starts[line] + pos.column.min(self.line_len(line))
    }
}

/// The document being edited
#[derive(Debug, Clone)]
pub struct Document {
    text: String,
    /// Content at the last save (or load)
    baseline: String,
    char_len: usize,
    line_index: OnceCell<LineIndex>,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self::from_str("")
    }

    /// Create a document from loaded content; the content is the saved baseline
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Self {
        Self {
            text: text.to_string(),
            baseline: text.to_string(),
            char_len: text.chars().count(),
            line_index: OnceCell::new(),
        }
    }

    /// Get the full text content
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Total char count
    pub fn len(&self) -> usize {
        self.char_len
    }

    pub fn is_empty(&self) -> bool {
        self.char_len == 0
    }

    /// Whether the content differs from the saved baseline
    pub fn is_dirty(&self) -> bool {
        self.text != self.baseline
    }

    /// Record the current content as saved
    pub fn mark_saved(&mut self) {
        self.baseline.clone_from(&self.text);
    }

    pub fn line_index(&self) -> &LineIndex {
        self.line_index.get_or_init(|| LineIndex::new(&self.text))
    }

    pub fn line_count(&self) -> usize {
        self.line_index().line_count()
    }

    /// Line content without its trailing newline
    pub fn line(&self, line: usize) -> Option<&str> {
        if line >= self.line_count() {
            return None;
        }
        let index = self.line_index();
        let start = index.line_start(line);
        Some(self.slice(start..start + index.line_len(line)))
    }

    pub fn line_len(&self, line: usize) -> usize {
        self.line_index().line_len(line)
    }

    pub fn offset_to_position(&self, offset: usize) -> Position {
        self.line_index().offset_to_position(offset)
    }

    /// Convert (line, column) to an offset, clamping the column to the line length
    pub fn position_to_offset(&self, line: usize, column: usize) -> usize {
        self.line_index().position_to_offset(Position::new(line, column))
    }

    /// Clamp an offset into `[0, len]`
    pub fn clamp(&self, offset: usize) -> usize {
        offset.min(self.char_len)
    }

    /// Text between two char offsets (clamped, swapped if reversed)
    pub fn slice(&self, range: Range<usize>) -> &str {
        let start = self.clamp(range.start.min(range.end));
        let end = self.clamp(range.start.max(range.end));
        &self.text[self.byte_offset(start)..self.byte_offset(end)]
    }

    /// Char at an offset
    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.slice(offset..offset + 1).chars().next()
    }

    /// Replace the chars in `range` with `text`
    pub fn replace(&mut self, range: Range<usize>, text: &str) {
        let start = self.clamp(range.start.min(range.end));
        let end = self.clamp(range.start.max(range.end));
        let byte_range = self.byte_offset(start)..self.byte_offset(end);
        self.text.replace_range(byte_range, text);
        self.char_len = self.char_len - (end - start) + text.chars().count();
        self.line_index = OnceCell::new();
    }

    /// Swap in entirely new content (undo/redo restore, replace-all)
    pub fn set_text(&mut self, text: String) {
        self.char_len = text.chars().count();
        self.text = text;
        self.line_index = OnceCell::new();
    }

    fn byte_offset(&self, char_offset: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_offset)
            .map(|(byte, _)| byte)
            .unwrap_or(self.text.len())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
