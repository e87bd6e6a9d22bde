//! Selection Management
//!
//! A selection is an (anchor, caret) pair of char offsets. The anchor stays
//! where the selection began; the caret is the end that moves.

use serde::Serialize;

/// A text selection range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Selection {
    /// Where the selection started
    pub anchor: usize,
    /// The active end
    pub caret: usize,
}

impl Selection {
    /// Create a new selection
    pub fn new(anchor: usize, caret: usize) -> Self {
        Self { anchor, caret }
    }

    /// Create an empty selection (a bare caret) at an offset
    pub fn caret(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    /// Check if the selection is empty
    pub fn is_empty(&self) -> bool {
        self.anchor == self.caret
    }

    /// The lesser endpoint
    pub fn start(&self) -> usize {
        self.anchor.min(self.caret)
    }

    /// The greater endpoint
    pub fn end(&self) -> usize {
        self.anchor.max(self.caret)
    }

    /// Get the normalized selection (start always before end)
    pub fn normalized(&self) -> (usize, usize) {
        (self.start(), self.end())
    }

    /// Number of selected chars
    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    /// Check if an offset is within the selection
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start() && offset < self.end()
    }

    /// Move the caret, keeping the anchor
    pub fn extend_to(&mut self, offset: usize) {
        self.caret = offset;
    }

    /// Collapse to a caret at the given offset
    pub fn collapse_to(&mut self, offset: usize) {
        self.anchor = offset;
        self.caret = offset;
    }

    /// Bring both endpoints into `[0, len]`
    pub fn clamped(self, len: usize) -> Self {
        Self {
            anchor: self.anchor.min(len),
            caret: self.caret.min(len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_contains() {
        let sel = Selection::new(10, 20);

        assert!(sel.contains(15));
        assert!(!sel.contains(5));
        assert!(!sel.contains(20));
    }

    #[test]
    fn test_selection_normalized() {
        let sel = Selection::new(10, 5);
        assert_eq!(sel.normalized(), (5, 10));
        assert_eq!(sel.len(), 5);
        assert!(!sel.is_empty());
    }

    #[test]
    fn test_clamped_keeps_direction() {
        let sel = Selection::new(30, 2).clamped(12);
        assert_eq!(sel, Selection::new(12, 2));
        assert!(sel.start() <= sel.end());
    }

    #[test]
    fn test_extend_and_collapse() {
        let mut sel = Selection::caret(4);
        sel.extend_to(9);
        assert_eq!(sel.normalized(), (4, 9));
        sel.collapse_to(1);
        assert!(sel.is_empty());
        assert_eq!(sel.start(), 1);
    }
}
