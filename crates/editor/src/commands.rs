//! Editor Commands
//!
//! Mutating commands run as transactions: the current (content, selection) is
//! snapshotted, the edit is applied, and the snapshot lands on the undo stack.
//! Commands that turn out to be no-ops leave both stacks untouched.

use std::collections::VecDeque;
use std::ops::Range;

use tracing::debug;

use crate::buffer::{Document, Position};
use crate::selection::Selection;

/// Editor command type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Edit commands
    InsertText(String),
    Paste(String),
    Cut,
    Enter,
    Backspace,
    Indent,
    Outdent,

    // Search/replace results
    Replace { range: Range<usize>, text: String },
    SetContent(String),

    // Undo/Redo
    Undo,
    Redo,
}

/// Command execution result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub success: bool,
    /// Whether the document or selection was committed
    pub changed: bool,
    pub message: Option<String>,
}

impl CommandResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            changed: true,
            message: None,
        }
    }

    pub fn unchanged() -> Self {
        Self {
            success: true,
            changed: false,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            changed: false,
            message: Some(message.into()),
        }
    }
}

/// Immutable (content, selection) pair captured before a mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSnapshot {
    pub content: String,
    pub selection: Selection,
}

impl EditSnapshot {
    pub fn capture(document: &Document, selection: Selection) -> Self {
        Self {
            content: document.text().to_string(),
            selection,
        }
    }
}

/// Undo/redo transaction log over a document and its selection
#[derive(Debug, Clone)]
pub struct CommandStack {
    undo_stack: VecDeque<EditSnapshot>,
    redo_stack: Vec<EditSnapshot>,
    max_history: usize,
    indent_width: usize,
}

impl CommandStack {
    pub fn new() -> Self {
        Self::with_limits(1000, 4)
    }

    pub fn with_limits(max_history: usize, indent_width: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_history: max_history.max(1),
            indent_width: indent_width.max(1),
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Forget all history (document replaced or reloaded)
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Execute a command on a document
    pub fn execute(
        &mut self,
        command: Command,
        document: &mut Document,
        selection: &mut Selection,
    ) -> CommandResult {
        *selection = selection.clamped(document.len());
        debug!("Executing {:?}", command);

        let indent = self.indent_width;
        let result = match command {
            Command::InsertText(text) | Command::Paste(text) => {
                self.transact(document, selection, |doc, sel| insert_text(doc, sel, &text))
            }
            Command::Cut => {
                if selection.is_empty() {
                    return CommandResult::unchanged().with_message("No selection to cut");
                }
                self.transact(document, selection, |doc, sel| insert_text(doc, sel, ""))
            }
            Command::Enter => self.transact(document, selection, enter),
            Command::Backspace => self.transact(document, selection, backspace),
            Command::Indent => self.transact(document, selection, |doc, sel| {
                if sel.is_empty() {
                    insert_text(doc, sel, &" ".repeat(indent))
                } else {
                    indent_lines(doc, sel, indent)
                }
            }),
            Command::Outdent => self.transact(document, selection, |doc, sel| {
                if sel.is_empty() {
                    outdent_caret(doc, sel, indent)
                } else {
                    outdent_lines(doc, sel, indent)
                }
            }),
            Command::Replace { range, text } => self.transact(document, selection, |doc, sel| {
                let start = doc.clamp(range.start.min(range.end));
                let end = doc.clamp(range.start.max(range.end));
                if doc.slice(start..end) == text {
                    return false;
                }
                doc.replace(start..end, &text);
                *sel = Selection::caret(start + text.chars().count());
                true
            }),
            Command::SetContent(content) => self.transact(document, selection, |doc, sel| {
                if doc.text() == content {
                    return false;
                }
                doc.set_text(content);
                *sel = sel.clamped(doc.len());
                true
            }),
            Command::Undo => return self.undo(document, selection),
            Command::Redo => return self.redo(document, selection),
        };

        *selection = selection.clamped(document.len());
        result
    }

    /// Snapshot, run `edit`, and keep the snapshot only if `edit` changed something
    fn transact<F>(&mut self, document: &mut Document, selection: &mut Selection, edit: F) -> CommandResult
    where
        F: FnOnce(&mut Document, &mut Selection) -> bool,
    {
        let snapshot = EditSnapshot::capture(document, *selection);
        if !edit(document, selection) {
            return CommandResult::unchanged();
        }

        self.undo_stack.push_back(snapshot);
        self.redo_stack.clear();
        if self.undo_stack.len() > self.max_history {
            self.undo_stack.pop_front();
        }
        CommandResult::ok()
    }

    /// Undo the last transaction
    pub fn undo(&mut self, document: &mut Document, selection: &mut Selection) -> CommandResult {
        let Some(snapshot) = self.undo_stack.pop_back() else {
            return CommandResult::unchanged().with_message("Nothing to undo");
        };
        self.redo_stack.push(EditSnapshot::capture(document, *selection));
        restore(snapshot, document, selection);
        CommandResult::ok().with_message("Undone")
    }

    /// Redo the last undone transaction
    pub fn redo(&mut self, document: &mut Document, selection: &mut Selection) -> CommandResult {
        let Some(snapshot) = self.redo_stack.pop() else {
            return CommandResult::unchanged().with_message("Nothing to redo");
        };
        self.undo_stack.push_back(EditSnapshot::capture(document, *selection));
        restore(snapshot, document, selection);
        CommandResult::ok().with_message("Redone")
    }
}

impl Default for CommandStack {
    fn default() -> Self {
        Self::new()
    }
}

fn restore(snapshot: EditSnapshot, document: &mut Document, selection: &mut Selection) {
    document.set_text(snapshot.content);
    *selection = snapshot.selection.clamped(document.len());
}

/// Replace the selection with `text`; the caret lands after the inserted run
fn insert_text(doc: &mut Document, sel: &mut Selection, text: &str) -> bool {
    if text.is_empty() && sel.is_empty() {
        return false;
    }
    let start = sel.start();
    doc.replace(start..sel.end(), text);
    *sel = Selection::caret(start + text.chars().count());
    true
}

/// Newline carrying over the current line's leading whitespace up to the caret
fn enter(doc: &mut Document, sel: &mut Selection) -> bool {
    let start = sel.start();
    let pos = doc.offset_to_position(start);
    let line_start = doc.position_to_offset(pos.line, 0);
    let indent: String = doc
        .slice(line_start..start)
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect();
    insert_text(doc, sel, &format!("\n{}", indent))
}

fn backspace(doc: &mut Document, sel: &mut Selection) -> bool {
    if !sel.is_empty() {
        return insert_text(doc, sel, "");
    }
    let caret = sel.caret;
    if caret == 0 {
        return false;
    }
    doc.replace(caret - 1..caret, "");
    *sel = Selection::caret(caret - 1);
    true
}

/// Remove up to `width` spaces immediately left of the caret
fn outdent_caret(doc: &mut Document, sel: &mut Selection, width: usize) -> bool {
    let caret = sel.caret;
    let spaces = doc
        .slice(caret.saturating_sub(width)..caret)
        .chars()
        .rev()
        .take_while(|c| *c == ' ')
        .count();
    if spaces == 0 {
        return false;
    }
    doc.replace(caret - spaces..caret, "");
    *sel = Selection::caret(caret - spaces);
    true
}

/// Lines touched by the selection, inclusive
fn selected_lines(doc: &Document, sel: &Selection) -> (Position, Position, Range<usize>) {
    let anchor = doc.offset_to_position(sel.anchor);
    let caret = doc.offset_to_position(sel.caret);
    let first = anchor.line.min(caret.line);
    let last = anchor.line.max(caret.line);
    (anchor, caret, first..last + 1)
}

fn indent_lines(doc: &mut Document, sel: &mut Selection, width: usize) -> bool {
    let (anchor, caret, lines) = selected_lines(doc, sel);
    let pad = " ".repeat(width);

    for line in lines.rev() {
        let start = doc.position_to_offset(line, 0);
        doc.replace(start..start, &pad);
    }

    *sel = Selection::new(
        doc.position_to_offset(anchor.line, anchor.column + width),
        doc.position_to_offset(caret.line, caret.column + width),
    );
    true
}

/// Strip a leading `width`-space run, else one leading tab, from each selected line.
/// Both endpoint columns move back by `width`, stopping at 0.
fn outdent_lines(doc: &mut Document, sel: &mut Selection, width: usize) -> bool {
    let (anchor, caret, lines) = selected_lines(doc, sel);
    let run = " ".repeat(width);

    let mut removed_any = false;
    for line in lines.rev() {
        let text = doc.line(line).unwrap_or_default();
        let count = if text.starts_with(&run) {
            width
        } else if text.starts_with('\t') {
            1
        } else {
            0
        };
        if count > 0 {
            let start = doc.position_to_offset(line, 0);
            doc.replace(start..start + count, "");
            removed_any = true;
        }
    }
    if !removed_any {
        return false;
    }

    *sel = Selection::new(
        doc.position_to_offset(anchor.line, anchor.column.saturating_sub(width)),
        doc.position_to_offset(caret.line, caret.column.saturating_sub(width)),
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(text: &str, anchor: usize, caret: usize) -> (CommandStack, Document, Selection) {
        (CommandStack::new(), Document::from_str(text), Selection::new(anchor, caret))
    }

    #[test]
    fn test_insert_command() {
        let (mut stack, mut doc, mut sel) = setup("Hello", 5, 5);
        stack.execute(Command::InsertText(" World".into()), &mut doc, &mut sel);

        assert_eq!(doc.text(), "Hello World");
        assert_eq!(sel, Selection::caret(11));
    }

    #[test]
    fn test_paste_replaces_selection() {
        let (mut stack, mut doc, mut sel) = setup("one two three", 8, 4);
        stack.execute(Command::Paste("2".into()), &mut doc, &mut sel);

        assert_eq!(doc.text(), "one 2three");
        assert_eq!(sel, Selection::caret(5));
    }

    #[test]
    fn test_cut_requires_selection() {
        let (mut stack, mut doc, mut sel) = setup("abc", 1, 1);
        let result = stack.execute(Command::Cut, &mut doc, &mut sel);
        assert!(!result.changed);
        assert!(!stack.can_undo());

        sel = Selection::new(0, 2);
        stack.execute(Command::Cut, &mut doc, &mut sel);
        assert_eq!(doc.text(), "c");
        assert_eq!(sel, Selection::caret(0));
    }

    #[test]
    fn test_enter_auto_indents() {
        let text = "fn main() {\n    let x = 1;";
        let (mut stack, mut doc, mut sel) = setup(text, text.len(), text.len());
        stack.execute(Command::Enter, &mut doc, &mut sel);

        assert_eq!(doc.text(), "fn main() {\n    let x = 1;\n    ");
        assert_eq!(sel, Selection::caret(doc.len()));
    }

    #[test]
    fn test_enter_indent_limited_to_caret() {
        let (mut stack, mut doc, mut sel) = setup("\t  x", 2, 2);
        stack.execute(Command::Enter, &mut doc, &mut sel);

        assert_eq!(doc.text(), "\t \n\t  x");
        assert_eq!(sel, Selection::caret(5));
    }

    #[test]
    fn test_backspace() {
        let (mut stack, mut doc, mut sel) = setup("abc", 0, 0);
        let result = stack.execute(Command::Backspace, &mut doc, &mut sel);
        assert!(!result.changed);

        sel = Selection::caret(2);
        stack.execute(Command::Backspace, &mut doc, &mut sel);
        assert_eq!(doc.text(), "ac");
        assert_eq!(sel, Selection::caret(1));

        sel = Selection::new(2, 0);
        stack.execute(Command::Backspace, &mut doc, &mut sel);
        assert_eq!(doc.text(), "");
    }

    #[test]
    fn test_tab_and_shift_tab_at_caret() {
        let (mut stack, mut doc, mut sel) = setup("x", 0, 0);
        stack.execute(Command::Indent, &mut doc, &mut sel);
        assert_eq!(doc.text(), "    x");
        assert_eq!(sel, Selection::caret(4));

        stack.execute(Command::Outdent, &mut doc, &mut sel);
        assert_eq!(doc.text(), "x");
        assert_eq!(sel, Selection::caret(0));

        let result = stack.execute(Command::Outdent, &mut doc, &mut sel);
        assert!(!result.changed);
    }

    #[test]
    fn test_shift_tab_stops_at_non_space() {
        let (mut stack, mut doc, mut sel) = setup("a\t  b", 4, 4);
        stack.execute(Command::Outdent, &mut doc, &mut sel);
        assert_eq!(doc.text(), "a\tb");
        assert_eq!(sel, Selection::caret(2));
    }

    #[test]
    fn test_indent_selection_shifts_columns() {
        let text = "a\nbb\nccc";
        let (mut stack, mut doc, mut sel) = setup(text, 1, 6);
        stack.execute(Command::Indent, &mut doc, &mut sel);

        assert_eq!(doc.text(), "    a\n    bb\n    ccc");
        assert_eq!(doc.offset_to_position(sel.anchor), Position::new(0, 5));
        assert_eq!(doc.offset_to_position(sel.caret), Position::new(2, 5));
    }

    #[test]
    fn test_outdent_selection_mixed() {
        let text = "    a\n\tb\nc";
        let (mut stack, mut doc, mut sel) = setup(text, 0, text.len());
        stack.execute(Command::Outdent, &mut doc, &mut sel);

        assert_eq!(doc.text(), "a\nb\nc");
        assert_eq!(sel, Selection::new(0, 4));
    }

    #[test]
    fn test_outdent_selection_moves_columns_by_width() {
        let text = "    a\n\tbcdefg";
        let (mut stack, mut doc, mut sel) = setup(text, 0, 12);
        stack.execute(Command::Outdent, &mut doc, &mut sel);

        assert_eq!(doc.text(), "a\nbcdefg");
        assert_eq!(doc.offset_to_position(sel.anchor), Position::new(0, 0));
        assert_eq!(doc.offset_to_position(sel.caret), Position::new(1, 2));
    }

    #[test]
    fn test_tab_shift_tab_symmetry() {
        let text = "alpha\n  beta\n\tgamma\n";
        let (mut stack, mut doc, mut sel) = setup(text, 2, 15);
        stack.execute(Command::Indent, &mut doc, &mut sel);
        stack.execute(Command::Outdent, &mut doc, &mut sel);

        assert_eq!(doc.text(), text);
        assert_eq!(doc.offset_to_position(sel.anchor), Position::new(0, 2));
        assert_eq!(doc.offset_to_position(sel.caret), Position::new(2, 2));
    }

    #[test]
    fn test_undo_redo() {
        let (mut stack, mut doc, mut sel) = setup("Hello", 5, 5);
        stack.execute(Command::InsertText(" World".into()), &mut doc, &mut sel);
        let after = (doc.text().to_string(), sel);

        stack.execute(Command::Undo, &mut doc, &mut sel);
        assert_eq!(doc.text(), "Hello");
        assert_eq!(sel, Selection::caret(5));

        stack.execute(Command::Redo, &mut doc, &mut sel);
        assert_eq!((doc.text().to_string(), sel), after);
    }

    #[test]
    fn test_fresh_edit_clears_redo() {
        let (mut stack, mut doc, mut sel) = setup("", 0, 0);
        stack.execute(Command::InsertText("a".into()), &mut doc, &mut sel);
        stack.execute(Command::Undo, &mut doc, &mut sel);
        assert!(stack.can_redo());

        stack.execute(Command::InsertText("b".into()), &mut doc, &mut sel);
        assert!(!stack.can_redo());
        let result = stack.execute(Command::Redo, &mut doc, &mut sel);
        assert!(!result.changed);
        assert_eq!(result.message.as_deref(), Some("Nothing to redo"));
        assert_eq!(doc.text(), "b");
    }

    #[test]
    fn test_underflow_is_noop() {
        let (mut stack, mut doc, mut sel) = setup("keep", 2, 2);
        let result = stack.execute(Command::Undo, &mut doc, &mut sel);
        assert!(result.success);
        assert!(!result.changed);
        assert_eq!(doc.text(), "keep");
    }

    #[test]
    fn test_history_limit() {
        let mut stack = CommandStack::with_limits(2, 4);
        let mut doc = Document::new();
        let mut sel = Selection::default();
        for ch in ["a", "b", "c"] {
            stack.execute(Command::InsertText(ch.into()), &mut doc, &mut sel);
        }
        assert_eq!(stack.undo_depth(), 2);

        stack.execute(Command::Undo, &mut doc, &mut sel);
        stack.execute(Command::Undo, &mut doc, &mut sel);
        stack.execute(Command::Undo, &mut doc, &mut sel);
        assert_eq!(doc.text(), "a");

        // Redo refills the capped history without growing past it
        stack.execute(Command::Redo, &mut doc, &mut sel);
        stack.execute(Command::Redo, &mut doc, &mut sel);
        assert_eq!(doc.text(), "abc");
        assert_eq!(stack.undo_depth(), 2);
    }

    #[test]
    fn test_out_of_range_selection_is_clamped() {
        let (mut stack, mut doc, mut sel) = setup("abc", 10, 50);
        stack.execute(Command::InsertText("!".into()), &mut doc, &mut sel);
        assert_eq!(doc.text(), "abc!");
        assert_eq!(sel, Selection::caret(4));
    }
}
