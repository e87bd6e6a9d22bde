//! Quill Editor
//!
//! Editing core for one open document:
//! - Contiguous text buffer with a lazy line-start index
//! - Snapshot-based undo/redo command stack
//! - One generic scanner driven by per-language descriptors
//! - Diagnostics, highlight markup and search/replace over the buffer

pub mod buffer;
pub mod commands;
pub mod diagnostics;
pub mod highlight;
pub mod host;
pub mod search;
pub mod selection;
pub mod session;
pub mod syntax;

pub use buffer::{Document, Position};
pub use commands::{Command, CommandResult, CommandStack, EditSnapshot};
pub use diagnostics::{Diagnostic, DiagnosticsEngine, ScanIssue};
pub use highlight::{highlight, Generation, HighlightGate, HighlightRequest, HighlightResult, Markup, SpanStyle, StyledSpan};
pub use host::{Clipboard, FileSaver, MemoryClipboard, MemorySaver, Saver};
pub use search::{SearchEngine, SearchMatch};
pub use selection::Selection;
pub use session::{EditorSession, SessionHandle, SessionView};
pub use syntax::{scan, Language, LanguageDescriptor, Token, TokenClass};
