//! Quill - editing core
//!
//! A text buffer with transactional editing, one generic multi-language
//! scanner, diagnostics, highlight markup and search/replace.
//!
//! ## Architecture
//!
//! - `quill-core`: configuration, errors and the event bus
//! - `quill-editor`: buffer, command stack, scanner, diagnostics, highlight,
//!   search and the editing session
//!
//! This crate adds the `quill` command-line front end.

#![warn(clippy::all)]

pub mod commands;

// Re-export main components for library usage
pub use quill_core as core;
pub use quill_editor as editor;

/// Prelude module for convenient imports
pub mod prelude {
    pub use quill_core::{AppConfig, EditorConfig, Event, EventBus, KeyBindings, QuillError};
    pub use quill_editor::{
        Clipboard, Command, Document, EditorSession, HighlightGate, Language, Saver, SearchEngine, Selection,
        SessionHandle,
    };
}
