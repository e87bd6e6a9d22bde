//! Quill Core - configuration, errors and events
//!
//! Shared pieces every Quill crate builds on: the error type, the
//! configuration handed to an editing session, and the event bus sessions
//! publish to.

pub mod config;
pub mod error;
pub mod events;

pub use config::{AppConfig, EditorAction, EditorConfig, KeyBindings};
pub use error::{QuillError, Result};
pub use events::{Event, EventBus, EventSubscription};

/// Quill version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "Quill";
