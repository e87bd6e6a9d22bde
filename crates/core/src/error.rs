//! Error types for Quill
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// Main error type for Quill
#[derive(Error, Debug)]
pub enum QuillError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Save failed: {0}")]
    Save(String),

    #[error("Editing session closed")]
    SessionClosed,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Quill operations
pub type Result<T> = std::result::Result<T, QuillError>;

impl QuillError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, QuillError::Clipboard(_) | QuillError::Save(_))
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            QuillError::Io(e) => format!("File operation failed: {}", e),
            QuillError::Config(msg) => format!("Configuration error: {}", msg),
            QuillError::Clipboard(msg) => format!("Clipboard unavailable: {}", msg),
            QuillError::Save(msg) => format!("Could not save: {}", msg),
            QuillError::SessionClosed => "The editor was closed".to_string(),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable() {
        assert!(QuillError::Clipboard("denied".into()).is_recoverable());
        assert!(!QuillError::SessionClosed.is_recoverable());
    }

    #[test]
    fn test_user_message() {
        let err = QuillError::Save("disk full".into());
        assert_eq!(err.user_message(), "Could not save: disk full");
        assert_eq!(err.to_string(), "Save failed: disk full");
    }
}
