//! Application Configuration
//!
//! Settings handed to the editing core at construction time:
//! - Editor behaviour (indent width, history depth, status expiry)
//! - Keybinding map (chord -> action)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{QuillError, Result};

/// Editor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Spaces inserted by Tab and removed by Shift+Tab
    pub indent_width: usize,
    /// Maximum number of undo snapshots kept
    pub history_limit: usize,
    /// How long a status message stays visible, in milliseconds
    pub status_ttl_ms: u64,
    /// Delay before a deferred highlight pass, in milliseconds
    pub highlight_debounce_ms: u64,
    /// Default case sensitivity for search
    pub case_sensitive_search: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            indent_width: 4,
            history_limit: 1000,
            status_ttl_ms: 3000,
            highlight_debounce_ms: 120,
            case_sensitive_search: false,
        }
    }
}

/// Actions a key chord can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorAction {
    Enter,
    Backspace,
    Indent,
    Outdent,
    Cut,
    Copy,
    Paste,
    Undo,
    Redo,
    SelectAll,
    FindNext,
    FindPrevious,
}

/// Keybinding map from chord (e.g. `ctrl+z`) to action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyBindings(BTreeMap<String, EditorAction>);

impl KeyBindings {
    /// An empty map with no bindings
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Bind a chord, replacing any existing binding
    pub fn bind(&mut self, chord: &str, action: EditorAction) {
        self.0.insert(normalize_chord(chord), action);
    }

    /// Remove a chord binding
    pub fn unbind(&mut self, chord: &str) -> Option<EditorAction> {
        self.0.remove(&normalize_chord(chord))
    }

    /// Look up the action for a chord
    pub fn action_for(&self, chord: &str) -> Option<EditorAction> {
        self.0.get(&normalize_chord(chord)).copied()
    }

    /// Number of bound chords
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = Self::empty();
        bindings.bind("enter", EditorAction::Enter);
        bindings.bind("backspace", EditorAction::Backspace);
        bindings.bind("tab", EditorAction::Indent);
        bindings.bind("shift+tab", EditorAction::Outdent);
        bindings.bind("ctrl+x", EditorAction::Cut);
        bindings.bind("ctrl+c", EditorAction::Copy);
        bindings.bind("ctrl+v", EditorAction::Paste);
        bindings.bind("ctrl+z", EditorAction::Undo);
        bindings.bind("ctrl+y", EditorAction::Redo);
        bindings.bind("ctrl+shift+z", EditorAction::Redo);
        bindings.bind("ctrl+a", EditorAction::SelectAll);
        bindings.bind("f3", EditorAction::FindNext);
        bindings.bind("shift+f3", EditorAction::FindPrevious);
        bindings
    }
}

/// Canonical chord spelling: lowercase, no spaces, modifiers ordered ctrl/alt/shift/meta
fn normalize_chord(chord: &str) -> String {
    const ORDER: [&str; 4] = ["ctrl", "alt", "shift", "meta"];

    let parts: Vec<String> = chord
        .split('+')
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect();
    let Some((key, modifiers)) = parts.split_last() else {
        return String::new();
    };

    let mut ordered: Vec<&str> = ORDER
        .iter()
        .copied()
        .filter(|m| modifiers.iter().any(|p| p.as_str() == *m))
        .collect();
    ordered.push(key.as_str());
    ordered.join("+")
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration version for migrations
    pub version: u32,
    /// Editor settings
    pub editor: EditorConfig,
    /// Keybinding map
    pub keybindings: KeyBindings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            editor: EditorConfig::default(),
            keybindings: KeyBindings::default(),
        }
    }
}

impl AppConfig {
    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "quill", "Quill").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the configuration file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location
    pub async fn load() -> Result<Self> {
        let config_file = Self::config_file()
            .ok_or_else(|| QuillError::Config("Cannot determine config path".into()))?;
        Self::load_from(&config_file).await
    }

    /// Load configuration from a file, falling back to defaults when it is missing
    pub async fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!("Loading config from {:?}", path);
            let contents = tokio::fs::read_to_string(path).await?;
            Self::from_toml_str(&contents)
        } else {
            info!("Config file not found, using defaults");
            Ok(AppConfig::default())
        }
    }

    /// Save configuration to the default location
    pub async fn save(&self) -> Result<()> {
        let config_file = Self::config_file()
            .ok_or_else(|| QuillError::Config("Cannot determine config path".into()))?;
        self.save_to(&config_file).await
    }

    /// Save configuration to a file
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = toml::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;

        debug!("Config saved to {:?}", path);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.editor.indent_width == 0 {
            return Err(QuillError::Config("editor.indent_width must be at least 1".into()));
        }
        if self.editor.history_limit == 0 {
            return Err(QuillError::Config("editor.history_limit must be at least 1".into()));
        }
        Ok(())
    }
}
