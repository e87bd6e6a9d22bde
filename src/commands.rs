//! CLI commands for Quill
//!
//! Each command loads one file into the editing core and reports what the
//! core sees: diagnostics, highlight markup or search results.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use quill_core::AppConfig;
use quill_editor::{
    Diagnostic, DiagnosticsEngine, EditorSession, FileSaver, Language, Markup, MemoryClipboard, SearchMatch,
};
use serde::Serialize;
use tracing::{debug, info};

/// Read a file and work out its language, preferring an explicit identifier
pub async fn load_document(path: &Path, language: Option<&str>) -> Result<(String, Option<Language>)> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let language = match language {
        Some(id) => Language::from_id(id),
        None => path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Language::from_extension),
    };
    debug!(
        "Loaded {} as {}",
        path.display(),
        language.map(|l| l.name()).unwrap_or("plain text")
    );
    Ok((content, language))
}

/// Report diagnostics for a file
pub struct CheckCommand {
    pub path: PathBuf,
    pub language: Option<String>,
    /// 1-based lines whose diagnostics are hidden
    pub muted_lines: Vec<usize>,
}

impl CheckCommand {
    /// Visible diagnostics after muting
    pub async fn execute(&self) -> Result<Vec<Diagnostic>> {
        let (content, language) = load_document(&self.path, self.language.as_deref()).await?;

        let mut engine = DiagnosticsEngine::new();
        for line in &self.muted_lines {
            engine.mute_line(*line);
        }
        engine.refresh(&content, language);

        info!("{}: {} diagnostics", self.path.display(), engine.visible_count());
        Ok(engine.visible())
    }
}

/// Render one diagnostic per line as `path:line:col: message`
pub fn format_diagnostics(path: &Path, diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("{}:{}:{}: {}\n", path.display(), d.line, d.col, d.message))
        .collect()
}

/// Render highlight markup for a file
pub struct HighlightCommand {
    pub path: PathBuf,
    pub language: Option<String>,
    pub term: Option<String>,
    pub case_sensitive: bool,
}

impl HighlightCommand {
    pub async fn execute(&self) -> Result<Markup> {
        let (content, language) = load_document(&self.path, self.language.as_deref()).await?;
        let term = self.term.as_deref().unwrap_or("");
        Ok(quill_editor::highlight(&content, language, term, self.case_sensitive))
    }
}

/// Search a file, optionally replacing every occurrence
pub struct SearchCommand {
    pub path: PathBuf,
    pub language: Option<String>,
    pub term: String,
    pub replacement: Option<String>,
    pub case_sensitive: Option<bool>,
    /// Write the replaced content back to `path`
    pub write: bool,
}

/// What a search run found and changed
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub matches: Vec<SearchMatch>,
    pub replaced: usize,
    pub content: Option<String>,
    pub saved: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> Result<SearchReport> {
        let (content, language) = load_document(&self.path, self.language.as_deref()).await?;
        let mut session = EditorSession::new(&content, language, config, Arc::new(MemoryClipboard::new()));

        let matches = session.search(&self.term, self.case_sensitive);
        let mut report = SearchReport {
            matches,
            replaced: 0,
            content: None,
            saved: false,
        };

        let Some(replacement) = &self.replacement else {
            return Ok(report);
        };

        let before = session.content().to_string();
        session.replace_all(replacement);
        report.replaced = quill_editor::search::find_matches(
            &before,
            &self.term,
            self.case_sensitive.unwrap_or(config.editor.case_sensitive_search),
        )
        .len();
        report.content = Some(session.content().to_string());

        if self.write && session.is_dirty() {
            let result = session.save(&FileSaver::new(&self.path)).await;
            if !result.success {
                anyhow::bail!(result.message.unwrap_or_else(|| "Save failed".to_string()));
            }
            report.saved = true;
            info!("Wrote {} replacements to {}", report.replaced, self.path.display());
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        tokio::fs::write(&path, content).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_document_detects_language() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "main.py", "x = 1").await;

        let (_, language) = load_document(&path, None).await.unwrap();
        assert_eq!(language, Some(Language::Python));

        let (_, language) = load_document(&path, Some("rust")).await.unwrap();
        assert_eq!(language, Some(Language::Rust));

        let (_, language) = load_document(&path, Some("cobol")).await.unwrap();
        assert_eq!(language, None);
    }

    #[tokio::test]
    async fn test_check_command() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "app.js", "f(\n)]\n").await;

        let command = CheckCommand {
            path: path.clone(),
            language: None,
            muted_lines: Vec::new(),
        };
        let diagnostics = command.execute().await.unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            format_diagnostics(&path, &diagnostics),
            format!("{}:2:2: Unmatched closing ']'\n", path.display())
        );

        let muted = CheckCommand {
            path,
            language: None,
            muted_lines: vec![2],
        };
        assert!(muted.execute().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_highlight_unknown_extension_is_plain() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "notes.txt", "<b>").await;

        let command = HighlightCommand {
            path,
            language: None,
            term: None,
            case_sensitive: false,
        };
        assert_eq!(command.execute().await.unwrap().to_html(), "&lt;b&gt;");
    }

    #[tokio::test]
    async fn test_search_and_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "data.json", "{\"a\": 1,\n \"A\": 2}").await;

        let command = SearchCommand {
            path: path.clone(),
            language: None,
            term: "a".to_string(),
            replacement: Some("b".to_string()),
            case_sensitive: Some(true),
            write: true,
        };
        let report = command.execute(&AppConfig::default()).await.unwrap();
        assert_eq!(report.matches, vec![SearchMatch { line_number: 1 }]);
        assert_eq!(report.replaced, 1);
        assert!(report.saved);
        assert_eq!(
            tokio::fs::read_to_string(&path).await.unwrap(),
            "{\"b\": 1,\n \"A\": 2}"
        );
    }
}
