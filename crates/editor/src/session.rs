//! Editing session
//!
//! `EditorSession` owns one document and everything derived from it. The
//! `SessionHandle` actor serializes every request through a single queue, so a
//! clipboard call always resolves before the next queued command runs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use quill_core::{AppConfig, EditorAction, EditorConfig, Event, EventBus, KeyBindings, QuillError, Result};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::buffer::Document;
use crate::commands::{Command, CommandResult, CommandStack};
use crate::diagnostics::{Diagnostic, DiagnosticsEngine};
use crate::highlight::{highlight, Generation, HighlightGate, HighlightRequest, Markup};
use crate::host::{Clipboard, Saver};
use crate::search::{find_matches, SearchEngine, SearchMatch};
use crate::selection::Selection;
use crate::syntax::Language;

/// Status text with an expiry
#[derive(Debug, Clone)]
struct StatusLine {
    text: String,
    expires_at: Instant,
}

/// Read-only snapshot of a session for collaborators
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub content: String,
    pub dirty: bool,
    pub selection: Selection,
    pub language: Option<Language>,
    pub generation: Generation,
    pub diagnostics: Vec<Diagnostic>,
    pub search_matches: Vec<SearchMatch>,
    pub search_cursor: Option<usize>,
    pub status: Option<String>,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// One open document with its selection, history and derived state
pub struct EditorSession {
    document: Document,
    selection: Selection,
    commands: CommandStack,
    diagnostics: DiagnosticsEngine,
    search: SearchEngine,
    language: Option<Language>,
    generation: Generation,
    status: Option<StatusLine>,
    config: EditorConfig,
    keybindings: KeyBindings,
    clipboard: Arc<dyn Clipboard>,
    events: Option<Arc<EventBus>>,
}

impl EditorSession {
    pub fn new(content: &str, language: Option<Language>, config: &AppConfig, clipboard: Arc<dyn Clipboard>) -> Self {
        let mut session = Self {
            document: Document::from_str(content),
            selection: Selection::default(),
            commands: CommandStack::with_limits(config.editor.history_limit, config.editor.indent_width),
            diagnostics: DiagnosticsEngine::new(),
            search: SearchEngine::new(),
            language,
            generation: Generation::default(),
            status: None,
            config: config.editor.clone(),
            keybindings: config.keybindings.clone(),
            clipboard,
            events: None,
        };
        session.diagnostics.refresh(session.document.text(), language);
        info!(
            "Opened document: {} chars, language {}",
            session.document.len(),
            language.map(|l| l.name()).unwrap_or("plain")
        );
        session
    }

    /// Publish session events on `bus`
    pub fn with_events(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    /// Replace the document (open or reload); selection, history and mutes reset
    pub fn open(&mut self, content: &str, language: Option<Language>) {
        self.document = Document::from_str(content);
        self.selection = Selection::default();
        self.commands.clear();
        self.diagnostics = DiagnosticsEngine::new();
        self.search.clear();
        self.language = language;
        self.generation = self.generation.next();
        self.diagnostics.refresh(self.document.text(), language);

        info!("Reloaded document: {} chars", self.document.len());
        self.emit(Event::ContentChanged { generation: self.generation.0 });
        self.emit(Event::DiagnosticsUpdated { visible: self.diagnostics.visible_count() });
    }

    pub fn content(&self) -> &str {
        self.document.text()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn is_dirty(&self) -> bool {
        self.document.is_dirty()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn language(&self) -> Option<Language> {
        self.language
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn can_undo(&self) -> bool {
        self.commands.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.commands.can_redo()
    }

    /// Run a command as one transaction
    pub fn execute(&mut self, command: Command) -> CommandResult {
        let was_dirty = self.document.is_dirty();
        let result = self.commands.execute(command, &mut self.document, &mut self.selection);
        if result.changed {
            self.commit(was_dirty, true);
        }
        result
    }

    /// Bump the generation and recompute everything derived from content
    fn commit(&mut self, was_dirty: bool, refresh_search: bool) {
        self.generation = self.generation.next();
        self.diagnostics.refresh(self.document.text(), self.language);
        if refresh_search {
            self.search.refresh(self.document.text());
        }

        self.emit(Event::ContentChanged { generation: self.generation.0 });
        let dirty = self.document.is_dirty();
        if dirty != was_dirty {
            self.emit(Event::DirtyChanged(dirty));
        }
        self.emit(Event::DiagnosticsUpdated { visible: self.diagnostics.visible_count() });
    }

    /// Cut: write the selection to the clipboard, then remove it.
    /// The buffer is untouched if the clipboard write fails.
    pub async fn cut(&mut self) -> CommandResult {
        if self.selection.is_empty() {
            return CommandResult::unchanged().with_message("No selection to cut");
        }
        let text = self.selected_text();
        if let Err(e) = self.clipboard.write(text).await {
            return self.clipboard_failed(e);
        }
        self.execute(Command::Cut)
    }

    pub async fn copy(&mut self) -> CommandResult {
        if self.selection.is_empty() {
            return CommandResult::unchanged().with_message("No selection to copy");
        }
        let text = self.selected_text();
        match self.clipboard.write(text).await {
            Ok(()) => CommandResult::unchanged(),
            Err(e) => self.clipboard_failed(e),
        }
    }

    pub async fn paste(&mut self) -> CommandResult {
        match self.clipboard.read().await {
            Ok(text) => self.execute(Command::Paste(text)),
            Err(e) => self.clipboard_failed(e),
        }
    }

    fn clipboard_failed(&mut self, error: anyhow::Error) -> CommandResult {
        let error = QuillError::Clipboard(error.to_string());
        warn!("{}", error);
        let message = error.user_message();
        self.set_status(message.clone());
        CommandResult::error(message)
    }

    fn selected_text(&self) -> String {
        self.document.slice(self.selection.start()..self.selection.end()).to_string()
    }

    /// Dispatch a key chord through the keybinding map; unbound chords yield `None`
    pub async fn handle_key(&mut self, chord: &str) -> Option<CommandResult> {
        let action = self.keybindings.action_for(chord)?;
        debug!("Key {} -> {:?}", chord, action);

        let result = match action {
            EditorAction::Enter => self.execute(Command::Enter),
            EditorAction::Backspace => self.execute(Command::Backspace),
            EditorAction::Indent => self.execute(Command::Indent),
            EditorAction::Outdent => self.execute(Command::Outdent),
            EditorAction::Undo => self.execute(Command::Undo),
            EditorAction::Redo => self.execute(Command::Redo),
            EditorAction::Cut => self.cut().await,
            EditorAction::Copy => self.copy().await,
            EditorAction::Paste => self.paste().await,
            EditorAction::SelectAll => {
                self.select_all();
                CommandResult::unchanged()
            }
            EditorAction::FindNext => self.step_search(true),
            EditorAction::FindPrevious => self.step_search(false),
        };
        Some(result)
    }

    pub fn set_selection(&mut self, anchor: usize, caret: usize) {
        self.selection = Selection::new(anchor, caret).clamped(self.document.len());
    }

    pub fn select_all(&mut self) {
        self.selection = Selection::new(0, self.document.len());
    }

    pub fn set_language(&mut self, language: Option<Language>) {
        if self.language == language {
            return;
        }
        self.language = language;
        self.generation = self.generation.next();
        self.diagnostics.refresh(self.document.text(), language);
        self.emit(Event::ContentChanged { generation: self.generation.0 });
        self.emit(Event::DiagnosticsUpdated { visible: self.diagnostics.visible_count() });
    }

    /// Search the current content; `None` uses the configured default case sensitivity
    pub fn search(&mut self, term: &str, case_sensitive: Option<bool>) -> Vec<SearchMatch> {
        let case_sensitive = case_sensitive.unwrap_or(self.config.case_sensitive_search);
        self.search.search(self.document.text(), term, case_sensitive).to_vec()
    }

    pub fn search_matches(&self) -> &[SearchMatch] {
        self.search.matches()
    }

    pub fn search_cursor(&self) -> Option<usize> {
        self.search.cursor()
    }

    pub fn search_next(&mut self) -> Option<SearchMatch> {
        let found = self.search.next()?;
        self.reveal(found);
        Some(found)
    }

    pub fn search_previous(&mut self) -> Option<SearchMatch> {
        let found = self.search.previous()?;
        self.reveal(found);
        Some(found)
    }

    fn step_search(&mut self, forward: bool) -> CommandResult {
        let found = if forward { self.search_next() } else { self.search_previous() };
        match found {
            Some(_) => CommandResult::unchanged(),
            None => CommandResult::unchanged().with_message("No matches"),
        }
    }

    /// Select the first occurrence on the match's line
    fn reveal(&mut self, found: SearchMatch) {
        let line = found.line_number - 1;
        let Some(text) = self.document.line(line) else {
            return;
        };
        if let Some(hit) = find_matches(text, self.search.term(), self.search.case_sensitive()).first() {
            let line_start = self.document.position_to_offset(line, 0);
            self.selection = Selection::new(line_start + hit.start, line_start + hit.end);
        }
    }

    /// Replace the first occurrence on the current match's line
    pub fn replace_current(&mut self, replacement: &str) -> CommandResult {
        let Some(index) = self.search.cursor() else {
            return CommandResult::unchanged().with_message("No matches");
        };
        let Some(edit) = self.search.replace_one(self.document.text(), index, replacement) else {
            return CommandResult::unchanged();
        };

        let was_dirty = self.document.is_dirty();
        let command = Command::Replace { range: edit.range, text: edit.text };
        let result = self.commands.execute(command, &mut self.document, &mut self.selection);
        if result.changed {
            self.commit(was_dirty, false);
        }
        result
    }

    /// Replace every occurrence as a single undoable transaction
    pub fn replace_all(&mut self, replacement: &str) -> CommandResult {
        let (content, count) = self.search.replace_all(self.document.text(), replacement);
        if count == 0 {
            return CommandResult::unchanged().with_message("No matches");
        }

        let was_dirty = self.document.is_dirty();
        let result = self
            .commands
            .execute(Command::SetContent(content), &mut self.document, &mut self.selection);
        if result.changed {
            self.commit(was_dirty, false);
        }
        debug!("Replaced {} occurrences", count);
        result.with_message(format!("Replaced {} occurrences", count))
    }

    pub fn visible_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.visible()
    }

    pub fn diagnostics(&self) -> &DiagnosticsEngine {
        &self.diagnostics
    }

    pub fn mute_line(&mut self, line: usize) {
        self.diagnostics.mute_line(line);
        self.emit(Event::DiagnosticsUpdated { visible: self.diagnostics.visible_count() });
    }

    pub fn unmute_all(&mut self) {
        self.diagnostics.unmute_all();
        self.emit(Event::DiagnosticsUpdated { visible: self.diagnostics.visible_count() });
    }

    /// Ask `saver` to persist the content; success moves the saved baseline
    pub async fn save(&mut self, saver: &dyn Saver) -> CommandResult {
        let was_dirty = self.document.is_dirty();
        match saver.save(self.document.text().to_string()).await {
            Ok(()) => {
                self.document.mark_saved();
                info!("Saved document ({} chars)", self.document.len());
                self.emit(Event::SaveCompleted { success: true });
                if was_dirty {
                    self.emit(Event::DirtyChanged(false));
                }
                CommandResult::unchanged().with_message("Saved")
            }
            Err(e) => {
                let error = QuillError::Save(e.to_string());
                warn!("{}", error);
                let message = error.user_message();
                self.set_status(message.clone());
                self.emit(Event::SaveCompleted { success: false });
                CommandResult::error(message)
            }
        }
    }

    /// Current status text, if it has not expired
    pub fn status(&self) -> Option<&str> {
        self.status
            .as_ref()
            .filter(|s| Instant::now() < s.expires_at)
            .map(|s| s.text.as_str())
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.emit(Event::Status(text.clone()));
        self.status = Some(StatusLine {
            text,
            expires_at: Instant::now() + Duration::from_millis(self.config.status_ttl_ms),
        });
    }

    /// Render the current content synchronously
    pub fn highlight(&self) -> Markup {
        highlight(
            self.document.text(),
            self.language,
            self.search.term(),
            self.search.case_sensitive(),
        )
    }

    /// Inputs for a deferred render, tagged with the current generation
    pub fn highlight_request(&self) -> HighlightRequest {
        HighlightRequest {
            generation: self.generation,
            content: self.document.text().to_string(),
            language: self.language,
            term: self.search.term().to_string(),
            case_sensitive: self.search.case_sensitive(),
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            content: self.document.text().to_string(),
            dirty: self.document.is_dirty(),
            selection: self.selection,
            language: self.language,
            generation: self.generation,
            diagnostics: self.diagnostics.visible(),
            search_matches: self.search.matches().to_vec(),
            search_cursor: self.search.cursor(),
            status: self.status().map(str::to_string),
            can_undo: self.commands.can_undo(),
            can_redo: self.commands.can_redo(),
        }
    }

    fn emit(&self, event: Event) {
        if let Some(bus) = &self.events {
            bus.emit(event);
        }
    }
}

/// Requests processed by the session actor, one at a time
enum Request {
    Execute(Command, oneshot::Sender<CommandResult>),
    Key(String, oneshot::Sender<Option<CommandResult>>),
    Cut(oneshot::Sender<CommandResult>),
    Copy(oneshot::Sender<CommandResult>),
    Paste(oneshot::Sender<CommandResult>),
    SetSelection {
        anchor: usize,
        caret: usize,
        reply: oneshot::Sender<()>,
    },
    Search {
        term: String,
        case_sensitive: Option<bool>,
        reply: oneshot::Sender<Vec<SearchMatch>>,
    },
    ReplaceCurrent(String, oneshot::Sender<CommandResult>),
    ReplaceAll(String, oneshot::Sender<CommandResult>),
    MuteLine(usize, oneshot::Sender<()>),
    UnmuteAll(oneshot::Sender<()>),
    Save(Arc<dyn Saver>, oneshot::Sender<CommandResult>),
    Open {
        content: String,
        language: Option<Language>,
        reply: oneshot::Sender<()>,
    },
    Highlight(oneshot::Sender<(HighlightRequest, Duration)>),
    Generation(oneshot::Sender<Generation>),
    View(oneshot::Sender<SessionView>),
}

/// Cloneable handle to a session running on its own task
#[derive(Clone)]
pub struct SessionHandle {
    requests: mpsc::Sender<Request>,
}

impl SessionHandle {
    /// Move `session` onto a task that drains the request queue
    pub fn spawn(session: EditorSession) -> Self {
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(run(session, rx));
        Self { requests: tx }
    }

    async fn call<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Request) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(make(reply))
            .await
            .map_err(|_| QuillError::SessionClosed)?;
        rx.await.map_err(|_| QuillError::SessionClosed)
    }

    pub async fn execute(&self, command: Command) -> Result<CommandResult> {
        self.call(|reply| Request::Execute(command, reply)).await
    }

    pub async fn handle_key(&self, chord: &str) -> Result<Option<CommandResult>> {
        let chord = chord.to_string();
        self.call(|reply| Request::Key(chord, reply)).await
    }

    pub async fn cut(&self) -> Result<CommandResult> {
        self.call(Request::Cut).await
    }

    pub async fn copy(&self) -> Result<CommandResult> {
        self.call(Request::Copy).await
    }

    pub async fn paste(&self) -> Result<CommandResult> {
        self.call(Request::Paste).await
    }

    pub async fn set_selection(&self, anchor: usize, caret: usize) -> Result<()> {
        self.call(|reply| Request::SetSelection { anchor, caret, reply }).await
    }

    pub async fn search(&self, term: &str, case_sensitive: Option<bool>) -> Result<Vec<SearchMatch>> {
        let term = term.to_string();
        self.call(|reply| Request::Search { term, case_sensitive, reply }).await
    }

    pub async fn replace_current(&self, replacement: &str) -> Result<CommandResult> {
        let replacement = replacement.to_string();
        self.call(|reply| Request::ReplaceCurrent(replacement, reply)).await
    }

    pub async fn replace_all(&self, replacement: &str) -> Result<CommandResult> {
        let replacement = replacement.to_string();
        self.call(|reply| Request::ReplaceAll(replacement, reply)).await
    }

    pub async fn mute_line(&self, line: usize) -> Result<()> {
        self.call(|reply| Request::MuteLine(line, reply)).await
    }

    pub async fn unmute_all(&self) -> Result<()> {
        self.call(Request::UnmuteAll).await
    }

    pub async fn save(&self, saver: Arc<dyn Saver>) -> Result<CommandResult> {
        self.call(|reply| Request::Save(saver, reply)).await
    }

    pub async fn open(&self, content: &str, language: Option<Language>) -> Result<()> {
        let content = content.to_string();
        self.call(|reply| Request::Open { content, language, reply }).await
    }

    pub async fn generation(&self) -> Result<Generation> {
        self.call(Request::Generation).await
    }

    pub async fn view(&self) -> Result<SessionView> {
        self.call(Request::View).await
    }

    /// Debounced render off the edit path. Returns `None` when an edit landed
    /// while rendering and the result is stale.
    pub async fn render_highlight(&self, gate: &mut HighlightGate) -> Result<Option<Markup>> {
        let (request, debounce) = self.call(Request::Highlight).await?;
        let result = request.render_deferred(debounce).await?;
        gate.observe(self.generation().await?);
        Ok(gate.accept(result))
    }
}

async fn run(mut session: EditorSession, mut requests: mpsc::Receiver<Request>) {
    debug!("Session task started");

    while let Some(request) = requests.recv().await {
        match request {
            Request::Execute(command, reply) => {
                let _ = reply.send(session.execute(command));
            }
            Request::Key(chord, reply) => {
                let _ = reply.send(session.handle_key(&chord).await);
            }
            Request::Cut(reply) => {
                let _ = reply.send(session.cut().await);
            }
            Request::Copy(reply) => {
                let _ = reply.send(session.copy().await);
            }
            Request::Paste(reply) => {
                let _ = reply.send(session.paste().await);
            }
            Request::SetSelection { anchor, caret, reply } => {
                session.set_selection(anchor, caret);
                let _ = reply.send(());
            }
            Request::Search { term, case_sensitive, reply } => {
                let _ = reply.send(session.search(&term, case_sensitive));
            }
            Request::ReplaceCurrent(replacement, reply) => {
                let _ = reply.send(session.replace_current(&replacement));
            }
            Request::ReplaceAll(replacement, reply) => {
                let _ = reply.send(session.replace_all(&replacement));
            }
            Request::MuteLine(line, reply) => {
                session.mute_line(line);
                let _ = reply.send(());
            }
            Request::UnmuteAll(reply) => {
                session.unmute_all();
                let _ = reply.send(());
            }
            Request::Save(saver, reply) => {
                let _ = reply.send(session.save(saver.as_ref()).await);
            }
            Request::Open { content, language, reply } => {
                session.open(&content, language);
                let _ = reply.send(());
            }
            Request::Highlight(reply) => {
                let debounce = Duration::from_millis(session.config().highlight_debounce_ms);
                let _ = reply.send((session.highlight_request(), debounce));
            }
            Request::Generation(reply) => {
                let _ = reply.send(session.generation());
            }
            Request::View(reply) => {
                let _ = reply.send(session.view());
            }
        }
    }

    session.emit(Event::Closed);
    info!("Editor session closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MemoryClipboard, MemorySaver};

    fn session(content: &str, language: Option<Language>) -> (EditorSession, MemoryClipboard) {
        let clipboard = MemoryClipboard::new();
        let session = EditorSession::new(content, language, &AppConfig::default(), Arc::new(clipboard.clone()));
        (session, clipboard)
    }

    #[test]
    fn test_execute_bumps_generation() {
        let (mut session, _) = session("abc", None);
        assert_eq!(session.generation(), Generation(0));

        session.set_selection(3, 3);
        session.execute(Command::InsertText("d".into()));
        assert_eq!(session.content(), "abcd");
        assert_eq!(session.generation(), Generation(1));
        assert!(session.is_dirty());

        session.execute(Command::Undo);
        assert_eq!(session.generation(), Generation(2));
        assert!(!session.is_dirty());

        // Underflow is silent and commits nothing
        session.execute(Command::Undo);
        assert_eq!(session.generation(), Generation(2));
    }

    #[test]
    fn test_diagnostics_follow_edits() {
        let (mut session, _) = session("", Some(Language::JavaScript));
        assert!(session.visible_diagnostics().is_empty());

        session.execute(Command::InsertText(")".into()));
        let visible = session.visible_diagnostics();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].message, "Unmatched closing ')'");

        session.mute_line(1);
        assert!(session.visible_diagnostics().is_empty());
    }

    #[tokio::test]
    async fn test_cut_and_paste() {
        let (mut session, clipboard) = session("hello world", None);
        session.set_selection(0, 6);

        let result = session.cut().await;
        assert!(result.changed);
        assert_eq!(session.content(), "world");
        assert_eq!(clipboard.contents(), "hello ");

        session.set_selection(5, 5);
        session.paste().await;
        assert_eq!(session.content(), "worldhello ");
        assert_eq!(session.selection(), Selection::caret(11));
    }

    #[tokio::test]
    async fn test_clipboard_failure_leaves_buffer() {
        let (mut session, clipboard) = session("hello", None);
        clipboard.set_failing(true);
        session.set_selection(0, 5);

        let result = session.cut().await;
        assert!(!result.success);
        assert_eq!(session.content(), "hello");
        assert!(!session.can_undo());
        assert!(session.status().unwrap().contains("Clipboard unavailable"));

        let result = session.paste().await;
        assert!(!result.success);
        assert_eq!(session.content(), "hello");
    }

    #[tokio::test]
    async fn test_status_expires() {
        let mut config = AppConfig::default();
        config.editor.status_ttl_ms = 0;
        let session_clipboard = MemoryClipboard::new();
        session_clipboard.set_failing(true);
        let mut session = EditorSession::new("x", None, &config, Arc::new(session_clipboard));

        session.paste().await;
        assert_eq!(session.status(), None);
    }

    #[tokio::test]
    async fn test_handle_key() {
        let (mut session, _) = session("a", None);
        session.set_selection(1, 1);

        let result = session.handle_key("Tab").await.unwrap();
        assert!(result.changed);
        assert_eq!(session.content(), "a    ");

        session.handle_key("ctrl+z").await;
        assert_eq!(session.content(), "a");
        session.handle_key("CTRL+Y").await;
        assert_eq!(session.content(), "a    ");

        session.handle_key("ctrl+a").await;
        assert_eq!(session.selection(), Selection::new(0, 5));

        assert!(session.handle_key("ctrl+alt+q").await.is_none());
    }

    #[test]
    fn test_search_and_replace_current() {
        let (mut session, _) = session("let a;\nlet b;\nconst c;", None);
        let matches = session.search("LET", None);
        assert_eq!(matches.len(), 2);

        let found = session.search_next().unwrap();
        assert_eq!(found.line_number, 2);
        assert_eq!(session.selection(), Selection::new(7, 10));

        let result = session.replace_current("var");
        assert!(result.changed);
        assert_eq!(session.content(), "let a;\nvar b;\nconst c;");
        assert_eq!(session.search_matches(), &[SearchMatch { line_number: 1 }]);
        assert_eq!(session.search_cursor(), Some(0));

        session.execute(Command::Undo);
        assert_eq!(session.content(), "let a;\nlet b;\nconst c;");
    }

    #[test]
    fn test_replace_all_is_one_transaction() {
        let (mut session, _) = session("aaa", None);
        session.search("a", Some(true));

        let result = session.replace_all("bb");
        assert_eq!(result.message.as_deref(), Some("Replaced 3 occurrences"));
        assert_eq!(session.content(), "bbbbbb");
        assert!(session.search_matches().is_empty());
        assert_eq!(session.search("bb", Some(true)).len(), 1);

        session.execute(Command::Undo);
        assert_eq!(session.content(), "aaa");
    }

    #[tokio::test]
    async fn test_save() {
        let bus = Arc::new(EventBus::new());
        let events = bus.subscribe();
        let (session, _) = session("x", None);
        let mut session = session.with_events(bus);
        let saver = MemorySaver::new();

        session.execute(Command::InsertText("y".into()));
        assert!(session.is_dirty());

        let result = session.save(&saver).await;
        assert!(result.success);
        assert!(!session.is_dirty());
        assert_eq!(saver.saved(), vec!["yx".to_string()]);

        let seen = events.drain();
        assert!(seen.contains(&Event::DirtyChanged(true)));
        assert!(seen.contains(&Event::SaveCompleted { success: true }));
        assert!(seen.contains(&Event::DirtyChanged(false)));

        saver.set_failing(true);
        session.execute(Command::InsertText("z".into()));
        let result = session.save(&saver).await;
        assert!(!result.success);
        assert!(session.is_dirty());
        assert!(events.drain().contains(&Event::SaveCompleted { success: false }));
    }

    #[test]
    fn test_stale_highlight_is_discarded() {
        let (mut session, _) = session("let x", Some(Language::JavaScript));
        let mut gate = HighlightGate::new();

        let before = session.highlight_request();
        session.execute(Command::InsertText("y".into()));
        let after = session.highlight_request();
        gate.observe(session.generation());

        assert!(gate.accept(before.render()).is_none());
        let markup = gate.accept(after.render()).unwrap();
        assert_eq!(markup.plain_text(), "ylet x");
    }

    #[test]
    fn test_set_language_publishes_generation() {
        let bus = Arc::new(EventBus::new());
        let events = bus.subscribe();
        let (session, _) = session("(", None);
        let mut session = session.with_events(bus);
        assert!(session.visible_diagnostics().is_empty());

        session.set_language(Some(Language::Rust));
        assert_eq!(session.generation(), Generation(1));
        assert_eq!(session.visible_diagnostics().len(), 1);
        assert_eq!(
            events.drain(),
            vec![
                Event::ContentChanged { generation: 1 },
                Event::DiagnosticsUpdated { visible: 1 },
            ]
        );

        // Same language again is a no-op
        session.set_language(Some(Language::Rust));
        assert!(events.drain().is_empty());
    }

    #[test]
    fn test_open_resets_state() {
        let (mut session, _) = session("one", Some(Language::Rust));
        session.execute(Command::InsertText("x".into()));
        session.mute_line(1);

        session.open("two", Some(Language::Python));
        assert_eq!(session.content(), "two");
        assert!(!session.is_dirty());
        assert!(!session.can_undo());
        assert!(!session.diagnostics().is_muted(1));
        assert_eq!(session.selection(), Selection::caret(0));
    }

    #[tokio::test]
    async fn test_handle_serializes_requests() {
        let clipboard = MemoryClipboard::with_contents("!");
        let session = EditorSession::new("ab", None, &AppConfig::default(), Arc::new(clipboard));
        let handle = SessionHandle::spawn(session);

        handle.set_selection(2, 2).await.unwrap();
        let (a, b) = tokio::join!(handle.paste(), handle.execute(Command::InsertText("?".into())));
        assert!(a.unwrap().changed);
        assert!(b.unwrap().changed);

        let view = handle.view().await.unwrap();
        assert_eq!(view.content, "ab!?");
        assert_eq!(view.generation, Generation(2));
    }

    #[tokio::test]
    async fn test_render_highlight_through_handle() {
        let mut config = AppConfig::default();
        config.editor.highlight_debounce_ms = 0;
        let session = EditorSession::new("fn x", Some(Language::Rust), &config, Arc::new(MemoryClipboard::new()));
        let handle = SessionHandle::spawn(session);
        let mut gate = HighlightGate::new();

        let markup = handle.render_highlight(&mut gate).await.unwrap().unwrap();
        assert_eq!(markup.plain_text(), "fn x");
    }
}
