//! Host capabilities
//!
//! The clipboard and the save target live outside the core. Both are
//! asynchronous and may fail; the session turns failures into status messages.

use std::sync::Arc;

use anyhow::anyhow;
use futures::future::BoxFuture;
use parking_lot::Mutex;

/// Platform clipboard
pub trait Clipboard: Send + Sync {
    fn read(&self) -> BoxFuture<'_, anyhow::Result<String>>;
    fn write(&self, text: String) -> BoxFuture<'_, anyhow::Result<()>>;
}

/// Persists buffer content on request
pub trait Saver: Send + Sync {
    fn save(&self, content: String) -> BoxFuture<'_, anyhow::Result<()>>;
}

/// In-process clipboard, also used by tests to simulate an unavailable one
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    contents: Arc<Mutex<String>>,
    failing: Arc<Mutex<bool>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(text: impl Into<String>) -> Self {
        let clipboard = Self::default();
        *clipboard.contents.lock() = text.into();
        clipboard
    }

    pub fn contents(&self) -> String {
        self.contents.lock().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    fn check(&self) -> anyhow::Result<()> {
        if *self.failing.lock() {
            Err(anyhow!("clipboard unavailable"))
        } else {
            Ok(())
        }
    }
}

impl Clipboard for MemoryClipboard {
    fn read(&self) -> BoxFuture<'_, anyhow::Result<String>> {
        Box::pin(async move {
            self.check()?;
            Ok(self.contents())
        })
    }

    fn write(&self, text: String) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            self.check()?;
            *self.contents.lock() = text;
            Ok(())
        })
    }
}

/// Writes content to a file path with tokio fs
#[derive(Debug, Clone)]
pub struct FileSaver {
    path: std::path::PathBuf,
}

impl FileSaver {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Saver for FileSaver {
    fn save(&self, content: String) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            tokio::fs::write(&self.path, content).await?;
            Ok(())
        })
    }
}

/// Save target that records what it was given
#[derive(Debug, Clone, Default)]
pub struct MemorySaver {
    saved: Arc<Mutex<Vec<String>>>,
    failing: Arc<Mutex<bool>>,
}

impl MemorySaver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Vec<String> {
        self.saved.lock().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }
}

impl Saver for MemorySaver {
    fn save(&self, content: String) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            if *self.failing.lock() {
                return Err(anyhow!("storage unavailable"));
            }
            self.saved.lock().push(content);
            Ok(())
        })
    }
}
