//! Project files.
//!
//! A [`File`] is a passive holder of source text plus the artifacts derived
//! from it. Every content change bumps the file's revision and publishes it on
//! a watch channel; that channel is the only change notification the store's
//! recompute loop listens to.

mod kind;

pub use kind::FileKind;

use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use serde::Serialize;
use tokio::sync::watch;

/// Source of [`File::id`]; never reused within a process.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Files of a project keyed by filename, in display order.
pub type FileSet = IndexMap<String, File>;

/// Artifacts of the most recent successful compile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompiledOutput {
    /// Client-side module code.
    pub code: String,
    /// Extracted stylesheet.
    pub style: String,
    /// Server-side rendering module code.
    pub ssr_code: String,
}

impl CompiledOutput {
    pub fn is_empty(&self) -> bool {
        self.code.is_empty() && self.style.is_empty() && self.ssr_code.is_empty()
    }
}

/// A single file in a project.
#[derive(Debug)]
pub struct File {
    id: u64,
    filename: String,
    content: String,
    hidden: bool,
    compiled: CompiledOutput,
    revision: u64,
    changes: watch::Sender<u64>,
}

impl File {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            filename: filename.into(),
            content: content.into(),
            hidden: false,
            compiled: CompiledOutput::default(),
            revision: 0,
            changes,
        }
    }

    /// Mark the file as hidden (never activated automatically).
    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Identity of this instance. A file replaced under the same name gets a
    /// new id, so revisions are only comparable between equal ids.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    #[inline]
    pub fn compiled(&self) -> &CompiledOutput {
        &self.compiled
    }

    /// Content revision; starts at 0 and grows by one per change.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Subscribe to content changes. The receiver starts with the current
    /// revision marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Replace the content. Returns `false` (and notifies nobody) when the
    /// text is unchanged.
    pub(crate) fn set_content(&mut self, content: String) -> bool {
        if self.content == content {
            return false;
        }
        self.content = content;
        self.revision += 1;
        self.changes.send_replace(self.revision);
        true
    }

    pub(crate) fn set_compiled(&mut self, compiled: CompiledOutput) {
        self.compiled = compiled;
    }

    /// Owned copy of the observable state.
    pub fn snapshot(&self) -> FileSnapshot {
        FileSnapshot {
            filename: self.filename.clone(),
            content: self.content.clone(),
            hidden: self.hidden,
            compiled: self.compiled.clone(),
            revision: self.revision,
        }
    }
}

impl From<&str> for File {
    fn from(filename: &str) -> Self {
        Self::new(filename, "")
    }
}

impl From<String> for File {
    fn from(filename: String) -> Self {
        Self::new(filename, "")
    }
}

/// Detached view of a [`File`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSnapshot {
    pub filename: String,
    pub content: String,
    pub hidden: bool,
    pub compiled: CompiledOutput,
    pub revision: u64,
}
