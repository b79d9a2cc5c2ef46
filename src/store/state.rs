//! Mutable store state, guarded by the store's lock.

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::config::RuntimeUrls;
use crate::file::{FileSet, FileSnapshot};

pub(super) struct StoreState {
    pub(super) main_file: String,
    pub(super) files: FileSet,
    /// Filename of the active file; always a key of `files`.
    pub(super) active: String,
    pub(super) errors: Vec<String>,
    /// Diagnostics recorded while loading the current project.
    pub(super) load_errors: Vec<String>,
    pub(super) runtime: RuntimeUrls,
    /// Bumped whenever the whole file set is replaced.
    pub(super) generation: u64,
    /// Task recompiling the active file on change.
    pub(super) watcher: Option<JoinHandle<()>>,
    /// Set by `init`; watchers are only spawned once the store is started.
    pub(super) spawner: Option<Handle>,
}

impl StoreState {
    pub(super) fn is_started(&self) -> bool {
        self.spawner.is_some()
    }

    pub(super) fn active_snapshot(&self) -> FileSnapshot {
        // `active` always names a live file; fall back to main defensively
        self.files
            .get(&self.active)
            .or_else(|| self.files.get(&self.main_file))
            .map(|f| f.snapshot())
            .unwrap_or_else(|| FileSnapshot {
                filename: self.active.clone(),
                content: String::new(),
                hidden: false,
                compiled: Default::default(),
                revision: 0,
            })
    }

    pub(super) fn stop_watcher(&mut self) {
        if let Some(task) = self.watcher.take() {
            task.abort();
        }
    }
}
