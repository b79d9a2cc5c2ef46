//! Project store.
//!
//! [`ReplStore`] is the single source of truth for a playground session: the
//! files, which one is being edited, the latest diagnostics, the runtime URLs
//! and the compiler version. It is cheap to clone; clones share state.
//!
//! # Lifecycle
//!
//! ```text
//! new() ──► init() ──► edits / set_active / set_files / set_version ...
//!           │
//!           ├─ compiles every non-active file once
//!           └─ starts the active-file watcher
//! ```
//!
//! Before `init` the store is inert: nothing is compiled and no task is
//! spawned, so it can be built and inspected outside a tokio runtime.

mod compile;
mod events;
mod state;
mod version;


pub use events::{OutputMode, SandboxInput, StoreEvent};

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};

use crate::compiler::{CompileOutcome, CompilerAdapter, CompilerResolver, NoResolver, SfcCompiler};
use crate::config::{IMPORT_MAP_FILE, RuntimeUrls, StoreConfig};
use crate::error::ParseError;
use crate::file::{File, FileSet, FileSnapshot};
use crate::import_map::{self, EnsureOutcome};
use crate::logger::{LogSink, TerminalLog};
use crate::serializer::{self, FileMap, TOKEN_MARKER};
use state::StoreState;

/// Buffered events per subscriber before it starts lagging.
const EVENT_CAPACITY: usize = 256;

// ============================================================================
// Capabilities
// ============================================================================

/// Asked before a file is deleted.
pub trait ConfirmDelete: Send + Sync {
    fn confirm(&self, filename: &str) -> bool;
}

impl<F> ConfirmDelete for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, filename: &str) -> bool {
        self(filename)
    }
}

/// Approves every deletion (non-interactive embedding).
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysConfirm;

impl ConfirmDelete for AlwaysConfirm {
    fn confirm(&self, _filename: &str) -> bool {
        true
    }
}

/// Result of [`ReplStore::delete_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The confirmation capability declined.
    Cancelled,
    NotFound,
    /// The main file cannot be deleted.
    ProtectedMain,
}

// ============================================================================
// Options
// ============================================================================

/// Construction options for [`ReplStore::new`].
pub struct StoreOptions {
    pub config: Arc<StoreConfig>,
    /// Share token to restore a project from.
    pub serialized_state: Option<String>,
    /// Overrides the default runtime URL.
    pub runtime_url: Option<String>,
    /// Overrides the default server renderer URL.
    pub server_renderer_url: Option<String>,
    pub show_output: bool,
    pub output_mode: OutputMode,
    pub resolver: Arc<dyn CompilerResolver>,
    pub confirm: Arc<dyn ConfirmDelete>,
    pub log: Arc<dyn LogSink>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            config: Arc::new(StoreConfig::default()),
            serialized_state: None,
            runtime_url: None,
            server_renderer_url: None,
            show_output: false,
            output_mode: OutputMode::default(),
            resolver: Arc::new(NoResolver),
            confirm: Arc::new(AlwaysConfirm),
            log: Arc::new(TerminalLog),
        }
    }
}

impl StoreOptions {
    pub fn with_config(mut self, config: Arc<StoreConfig>) -> Self {
        self.config = config;
        self
    }

    pub fn with_serialized_state(mut self, token: impl Into<String>) -> Self {
        self.serialized_state = Some(token.into());
        self
    }

    pub fn with_runtime_urls(
        mut self,
        runtime: impl Into<String>,
        server_renderer: impl Into<String>,
    ) -> Self {
        self.runtime_url = Some(runtime.into());
        self.server_renderer_url = Some(server_renderer.into());
        self
    }

    pub fn with_output(mut self, show: bool, mode: OutputMode) -> Self {
        self.show_output = show;
        self.output_mode = mode;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn CompilerResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_confirm(mut self, confirm: Arc<dyn ConfirmDelete>) -> Self {
        self.confirm = confirm;
        self
    }

    pub fn with_log(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = log;
        self
    }
}

// ============================================================================
// Store
// ============================================================================

struct Inner {
    state: RwLock<StoreState>,
    compiler: CompilerAdapter,
    config: Arc<StoreConfig>,
    /// URLs `reset_version` returns to.
    default_urls: RuntimeUrls,
    confirm: Arc<dyn ConfirmDelete>,
    log: Arc<dyn LogSink>,
    events: broadcast::Sender<StoreEvent>,
    reset: watch::Sender<bool>,
    /// Latest `set_files` ticket; only its file set may be published.
    replace_requests: AtomicU64,
    show_output: bool,
    output_mode: OutputMode,
}

impl Inner {
    fn emit(&self, event: StoreEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    fn toggle_reset(&self) {
        self.reset.send_modify(|flag| *flag = !*flag);
        self.emit(StoreEvent::SandboxReset);
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.state.get_mut().stop_watcher();
    }
}

/// Reactive project store.
#[derive(Clone)]
pub struct ReplStore {
    inner: Arc<Inner>,
}

impl ReplStore {
    /// Build a store around the default `compiler`.
    ///
    /// A share token that fails to decode is not fatal: the store falls back
    /// to the welcome project and records a diagnostic.
    pub fn new(compiler: Arc<dyn SfcCompiler>, options: StoreOptions) -> Self {
        let StoreOptions {
            config,
            serialized_state,
            runtime_url,
            server_renderer_url,
            show_output,
            output_mode,
            resolver,
            confirm,
            log,
        } = options;

        let defaults = config.runtime.urls(None);
        let default_urls = RuntimeUrls {
            runtime: runtime_url.unwrap_or(defaults.runtime),
            server_renderer: server_renderer_url.unwrap_or(defaults.server_renderer),
        };

        let mut errors = Vec::new();
        let mut files = FileSet::new();
        let token = serialized_state
            .as_deref()
            .map(|t| t.trim().trim_start_matches(TOKEN_MARKER))
            .filter(|t| !t.is_empty());
        if let Some(token) = token {
            match serializer::deserialize(token) {
                Ok(map) => files = into_file_set(map),
                Err(e) => {
                    log.warn("store", &format!("failed to restore project: {e}"));
                    errors.push(format!("Failed to restore project: {e}"));
                }
            }
        }

        let main_file = pick_main(&mut files, &config);
        if let Err(e) = import_map::ensure(&mut files, &config.runtime, &default_urls) {
            errors.push(import_map::syntax_error(&e));
        }

        let state = StoreState {
            active: main_file.clone(),
            main_file,
            files,
            load_errors: errors.clone(),
            errors,
            runtime: default_urls.clone(),
            generation: 0,
            watcher: None,
            spawner: None,
        };
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (reset, _) = watch::channel(false);

        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(state),
                compiler: CompilerAdapter::new(
                    compiler,
                    resolver,
                    config.project.sfc_extension.clone(),
                ),
                config,
                default_urls,
                confirm,
                log,
                events,
                reset,
                replace_requests: AtomicU64::new(0),
                show_output,
                output_mode,
            }),
        }
    }

    /// Start the store: compile every file except the active one, and start
    /// recompiling the active file whenever it changes.
    ///
    /// Must be called inside a tokio runtime; later calls do nothing.
    pub async fn init(&self) {
        let active = {
            let mut state = self.inner.state.write();
            if state.is_started() {
                return;
            }
            state.spawner = Some(Handle::current());
            compile::respawn_watcher(&self.inner, &mut state);
            state.active.clone()
        };
        compile::compile_all(&self.inner, Some(&active)).await;
    }

    // ------------------------------------------------------------------------
    // file operations
    // ------------------------------------------------------------------------

    /// Make `filename` the active file. Unknown names are ignored.
    pub fn set_active(&self, filename: &str) -> bool {
        let mut state = self.inner.state.write();
        if !state.files.contains_key(filename) {
            return false;
        }
        if state.active != filename {
            state.active = filename.to_string();
            compile::respawn_watcher(&self.inner, &mut state);
        }
        true
    }

    /// Insert or overwrite a file. Non-hidden files become active.
    ///
    /// An overwritten file keeps its position; its old state is returned.
    pub fn add_file(&self, file: impl Into<File>) -> Option<FileSnapshot> {
        let file = file.into();
        let filename = file.filename().to_string();
        let hidden = file.is_hidden();

        let mut state = self.inner.state.write();
        let replaced = state
            .files
            .insert(filename.clone(), file)
            .map(|old| old.snapshot());
        if !hidden {
            state.active = filename.clone();
        }
        if state.active == filename {
            compile::respawn_watcher(&self.inner, &mut state);
        }
        replaced
    }

    /// Delete a file after confirmation.
    ///
    /// Deleting the active file activates the main file; deleting the import
    /// map regenerates it with the reserved entries.
    pub fn delete_file(&self, filename: &str) -> DeleteOutcome {
        if let Some(refused) = self.check_deletable(filename) {
            return refused;
        }
        if !self.inner.confirm.confirm(filename) {
            return DeleteOutcome::Cancelled;
        }

        let mut guard = self.inner.state.write();
        // re-check: the set may have changed while confirming
        if let Some(refused) = deletable(&guard, filename) {
            return refused;
        }
        let state = &mut *guard;
        state.files.shift_remove(filename);

        if filename == IMPORT_MAP_FILE
            && let Err(e) =
                import_map::ensure(&mut state.files, &self.inner.config.runtime, &state.runtime)
        {
            state.errors = vec![import_map::syntax_error(&e)];
        }
        if state.active == filename {
            state.active = state.main_file.clone();
            compile::respawn_watcher(&self.inner, state);
        }
        DeleteOutcome::Deleted
    }

    fn check_deletable(&self, filename: &str) -> Option<DeleteOutcome> {
        deletable(&self.inner.state.read(), filename)
    }

    /// Replace a file's content. Returns whether anything changed; a change to
    /// the active file triggers a recompile.
    pub fn update_file(&self, filename: &str, content: impl Into<String>) -> bool {
        let mut state = self.inner.state.write();
        match state.files.get_mut(filename) {
            Some(file) => file.set_content(content.into()),
            None => false,
        }
    }

    /// Replace the whole file set.
    ///
    /// Every file is compiled before the new set becomes visible, then the
    /// main file is activated and the sandbox reset. When calls overlap, only
    /// the most recent one is published; superseded calls return `false`.
    pub async fn set_files(&self, new_files: FileMap, main_file: Option<&str>) -> bool {
        let inner = &self.inner;
        let ticket = inner.replace_requests.fetch_add(1, Ordering::SeqCst) + 1;
        let epoch = inner.compiler.epoch();
        let main = main_file
            .unwrap_or(&inner.config.project.main_file)
            .to_string();

        let mut files = FileSet::new();
        if !new_files.contains_key(&main) {
            files.insert(
                main.clone(),
                File::new(main.clone(), inner.config.project.welcome_code.clone()),
            );
        }
        files.extend(into_file_set(new_files));

        let runtime = inner.state.read().runtime.clone();
        let mut load_errors = Vec::new();
        if let Err(e) = import_map::ensure(&mut files, &inner.config.runtime, &runtime) {
            load_errors.push(import_map::syntax_error(&e));
        }
        let mut errors = load_errors.clone();

        for (name, file) in files.iter_mut() {
            let run = inner.compiler.compile(name, file.content()).await;
            match run.outcome {
                CompileOutcome::Compiled(output) => file.set_compiled(output),
                CompileOutcome::Skipped => {}
                CompileOutcome::Failed(diagnostics) => errors.extend(diagnostics),
            }
        }

        let count = files.len();
        let runtime_moved = {
            let mut guard = inner.state.write();
            if inner.replace_requests.load(Ordering::SeqCst) != ticket {
                inner
                    .log
                    .debug("store", "discarded superseded file set");
                return false;
            }
            let state = &mut *guard;
            // a version switch landed while staging
            let runtime_moved = state.runtime != runtime;
            if runtime_moved
                && load_errors.is_empty()
                && let Err(e) =
                    import_map::force_runtime(&mut files, &inner.config.runtime, &state.runtime)
            {
                load_errors.push(import_map::syntax_error(&e));
                errors.push(import_map::syntax_error(&e));
            }
            state.generation += 1;
            state.main_file = main.clone();
            state.active = main.clone();
            state.files = files;
            state.errors = errors;
            state.load_errors = load_errors;
            compile::respawn_watcher(inner, state);
            runtime_moved
        };

        inner.log.debug("store", &format!("loaded {count} files"));
        inner.emit(StoreEvent::FilesReplaced { main_file: main });
        inner.toggle_reset();

        // the compiler changed while staging; artifacts are from the old one
        if runtime_moved || inner.compiler.epoch() != epoch {
            compile::compile_all(inner, None).await;
        }
        true
    }

    /// Flip the reset toggle so the sandbox rebuilds.
    pub fn force_sandbox_reset(&self) {
        self.inner.toggle_reset();
    }

    /// Filename to content, in display order.
    pub fn get_files(&self) -> FileMap {
        self.inner
            .state
            .read()
            .files
            .iter()
            .map(|(name, file)| (name.clone(), file.content().to_string()))
            .collect()
    }

    /// Share token for the current files.
    pub fn serialize(&self) -> io::Result<String> {
        serializer::serialize(&self.get_files())
    }

    // ------------------------------------------------------------------------
    // import map
    // ------------------------------------------------------------------------

    /// Parsed import map. An unreadable map yields an empty object and a
    /// syntax diagnostic.
    pub fn import_map(&self) -> Map<String, Value> {
        let result = import_map::read(&self.inner.state.read().files);
        match result {
            Ok(map) => map,
            Err(e) => {
                self.inner.state.write().errors = vec![import_map::syntax_error(&e)];
                Map::new()
            }
        }
    }

    /// Overwrite the import map file with `map`.
    pub fn set_import_map(&self, map: &Map<String, Value>) {
        let mut guard = self.inner.state.write();
        let state = &mut *guard;
        if let Err(e) = import_map::write(&mut state.files, map) {
            state.errors = vec![import_map::syntax_error(&e)];
        }
    }

    /// Add missing reserved entries to the import map.
    pub fn ensure_import_map(&self) -> Result<EnsureOutcome, ParseError> {
        let mut guard = self.inner.state.write();
        let state = &mut *guard;
        import_map::ensure(&mut state.files, &self.inner.config.runtime, &state.runtime)
            .inspect_err(|e| state.errors = vec![import_map::syntax_error(e)])
    }

    // ------------------------------------------------------------------------
    // reads
    // ------------------------------------------------------------------------

    pub fn file(&self, filename: &str) -> Option<FileSnapshot> {
        self.inner.state.read().files.get(filename).map(File::snapshot)
    }

    pub fn file_names(&self) -> Vec<String> {
        self.inner.state.read().files.keys().cloned().collect()
    }

    pub fn active_file(&self) -> FileSnapshot {
        self.inner.state.read().active_snapshot()
    }

    pub fn active_filename(&self) -> String {
        self.inner.state.read().active.clone()
    }

    pub fn main_file(&self) -> String {
        self.inner.state.read().main_file.clone()
    }

    /// Diagnostics of the most recent compile or import map operation.
    pub fn errors(&self) -> Vec<String> {
        self.inner.state.read().errors.clone()
    }

    /// Diagnostics from loading the current project (token restore, import
    /// map). Unlike [`errors`](Self::errors) they survive later compiles and
    /// are only replaced when `set_files` loads another project.
    pub fn load_errors(&self) -> Vec<String> {
        self.inner.state.read().load_errors.clone()
    }

    pub fn runtime(&self) -> RuntimeUrls {
        self.inner.state.read().runtime.clone()
    }

    /// Selected compiler version; `None` for the default compiler.
    pub fn version(&self) -> Option<String> {
        self.inner.compiler.version()
    }

    pub fn show_output(&self) -> bool {
        self.inner.show_output
    }

    pub fn output_mode(&self) -> OutputMode {
        self.inner.output_mode
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    /// Receiver of the reset toggle; changes whenever the sandbox must rebuild.
    pub fn reset_signal(&self) -> watch::Receiver<bool> {
        self.inner.reset.subscribe()
    }

    pub fn reset_toggle(&self) -> bool {
        *self.inner.reset.borrow()
    }

    /// Everything the sandbox needs, read under one lock.
    pub fn sandbox_input(&self) -> SandboxInput {
        let state = self.inner.state.read();
        SandboxInput {
            files: state.files.values().map(File::snapshot).collect(),
            main_file: state.main_file.clone(),
            import_map: import_map::read(&state.files).unwrap_or_default(),
            reset: *self.inner.reset.borrow(),
        }
    }
}

fn deletable(state: &StoreState, filename: &str) -> Option<DeleteOutcome> {
    if !state.files.contains_key(filename) {
        Some(DeleteOutcome::NotFound)
    } else if state.main_file == filename {
        Some(DeleteOutcome::ProtectedMain)
    } else {
        None
    }
}

fn into_file_set(map: FileMap) -> FileSet {
    map.into_iter()
        .map(|(name, content)| {
            let file = File::new(name.clone(), content);
            (name, file)
        })
        .collect()
}

/// Main file of a restored set: the configured name if present, else the
/// first non-import-map file, else a synthesized welcome file.
fn pick_main(files: &mut FileSet, config: &StoreConfig) -> String {
    let preferred = &config.project.main_file;
    if files.contains_key(preferred) {
        return preferred.clone();
    }
    if let Some(first) = files.keys().find(|name| *name != IMPORT_MAP_FILE) {
        return first.clone();
    }
    files.shift_insert(
        0,
        preferred.clone(),
        File::new(preferred.clone(), config.project.welcome_code.clone()),
    );
    preferred.clone()
}
