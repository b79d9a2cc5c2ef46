//! Recompute loop: compile files and commit results that are still current.
//!
//! A compile reads a snapshot of the file under the lock, runs without the
//! lock, then commits under the lock only if nothing moved underneath it:
//!
//! - the file is the same instance (id) at the same revision
//! - the file set was not replaced (generation)
//! - the compiler was not swapped (epoch)
//!
//! Anything else is dropped and reported as [`StoreEvent::Discarded`].

use std::sync::{Arc, Weak};

use tokio::sync::watch;

use super::{Inner, StoreEvent, StoreState};
use crate::compiler::CompileOutcome;

/// Compile `filename` as it is now and commit the result if still current.
pub(super) async fn compile_file(inner: &Inner, filename: &str) {
    let (content, id, revision, generation) = {
        let state = inner.state.read();
        let Some(file) = state.files.get(filename) else {
            return;
        };
        (
            file.content().to_string(),
            file.id(),
            file.revision(),
            state.generation,
        )
    };

    let run = inner.compiler.compile(filename, &content).await;

    let event = {
        let mut guard = inner.state.write();
        let state = &mut *guard;
        let current = state.generation == generation && inner.compiler.epoch() == run.epoch;
        let stamp = (id, revision);
        match state.files.get_mut(filename) {
            Some(file) if current && (file.id(), file.revision()) == stamp => match run.outcome {
                CompileOutcome::Compiled(output) => {
                    file.set_compiled(output);
                    state.errors.clear();
                    StoreEvent::Compiled {
                        filename: filename.to_string(),
                        revision,
                    }
                }
                CompileOutcome::Skipped => {
                    state.errors.clear();
                    StoreEvent::Skipped {
                        filename: filename.to_string(),
                        revision,
                    }
                }
                CompileOutcome::Failed(errors) => {
                    state.errors = errors.clone();
                    StoreEvent::CompileFailed {
                        filename: filename.to_string(),
                        revision,
                        errors,
                    }
                }
            },
            _ => {
                inner.log.debug(
                    "compile",
                    &format!("discarded stale result for {filename} (rev {revision})"),
                );
                StoreEvent::Discarded {
                    filename: filename.to_string(),
                    revision,
                }
            }
        }
    };

    if let StoreEvent::CompileFailed { errors, .. } = &event {
        inner
            .log
            .debug("compile", &format!("{filename}: {} error(s)", errors.len()));
    }
    inner.emit(event);
}

/// Compile every file of the current set except `skip`, one after another.
pub(super) async fn compile_all(inner: &Inner, skip: Option<&str>) {
    let names: Vec<String> = {
        let state = inner.state.read();
        state
            .files
            .keys()
            .filter(|name| Some(name.as_str()) != skip)
            .cloned()
            .collect()
    };
    for name in names {
        compile_file(inner, &name).await;
    }
}

/// Replace the active-file watcher with one for `state.active`.
///
/// No-op until the store has been started.
pub(super) fn respawn_watcher(inner: &Arc<Inner>, state: &mut StoreState) {
    state.stop_watcher();
    let Some(spawner) = state.spawner.as_ref() else {
        return;
    };
    let Some(file) = state.files.get(&state.active) else {
        return;
    };
    let changes = file.subscribe();
    let filename = state.active.clone();
    inner.log.debug("compile", &format!("watching {filename}"));
    state.watcher = Some(spawner.spawn(watch_active(
        Arc::downgrade(inner),
        filename,
        changes,
    )));
}

/// Compile the active file now and again after every content change.
///
/// Ends when the store is dropped or the file leaves the set (its change
/// channel closes).
async fn watch_active(inner: Weak<Inner>, filename: String, mut changes: watch::Receiver<u64>) {
    loop {
        let _ = changes.borrow_and_update();
        {
            let Some(inner) = inner.upgrade() else {
                return;
            };
            compile_file(&inner, &filename).await;
        }
        if changes.changed().await.is_err() {
            return;
        }
    }
}
