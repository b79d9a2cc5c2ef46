//! Compiler version switching.

use super::{Inner, ReplStore, StoreEvent, compile};
use crate::compiler::VersionRequest;
use crate::config::RuntimeUrls;
use crate::error::ResolveError;
use crate::import_map;

impl ReplStore {
    /// Switch to the compiler and runtime of `version`.
    ///
    /// Returns `Ok(false)` when a later `set_version`/`reset_version`
    /// superseded this call while the compiler was resolving; the state is
    /// then left to the later call. A resolve failure leaves everything as it
    /// was.
    pub async fn set_version(&self, version: &str) -> Result<bool, ResolveError> {
        let inner = &self.inner;
        let ticket = inner.compiler.begin_request();
        let request = VersionRequest {
            version: version.to_string(),
            compiler_url: inner.config.runtime.compiler_url(version),
        };
        inner
            .log
            .debug("version", &format!("resolving {}", request.compiler_url));

        let compiler = match inner.compiler.resolve(&request).await {
            Ok(compiler) => compiler,
            Err(e) => {
                inner.log.warn("version", &e.to_string());
                return Err(e);
            }
        };

        {
            let mut state = inner.state.write();
            if !inner.compiler.install(ticket, compiler, version.to_string()) {
                inner
                    .log
                    .debug("version", &format!("{version} superseded by a newer request"));
                return Ok(false);
            }
            apply_runtime(inner, &mut state, inner.config.runtime.urls(Some(version)));
        }

        self.announce(Some(version.to_string()));
        compile::compile_all(inner, None).await;
        Ok(true)
    }

    /// Return to the default compiler and runtime URLs.
    ///
    /// Takes effect immediately and supersedes any pending `set_version`.
    pub fn reset_version(&self) {
        let inner = &self.inner;
        {
            let mut state = inner.state.write();
            inner.compiler.reset();
            apply_runtime(inner, &mut state, inner.default_urls.clone());
        }
        self.announce(None);

        let spawner = inner.state.read().spawner.clone();
        if let Some(spawner) = spawner {
            let inner = std::sync::Arc::clone(inner);
            spawner.spawn(async move { compile::compile_all(&inner, None).await });
        }
    }

    fn announce(&self, version: Option<String>) {
        let inner = &self.inner;
        let framework = &inner.config.runtime.framework;
        let message = match &version {
            Some(v) => format!("Now using {framework} version: {v}"),
            None => format!("Now using default {framework} version"),
        };
        inner.log.info("version", &message);
        inner.emit(StoreEvent::VersionChanged { version });
        inner.toggle_reset();
    }
}

fn apply_runtime(inner: &Inner, state: &mut super::StoreState, urls: RuntimeUrls) {
    if let Err(e) = import_map::force_runtime(&mut state.files, &inner.config.runtime, &urls) {
        state.errors = vec![import_map::syntax_error(&e)];
    }
    state.runtime = urls;
}
