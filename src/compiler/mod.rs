//! Compiler adapter.
//!
//! The single-file-component compiler is an external collaborator reached
//! through [`SfcCompiler`]. Which compiler is active depends on the selected
//! version; [`CompilerResolver`] obtains a compiler for a version, and the
//! adapter keeps the active one as an `ArcSwap` snapshot so a compile that
//! already started keeps using the compiler it loaded.

mod adapter;

pub use adapter::{CompileOutcome, compile_source};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use async_trait::async_trait;

use crate::error::{CompileError, ResolveError};
use crate::file::{CompiledOutput, FileKind};

/// External single-file-component compiler.
#[async_trait]
pub trait SfcCompiler: Send + Sync {
    /// Compile one component. Errors carry the compiler's diagnostics.
    async fn compile(&self, filename: &str, source: &str) -> Result<CompiledOutput, CompileError>;
}

/// Obtains a compiler bound to a specific version.
#[async_trait]
pub trait CompilerResolver: Send + Sync {
    async fn resolve(&self, request: &VersionRequest) -> Result<Arc<dyn SfcCompiler>, ResolveError>;
}

/// What a resolver is asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRequest {
    pub version: String,
    /// Module URL of the compiler for `version`, from the URL template.
    pub compiler_url: String,
}

/// Resolver that knows no versions; every request fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoResolver;

#[async_trait]
impl CompilerResolver for NoResolver {
    async fn resolve(&self, request: &VersionRequest) -> Result<Arc<dyn SfcCompiler>, ResolveError> {
        Err(ResolveError::UnknownVersion(request.version.clone()))
    }
}

/// Stand-in when no component compiler is available; every component fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unavailable;

#[async_trait]
impl SfcCompiler for Unavailable {
    async fn compile(&self, filename: &str, _source: &str) -> Result<CompiledOutput, CompileError> {
        Err(CompileError::single(format!(
            "{filename}: no component compiler available"
        )))
    }
}

/// The compiler currently in use.
pub struct ActiveCompiler {
    pub compiler: Arc<dyn SfcCompiler>,
    /// `None` for the default compiler.
    pub version: Option<String>,
    /// Bumped on every swap; compile results carry the epoch they ran under.
    pub epoch: u64,
}

/// Result of one adapter compile run.
pub struct CompileRun {
    pub epoch: u64,
    pub outcome: CompileOutcome,
}

/// Version-selectable wrapper around the external compiler.
pub struct CompilerAdapter {
    active: ArcSwap<ActiveCompiler>,
    default: Arc<dyn SfcCompiler>,
    resolver: Arc<dyn CompilerResolver>,
    /// Latest issued version request; only its resolution may be installed.
    latest_request: AtomicU64,
    sfc_extension: String,
}

impl CompilerAdapter {
    pub fn new(
        default: Arc<dyn SfcCompiler>,
        resolver: Arc<dyn CompilerResolver>,
        sfc_extension: impl Into<String>,
    ) -> Self {
        Self {
            active: ArcSwap::from_pointee(ActiveCompiler {
                compiler: Arc::clone(&default),
                version: None,
                epoch: 0,
            }),
            default,
            resolver,
            latest_request: AtomicU64::new(0),
            sfc_extension: sfc_extension.into(),
        }
    }

    /// Snapshot of the active compiler.
    #[inline]
    pub fn current(&self) -> Arc<ActiveCompiler> {
        self.active.load_full()
    }

    #[inline]
    pub fn epoch(&self) -> u64 {
        self.active.load().epoch
    }

    pub fn version(&self) -> Option<String> {
        self.active.load().version.clone()
    }

    pub fn kind_of(&self, filename: &str) -> FileKind {
        FileKind::detect(filename, &self.sfc_extension)
    }

    /// Compile `source` with the compiler active when the call starts.
    pub async fn compile(&self, filename: &str, source: &str) -> CompileRun {
        let active = self.current();
        let kind = self.kind_of(filename);
        let outcome = compile_source(active.compiler.as_ref(), kind, filename, source).await;
        CompileRun {
            epoch: active.epoch,
            outcome,
        }
    }

    /// Issue a new version request ticket, superseding all earlier ones.
    pub fn begin_request(&self) -> u64 {
        self.latest_request.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether `ticket` is still the latest request.
    pub fn is_latest(&self, ticket: u64) -> bool {
        self.latest_request.load(Ordering::SeqCst) == ticket
    }

    /// Ask the resolver for a compiler. Does not touch the active compiler.
    pub async fn resolve(
        &self,
        request: &VersionRequest,
    ) -> Result<Arc<dyn SfcCompiler>, ResolveError> {
        self.resolver.resolve(request).await
    }

    /// Install a resolved compiler if `ticket` was not superseded.
    pub fn install(&self, ticket: u64, compiler: Arc<dyn SfcCompiler>, version: String) -> bool {
        if !self.is_latest(ticket) {
            return false;
        }
        self.replace(compiler, Some(version));
        true
    }

    /// Go back to the default compiler, superseding in-flight requests.
    pub fn reset(&self) {
        self.begin_request();
        self.replace(Arc::clone(&self.default), None);
    }

    /// Resolve and install a compiler for `request` in one step.
    ///
    /// Returns `Ok(false)` when a newer request superseded this one while it
    /// was resolving; the active compiler is then left alone.
    pub async fn swap_version(&self, request: &VersionRequest) -> Result<bool, ResolveError> {
        let ticket = self.begin_request();
        let compiler = self.resolve(request).await?;
        Ok(self.install(ticket, compiler, request.version.clone()))
    }

    fn replace(&self, compiler: Arc<dyn SfcCompiler>, version: Option<String>) {
        let epoch = self.active.load().epoch + 1;
        self.active.store(Arc::new(ActiveCompiler {
            compiler,
            version,
            epoch,
        }));
    }
}
