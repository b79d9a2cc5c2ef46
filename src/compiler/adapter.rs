//! Per-kind compilation.
//!
//! Only components reach the external compiler. Styles, scripts and JSON are
//! turned into artifacts here; unknown kinds and blank files produce nothing.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use super::SfcCompiler;
use crate::file::{CompiledOutput, FileKind};

/// Result of compiling a single file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// New artifacts for the file
    Compiled(CompiledOutput),
    /// Nothing to compile (blank content or unknown kind)
    Skipped,
    /// Diagnostics; the file keeps its previous artifacts
    Failed(Vec<String>),
}

/// Compile `source` according to its kind.
///
/// Never panics and never returns an error: compiler failures and panics are
/// converted into [`CompileOutcome::Failed`].
pub async fn compile_source(
    compiler: &dyn SfcCompiler,
    kind: FileKind,
    filename: &str,
    source: &str,
) -> CompileOutcome {
    if source.trim().is_empty() {
        return CompileOutcome::Skipped;
    }

    match kind {
        FileKind::Style => CompileOutcome::Compiled(CompiledOutput {
            style: source.to_string(),
            ..Default::default()
        }),
        FileKind::Script => CompileOutcome::Compiled(CompiledOutput {
            code: source.to_string(),
            ssr_code: source.to_string(),
            ..Default::default()
        }),
        FileKind::Json => compile_json(source),
        FileKind::Component => compile_component(compiler, filename, source).await,
        FileKind::Other => CompileOutcome::Skipped,
    }
}

fn compile_json(source: &str) -> CompileOutcome {
    match serde_json::from_str::<serde_json::Value>(source) {
        Ok(value) => {
            let code = format!("export default {value}");
            CompileOutcome::Compiled(CompiledOutput {
                ssr_code: code.clone(),
                code,
                style: String::new(),
            })
        }
        Err(e) => CompileOutcome::Failed(vec![e.to_string()]),
    }
}

/// Panics are caught only with unwinding; keep `panic = "unwind"` in profiles.
async fn compile_component(
    compiler: &dyn SfcCompiler,
    filename: &str,
    source: &str,
) -> CompileOutcome {
    match AssertUnwindSafe(compiler.compile(filename, source))
        .catch_unwind()
        .await
    {
        Ok(Ok(output)) => CompileOutcome::Compiled(output),
        Ok(Err(e)) if e.errors.is_empty() => {
            CompileOutcome::Failed(vec![format!("{filename}: compilation failed")])
        }
        Ok(Err(e)) => CompileOutcome::Failed(e.errors),
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            CompileOutcome::Failed(vec![format!(
                "Internal compiler error in {filename}: {message}"
            )])
        }
    }
}
