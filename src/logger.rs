//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` / `debug!` macros for formatted terminal output with colored prefixes
//! - `LogSink`, the capability a store logs through instead of writing to stdout
//!   directly, so embedders can route messages elsewhere
//! - `TerminalLog` (default sink) and `MemoryLog` (capturing sink)
//!
//! # Example
//!
//! ```ignore
//! log!("store"; "now using vue version: {}", version);
//! debug!("compile"; "discarded stale result for {}", filename);
//! ```

use crossterm::{
    execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    sync::atomic::{AtomicBool, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    let mut stdout = stdout().lock();
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "store" => prefix.bright_blue().bold().to_string(),
        "version" => prefix.bright_green().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Log Sinks
// ============================================================================

/// Severity of a message handed to a [`LogSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
}

/// Destination for store log messages.
pub trait LogSink: Send + Sync {
    fn log(&self, level: Level, module: &str, message: &str);

    fn info(&self, module: &str, message: &str) {
        self.log(Level::Info, module, message);
    }

    fn warn(&self, module: &str, message: &str) {
        self.log(Level::Warn, module, message);
    }

    fn debug(&self, module: &str, message: &str) {
        self.log(Level::Debug, module, message);
    }
}

/// Writes to the terminal through [`log`]; debug messages need `--verbose`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalLog;

impl LogSink for TerminalLog {
    fn log(&self, level: Level, module: &str, message: &str) {
        match level {
            Level::Debug if !is_verbose() => {}
            Level::Warn => log("error", &format!("{module}: {message}")),
            _ => log(module, message),
        }
    }
}

/// Keeps every message in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: Mutex<Vec<(Level, String)>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured messages as `[module] message`.
    pub fn messages(&self) -> Vec<String> {
        self.entries.lock().iter().map(|(_, m)| m.clone()).collect()
    }

    /// Captured messages at `level` or above.
    pub fn at_least(&self, level: Level) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|(l, _)| *l >= level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.entries.lock().iter().any(|(_, m)| m.contains(needle))
    }
}

impl LogSink for MemoryLog {
    fn log(&self, level: Level, module: &str, message: &str) {
        self.entries
            .lock()
            .push((level, format!("[{module}] {message}")));
    }
}

// ============================================================================
// Tests
// ============================================================================
