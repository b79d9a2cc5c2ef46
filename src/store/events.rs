//! Store notifications and the sandbox-facing snapshot.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::file::FileSnapshot;

/// Notifications broadcast by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// New artifacts were committed for `revision` of the file.
    Compiled { filename: String, revision: u64 },
    /// Nothing to compile for `revision` (blank or unknown kind).
    Skipped { filename: String, revision: u64 },
    /// Compilation of `revision` failed; artifacts were left untouched.
    CompileFailed {
        filename: String,
        revision: u64,
        errors: Vec<String>,
    },
    /// A result arrived for a revision, file set or compiler that is no
    /// longer current and was dropped.
    Discarded { filename: String, revision: u64 },
    /// The whole file set was replaced.
    FilesReplaced { main_file: String },
    /// A different compiler version is now active (`None` = default).
    VersionChanged { version: Option<String> },
    /// The reset toggle flipped.
    SandboxReset,
}

impl StoreEvent {
    /// Filename the event is about, if any.
    pub fn filename(&self) -> Option<&str> {
        match self {
            Self::Compiled { filename, .. }
            | Self::Skipped { filename, .. }
            | Self::CompileFailed { filename, .. }
            | Self::Discarded { filename, .. } => Some(filename),
            _ => None,
        }
    }
}

/// Everything the sandbox consumes, taken at one point in time.
#[derive(Debug, Clone, Serialize)]
pub struct SandboxInput {
    pub files: Vec<FileSnapshot>,
    pub main_file: String,
    pub import_map: Map<String, Value>,
    pub reset: bool,
}

/// Initial output pane shown by a host UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Preview,
    Js,
    Css,
    Ssr,
}
