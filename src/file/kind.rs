//! File kind detection, determines compilation strategy.

/// Kind of project file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// Single-file component - compile with the external compiler
    Component,
    /// Stylesheet - passed through as style
    Style,
    /// Script (.js/.ts) - passed through as code
    Script,
    /// JSON - exposed as a default export
    Json,
    /// Anything else - no artifacts
    Other,
}

impl FileKind {
    /// Detect file kind from a filename, given the component extension.
    pub fn detect(filename: &str, sfc_extension: &str) -> Self {
        let Some((_, ext)) = filename.rsplit_once('.') else {
            return Self::Other;
        };
        let ext = ext.to_ascii_lowercase();
        if ext == sfc_extension.to_ascii_lowercase() {
            return Self::Component;
        }
        match ext.as_str() {
            "css" => Self::Style,
            "js" | "mjs" | "ts" => Self::Script,
            "json" => Self::Json,
            _ => Self::Other,
        }
    }

    /// Display name for this file kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::Style => "style",
            Self::Script => "script",
            Self::Json => "json",
            Self::Other => "other",
        }
    }
}
