//! Error types for the project store.
//!
//! Parse and compile errors are recovered locally and end up as store
//! diagnostics. Decode and resolve errors are returned to the caller.

use thiserror::Error;

/// Malformed JSON in the import map or in a file compiled as JSON.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("{0}")]
    Json(String),

    #[error("expected {expected} at `{at}`")]
    Shape { at: &'static str, expected: &'static str },
}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}

/// Diagnostics produced while compiling one file.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{}", .errors.join("\n"))]
pub struct CompileError {
    pub errors: Vec<String>,
}

impl CompileError {
    pub fn new(errors: Vec<String>) -> Self {
        Self { errors }
    }

    pub fn single(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
        }
    }
}

/// A shareable token that cannot be turned back into a file set.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("token is empty")]
    Empty,

    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid compressed stream: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("decoded payload exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("payload is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("payload is not a file map: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure to obtain a compiler for a requested version.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("unknown compiler version `{0}`")]
    UnknownVersion(String),

    #[error("failed to load compiler `{version}`: {message}")]
    Load { version: String, message: String },
}
