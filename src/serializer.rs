//! Project ↔ shareable token.
//!
//! Token format: `#` followed by the codec encoding of a JSON object mapping
//! filename to content. Compiled artifacts and the `hidden` flag are not part
//! of the token.

use std::io;

use indexmap::IndexMap;

use crate::codec;
use crate::error::DecodeError;

/// Marker that separates a token from a plain path in the host URL.
pub const TOKEN_MARKER: char = '#';

/// Ordered `filename → content` projection of a project.
pub type FileMap = IndexMap<String, String>;

/// Encode a file map into a shareable token.
pub fn serialize(files: &FileMap) -> io::Result<String> {
    let json = serde_json::to_string(files)?;
    let body = codec::encode(&json)?;

    let mut token = String::with_capacity(body.len() + 1);
    token.push(TOKEN_MARKER);
    token.push_str(&body);
    Ok(token)
}

/// Decode a shareable token. The leading marker is optional.
///
/// Fails as a whole: no partially decoded file set is ever returned.
pub fn deserialize(token: &str) -> Result<FileMap, DecodeError> {
    let body = token.trim().trim_start_matches(TOKEN_MARKER);
    let json = codec::decode(body)?;
    Ok(serde_json::from_str(&json)?)
}
