//! Reversible text ↔ token transform for shareable state.
//!
//! `encode` compresses UTF-8 text with Brotli and renders the bytes as
//! URL-safe base64 without padding, so the result can sit in a URL fragment
//! without escaping. `decode` is the exact inverse.

use std::io::{self, Read, Write};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::error::DecodeError;

/// Brotli quality (0-11). Tokens are small and built rarely, so favor size.
const QUALITY: u32 = 11;
/// Brotli window size (log2).
const LG_WINDOW: u32 = 22;
const BUFFER_SIZE: usize = 4096;
/// Upper bound on decoded text; tokens come from untrusted URLs.
pub const MAX_DECODED: usize = 8 * 1024 * 1024;

/// Compress and encode text into a URL-safe token body.
pub fn encode(text: &str) -> io::Result<String> {
    let mut writer = brotli::CompressorWriter::new(Vec::new(), BUFFER_SIZE, QUALITY, LG_WINDOW);
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    Ok(URL_SAFE_NO_PAD.encode(writer.into_inner()))
}

/// Decode and decompress a token body produced by [`encode`].
///
/// Output larger than [`MAX_DECODED`] is rejected.
pub fn decode(token: &str) -> Result<String, DecodeError> {
    decode_with_limit(token, MAX_DECODED)
}

fn decode_with_limit(token: &str, limit: usize) -> Result<String, DecodeError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(DecodeError::Empty);
    }

    let compressed = URL_SAFE_NO_PAD.decode(token)?;
    let mut bytes = Vec::with_capacity((compressed.len() * 4).min(limit));
    brotli::Decompressor::new(compressed.as_slice(), BUFFER_SIZE)
        .take(limit as u64 + 1)
        .read_to_end(&mut bytes)
        .map_err(DecodeError::Decompress)?;
    if bytes.len() > limit {
        return Err(DecodeError::TooLarge { limit });
    }

    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_unicode() {
        let text = "<h1>héllo 世界 🚀</h1>";
        let token = encode(text).unwrap();
        assert_eq!(decode(&token).unwrap(), text);
    }

    #[test]
    fn test_token_is_url_safe() {
        let text = "?&=+/#".repeat(50);
        let token = encode(&text).unwrap();
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_roundtrip_empty_text() {
        let token = encode("").unwrap();
        assert!(!token.is_empty());
        assert_eq!(decode(&token).unwrap(), "");
    }

    #[test]
    fn test_repetitive_text_shrinks() {
        let text = "<template><div>repeat</div></template>\n".repeat(200);
        let token = encode(&text).unwrap();
        assert!(token.len() < text.len() / 4);
    }

    #[test]
    fn test_decode_rejects_empty() {
        assert!(matches!(decode("  "), Err(DecodeError::Empty)));
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        assert!(matches!(decode("not*base64!"), Err(DecodeError::Base64(_))));
    }

    #[test]
    fn test_decode_stops_at_limit() {
        let token = encode(&"a".repeat(10_000)).unwrap();
        assert!(token.len() < 100);
        assert!(matches!(
            decode_with_limit(&token, 1024),
            Err(DecodeError::TooLarge { limit: 1024 })
        ));
        assert_eq!(decode_with_limit(&token, 10_000).unwrap().len(), 10_000);
    }

    #[test]
    fn test_decode_rejects_truncated_stream() {
        let text = "the quick brown fox jumps over the lazy dog ".repeat(40);
        let full = URL_SAFE_NO_PAD.decode(encode(&text).unwrap()).unwrap();
        let truncated = URL_SAFE_NO_PAD.encode(&full[..full.len() / 2]);
        assert!(decode(&truncated).is_err());
    }
}
