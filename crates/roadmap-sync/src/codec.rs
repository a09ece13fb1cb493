//! Transport codec for document content
//!
//! The remote carries blob content as base64 text. Encoding always goes
//! through UTF-8 so every Unicode scalar value survives. Decoding accepts
//! two generations of writers:
//!
//! 1. UTF-8-aware encoders (this crate): base64 of the UTF-8 bytes.
//! 2. Legacy byte-oriented encoders that only handled code points below
//!    U+0100 and wrote one byte per character.
//!
//! The legacy path is taken only when the decoded bytes are not valid UTF-8.

use crate::error::CodecError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Encode document text for transport
#[must_use]
pub fn encode(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Decode transported content back into document text
///
/// Whitespace injected by transports (GitHub wraps at 60 columns) is
/// stripped first.
///
/// # Errors
/// Returns [`CodecError::InvalidBase64`] if the content is not base64 at all;
/// there is no further fallback.
pub fn decode(encoded: &str) -> Result<String, CodecError> {
    let compact = strip_whitespace(encoded);
    let bytes = STANDARD.decode(compact.as_bytes())?;

    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            tracing::debug!(
                valid_up_to = err.utf8_error().valid_up_to(),
                "content is not UTF-8, decoding as legacy single-byte text"
            );
            Ok(decode_legacy(&err.into_bytes()))
        }
    }
}

/// Byte-per-character decoding used by the first-generation encoder
fn decode_legacy(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

fn strip_whitespace(encoded: &str) -> String {
    encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ascii_matches_plain_base64() {
        assert_eq!(encode("hello"), "aGVsbG8=");
        assert_eq!(decode("aGVsbG8=").unwrap(), "hello");
    }

    #[test]
    fn non_ascii_text_round_trips() {
        for text in ["Überblick", "路线图", "🚀 launch", "e\u{301}", "\u{0}\u{10FFFF}"] {
            assert_eq!(decode(&encode(text)).unwrap(), text);
        }
    }

    #[test]
    fn empty_text_round_trips() {
        assert_eq!(encode(""), "");
        assert_eq!(decode("").unwrap(), "");
    }

    #[test]
    fn transport_line_breaks_are_ignored() {
        let encoded = encode("{\n  \"projects\": []\n}");
        let (head, tail) = encoded.split_at(8);
        let wrapped = format!(" {head}\n{tail}\r\n\t");
        assert_eq!(decode(&wrapped).unwrap(), "{\n  \"projects\": []\n}");
    }

    #[test]
    fn legacy_latin1_payload_decodes_per_byte() {
        // "café" written one byte per character: 0xE9 alone is not UTF-8
        let legacy = STANDARD.encode([b'c', b'a', b'f', 0xE9]);
        assert_eq!(decode(&legacy).unwrap(), "café");
    }

    #[test]
    fn legacy_ascii_payload_is_identical_under_both_decoders() {
        let legacy = STANDARD.encode(b"{\"projects\":[]}");
        assert_eq!(decode(&legacy).unwrap(), "{\"projects\":[]}");
    }

    #[test]
    fn malformed_base64_is_terminal() {
        let err = decode("not*base64!").unwrap_err();
        assert!(matches!(err, CodecError::InvalidBase64(_)));
    }

    #[test]
    fn truncated_base64_is_terminal() {
        assert!(decode("aGVsbG8").is_err());
    }

    proptest! {
        #[test]
        fn prop_round_trip(text in any::<String>()) {
            prop_assert_eq!(decode(&encode(&text)).unwrap(), text);
        }

        #[test]
        fn prop_round_trip_with_line_wrapping(text in any::<String>(), width in 1..80usize) {
            let encoded = encode(&text);
            let wrapped: String = encoded
                .as_bytes()
                .chunks(width)
                .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
                .collect::<Vec<_>>()
                .join("\n");
            prop_assert_eq!(decode(&wrapped).unwrap(), text);
        }
    }
}
