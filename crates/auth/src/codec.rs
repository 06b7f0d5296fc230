//! URL-safe base64 (RFC 4648 §5) without padding.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid base64url input: {0}")]
pub struct CodecError(String);

pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode URL-safe base64. Trailing `=` padding is tolerated.
pub fn decode(text: &str) -> Result<Vec<u8>, CodecError> {
    URL_SAFE_NO_PAD
        .decode(text.trim_end_matches('='))
        .map_err(|e| CodecError(e.to_string()))
}

/// Decode only the canonical unpadded form, so each byte string has exactly
/// one accepted encoding.
pub fn decode_strict(text: &str) -> Result<Vec<u8>, CodecError> {
    URL_SAFE_NO_PAD
        .decode(text)
        .map_err(|e| CodecError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_uses_url_safe_alphabet() {
        let encoded = encode([0xfb, 0xff, 0xfe]);
        assert_eq!(encoded, "-__-");
        assert!(!encoded.contains('='));
    }

    #[test]
    fn padded_input_is_accepted() {
        assert_eq!(decode("aGk=").unwrap(), b"hi");
        assert_eq!(decode("aGk").unwrap(), b"hi");
    }

    #[test]
    fn strict_decode_rejects_padding() {
        assert_eq!(decode_strict("aGk").unwrap(), b"hi");
        assert!(decode_strict("aGk=").is_err());
        assert!(decode_strict("aGk==").is_err());
    }

    #[test]
    fn standard_alphabet_is_rejected() {
        assert!(decode("+/+/").is_err());
    }
}
