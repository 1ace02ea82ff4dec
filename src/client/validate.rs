//! Key identifier validation.

use crate::error::{KeyServiceError, Result};

/// Length of a GPG key id: the low 64 bits of the fingerprint in hex.
pub const KEY_ID_LEN: usize = 16;

/// Checks that `key_id` is exactly 16 hexadecimal characters (either
/// case). Runs before any network request that names a key, so malformed
/// ids never reach the service.
pub fn validate_key_id(key_id: &str) -> Result<()> {
    if key_id.len() != KEY_ID_LEN {
        return Err(KeyServiceError::InvalidArgument(format!(
            "key id must be exactly {} characters, got {}",
            KEY_ID_LEN,
            key_id.len()
        )));
    }
    if !key_id.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(KeyServiceError::InvalidArgument(format!(
            "key id must be hexadecimal, got: {key_id}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_16_hex_chars_either_case() {
        assert!(validate_key_id("0123456789abcdef").is_ok());
        assert!(validate_key_id("0123456789ABCDEF").is_ok());
        assert!(validate_key_id("DeadBeefDeadBeef").is_ok());
    }

    #[test]
    fn rejects_wrong_length() {
        for id in ["", "abc", "0123456789abcde", "0123456789abcdef0"] {
            let err = validate_key_id(id).unwrap_err();
            assert!(
                matches!(err, KeyServiceError::InvalidArgument(_)),
                "expected InvalidArgument for {id:?}"
            );
        }
    }

    #[test]
    fn rejects_non_hex_characters() {
        for id in ["0123456789abcdeg", "0123456789abcde ", "-123456789abcdef"] {
            let err = validate_key_id(id).unwrap_err();
            assert!(matches!(err, KeyServiceError::InvalidArgument(_)));
        }
    }

    #[test]
    fn rejects_multibyte_input() {
        // 15 chars but 16 bytes; must not slip past the length check
        assert!(validate_key_id("0123456789abcdé").is_err());
    }
}
