//! Tag decoder.
//!
//! Turns the raw identity block read from a FeliCa card into an
//! [`IdentityRecord`]. The block is UTF-8 text: a two-character role code
//! followed by the seven-character identifier. Anything after the ninth
//! character is padding and ignored.
//!
//! # Examples
//!
//! ```
//! use oruca_core::{decode, RawTagRecord, Role};
//!
//! let record = decode(&RawTagRecord::from("01AB12345")).unwrap();
//! assert_eq!(record.role, Role::Student);
//! assert_eq!(record.student_id.as_str(), "AB12345");
//! ```

use crate::{
    Result,
    constants::{MIN_PAYLOAD_CHARS, ROLE_CODE_LENGTH},
    error::DecodeError,
    types::{IdentityRecord, RawTagRecord, Role, StudentId},
};

/// Decode a raw identity block.
///
/// # Errors
///
/// - `DecodeError::Encoding` if the block is not valid UTF-8
/// - `DecodeError::Truncated` if fewer than 9 characters remain once trailing
///   NUL and space padding is removed
/// - `DecodeError::UnknownRole` if the role code is not `01`, `02` or `11`
/// - `DecodeError::InvalidIdentifier` if the identifier is not ASCII alphanumeric
pub fn decode(raw: &RawTagRecord) -> Result<IdentityRecord> {
    let text =
        std::str::from_utf8(raw.as_bytes()).map_err(|e| DecodeError::Encoding(e.to_string()))?;

    // A block read from a card is always 16 bytes; a short payload is padded.
    let text = text.trim_end_matches(['\0', ' ']);

    // Index by character, not by byte: a multi-byte character in the role
    // prefix must not shift the identifier window.
    let chars: Vec<char> = text.chars().collect();

    if chars.len() < ROLE_CODE_LENGTH {
        return Err(DecodeError::Truncated {
            len: chars.len(),
            required: MIN_PAYLOAD_CHARS,
        });
    }

    let code: String = chars[..ROLE_CODE_LENGTH].iter().collect();
    let role = Role::from_code(&code)?;

    if chars.len() < MIN_PAYLOAD_CHARS {
        return Err(DecodeError::Truncated {
            len: chars.len(),
            required: MIN_PAYLOAD_CHARS,
        });
    }

    let identifier: String = chars[ROLE_CODE_LENGTH..MIN_PAYLOAD_CHARS].iter().collect();
    let student_id = StudentId::new(&identifier)?;

    Ok(IdentityRecord::new(role, student_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("01AB12345", Role::Student, "AB12345")]
    #[case("02CD67890", Role::Student, "CD67890")]
    #[case("11ST00001", Role::Staff, "ST00001")]
    #[case("01AB12345       ", Role::Student, "AB12345")] // padded block
    #[case("01AB12345XYZ", Role::Student, "AB12345")] // trailing data ignored
    fn test_decode_valid(#[case] payload: &str, #[case] role: Role, #[case] id: &str) {
        let record = decode(&RawTagRecord::from(payload)).unwrap();
        assert_eq!(record.role, role);
        assert_eq!(record.student_id.as_str(), id);
    }

    #[test]
    fn test_decode_full_block_with_nul_padding() {
        let mut block = b"11XY98765".to_vec();
        block.resize(16, 0);
        let record = decode(&RawTagRecord::new(block)).unwrap();
        assert_eq!(record.role, Role::Staff);
        assert_eq!(record.student_id.as_str(), "XY98765");
    }

    #[rstest]
    #[case("99AB12345", "99")]
    #[case("00AB12345", "00")]
    #[case("12AB12345", "12")]
    #[case("99AB", "99")] // unknown role reported before length
    fn test_decode_unknown_role(#[case] payload: &str, #[case] expected_code: &str) {
        let result = decode(&RawTagRecord::from(payload));
        assert_eq!(
            result,
            Err(DecodeError::UnknownRole {
                code: expected_code.to_string()
            })
        );
    }

    #[rstest]
    #[case("", 0)]
    #[case("0", 1)]
    #[case("01", 2)]
    #[case("01AB1234", 8)]
    fn test_decode_truncated(#[case] payload: &str, #[case] len: usize) {
        let result = decode(&RawTagRecord::from(payload));
        assert_eq!(
            result,
            Err(DecodeError::Truncated {
                len,
                required: MIN_PAYLOAD_CHARS
            })
        );
    }

    #[rstest]
    #[case(0)]
    #[case(b' ')]
    fn test_decode_short_id_in_padded_block(#[case] pad: u8) {
        let mut block = b"01AB123".to_vec();
        block.resize(16, pad);
        assert_eq!(
            decode(&RawTagRecord::new(block)),
            Err(DecodeError::Truncated {
                len: 7,
                required: MIN_PAYLOAD_CHARS
            })
        );
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let raw = RawTagRecord::new(vec![b'0', b'1', 0xFF, 0xFE, b'1', b'2', b'3', b'4', b'5']);
        assert!(matches!(decode(&raw), Err(DecodeError::Encoding(_))));
    }

    #[test]
    fn test_decode_rejects_non_alphanumeric_identifier() {
        let result = decode(&RawTagRecord::from("01AB 2345"));
        assert!(matches!(
            result,
            Err(DecodeError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn test_decode_counts_characters_not_bytes() {
        // Seven multi-byte characters: nine characters in total, but the
        // identifier character set check still rejects them.
        let result = decode(&RawTagRecord::from("01あいうえおかき"));
        assert!(matches!(
            result,
            Err(DecodeError::InvalidIdentifier { .. })
        ));
    }
}
