// GuidSleuth - core/identifier.rs
//
// The canonical identifier type and its validator.
//
// `Identifier` can only be built through `parse`/`from_bytes`, so every value
// that reaches the candidate set or the vote tally is uppercase and has the
// `8-4-4-4-12` hex shape. This is the single acceptance gate for both
// scanners; the byte-pattern regex used inside marker windows only narrows
// the search.

use crate::util::constants::{IDENTIFIER_GROUPS, IDENTIFIER_LEN};
use serde::Serialize;
use std::fmt;

/// A validated, uppercase `8-4-4-4-12` hexadecimal identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Uppercase `raw` and accept it only if it has the canonical shape.
    pub fn parse(raw: &str) -> Option<Self> {
        // Cheap length gate before allocating the uppercase copy.
        if raw.len() != IDENTIFIER_LEN {
            return None;
        }
        let upper = raw.to_ascii_uppercase();
        if is_canonical(&upper) {
            Some(Self(upper))
        } else {
            None
        }
    }

    /// Decode a raw byte match (invalid sequences replaced) and validate it.
    ///
    /// A replaced byte can never be a hex digit, so a match containing one is
    /// rejected by the shape check rather than by the decoder.
    pub fn from_bytes(raw: &[u8]) -> Option<Self> {
        Self::parse(&String::from_utf8_lossy(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// True when `s` is exactly five hyphen-separated groups of uppercase hex
/// digits with lengths 8, 4, 4, 4 and 12.
pub fn is_canonical(s: &str) -> bool {
    if s.len() != IDENTIFIER_LEN {
        return false;
    }
    let mut groups = s.split('-');
    for expected in IDENTIFIER_GROUPS {
        match groups.next() {
            Some(group) if group.len() == expected && group.bytes().all(is_upper_hex) => {}
            _ => return false,
        }
    }
    groups.next().is_none()
}

fn is_upper_hex(b: u8) -> bool {
    matches!(b, b'0'..=b'9' | b'A'..=b'F')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_and_uppercases() {
        let id = Identifier::parse("3f2504e0-4f89-11d3-9a0c-0305e82c3301").unwrap();
        assert_eq!(id.as_str(), "3F2504E0-4F89-11D3-9A0C-0305E82C3301");
    }

    #[test]
    fn test_rejects_wrong_group_layout() {
        // Right length, right alphabet, hyphens in the wrong places.
        assert!(Identifier::parse("3F2504E04-F89-11D3-9A0C-0305E82C3301").is_none());
        assert!(Identifier::parse("3F2504E0-4F89-11D3-9A0C0-305E82C3301").is_none());
        // Five groups, but 8-4-4-6-10.
        assert!(Identifier::parse("3F2504E0-4F89-11D3-9A0C03-05E82C3301").is_none());
    }

    #[test]
    fn test_rejects_non_hex_and_bad_length() {
        assert!(Identifier::parse("3F2504E0-4F89-11D3-9A0C-0305E82C330G").is_none());
        assert!(Identifier::parse("3F2504E0-4F89-11D3-9A0C-0305E82C330").is_none());
        assert!(Identifier::parse("3F2504E0-4F89-11D3-9A0C-0305E82C33011").is_none());
        assert!(Identifier::parse("").is_none());
    }

    #[test]
    fn test_from_bytes_rejects_invalid_utf8() {
        let mut raw = b"3F2504E0-4F89-11D3-9A0C-0305E82C3301".to_vec();
        raw[0] = 0xFF;
        assert!(Identifier::from_bytes(&raw).is_none());
        assert!(Identifier::from_bytes(b"3F2504E0-4F89-11D3-9A0C-0305E82C3301").is_some());
    }

    #[test]
    fn test_is_canonical_requires_uppercase() {
        assert!(is_canonical("3F2504E0-4F89-11D3-9A0C-0305E82C3301"));
        assert!(!is_canonical("3f2504e0-4f89-11d3-9a0c-0305e82c3301"));
    }

    #[test]
    fn test_serialises_as_plain_string() {
        let id = Identifier::parse("1b2c3d4e-0000-1111-2222-333344445555").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"1B2C3D4E-0000-1111-2222-333344445555\"");
    }
}
