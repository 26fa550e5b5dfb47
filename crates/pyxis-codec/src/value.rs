//! Decoded field values.

use std::fmt;

/// A single decoded field value.
///
/// Signed and unsigned integers of every width collapse into `Int`/`Uint`;
/// the field type, not the value, remembers the wire width.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// Signed integer (two's complement on the wire).
    Int(i64),
    /// Unsigned integer.
    Uint(u64),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// 32-byte hash.
    Hash([u8; 32]),
}

impl fmt::Display for Value {
    /// Render a value the way sample queries present it: integers in
    /// decimal, text verbatim, bytes as lowercase hex, hashes as
    /// byte-reversed lowercase hex (ledger display convention).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Uint(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
            Value::Bytes(b) => f.write_str(&hex::encode(b)),
            Value::Hash(h) => {
                let mut reversed = *h;
                reversed.reverse();
                f.write_str(&hex::encode(reversed))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_int() {
        assert_eq!(Value::Int(-1).to_string(), "-1");
        assert_eq!(Value::Uint(255).to_string(), "255");
    }

    #[test]
    fn test_display_text() {
        assert_eq!(Value::Text("Anton".into()).to_string(), "Anton");
    }

    #[test]
    fn test_display_bytes() {
        assert_eq!(Value::Bytes(vec![0x01]).to_string(), "01");
        assert_eq!(Value::Bytes(vec![0xAB, 0xCD]).to_string(), "abcd");
    }

    #[test]
    fn test_display_hash_is_byte_reversed() {
        let mut h = [0u8; 32];
        h[0] = 0x01;
        let rendered = Value::Hash(h).to_string();
        assert!(rendered.ends_with("01"));
        assert!(rendered.starts_with("00"));
    }
}
