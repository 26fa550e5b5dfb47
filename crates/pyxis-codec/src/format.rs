//! Format-spec parsing and strict binary encode/decode.
//!
//! Each field is one of a closed set of types identified by a
//! single-character tag. Integers are little-endian; signed and unsigned
//! variants of a width share the same byte layout and differ only in
//! two's-complement interpretation.

use std::fmt;

use crate::value::Value;
use crate::{CodecError, Result};

/// One typed field of a format spec.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    /// `s` — string up to 255 bytes, 1-byte length prefix.
    ShortString,
    /// `S` — string up to 65535 bytes, 2-byte LE length prefix.
    LongString,
    /// `d` — binary blob up to 255 bytes, 1-byte length prefix.
    ShortBlob,
    /// `D` — binary blob up to 65535 bytes, 2-byte LE length prefix.
    LongBlob,
    /// `c` — signed 8-bit integer.
    Int8,
    /// `C` — unsigned 8-bit integer.
    Uint8,
    /// `t` — signed 16-bit integer.
    Int16,
    /// `T` — unsigned 16-bit integer.
    Uint16,
    /// `i` — signed 32-bit integer.
    Int32,
    /// `I` — unsigned 32-bit integer.
    Uint32,
    /// `l` — signed 64-bit integer.
    Int64,
    /// `L` — unsigned 64-bit integer.
    Uint64,
    /// `h` — 32-byte hash.
    Hash256,
}

impl FieldType {
    /// Map a type tag to its field type.
    pub fn from_tag(tag: char) -> Result<Self> {
        match tag {
            's' => Ok(FieldType::ShortString),
            'S' => Ok(FieldType::LongString),
            'd' => Ok(FieldType::ShortBlob),
            'D' => Ok(FieldType::LongBlob),
            'c' => Ok(FieldType::Int8),
            'C' => Ok(FieldType::Uint8),
            't' => Ok(FieldType::Int16),
            'T' => Ok(FieldType::Uint16),
            'i' => Ok(FieldType::Int32),
            'I' => Ok(FieldType::Uint32),
            'l' => Ok(FieldType::Int64),
            'L' => Ok(FieldType::Uint64),
            'h' => Ok(FieldType::Hash256),
            other => Err(CodecError::InvalidTypeTag(other)),
        }
    }

    /// The field's type tag.
    pub fn tag(&self) -> char {
        match self {
            FieldType::ShortString => 's',
            FieldType::LongString => 'S',
            FieldType::ShortBlob => 'd',
            FieldType::LongBlob => 'D',
            FieldType::Int8 => 'c',
            FieldType::Uint8 => 'C',
            FieldType::Int16 => 't',
            FieldType::Uint16 => 'T',
            FieldType::Int32 => 'i',
            FieldType::Uint32 => 'I',
            FieldType::Int64 => 'l',
            FieldType::Uint64 => 'L',
            FieldType::Hash256 => 'h',
        }
    }
}

/// An ordered sequence of typed fields.
///
/// Immutable once parsed; an oracle's spec is parsed at creation time and
/// never changes afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatSpec {
    fields: Vec<FieldType>,
}

impl FormatSpec {
    /// Parse a spec string such as `"Ihh"` into its field sequence.
    ///
    /// # Errors
    ///
    /// - [`CodecError::EmptySpec`] for an empty string
    /// - [`CodecError::InvalidTypeTag`] for any unrecognized character
    pub fn parse(spec: &str) -> Result<Self> {
        if spec.is_empty() {
            return Err(CodecError::EmptySpec);
        }
        let fields = spec
            .chars()
            .map(FieldType::from_tag)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { fields })
    }

    /// The fields of this spec, in wire order.
    pub fn fields(&self) -> &[FieldType] {
        &self.fields
    }

    /// Decode a raw payload into one value per field.
    ///
    /// The cursor advances strictly left to right. Fails with
    /// [`CodecError::TruncatedInput`] if bytes run out mid-field and with
    /// [`CodecError::TrailingBytes`] if bytes remain after the last field.
    pub fn decode(&self, bytes: &[u8]) -> Result<Vec<Value>> {
        let mut cursor = Cursor::new(bytes);
        let mut values = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            values.push(decode_field(*field, &mut cursor)?);
        }
        let remaining = cursor.remaining();
        if remaining > 0 {
            return Err(CodecError::TrailingBytes(remaining));
        }
        Ok(values)
    }

    /// Encode one value per field into a raw payload.
    ///
    /// The inverse of [`FormatSpec::decode`]; `decode(encode(v)) == v`.
    pub fn encode(&self, values: &[Value]) -> Result<Vec<u8>> {
        if values.len() != self.fields.len() {
            return Err(CodecError::ArityMismatch {
                expected: self.fields.len(),
                got: values.len(),
            });
        }
        let mut out = Vec::new();
        for (index, (field, value)) in self.fields.iter().zip(values).enumerate() {
            encode_field(*field, value, index, &mut out)?;
        }
        Ok(out)
    }
}

impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.fields {
            write!(f, "{}", field.tag())?;
        }
        Ok(())
    }
}

/// Byte cursor over an input buffer.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Take exactly `n` bytes, failing on a short buffer.
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(CodecError::TruncatedInput {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn take_u16_le(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }
}

fn decode_field(field: FieldType, cursor: &mut Cursor<'_>) -> Result<Value> {
    match field {
        FieldType::ShortString => {
            let len = cursor.take_u8()? as usize;
            decode_text(cursor.take(len)?)
        }
        FieldType::LongString => {
            let len = cursor.take_u16_le()? as usize;
            decode_text(cursor.take(len)?)
        }
        FieldType::ShortBlob => {
            let len = cursor.take_u8()? as usize;
            Ok(Value::Bytes(cursor.take(len)?.to_vec()))
        }
        FieldType::LongBlob => {
            let len = cursor.take_u16_le()? as usize;
            Ok(Value::Bytes(cursor.take(len)?.to_vec()))
        }
        FieldType::Int8 => Ok(Value::Int(cursor.take_u8()? as i8 as i64)),
        FieldType::Uint8 => Ok(Value::Uint(cursor.take_u8()? as u64)),
        FieldType::Int16 => Ok(Value::Int(cursor.take_u16_le()? as i16 as i64)),
        FieldType::Uint16 => Ok(Value::Uint(cursor.take_u16_le()? as u64)),
        FieldType::Int32 => {
            let b = cursor.take(4)?;
            Ok(Value::Int(
                i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as i64
            ))
        }
        FieldType::Uint32 => {
            let b = cursor.take(4)?;
            Ok(Value::Uint(
                u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as u64
            ))
        }
        FieldType::Int64 => {
            let b = cursor.take(8)?;
            Ok(Value::Int(i64::from_le_bytes([
                b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
            ])))
        }
        FieldType::Uint64 => {
            let b = cursor.take(8)?;
            Ok(Value::Uint(u64::from_le_bytes([
                b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
            ])))
        }
        FieldType::Hash256 => {
            let b = cursor.take(32)?;
            let mut hash = [0u8; 32];
            hash.copy_from_slice(b);
            Ok(Value::Hash(hash))
        }
    }
}

fn decode_text(bytes: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?;
    Ok(Value::Text(text.to_string()))
}

fn encode_field(field: FieldType, value: &Value, index: usize, out: &mut Vec<u8>) -> Result<()> {
    match (field, value) {
        (FieldType::ShortString, Value::Text(s)) => encode_prefixed(s.as_bytes(), false, out),
        (FieldType::LongString, Value::Text(s)) => encode_prefixed(s.as_bytes(), true, out),
        (FieldType::ShortBlob, Value::Bytes(b)) => encode_prefixed(b, false, out),
        (FieldType::LongBlob, Value::Bytes(b)) => encode_prefixed(b, true, out),
        (FieldType::Int8, Value::Int(v)) => {
            let narrowed =
                i8::try_from(*v).map_err(|_| CodecError::TypeMismatch { field: index })?;
            out.push(narrowed as u8);
            Ok(())
        }
        (FieldType::Uint8, Value::Uint(v)) => {
            let narrowed =
                u8::try_from(*v).map_err(|_| CodecError::TypeMismatch { field: index })?;
            out.push(narrowed);
            Ok(())
        }
        (FieldType::Int16, Value::Int(v)) => {
            let narrowed =
                i16::try_from(*v).map_err(|_| CodecError::TypeMismatch { field: index })?;
            out.extend_from_slice(&narrowed.to_le_bytes());
            Ok(())
        }
        (FieldType::Uint16, Value::Uint(v)) => {
            let narrowed =
                u16::try_from(*v).map_err(|_| CodecError::TypeMismatch { field: index })?;
            out.extend_from_slice(&narrowed.to_le_bytes());
            Ok(())
        }
        (FieldType::Int32, Value::Int(v)) => {
            let narrowed =
                i32::try_from(*v).map_err(|_| CodecError::TypeMismatch { field: index })?;
            out.extend_from_slice(&narrowed.to_le_bytes());
            Ok(())
        }
        (FieldType::Uint32, Value::Uint(v)) => {
            let narrowed =
                u32::try_from(*v).map_err(|_| CodecError::TypeMismatch { field: index })?;
            out.extend_from_slice(&narrowed.to_le_bytes());
            Ok(())
        }
        (FieldType::Int64, Value::Int(v)) => {
            out.extend_from_slice(&v.to_le_bytes());
            Ok(())
        }
        (FieldType::Uint64, Value::Uint(v)) => {
            out.extend_from_slice(&v.to_le_bytes());
            Ok(())
        }
        (FieldType::Hash256, Value::Hash(h)) => {
            out.extend_from_slice(h);
            Ok(())
        }
        _ => Err(CodecError::TypeMismatch { field: index }),
    }
}

/// Write a length-prefixed payload (1-byte or 2-byte LE prefix).
fn encode_prefixed(bytes: &[u8], long: bool, out: &mut Vec<u8>) -> Result<()> {
    let max = if long { u16::MAX as usize } else { u8::MAX as usize };
    if bytes.len() > max {
        return Err(CodecError::Oversize {
            len: bytes.len(),
            max,
        });
    }
    if long {
        out.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
    } else {
        out.push(bytes.len() as u8);
    }
    out.extend_from_slice(bytes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(s: &str) -> FormatSpec {
        FormatSpec::parse(s).expect("parse spec")
    }

    fn decode_hex(s: &str, payload: &str) -> Vec<Value> {
        spec(s)
            .decode(&hex::decode(payload).expect("hex"))
            .expect("decode")
    }

    #[test]
    fn test_parse_rejects_unknown_tag() {
        assert!(matches!(
            FormatSpec::parse("Test"),
            Err(CodecError::InvalidTypeTag('e'))
        ));
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(matches!(FormatSpec::parse(""), Err(CodecError::EmptySpec)));
    }

    #[test]
    fn test_parse_all_tags() {
        let parsed = spec("sSdDcCtTiIlLh");
        assert_eq!(parsed.fields().len(), 13);
        assert_eq!(parsed.to_string(), "sSdDcCtTiIlLh");
    }

    #[test]
    fn test_decode_short_string() {
        assert_eq!(
            decode_hex("s", "05416e746f6e"),
            vec![Value::Text("Anton".into())]
        );
    }

    #[test]
    fn test_decode_long_string() {
        let mut payload = vec![0x00, 0x01];
        payload.extend_from_slice(&[b'a'; 256]);
        let values = spec("S").decode(&payload).expect("decode");
        assert_eq!(values, vec![Value::Text("a".repeat(256))]);
    }

    #[test]
    fn test_decode_blobs() {
        assert_eq!(decode_hex("d", "0101"), vec![Value::Bytes(vec![0x01])]);
        assert_eq!(decode_hex("D", "010001"), vec![Value::Bytes(vec![0x01])]);
    }

    #[test]
    fn test_signed_unsigned_symmetry_8() {
        assert_eq!(decode_hex("c", "ff"), vec![Value::Int(-1)]);
        assert_eq!(decode_hex("C", "ff"), vec![Value::Uint(255)]);
    }

    #[test]
    fn test_signed_unsigned_symmetry_16() {
        assert_eq!(decode_hex("t", "ffff"), vec![Value::Int(-1)]);
        assert_eq!(decode_hex("T", "ffff"), vec![Value::Uint(65535)]);
    }

    #[test]
    fn test_signed_unsigned_symmetry_32() {
        assert_eq!(decode_hex("i", "ffffffff"), vec![Value::Int(-1)]);
        assert_eq!(decode_hex("I", "ffffffff"), vec![Value::Uint(4_294_967_295)]);
    }

    #[test]
    fn test_signed_unsigned_symmetry_64() {
        // Two's-complement: 0xffffffff00000000 as i64 is -2^32.
        assert_eq!(
            decode_hex("l", "00000000ffffffff"),
            vec![Value::Int(-4_294_967_296)]
        );
        assert_eq!(
            decode_hex("L", "00000000ffffffff"),
            vec![Value::Uint(18_446_744_069_414_584_320)]
        );
    }

    #[test]
    fn test_decode_hash_renders_reversed() {
        let values = decode_hex(
            "h",
            "00000000ffffffff00000000ffffffff00000000ffffffff00000000ffffffff",
        );
        assert_eq!(
            values[0].to_string(),
            "ffffffff00000000ffffffff00000000ffffffff00000000ffffffff00000000"
        );
    }

    #[test]
    fn test_decode_composite_in_field_order() {
        let hash_le = "00000000ffffffff00000000ffffffff00000000ffffffff00000000ffffffff";
        let payload = format!("ffffffff{hash_le}{hash_le}");
        let values = decode_hex("Ihh", &payload);
        let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "4294967295".to_string(),
                "ffffffff00000000ffffffff00000000ffffffff00000000ffffffff00000000".to_string(),
                "ffffffff00000000ffffffff00000000ffffffff00000000ffffffff00000000".to_string(),
            ]
        );
    }

    #[test]
    fn test_decode_truncated() {
        assert!(matches!(
            spec("I").decode(&[0xff, 0xff]),
            Err(CodecError::TruncatedInput {
                needed: 4,
                remaining: 2
            })
        ));
        // Length prefix promising more bytes than available
        assert!(matches!(
            spec("s").decode(&[0x05, b'a']),
            Err(CodecError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn test_decode_trailing_bytes() {
        assert!(matches!(
            spec("C").decode(&[0xff, 0x00]),
            Err(CodecError::TrailingBytes(1))
        ));
    }

    #[test]
    fn test_round_trip_every_tag() {
        let cases: Vec<(&str, Value)> = vec![
            ("s", Value::Text("Anton".into())),
            ("S", Value::Text("a".repeat(300))),
            ("d", Value::Bytes(vec![0x01, 0x02, 0x03])),
            ("D", Value::Bytes(vec![0xFF; 300])),
            ("c", Value::Int(-1)),
            ("C", Value::Uint(255)),
            ("t", Value::Int(-32768)),
            ("T", Value::Uint(65535)),
            ("i", Value::Int(-2_147_483_648)),
            ("I", Value::Uint(4_294_967_295)),
            ("l", Value::Int(-4_294_967_296)),
            ("L", Value::Uint(u64::MAX)),
            ("h", Value::Hash([0x42; 32])),
        ];
        for (tag, value) in cases {
            let parsed = spec(tag);
            let encoded = parsed.encode(std::slice::from_ref(&value)).expect("encode");
            let decoded = parsed.decode(&encoded).expect("decode");
            assert_eq!(decoded, vec![value], "round trip for tag {tag}");
        }
    }

    #[test]
    fn test_encode_arity_mismatch() {
        assert!(matches!(
            spec("Ih").encode(&[Value::Uint(1)]),
            Err(CodecError::ArityMismatch {
                expected: 2,
                got: 1
            })
        ));
    }

    #[test]
    fn test_encode_type_mismatch() {
        assert!(matches!(
            spec("I").encode(&[Value::Text("nope".into())]),
            Err(CodecError::TypeMismatch { field: 0 })
        ));
        // Signed value out of range for the narrow width
        assert!(matches!(
            spec("c").encode(&[Value::Int(300)]),
            Err(CodecError::TypeMismatch { field: 0 })
        ));
    }

    #[test]
    fn test_encode_oversize_short_string() {
        assert!(matches!(
            spec("s").encode(&[Value::Text("a".repeat(256))]),
            Err(CodecError::Oversize { len: 256, max: 255 })
        ));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        assert!(matches!(
            spec("s").decode(&[0x02, 0xff, 0xfe]),
            Err(CodecError::InvalidUtf8)
        ));
    }
}
