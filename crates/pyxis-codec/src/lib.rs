//! # pyxis-codec
//!
//! Binary codec for oracle data feeds.
//!
//! A feed's wire format is described by a format spec: an ordered sequence
//! of single-character type tags, parsed once at oracle-creation time into
//! a closed [`format::FieldType`] enum. Encoding and decoding are strict:
//! fields are consumed left to right, a short buffer is rejected, and so
//! are trailing bytes after the last field.
//!
//! ## Modules
//!
//! - [`format`] — format-spec parsing, encode, decode
//! - [`value`] — decoded field values and their text rendering

pub mod format;
pub mod value;

pub use format::{FieldType, FormatSpec};
pub use value::Value;

/// Error types for codec operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The format spec contains an unrecognized type tag.
    #[error("invalid type tag '{0}'")]
    InvalidTypeTag(char),

    /// The format spec is empty.
    #[error("empty format spec")]
    EmptySpec,

    /// Not enough bytes remain for the next field.
    #[error("truncated input: field needs {needed} bytes, {remaining} remain")]
    TruncatedInput {
        /// Bytes required by the next field.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// Bytes remain after the last field was consumed.
    #[error("{0} trailing bytes after last field")]
    TrailingBytes(usize),

    /// The number of values does not match the number of fields.
    #[error("arity mismatch: spec has {expected} fields, got {got} values")]
    ArityMismatch {
        /// Field count of the spec.
        expected: usize,
        /// Value count supplied.
        got: usize,
    },

    /// A value's kind does not match its field's type.
    #[error("type mismatch at field {field}")]
    TypeMismatch {
        /// Zero-based field index.
        field: usize,
    },

    /// A length-prefixed payload exceeds the prefix's capacity.
    #[error("payload of {len} bytes exceeds maximum {max}")]
    Oversize {
        /// Payload length.
        len: usize,
        /// Maximum representable length.
        max: usize,
    },

    /// A string field holds bytes that are not valid UTF-8.
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,
}

/// Convenience result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
