//! Error types.

use std::io;

use crate::wire::WireType;

/// Result type for operations that mix schema, decoding and I/O concerns.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while building a [`Registry`](crate::Registry).
///
/// These are detected once, at startup, and are not expected to be recovered from.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Field number 0, or above the largest encodable field number.
    #[error("message `{message}`: field `{field}` has invalid number {number}")]
    InvalidFieldNumber {
        message: String,
        field: String,
        number: u32,
    },

    /// Field number inside the range reserved by the wire format.
    #[error("message `{message}`: field `{field}` uses reserved number {number}")]
    ReservedFieldNumber {
        message: String,
        field: String,
        number: u32,
    },

    /// Two fields of one message share a number.
    #[error("message `{message}`: field number {number} used by both `{first}` and `{second}`")]
    DuplicateFieldNumber {
        message: String,
        number: u32,
        first: String,
        second: String,
    },

    /// Two fields of one message share a name.
    #[error("message `{message}`: duplicate field name `{field}`")]
    DuplicateFieldName { message: String, field: String },

    /// A field's name or JSON name is already taken by another field's name or JSON name.
    #[error("message `{message}`: name `{name}` of field `{second}` clashes with field `{first}`")]
    FieldNameClash {
        message: String,
        name: String,
        first: String,
        second: String,
    },

    /// A message or enum type name was registered twice.
    #[error("type `{0}` is registered more than once")]
    DuplicateType(String),

    /// A field refers to a message or enum type the registry does not know.
    #[error("message `{message}`: field `{field}` refers to unknown type `{type_name}`")]
    UnresolvedType {
        message: String,
        field: String,
        type_name: String,
    },

    /// Enum types must open with a value numbered 0, which serves as the default.
    #[error("enum `{0}` must declare a first value numbered 0")]
    MissingZeroValue(String),

    /// Two values of one enum share a symbol.
    #[error("enum `{enum_name}`: duplicate symbol `{symbol}`")]
    DuplicateEnumSymbol { enum_name: String, symbol: String },
}

/// Errors raised while decoding wire bytes or JSON text into a message.
///
/// Decoding is atomic: when one of these is returned no partially decoded message is handed
/// to the caller.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Input ended inside a varint.
    #[error("truncated varint at offset {offset}")]
    TruncatedVarint { offset: usize },

    /// Varint longer than ten bytes or wider than 64 bits.
    #[error("malformed varint at offset {offset}")]
    VarintOverflow { offset: usize },

    /// A length prefix points past the end of the input.
    #[error(
        "length-delimited value at offset {offset} declares {declared} bytes, only {remaining} remain"
    )]
    LengthOverrun {
        offset: usize,
        declared: u64,
        remaining: usize,
    },

    /// Input ended inside a fixed-width value.
    #[error("truncated fixed-width value at offset {offset}: need {needed} bytes, have {remaining}")]
    TruncatedFixed {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    /// Wire type code the format does not define (or a group, which is unsupported).
    #[error("unknown wire type {wire_type} at offset {offset}")]
    UnknownWireType { offset: usize, wire_type: u8 },

    /// Tag carrying field number 0 or one that does not fit in 29 bits.
    #[error("invalid field number {number} at offset {offset}")]
    InvalidFieldNumber { offset: usize, number: u64 },

    /// A known field arrived with a wire type its declared type cannot use.
    #[error("field `{field}` at offset {offset}: expected wire type {expected:?}, found {found:?}")]
    WireTypeMismatch {
        field: String,
        offset: usize,
        expected: WireType,
        found: WireType,
    },

    /// A string field does not hold valid UTF-8.
    #[error("field `{field}` at offset {offset}: invalid UTF-8")]
    InvalidUtf8 { field: String, offset: usize },

    /// A message field names a type the codec's registry does not hold.
    #[error("field `{field}` refers to unknown message type `{type_name}`")]
    UnresolvedType { field: String, type_name: String },

    /// Nested messages go deeper than the configured limit.
    #[error("message nesting exceeds the recursion limit of {limit}")]
    RecursionLimit { limit: usize },

    /// JSON text could not be parsed at all.
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// JSON object key with no matching field.
    #[error("message `{message}` has no field named `{key}`")]
    UnknownFieldName { message: String, key: String },

    /// Enum symbol that is not registered for the field's enum type.
    #[error("field `{field}`: `{symbol}` is not a value of enum `{enum_name}`")]
    UnknownEnumSymbol {
        field: String,
        enum_name: String,
        symbol: String,
    },

    /// JSON value of the wrong shape or out of range for its field.
    #[error("field `{field}`: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Errors raised by the message tree API when a caller misuses it.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// The message type declares no field with this number.
    #[error("message `{message}` has no field number {number}")]
    UnknownNumber { message: String, number: u32 },

    /// The message type declares no field with this name.
    #[error("message `{message}` has no field named `{name}`")]
    UnknownName { message: String, name: String },

    /// Value does not match the field's declared type or cardinality.
    #[error("field `{field}` expects {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: &'static str,
    },

    /// `merge` was asked to combine two different message types.
    #[error("cannot merge `{from}` into `{into}`")]
    MergeMismatch { into: String, from: String },
}

/// Top-level error for callers combining registry lookups, decoding and file I/O.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Registry validation failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Wire or text decoding failed.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Message tree misuse.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// The registry has no message type with this name.
    #[error("unknown message type `{0}`")]
    UnknownType(String),

    /// Filesystem I/O error, passed through unchanged.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}
