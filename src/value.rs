//! Field values.

use crate::descriptor::FieldType;
use crate::message::Message;

/// A field value, checked against its [`FieldType`] when stored in a [`Message`].
///
/// Several field types share a variant: `int32`, `sint32` and `sfixed32` all hold
/// [`Value::I32`], `uint32` and `fixed32` hold [`Value::U32`], and likewise for 64 bits.
/// Repeated fields hold a [`Value::List`] of element values.
#[derive(Debug, Clone)]
pub enum Value {
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    /// Raw enum number; numbers unknown to the registry are kept as-is.
    Enum(i32),
    Message(Message),
    List(Vec<Value>),
}

impl Value {
    /// Build a [`Value::List`] from anything convertible into values.
    pub fn list<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Zero value of a scalar type. Message types have no default instance.
    pub fn default_for(field_type: &FieldType) -> Option<Self> {
        Some(match field_type {
            FieldType::Int32 | FieldType::SInt32 | FieldType::SFixed32 => Value::I32(0),
            FieldType::Int64 | FieldType::SInt64 | FieldType::SFixed64 => Value::I64(0),
            FieldType::UInt32 | FieldType::Fixed32 => Value::U32(0),
            FieldType::UInt64 | FieldType::Fixed64 => Value::U64(0),
            FieldType::Float => Value::F32(0.0),
            FieldType::Double => Value::F64(0.0),
            FieldType::Bool => Value::Bool(false),
            FieldType::String => Value::String(String::new()),
            FieldType::Bytes => Value::Bytes(Vec::new()),
            FieldType::Enum(_) => Value::Enum(0),
            FieldType::Message(_) => return None,
        })
    }

    /// Whether this is the zero value, which the wire format does not distinguish from unset.
    ///
    /// Nested messages are never default: a set, empty message is still present.
    pub fn is_default(&self) -> bool {
        match self {
            Value::I32(v) | Value::Enum(v) => *v == 0,
            Value::I64(v) => *v == 0,
            Value::U32(v) => *v == 0,
            Value::U64(v) => *v == 0,
            // -0.0 is kept
            Value::F32(v) => v.to_bits() == 0,
            Value::F64(v) => v.to_bits() == 0,
            Value::Bool(v) => !v,
            Value::String(v) => v.is_empty(),
            Value::Bytes(v) => v.is_empty(),
            Value::List(v) => v.is_empty(),
            Value::Message(_) => false,
        }
    }

    /// Whether a single (non-list) value fits `field_type`.
    pub fn matches(&self, field_type: &FieldType) -> bool {
        match (self, field_type) {
            (Value::I32(_), FieldType::Int32 | FieldType::SInt32 | FieldType::SFixed32)
            | (Value::I64(_), FieldType::Int64 | FieldType::SInt64 | FieldType::SFixed64)
            | (Value::U32(_), FieldType::UInt32 | FieldType::Fixed32)
            | (Value::U64(_), FieldType::UInt64 | FieldType::Fixed64)
            | (Value::F32(_), FieldType::Float)
            | (Value::F64(_), FieldType::Double)
            | (Value::Bool(_), FieldType::Bool)
            | (Value::String(_), FieldType::String)
            | (Value::Bytes(_), FieldType::Bytes)
            | (Value::Enum(_), FieldType::Enum(_)) => true,
            (Value::Message(m), FieldType::Message(name)) => m.type_name() == name,
            _ => false,
        }
    }

    /// Variant name, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Enum(_) => "enum",
            Value::Message(_) => "message",
            Value::List(_) => "list",
        }
    }

    /// Integer view of any integral or enum value that fits in an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I32(v) | Value::Enum(v) => Some(*v as i64),
            Value::I64(v) => Some(*v),
            Value::U32(v) => Some(*v as i64),
            Value::U64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Integer view of any non-negative integral value.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::U32(v) => Some(*v as u64),
            Value::U64(v) => Some(*v),
            other => other.as_i64().and_then(|v| u64::try_from(v).ok()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F32(v) => Some(*v as f64),
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Value::Message(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    i32 => I32,
    i64 => I64,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    bool => Bool,
    String => String,
    Vec<u8> => Bytes,
    Message => Message,
    Vec<Value> => List,
}

/// Floats compare by bit pattern, so `NaN` equals itself and `-0.0` differs from `0.0`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::I32(a), Value::I32(b)) | (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Message(a), Value::Message(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_equality_is_bitwise() {
        assert_eq!(Value::F64(f64::NAN), Value::F64(f64::NAN));
        assert_eq!(Value::F32(f32::NAN), Value::F32(f32::NAN));
        assert_ne!(Value::F64(-0.0), Value::F64(0.0));
        assert_eq!(
            Value::list([f64::NAN, 1.5]),
            Value::list([f64::NAN, 1.5])
        );
        assert_ne!(Value::I32(1), Value::Enum(1));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Value::default_for(&FieldType::Int32), Some(Value::I32(0)));
        assert_eq!(
            Value::default_for(&FieldType::Enum("Day".into())),
            Some(Value::Enum(0))
        );
        assert_eq!(Value::default_for(&FieldType::Message("M".into())), None);
        assert!(Value::default_for(&FieldType::String).unwrap().is_default());
        assert!(!Value::F64(-0.0).is_default());
        assert!(!Value::from("x").is_default());
        assert!(Value::list(Vec::<i32>::new()).is_default());
    }

    #[test]
    fn test_matches() {
        assert!(Value::I32(1).matches(&FieldType::SInt32));
        assert!(!Value::I32(1).matches(&FieldType::Int64));
        assert!(Value::U64(1).matches(&FieldType::Fixed64));
        assert!(Value::Enum(3).matches(&FieldType::Enum("Day".into())));
        assert!(!Value::I32(3).matches(&FieldType::Enum("Day".into())));
        assert!(!Value::list([1]).matches(&FieldType::Int32));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::U64(u64::MAX).as_i64(), None);
        assert_eq!(Value::I32(-1).as_u64(), None);
        assert_eq!(Value::U32(7).as_i64(), Some(7));
        assert_eq!(Value::Enum(2).as_i64(), Some(2));
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
        assert_eq!(Value::F32(1.5).as_f64(), Some(1.5));
        assert_eq!(
            Value::list([1, 4]).as_list(),
            Some(&[Value::I32(1), Value::I32(4)][..])
        );
    }
}
