//! JSON text bridge.
//!
//! Messages become JSON objects keyed by field name, in ascending field number order. Only
//! set fields are written unless [`JsonOptions::emit_defaults`] is on.

use std::sync::Arc;

use base64::prelude::*;
use serde_json::{Map, Number, Value as JsonValue};
use tracing::debug;

use crate::descriptor::{FieldDescriptor, FieldType, MessageDescriptor};
use crate::error::{DecodeError, Error, Result};
use crate::message::Message;
use crate::registry::Registry;
use crate::value::Value;

/// Largest integer a JSON number (an IEEE double) holds exactly.
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// How `bytes` fields are written to JSON. Every variant reads back losslessly.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonBytes {
    #[default]
    /// Standard base64 with padding.
    Base64,

    /// JSON array of numbers.
    ByteArray,

    #[cfg(feature = "stfu8")]
    /// [stfu8](https://crates.io/crates/stfu8) encoded string.
    Stfu8,
}

/// JSON bridge settings.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct JsonOptions {
    /// How to write bytes fields.
    pub bytes_encoding: JsonBytes,

    /// Key objects by lowerCamelCase JSON name instead of the declared field name. Parsing
    /// accepts both either way.
    pub use_json_names: bool,

    /// Also write unset scalar and repeated fields, with their defaults.
    pub emit_defaults: bool,

    /// Skip object keys that match no field instead of failing.
    pub ignore_unknown_fields: bool,

    /// Indent output.
    pub pretty: bool,
}

/// Converts messages to and from JSON.
#[derive(Debug, Clone)]
pub struct JsonCodec {
    registry: Arc<Registry>,
    options: JsonOptions,
}

impl JsonCodec {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self::with_options(registry, JsonOptions::default())
    }

    pub fn with_options(registry: Arc<Registry>, options: JsonOptions) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> &JsonOptions {
        &self.options
    }

    /// Render `msg` as JSON text.
    pub fn to_text(&self, msg: &Message) -> String {
        let json = self.to_json(msg);
        if self.options.pretty {
            format!("{json:#}")
        } else {
            json.to_string()
        }
    }

    /// Render `msg` as a JSON value.
    pub fn to_json(&self, msg: &Message) -> JsonValue {
        if !msg.unknown_fields().is_empty() {
            debug!(
                message = msg.type_name(),
                unknown_fields = msg.unknown_fields().len(),
                "unknown fields are not written to JSON"
            );
        }
        JsonValue::Object(self.message_to_map(msg))
    }

    fn message_to_map(&self, msg: &Message) -> Map<String, JsonValue> {
        let mut map = Map::new();
        for field in msg.descriptor().fields() {
            let value = if msg.has(field.number()) || self.options.emit_defaults {
                msg.get(field.number())
            } else {
                None
            };
            let Some(value) = value else {
                continue;
            };
            let key = if self.options.use_json_names {
                field.json_name()
            } else {
                field.name()
            };
            map.insert(key.to_string(), self.value_to_json(field, &value));
        }
        map
    }

    fn value_to_json(&self, field: &FieldDescriptor, value: &Value) -> JsonValue {
        match value {
            Value::I32(v) => JsonValue::from(*v),
            Value::U32(v) => JsonValue::from(*v),
            Value::I64(v) if v.unsigned_abs() > MAX_SAFE_INTEGER => JsonValue::String(v.to_string()),
            Value::I64(v) => JsonValue::from(*v),
            Value::U64(v) if *v > MAX_SAFE_INTEGER => JsonValue::String(v.to_string()),
            Value::U64(v) => JsonValue::from(*v),
            Value::F32(v) => float_to_json(*v as f64),
            Value::F64(v) => float_to_json(*v),
            Value::Bool(v) => JsonValue::Bool(*v),
            Value::String(v) => JsonValue::String(v.clone()),
            Value::Bytes(v) => match self.options.bytes_encoding {
                JsonBytes::Base64 => JsonValue::String(BASE64_STANDARD.encode(v)),
                JsonBytes::ByteArray => JsonValue::from(v.clone()),
                #[cfg(feature = "stfu8")]
                JsonBytes::Stfu8 => JsonValue::String(stfu8::encode_u8(v)),
            },
            Value::Enum(v) => {
                let symbol = match field.field_type() {
                    FieldType::Enum(name) => self
                        .registry
                        .describe_enum(name)
                        .and_then(|e| e.name_of(*v)),
                    _ => None,
                };
                match symbol {
                    Some(symbol) => JsonValue::String(symbol.to_string()),
                    None => JsonValue::from(*v),
                }
            }
            Value::Message(m) => JsonValue::Object(self.message_to_map(m)),
            Value::List(items) => JsonValue::Array(
                items
                    .iter()
                    .map(|item| self.value_to_json(field, item))
                    .collect(),
            ),
        }
    }

    /// Parse JSON text as a message of type `descriptor`.
    pub fn from_text(
        &self,
        text: &str,
        descriptor: &Arc<MessageDescriptor>,
    ) -> Result<Message, DecodeError> {
        let json: JsonValue =
            serde_json::from_str(text).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;
        self.from_json(&json, descriptor)
    }

    /// Parse JSON text as a message of the registered type `type_name`.
    pub fn from_text_type(&self, text: &str, type_name: &str) -> Result<Message> {
        let descriptor = self
            .registry
            .describe(type_name)
            .ok_or_else(|| Error::UnknownType(type_name.to_string()))?;
        Ok(self.from_text(text, descriptor)?)
    }

    /// Build a message of type `descriptor` from a JSON value.
    pub fn from_json(
        &self,
        json: &JsonValue,
        descriptor: &Arc<MessageDescriptor>,
    ) -> Result<Message, DecodeError> {
        let JsonValue::Object(object) = json else {
            return Err(DecodeError::InvalidValue {
                field: descriptor.name().to_string(),
                reason: format!("expected an object, got {}", kind(json)),
            });
        };

        let mut msg = Message::new(Arc::clone(descriptor));
        for (key, json) in object {
            let Some(field) = descriptor.field_by_name(key) else {
                if self.options.ignore_unknown_fields {
                    continue;
                }
                return Err(DecodeError::UnknownFieldName {
                    message: descriptor.name().to_string(),
                    key: key.clone(),
                });
            };
            if json.is_null() {
                continue;
            }

            let value = if field.is_repeated() {
                let JsonValue::Array(items) = json else {
                    return Err(invalid(field, format!("expected an array, got {}", kind(json))));
                };
                Value::List(
                    items
                        .iter()
                        .map(|item| self.parse_single(field, item))
                        .collect::<Result<_, _>>()?,
                )
            } else {
                self.parse_single(field, json)?
            };
            msg.set(field.number(), value)
                .map_err(|e| invalid(field, e.to_string()))?;
        }
        Ok(msg)
    }

    fn parse_single(&self, field: &FieldDescriptor, json: &JsonValue) -> Result<Value, DecodeError> {
        Ok(match field.field_type() {
            FieldType::Int32 | FieldType::SInt32 | FieldType::SFixed32 => {
                Value::I32(parse_integer(field, json)?)
            }
            FieldType::Int64 | FieldType::SInt64 | FieldType::SFixed64 => {
                Value::I64(parse_integer(field, json)?)
            }
            FieldType::UInt32 | FieldType::Fixed32 => Value::U32(parse_integer(field, json)?),
            FieldType::UInt64 | FieldType::Fixed64 => Value::U64(parse_integer(field, json)?),
            FieldType::Float => {
                let v = parse_float(field, json)?;
                if v.is_finite() && v.abs() > f32::MAX as f64 {
                    return Err(invalid(field, format!("{v} is out of range for float")));
                }
                Value::F32(v as f32)
            }
            FieldType::Double => Value::F64(parse_float(field, json)?),
            FieldType::Bool => match json {
                JsonValue::Bool(v) => Value::Bool(*v),
                other => return Err(invalid(field, format!("expected a bool, got {}", kind(other)))),
            },
            FieldType::String => match json {
                JsonValue::String(v) => Value::String(v.clone()),
                other => {
                    return Err(invalid(field, format!("expected a string, got {}", kind(other))));
                }
            },
            FieldType::Bytes => Value::Bytes(self.parse_bytes(field, json)?),
            FieldType::Enum(enum_name) => match json {
                JsonValue::String(symbol) => {
                    let number = self
                        .registry
                        .describe_enum(enum_name)
                        .and_then(|e| e.number_of(symbol))
                        .ok_or_else(|| DecodeError::UnknownEnumSymbol {
                            field: field.name().to_string(),
                            enum_name: enum_name.clone(),
                            symbol: symbol.clone(),
                        })?;
                    Value::Enum(number)
                }
                JsonValue::Number(_) => Value::Enum(parse_integer(field, json)?),
                other => {
                    return Err(invalid(
                        field,
                        format!("expected an enum symbol, got {}", kind(other)),
                    ));
                }
            },
            FieldType::Message(type_name) => {
                let descriptor = self.registry.describe(type_name).ok_or_else(|| {
                    DecodeError::UnresolvedType {
                        field: field.name().to_string(),
                        type_name: type_name.clone(),
                    }
                })?;
                Value::Message(self.from_json(json, descriptor)?)
            }
        })
    }

    fn parse_bytes(&self, field: &FieldDescriptor, json: &JsonValue) -> Result<Vec<u8>, DecodeError> {
        match json {
            JsonValue::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_u64()
                        .and_then(|b| u8::try_from(b).ok())
                        .ok_or_else(|| invalid(field, "byte array holds a non-byte value".into()))
                })
                .collect(),
            JsonValue::String(s) => match self.options.bytes_encoding {
                #[cfg(feature = "stfu8")]
                JsonBytes::Stfu8 => {
                    stfu8::decode_u8(s).map_err(|e| invalid(field, format!("invalid stfu8: {e:?}")))
                }
                _ => decode_base64(s).ok_or_else(|| invalid(field, "invalid base64".into())),
            },
            other => Err(invalid(field, format!("expected bytes, got {}", kind(other)))),
        }
    }
}

fn invalid(field: &FieldDescriptor, reason: String) -> DecodeError {
    DecodeError::InvalidValue {
        field: field.name().to_string(),
        reason,
    }
}

fn kind(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a bool",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

fn float_to_json(v: f64) -> JsonValue {
    match Number::from_f64(v) {
        Some(n) => JsonValue::Number(n),
        None if v.is_nan() => JsonValue::String("NaN".into()),
        None if v > 0.0 => JsonValue::String("Infinity".into()),
        None => JsonValue::String("-Infinity".into()),
    }
}

fn parse_float(field: &FieldDescriptor, json: &JsonValue) -> Result<f64, DecodeError> {
    let parsed = match json {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => match s.as_str() {
            "NaN" => Some(f64::NAN),
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            other => other.parse().ok(),
        },
        _ => None,
    };
    parsed.ok_or_else(|| invalid(field, format!("expected a number, got {}", kind(json))))
}

/// Integers arrive as numbers or, for 64-bit values, as decimal strings.
fn parse_integer<T>(field: &FieldDescriptor, json: &JsonValue) -> Result<T, DecodeError>
where
    T: TryFrom<i64> + TryFrom<u64> + std::str::FromStr,
{
    let parsed = match json {
        JsonValue::Number(n) => {
            if let Some(v) = n.as_i64() {
                <T as TryFrom<i64>>::try_from(v).ok()
            } else if let Some(v) = n.as_u64() {
                <T as TryFrom<u64>>::try_from(v).ok()
            } else {
                // 1.0 and 1e3 are integers too
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER as f64)
                    .and_then(|f| <T as TryFrom<i64>>::try_from(f as i64).ok())
            }
        }
        JsonValue::String(s) => s.parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        invalid(
            field,
            format!("{json} is not a valid {}", field.field_type().type_name()),
        )
    })
}

fn decode_base64(s: &str) -> Option<Vec<u8>> {
    [
        &BASE64_STANDARD,
        &BASE64_STANDARD_NO_PAD,
        &BASE64_URL_SAFE,
        &BASE64_URL_SAFE_NO_PAD,
    ]
    .into_iter()
    .find_map(|engine| engine.decode(s).ok())
}
