//! Schema-driven wire codec.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::descriptor::{FieldDescriptor, FieldType, MessageDescriptor};
use crate::error::{DecodeError, Error, Result};
use crate::message::{Message, UnknownField};
use crate::registry::Registry;
use crate::value::Value;
use crate::varint::{encode_var, zigzag_decode, zigzag_encode};
use crate::wire::{Reader, WireType, put_fixed32, put_fixed64, put_length_delimited, put_tag};

/// Default nesting depth accepted by the decoder.
pub const DEFAULT_RECURSION_LIMIT: usize = 100;

/// Codec settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    /// Write repeated numeric, bool and enum fields as one packed run. The decoder accepts
    /// both forms either way.
    pub packed: bool,

    /// Deepest message nesting the decoder follows before giving up.
    pub recursion_limit: usize,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            packed: true,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }
}

/// Encodes messages to the binary wire format and decodes them back.
///
/// Output is deterministic: fields are written in ascending number order, with unknown fields
/// kept from an earlier decode slotted in by number.
#[derive(Debug, Clone)]
pub struct Codec {
    registry: Arc<Registry>,
    options: CodecOptions,
}

impl Codec {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self::with_options(registry, CodecOptions::default())
    }

    pub fn with_options(registry: Arc<Registry>, options: CodecOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Encode `msg` into a new buffer.
    pub fn encode(&self, msg: &Message) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode_to(msg, &mut buf);
        debug!(message = msg.type_name(), bytes = buf.len(), "encoded message");
        buf
    }

    /// Append the encoding of `msg` to `buf`.
    pub fn encode_to(&self, msg: &Message, buf: &mut Vec<u8>) {
        let mut unknown = msg.unknown_fields().iter().peekable();

        for (field, value) in msg.fields() {
            while let Some(u) = unknown.next_if(|u| u.number < field.number()) {
                buf.extend_from_slice(&u.bytes);
            }
            self.encode_field(field, value, buf);
        }
        for u in unknown {
            buf.extend_from_slice(&u.bytes);
        }
    }

    fn encode_field(&self, field: &FieldDescriptor, value: &Value, buf: &mut Vec<u8>) {
        let Value::List(items) = value else {
            put_tag(buf, field.number(), field.wire_type());
            self.encode_value(field.field_type(), value, buf);
            return;
        };

        if self.options.packed && field.field_type().is_packable() {
            let mut payload = Vec::new();
            for item in items {
                self.encode_value(field.field_type(), item, &mut payload);
            }
            put_tag(buf, field.number(), WireType::LengthDelimited);
            put_length_delimited(buf, &payload);
        } else {
            for item in items {
                put_tag(buf, field.number(), field.wire_type());
                self.encode_value(field.field_type(), item, buf);
            }
        }
    }

    /// Write one value without its tag.
    fn encode_value(&self, field_type: &FieldType, value: &Value, buf: &mut Vec<u8>) {
        match value {
            Value::I32(v) => match field_type {
                FieldType::SInt32 => encode_var(zigzag_encode(*v as i64), buf),
                FieldType::SFixed32 => put_fixed32(buf, *v as u32),
                // int32 is sign-extended to ten bytes when negative
                _ => encode_var(*v as i64 as u64, buf),
            },
            Value::I64(v) => match field_type {
                FieldType::SInt64 => encode_var(zigzag_encode(*v), buf),
                FieldType::SFixed64 => put_fixed64(buf, *v as u64),
                _ => encode_var(*v as u64, buf),
            },
            Value::U32(v) => match field_type {
                FieldType::Fixed32 => put_fixed32(buf, *v),
                _ => encode_var(*v as u64, buf),
            },
            Value::U64(v) => match field_type {
                FieldType::Fixed64 => put_fixed64(buf, *v),
                _ => encode_var(*v, buf),
            },
            Value::F32(v) => put_fixed32(buf, v.to_bits()),
            Value::F64(v) => put_fixed64(buf, v.to_bits()),
            Value::Bool(v) => encode_var(*v as u64, buf),
            Value::Enum(v) => encode_var(*v as i64 as u64, buf),
            Value::String(v) => put_length_delimited(buf, v.as_bytes()),
            Value::Bytes(v) => put_length_delimited(buf, v),
            Value::Message(m) => {
                let mut nested = Vec::new();
                self.encode_to(m, &mut nested);
                put_length_delimited(buf, &nested);
            }
            // nested lists cannot be stored in a message
            Value::List(_) => {}
        }
    }

    /// Decode `data` as a message of type `descriptor`.
    ///
    /// Unknown field numbers are skipped and kept on the message. Any structural error fails
    /// the whole decode.
    pub fn decode(
        &self,
        data: &[u8],
        descriptor: &Arc<MessageDescriptor>,
    ) -> Result<Message, DecodeError> {
        let msg = self.decode_message(Reader::new(data), descriptor, 0)?;
        debug!(
            message = descriptor.name(),
            bytes = data.len(),
            unknown_fields = msg.unknown_fields().len(),
            "decoded message"
        );
        Ok(msg)
    }

    /// Decode `data` as a message of the registered type `type_name`.
    pub fn decode_type(&self, data: &[u8], type_name: &str) -> Result<Message> {
        let descriptor = self
            .registry
            .describe(type_name)
            .ok_or_else(|| Error::UnknownType(type_name.to_string()))?;
        Ok(self.decode(data, descriptor)?)
    }

    /// Decode `data` and merge it into `msg`.
    ///
    /// On error `msg` is left exactly as it was.
    pub fn merge_from(&self, msg: &mut Message, data: &[u8]) -> Result<(), DecodeError> {
        let decoded = self.decode(data, &Arc::clone(msg.descriptor()))?;
        msg.merge_unchecked(&decoded);
        Ok(())
    }

    fn decode_message(
        &self,
        mut reader: Reader<'_>,
        descriptor: &Arc<MessageDescriptor>,
        depth: usize,
    ) -> Result<Message, DecodeError> {
        if depth > self.options.recursion_limit {
            return Err(DecodeError::RecursionLimit {
                limit: self.options.recursion_limit,
            });
        }

        let mut msg = Message::new(Arc::clone(descriptor));
        while !reader.is_empty() {
            let start = reader.remaining();
            let tag_offset = reader.offset();
            let (number, wire_type) = reader.read_tag()?;

            let Some(field) = descriptor.lookup(number) else {
                reader.skip_value(wire_type)?;
                let len = reader.offset() - tag_offset;
                trace!(
                    message = descriptor.name(),
                    number,
                    offset = tag_offset,
                    "kept unknown field"
                );
                msg.push_unknown(UnknownField {
                    number,
                    wire_type,
                    bytes: start[..len].to_vec(),
                });
                continue;
            };

            self.decode_field(&mut reader, &mut msg, field, wire_type, tag_offset, depth)?;
        }
        Ok(msg)
    }

    fn decode_field(
        &self,
        reader: &mut Reader<'_>,
        msg: &mut Message,
        field: &FieldDescriptor,
        wire_type: WireType,
        tag_offset: usize,
        depth: usize,
    ) -> Result<(), DecodeError> {
        let field_type = field.field_type();

        if field.is_repeated() && field_type.is_packable() && wire_type == WireType::LengthDelimited
        {
            let (payload, base) = reader.read_length_delimited()?;
            let mut packed = Reader::nested(payload, base);
            let mut items = Vec::new();
            while !packed.is_empty() {
                items.push(self.decode_value(&mut packed, field, depth)?);
            }
            append(msg, field.number(), items);
            return Ok(());
        }

        if wire_type != field.wire_type() {
            return Err(DecodeError::WireTypeMismatch {
                field: field.name().to_string(),
                offset: tag_offset,
                expected: field.wire_type(),
                found: wire_type,
            });
        }

        let value = self.decode_value(reader, field, depth)?;
        if field.is_repeated() {
            append(msg, field.number(), vec![value]);
            return Ok(());
        }

        // a message field seen twice merges, anything else is last one wins
        if let Value::Message(next) = &value {
            if let Some(Value::Message(existing)) = msg.raw_mut(field.number()) {
                existing.merge_unchecked(next);
                return Ok(());
            }
        }
        if value.is_default() {
            msg.clear(field.number());
        } else {
            msg.insert_raw(field.number(), value);
        }
        Ok(())
    }

    /// Read one value of the field's type; the tag has already been consumed.
    fn decode_value(
        &self,
        reader: &mut Reader<'_>,
        field: &FieldDescriptor,
        depth: usize,
    ) -> Result<Value, DecodeError> {
        Ok(match field.field_type() {
            FieldType::Int32 => Value::I32(reader.read_varint()? as i32),
            FieldType::Int64 => Value::I64(reader.read_varint()? as i64),
            FieldType::UInt32 => Value::U32(reader.read_varint()? as u32),
            FieldType::UInt64 => Value::U64(reader.read_varint()?),
            FieldType::SInt32 => Value::I32(zigzag_decode(reader.read_varint()?) as i32),
            FieldType::SInt64 => Value::I64(zigzag_decode(reader.read_varint()?)),
            FieldType::Bool => Value::Bool(reader.read_varint()? != 0),
            FieldType::Enum(_) => Value::Enum(reader.read_varint()? as i32),
            FieldType::Fixed32 => Value::U32(reader.read_fixed32()?),
            FieldType::SFixed32 => Value::I32(reader.read_fixed32()? as i32),
            FieldType::Float => Value::F32(f32::from_bits(reader.read_fixed32()?)),
            FieldType::Fixed64 => Value::U64(reader.read_fixed64()?),
            FieldType::SFixed64 => Value::I64(reader.read_fixed64()? as i64),
            FieldType::Double => Value::F64(f64::from_bits(reader.read_fixed64()?)),
            FieldType::String => {
                let (bytes, offset) = reader.read_length_delimited()?;
                let s = simdutf8::basic::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 {
                    field: field.name().to_string(),
                    offset,
                })?;
                Value::String(s.to_string())
            }
            FieldType::Bytes => Value::Bytes(reader.read_length_delimited()?.0.to_vec()),
            FieldType::Message(type_name) => {
                let (payload, base) = reader.read_length_delimited()?;
                let descriptor = self.registry.describe(type_name).ok_or_else(|| {
                    DecodeError::UnresolvedType {
                        field: field.name().to_string(),
                        type_name: type_name.clone(),
                    }
                })?;
                Value::Message(self.decode_message(
                    Reader::nested(payload, base),
                    descriptor,
                    depth + 1,
                )?)
            }
        })
    }
}

fn append(msg: &mut Message, number: u32, items: Vec<Value>) {
    match msg.raw_mut(number) {
        Some(Value::List(existing)) => existing.extend(items),
        _ if items.is_empty() => {}
        _ => msg.insert_raw(number, Value::List(items)),
    }
}
