//! In-memory message instances.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::descriptor::{FieldDescriptor, FieldType, MessageDescriptor};
use crate::error::FieldError;
use crate::registry::Registry;
use crate::value::Value;
use crate::wire::WireType;

/// A field the descriptor does not know, kept verbatim so re-encoding is lossless.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnknownField {
    /// Field number.
    pub number: u32,

    /// Wire type from the tag.
    pub wire_type: WireType,

    /// Tag and value bytes exactly as they were read.
    pub bytes: Vec<u8>,
}

/// One message instance.
///
/// Values are addressed by field number and checked against the message's descriptor when
/// set. Unset fields read as their zero value, and storing a zero value clears the field, so
/// two messages are equal whenever they would encode to the same bytes.
#[derive(Debug, Clone)]
pub struct Message {
    descriptor: Arc<MessageDescriptor>,
    fields: BTreeMap<u32, Value>,
    unknown: Vec<UnknownField>,
}

/// Symbolic view of an enum field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumSymbol<'r> {
    /// Number registered for the enum type.
    Known(&'r str),
    /// Number the registry does not know, e.g. one written by a newer schema.
    Unknown(i32),
}

impl fmt::Display for EnumSymbol<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumSymbol::Known(name) => f.write_str(name),
            EnumSymbol::Unknown(number) => write!(f, "{number}"),
        }
    }
}

impl Message {
    pub fn new(descriptor: Arc<MessageDescriptor>) -> Self {
        Self {
            descriptor,
            fields: BTreeMap::new(),
            unknown: Vec::new(),
        }
    }

    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    pub fn type_name(&self) -> &str {
        self.descriptor.name()
    }

    /// True when no field is set and no unknown field was kept.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.unknown.is_empty()
    }

    fn field(&self, number: u32) -> Result<&FieldDescriptor, FieldError> {
        self.descriptor
            .lookup(number)
            .ok_or_else(|| FieldError::UnknownNumber {
                message: self.type_name().to_string(),
                number,
            })
    }

    fn field_number(&self, name: &str) -> Result<u32, FieldError> {
        self.descriptor
            .field_by_name(name)
            .map(FieldDescriptor::number)
            .ok_or_else(|| FieldError::UnknownName {
                message: self.type_name().to_string(),
                name: name.to_string(),
            })
    }

    /// Value of field `number`, or its default when unset.
    ///
    /// Returns `None` when the type has no such field, and for an unset singular message
    /// field, which has no default instance.
    pub fn get(&self, number: u32) -> Option<Cow<'_, Value>> {
        if let Some(value) = self.fields.get(&number) {
            return Some(Cow::Borrowed(value));
        }
        let field = self.descriptor.lookup(number)?;
        if field.is_repeated() {
            Some(Cow::Owned(Value::List(Vec::new())))
        } else {
            Value::default_for(field.field_type()).map(Cow::Owned)
        }
    }

    pub fn get_by_name(&self, name: &str) -> Option<Cow<'_, Value>> {
        self.get(self.descriptor.field_by_name(name)?.number())
    }

    /// Whether field `number` holds a non-default value.
    pub fn has(&self, number: u32) -> bool {
        self.fields.contains_key(&number)
    }

    /// Nested message in singular field `number`, if set.
    pub fn get_message(&self, number: u32) -> Option<&Message> {
        self.fields.get(&number).and_then(Value::as_message)
    }

    /// Mutable nested message in singular field `number`, if set.
    pub fn get_message_mut(&mut self, number: u32) -> Option<&mut Message> {
        match self.fields.get_mut(&number) {
            Some(Value::Message(m)) => Some(m),
            _ => None,
        }
    }

    /// Elements of repeated field `number`; empty when unset.
    pub fn get_list(&self, number: u32) -> &[Value] {
        self.fields
            .get(&number)
            .and_then(Value::as_list)
            .unwrap_or(&[])
    }

    /// Raw number of enum field `number`.
    pub fn enum_value(&self, number: u32) -> Option<i32> {
        match self.field(number).ok()?.field_type() {
            FieldType::Enum(_) => match self.fields.get(&number) {
                Some(Value::Enum(v)) => Some(*v),
                _ => Some(0),
            },
            _ => None,
        }
    }

    /// Symbolic name of enum field `number`, resolved through `registry`.
    ///
    /// A number the registry does not know is reported as [`EnumSymbol::Unknown`]; the raw
    /// value stays in the message and is written back on encode.
    pub fn enum_symbol<'r>(&self, registry: &'r Registry, number: u32) -> Option<EnumSymbol<'r>> {
        let FieldType::Enum(enum_name) = self.field(number).ok()?.field_type() else {
            return None;
        };
        let raw = self.enum_value(number)?;
        let symbol = registry
            .describe_enum(enum_name)
            .and_then(|e| e.name_of(raw))
            .map_or(EnumSymbol::Unknown(raw), EnumSymbol::Known);
        Some(symbol)
    }

    /// Set field `number`, replacing any previous value.
    ///
    /// Repeated fields take a [`Value::List`]. Setting a zero value clears the field.
    pub fn set(&mut self, number: u32, value: impl Into<Value>) -> Result<(), FieldError> {
        let value = value.into();
        let field = self.field(number)?;
        check_value(field, &value)?;

        if value.is_default() {
            self.fields.remove(&number);
        } else {
            self.fields.insert(number, value);
        }
        Ok(())
    }

    pub fn set_by_name(&mut self, name: &str, value: impl Into<Value>) -> Result<(), FieldError> {
        let number = self.field_number(name)?;
        self.set(number, value)
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, number: u32, value: impl Into<Value>) -> Result<Self, FieldError> {
        self.set(number, value)?;
        Ok(self)
    }

    /// Append one element to repeated field `number`.
    pub fn push(&mut self, number: u32, value: impl Into<Value>) -> Result<(), FieldError> {
        let value = value.into();
        let field = self.field(number)?;
        if !field.is_repeated() || !value.matches(field.field_type()) {
            return Err(mismatch(field, &value));
        }
        match self
            .fields
            .entry(number)
            .or_insert_with(|| Value::List(Vec::new()))
        {
            Value::List(items) => items.push(value),
            // only lists are ever stored under a repeated field
            other => *other = Value::List(vec![value]),
        }
        Ok(())
    }

    /// Reset field `number` to its default.
    pub fn clear(&mut self, number: u32) {
        self.fields.remove(&number);
    }

    /// Set fields in ascending number order, paired with their descriptors.
    pub fn fields(&self) -> impl Iterator<Item = (&FieldDescriptor, &Value)> {
        self.fields.iter().filter_map(|(number, value)| {
            self.descriptor.lookup(*number).map(|field| (field, value))
        })
    }

    /// Fields the descriptor did not know when this message was decoded, ordered by number.
    /// Fields sharing a number keep the order they were read in.
    pub fn unknown_fields(&self) -> &[UnknownField] {
        &self.unknown
    }

    pub(crate) fn push_unknown(&mut self, field: UnknownField) {
        let at = self.unknown.partition_point(|f| f.number <= field.number);
        self.unknown.insert(at, field);
    }

    /// Insert without type checks; the decoder has already matched the value to the field.
    pub(crate) fn insert_raw(&mut self, number: u32, value: Value) {
        self.fields.insert(number, value);
    }

    pub(crate) fn raw_mut(&mut self, number: u32) -> Option<&mut Value> {
        self.fields.get_mut(&number)
    }

    /// Merge `other` into `self`.
    ///
    /// Singular scalars set in `other` overwrite, repeated fields append in order, singular
    /// nested messages merge recursively, and unknown fields join the list in number order.
    pub fn merge(&mut self, other: &Message) -> Result<(), FieldError> {
        if self.type_name() != other.type_name() {
            return Err(FieldError::MergeMismatch {
                into: self.type_name().to_string(),
                from: other.type_name().to_string(),
            });
        }

        self.merge_unchecked(other);
        Ok(())
    }

    /// [`merge`](Self::merge) for two messages already known to share a type.
    pub(crate) fn merge_unchecked(&mut self, other: &Message) {
        for (number, value) in &other.fields {
            match (self.fields.get_mut(number), value) {
                (Some(Value::List(mine)), Value::List(theirs)) => {
                    mine.extend(theirs.iter().cloned());
                }
                (Some(Value::Message(mine)), Value::Message(theirs)) => mine.merge_unchecked(theirs),
                (Some(slot), _) => *slot = value.clone(),
                (None, _) => {
                    self.fields.insert(*number, value.clone());
                }
            }
        }
        for field in &other.unknown {
            self.push_unknown(field.clone());
        }
    }

    /// Display with enum numbers resolved to symbols.
    pub fn display<'a>(&'a self, registry: &'a Registry) -> impl fmt::Display + 'a {
        Compact {
            message: self,
            registry: Some(registry),
        }
    }
}

fn mismatch(field: &FieldDescriptor, value: &Value) -> FieldError {
    let expected = if field.is_repeated() {
        format!("list of {}", field.field_type().type_name())
    } else {
        field.field_type().type_name().to_string()
    };
    FieldError::TypeMismatch {
        field: field.name().to_string(),
        expected,
        found: value.kind(),
    }
}

fn check_value(field: &FieldDescriptor, value: &Value) -> Result<(), FieldError> {
    let ok = match value {
        Value::List(items) => {
            field.is_repeated() && items.iter().all(|v| v.matches(field.field_type()))
        }
        single => !field.is_repeated() && single.matches(field.field_type()),
    };
    if ok { Ok(()) } else { Err(mismatch(field, value)) }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.type_name() == other.type_name()
            && self.fields == other.fields
            && self.unknown == other.unknown
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Compact {
            message: self,
            registry: None,
        }
        .fmt(f)
    }
}

/// Single-line text form: `id:1 name:"x" tags:1 tags:2 inner:{id:2}`.
struct Compact<'a> {
    message: &'a Message,
    registry: Option<&'a Registry>,
}

impl Compact<'_> {
    fn write_value(
        &self,
        f: &mut fmt::Formatter<'_>,
        field: &FieldDescriptor,
        value: &Value,
    ) -> fmt::Result {
        match value {
            Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v:?}"),
            Value::Bytes(v) => write!(f, "{:?}", String::from_utf8_lossy(v)),
            Value::Enum(v) => {
                let symbol = match (self.registry, field.field_type()) {
                    (Some(registry), FieldType::Enum(name)) => registry
                        .describe_enum(name)
                        .and_then(|e| e.name_of(*v)),
                    _ => None,
                };
                match symbol {
                    Some(symbol) => f.write_str(symbol),
                    None => write!(f, "{v}"),
                }
            }
            Value::Message(m) => write!(
                f,
                "{{{}}}",
                Compact {
                    message: m,
                    registry: self.registry,
                }
            ),
            // lists are expanded by the caller
            Value::List(_) => Ok(()),
        }
    }
}

impl fmt::Display for Compact<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, value) in self.message.fields() {
            let items = match value {
                Value::List(items) => items.as_slice(),
                single => std::slice::from_ref(single),
            };
            for item in items {
                if !first {
                    f.write_str(" ")?;
                }
                first = false;
                write!(f, "{}:", field.name())?;
                self.write_value(f, field, item)?;
            }
        }
        Ok(())
    }
}
