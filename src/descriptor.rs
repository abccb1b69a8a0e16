//! Static schema metadata: field, message and enum descriptors.

use std::collections::HashMap;
use std::fmt;

use crate::wire::WireType;

/// Logical type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Int32,
    Int64,
    UInt32,
    UInt64,
    /// ZigZag-encoded `i32`.
    SInt32,
    /// ZigZag-encoded `i64`.
    SInt64,
    Fixed32,
    Fixed64,
    SFixed32,
    SFixed64,
    Float,
    Double,
    Bool,
    String,
    Bytes,
    /// Enum, by registered enum type name.
    Enum(String),
    /// Nested message, by registered message type name.
    Message(String),
}

impl FieldType {
    /// Wire type a single value of this type is encoded with.
    pub fn wire_type(&self) -> WireType {
        match self {
            FieldType::Int32
            | FieldType::Int64
            | FieldType::UInt32
            | FieldType::UInt64
            | FieldType::SInt32
            | FieldType::SInt64
            | FieldType::Bool
            | FieldType::Enum(_) => WireType::Varint,
            FieldType::Fixed64 | FieldType::SFixed64 | FieldType::Double => WireType::Fixed64,
            FieldType::Fixed32 | FieldType::SFixed32 | FieldType::Float => WireType::Fixed32,
            FieldType::String | FieldType::Bytes | FieldType::Message(_) => {
                WireType::LengthDelimited
            }
        }
    }

    /// Whether repeated values of this type may share one length-delimited run.
    pub fn is_packable(&self) -> bool {
        self.wire_type() != WireType::LengthDelimited
    }

    /// Name as written in a schema source.
    pub fn type_name(&self) -> &str {
        match self {
            FieldType::Int32 => "int32",
            FieldType::Int64 => "int64",
            FieldType::UInt32 => "uint32",
            FieldType::UInt64 => "uint64",
            FieldType::SInt32 => "sint32",
            FieldType::SInt64 => "sint64",
            FieldType::Fixed32 => "fixed32",
            FieldType::Fixed64 => "fixed64",
            FieldType::SFixed32 => "sfixed32",
            FieldType::SFixed64 => "sfixed64",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::Bool => "bool",
            FieldType::String => "string",
            FieldType::Bytes => "bytes",
            FieldType::Enum(name) | FieldType::Message(name) => name,
        }
    }
}

/// Singular or repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cardinality {
    #[default]
    Singular,
    Repeated,
}

/// One field of a message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    number: u32,
    name: String,
    json_name: String,
    field_type: FieldType,
    cardinality: Cardinality,
}

impl FieldDescriptor {
    /// Singular field.
    pub fn new(number: u32, name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            number,
            json_name: to_lower_camel(&name),
            name,
            field_type,
            cardinality: Cardinality::Singular,
        }
    }

    /// Repeated field.
    pub fn repeated(number: u32, name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            cardinality: Cardinality::Repeated,
            ..Self::new(number, name, field_type)
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Declared name, e.g. `sample_list`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// lowerCamelCase name, e.g. `sampleList`.
    pub fn json_name(&self) -> &str {
        &self.json_name
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn is_repeated(&self) -> bool {
        self.cardinality == Cardinality::Repeated
    }

    pub fn wire_type(&self) -> WireType {
        self.field_type.wire_type()
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_repeated() {
            f.write_str("repeated ")?;
        }
        write!(
            f,
            "{} {} = {}",
            self.field_type.type_name(),
            self.name,
            self.number
        )
    }
}

/// Schema of one message type. Owns no data; shared by every instance of the type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDescriptor {
    name: String,
    /// Sorted by field number.
    fields: Vec<FieldDescriptor>,
    by_name: HashMap<String, usize>,
}

impl MessageDescriptor {
    /// Build a descriptor. Fields are reordered by number; validation happens when the
    /// descriptor is added to a [`RegistryBuilder`](crate::RegistryBuilder).
    pub fn new(name: impl Into<String>, mut fields: Vec<FieldDescriptor>) -> Self {
        fields.sort_by_key(|f| f.number);
        let mut by_name = HashMap::with_capacity(fields.len() * 2);
        for (i, field) in fields.iter().enumerate() {
            by_name.entry(field.name.clone()).or_insert(i);
            by_name.entry(field.json_name.clone()).or_insert(i);
        }
        Self {
            name: name.into(),
            fields,
            by_name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in ascending number order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Field with the given number.
    pub fn lookup(&self, number: u32) -> Option<&FieldDescriptor> {
        self.fields
            .binary_search_by_key(&number, |f| f.number)
            .ok()
            .map(|i| &self.fields[i])
    }

    /// Field with the given declared or JSON name.
    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }
}

/// One symbolic value of an enum type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValueDescriptor {
    pub name: String,
    pub number: i32,
}

/// Schema of one enum type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    name: String,
    values: Vec<EnumValueDescriptor>,
}

impl EnumDescriptor {
    /// Values keep their declaration order; the first one is the default.
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = (S, i32)>,
    ) -> Self {
        Self {
            name: name.into(),
            values: values
                .into_iter()
                .map(|(name, number)| EnumValueDescriptor {
                    name: name.into(),
                    number,
                })
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[EnumValueDescriptor] {
        &self.values
    }

    /// Symbol for `number`. Aliases resolve to the first declared symbol.
    pub fn name_of(&self, number: i32) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.number == number)
            .map(|v| v.name.as_str())
    }

    pub fn number_of(&self, symbol: &str) -> Option<i32> {
        self.values
            .iter()
            .find(|v| v.name == symbol)
            .map(|v| v.number)
    }
}

/// `phone_number` -> `phoneNumber`
fn to_lower_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_name() {
        assert_eq!(to_lower_camel("sample_list"), "sampleList");
        assert_eq!(to_lower_camel("is_simple"), "isSimple");
        assert_eq!(to_lower_camel("id"), "id");
        assert_eq!(to_lower_camel("one_dummy_"), "oneDummy");
    }

    #[test]
    fn test_lookup() {
        let desc = MessageDescriptor::new(
            "Thing",
            vec![
                FieldDescriptor::new(3, "name", FieldType::String),
                FieldDescriptor::repeated(4, "sample_list", FieldType::Int32),
                FieldDescriptor::new(1, "id", FieldType::Int32),
            ],
        );

        let numbers: Vec<u32> = desc.fields().iter().map(|f| f.number()).collect();
        assert_eq!(numbers, [1, 3, 4]);
        assert_eq!(desc.lookup(3).unwrap().name(), "name");
        assert!(desc.lookup(2).is_none());
        assert_eq!(desc.field_by_name("sampleList").unwrap().number(), 4);
        assert_eq!(desc.field_by_name("sample_list").unwrap().number(), 4);
        assert!(desc.field_by_name("missing").is_none());
    }

    #[test]
    fn test_field_display() {
        let field = FieldDescriptor::repeated(4, "sample_list", FieldType::Int32);
        assert_eq!(field.to_string(), "repeated int32 sample_list = 4");
    }

    #[test]
    fn test_enum_lookup() {
        let day = EnumDescriptor::new("Day", [("MONDAY", 0), ("TUESDAY", 1)]);
        assert_eq!(day.name_of(1), Some("TUESDAY"));
        assert_eq!(day.name_of(9), None);
        assert_eq!(day.number_of("MONDAY"), Some(0));
        assert_eq!(day.number_of("FUNDAY"), None);
    }

    #[test]
    fn test_packable() {
        assert!(FieldType::Int32.is_packable());
        assert!(FieldType::Enum("E".into()).is_packable());
        assert!(FieldType::Double.is_packable());
        assert!(!FieldType::String.is_packable());
        assert!(!FieldType::Message("M".into()).is_packable());
    }
}
