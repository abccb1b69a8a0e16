//! Registry of message and enum types.
//!
//! A registry is assembled once with [`RegistryBuilder`], validated as a whole by
//! [`RegistryBuilder::build`], and is read-only afterwards. Share it with `Arc`; lookups take
//! no locks.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::descriptor::{EnumDescriptor, FieldType, MessageDescriptor};
use crate::error::SchemaError;
use crate::message::Message;
use crate::wire::{MAX_FIELD_NUMBER, RESERVED_FIELD_NUMBERS};

/// Immutable set of message and enum types.
#[derive(Debug, Default)]
pub struct Registry {
    messages: HashMap<String, Arc<MessageDescriptor>>,
    enums: HashMap<String, Arc<EnumDescriptor>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Descriptor of the message type `name`.
    pub fn describe(&self, name: &str) -> Option<&Arc<MessageDescriptor>> {
        self.messages.get(name)
    }

    /// Descriptor of the enum type `name`.
    pub fn describe_enum(&self, name: &str) -> Option<&Arc<EnumDescriptor>> {
        self.enums.get(name)
    }

    /// Empty instance of the message type `name`.
    pub fn new_message(&self, name: &str) -> Option<Message> {
        self.describe(name).cloned().map(Message::new)
    }

    pub fn message_names(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }
}

/// Collects descriptors and validates them into a [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    messages: Vec<MessageDescriptor>,
    enums: Vec<EnumDescriptor>,
}

impl RegistryBuilder {
    /// Add a message type, checking its own fields right away.
    pub fn message(mut self, descriptor: MessageDescriptor) -> Result<Self, SchemaError> {
        validate_fields(&descriptor)?;
        self.messages.push(descriptor);
        Ok(self)
    }

    /// Add an enum type.
    pub fn enumeration(mut self, descriptor: EnumDescriptor) -> Result<Self, SchemaError> {
        validate_enum(&descriptor)?;
        self.enums.push(descriptor);
        Ok(self)
    }

    /// Check cross-type references and freeze the registry.
    pub fn build(self) -> Result<Registry, SchemaError> {
        let mut registry = Registry::default();

        for descriptor in self.enums {
            let name = descriptor.name().to_string();
            if registry.enums.contains_key(&name) {
                return Err(SchemaError::DuplicateType(name));
            }
            registry.enums.insert(name, Arc::new(descriptor));
        }
        for descriptor in self.messages {
            let name = descriptor.name().to_string();
            if registry.messages.contains_key(&name) || registry.enums.contains_key(&name) {
                return Err(SchemaError::DuplicateType(name));
            }
            registry.messages.insert(name, Arc::new(descriptor));
        }

        for message in registry.messages.values() {
            for field in message.fields() {
                let resolved = match field.field_type() {
                    FieldType::Message(type_name) => registry.messages.contains_key(type_name),
                    FieldType::Enum(type_name) => registry.enums.contains_key(type_name),
                    _ => true,
                };
                if !resolved {
                    return Err(SchemaError::UnresolvedType {
                        message: message.name().to_string(),
                        field: field.name().to_string(),
                        type_name: field.field_type().type_name().to_string(),
                    });
                }
            }
        }

        debug!(
            messages = registry.messages.len(),
            enums = registry.enums.len(),
            "registry built"
        );
        Ok(registry)
    }
}

fn validate_fields(descriptor: &MessageDescriptor) -> Result<(), SchemaError> {
    let message = descriptor.name();
    // declared and JSON names share one namespace, mapped to the owning field
    let mut names: HashMap<&str, &str> = HashMap::new();

    for (i, field) in descriptor.fields().iter().enumerate() {
        let number = field.number();
        if number == 0 || number > MAX_FIELD_NUMBER {
            return Err(SchemaError::InvalidFieldNumber {
                message: message.to_string(),
                field: field.name().to_string(),
                number,
            });
        }
        if RESERVED_FIELD_NUMBERS.contains(&number) {
            return Err(SchemaError::ReservedFieldNumber {
                message: message.to_string(),
                field: field.name().to_string(),
                number,
            });
        }
        // fields are sorted, so a duplicate number sits right behind its twin
        if let Some(prev) = i.checked_sub(1).map(|p| &descriptor.fields()[p]) {
            if prev.number() == number {
                return Err(SchemaError::DuplicateFieldNumber {
                    message: message.to_string(),
                    number,
                    first: prev.name().to_string(),
                    second: field.name().to_string(),
                });
            }
        }
        let clash = |name: &str, first: &str| SchemaError::FieldNameClash {
            message: message.to_string(),
            name: name.to_string(),
            first: first.to_string(),
            second: field.name().to_string(),
        };
        if let Some(&first) = names.get(field.name()) {
            return Err(if first == field.name() {
                SchemaError::DuplicateFieldName {
                    message: message.to_string(),
                    field: field.name().to_string(),
                }
            } else {
                clash(field.name(), first)
            });
        }
        names.insert(field.name(), field.name());
        if field.json_name() != field.name() {
            if let Some(&first) = names.get(field.json_name()) {
                return Err(clash(field.json_name(), first));
            }
            names.insert(field.json_name(), field.name());
        }
    }
    Ok(())
}

fn validate_enum(descriptor: &EnumDescriptor) -> Result<(), SchemaError> {
    if descriptor.values().first().map(|v| v.number) != Some(0) {
        return Err(SchemaError::MissingZeroValue(descriptor.name().to_string()));
    }
    let mut symbols = HashSet::new();
    for value in descriptor.values() {
        if !symbols.insert(value.name.as_str()) {
            return Err(SchemaError::DuplicateEnumSymbol {
                enum_name: descriptor.name().to_string(),
                symbol: value.name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FieldDescriptor;

    fn dummy() -> MessageDescriptor {
        MessageDescriptor::new(
            "DummyMessage",
            vec![
                FieldDescriptor::new(1, "id", FieldType::Int32),
                FieldDescriptor::new(2, "name", FieldType::String),
            ],
        )
    }

    #[test]
    fn test_describe_and_lookup() {
        let registry = Registry::builder().message(dummy()).unwrap().build().unwrap();
        let desc = registry.describe("DummyMessage").unwrap();
        assert_eq!(desc.lookup(2).unwrap().name(), "name");
        assert!(desc.lookup(3).is_none());
        assert!(registry.describe("Missing").is_none());
    }

    #[test]
    fn test_duplicate_field_number() {
        let desc = MessageDescriptor::new(
            "Bad",
            vec![
                FieldDescriptor::new(1, "id", FieldType::Int32),
                FieldDescriptor::new(1, "other", FieldType::String),
            ],
        );
        let err = Registry::builder().message(desc).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::DuplicateFieldNumber { number: 1, .. }
        ));
    }

    #[test]
    fn test_invalid_and_reserved_numbers() {
        let zero = MessageDescriptor::new("Z", vec![FieldDescriptor::new(0, "a", FieldType::Bool)]);
        assert!(matches!(
            Registry::builder().message(zero),
            Err(SchemaError::InvalidFieldNumber { number: 0, .. })
        ));

        let huge = MessageDescriptor::new(
            "H",
            vec![FieldDescriptor::new(MAX_FIELD_NUMBER + 1, "a", FieldType::Bool)],
        );
        assert!(matches!(
            Registry::builder().message(huge),
            Err(SchemaError::InvalidFieldNumber { .. })
        ));

        let reserved =
            MessageDescriptor::new("R", vec![FieldDescriptor::new(19500, "a", FieldType::Bool)]);
        assert!(matches!(
            Registry::builder().message(reserved),
            Err(SchemaError::ReservedFieldNumber { number: 19500, .. })
        ));
    }

    #[test]
    fn test_duplicate_field_name() {
        let desc = MessageDescriptor::new(
            "Bad",
            vec![
                FieldDescriptor::new(1, "id", FieldType::Int32),
                FieldDescriptor::new(2, "id", FieldType::Int64),
            ],
        );
        assert!(matches!(
            Registry::builder().message(desc),
            Err(SchemaError::DuplicateFieldName { .. })
        ));
    }

    #[test]
    fn test_json_name_clash() {
        let desc = MessageDescriptor::new(
            "Bad",
            vec![
                FieldDescriptor::new(1, "fooBar", FieldType::Int32),
                FieldDescriptor::new(2, "foo_bar", FieldType::Int32),
            ],
        );
        assert_eq!(
            Registry::builder().message(desc).unwrap_err(),
            SchemaError::FieldNameClash {
                message: "Bad".into(),
                name: "fooBar".into(),
                first: "fooBar".into(),
                second: "foo_bar".into(),
            }
        );

        // declared name of a later field equal to an earlier JSON name
        let desc = MessageDescriptor::new(
            "Bad",
            vec![
                FieldDescriptor::new(1, "sample_list", FieldType::Int32),
                FieldDescriptor::new(2, "sampleList", FieldType::Int32),
            ],
        );
        assert!(matches!(
            Registry::builder().message(desc),
            Err(SchemaError::FieldNameClash { ref name, .. }) if name == "sampleList"
        ));

        // a field whose JSON name equals its own name is fine
        let ok = MessageDescriptor::new(
            "Ok",
            vec![
                FieldDescriptor::new(1, "id", FieldType::Int32),
                FieldDescriptor::new(2, "is_simple", FieldType::Bool),
            ],
        );
        assert!(Registry::builder().message(ok).is_ok());
    }

    #[test]
    fn test_unresolved_type() {
        let desc = MessageDescriptor::new(
            "Outer",
            vec![FieldDescriptor::new(
                1,
                "inner",
                FieldType::Message("Inner".into()),
            )],
        );
        let err = Registry::builder().message(desc).unwrap().build().unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnresolvedType {
                message: "Outer".into(),
                field: "inner".into(),
                type_name: "Inner".into(),
            }
        );
    }

    #[test]
    fn test_duplicate_type() {
        let err = Registry::builder()
            .message(dummy())
            .unwrap()
            .message(dummy())
            .unwrap()
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateType("DummyMessage".into()));
    }

    #[test]
    fn test_enum_validation() {
        let no_zero = EnumDescriptor::new("E", [("A", 1)]);
        assert_eq!(
            Registry::builder().enumeration(no_zero).unwrap_err(),
            SchemaError::MissingZeroValue("E".into())
        );

        let dup = EnumDescriptor::new("E", [("A", 0), ("A", 1)]);
        assert!(matches!(
            Registry::builder().enumeration(dup),
            Err(SchemaError::DuplicateEnumSymbol { .. })
        ));
    }

    #[test]
    fn test_registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
        assert_send_sync::<Arc<MessageDescriptor>>();
    }
}
