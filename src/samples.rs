//! Sample schemas and messages: a simple message, an enum, nested messages and an address
//! book.
//!
//! ```text
//! message SimpleMessage {
//!   int32 id = 1;
//!   bool is_simple = 2;
//!   string name = 3;
//!   repeated int32 sample_list = 4;
//! }
//!
//! enum DayOfTheWeek { UNKNOWN_DAY_OF_THE_WEEK = 0; MONDAY = 1; ... SUNDAY = 7; }
//! message EnumMessage {
//!   int32 id = 1;
//!   DayOfTheWeek day_of_the_week = 2;
//! }
//!
//! message DummyMessage { int32 id = 1; string name = 2; }
//! message ComplexMessage {
//!   DummyMessage one_dummy = 2;
//!   repeated DummyMessage multiple_dummy = 3;
//! }
//!
//! message Person {
//!   string name = 1;
//!   int32 id = 2;
//!   string email = 3;
//!   enum PhoneType { MOBILE = 0; HOME = 1; WORK = 2; }
//!   message PhoneNumber { string number = 1; PhoneType type = 2; }
//!   repeated PhoneNumber phones = 4;
//! }
//! message AddressBook { repeated Person people = 1; }
//! ```

use crate::descriptor::{EnumDescriptor, FieldDescriptor, FieldType, MessageDescriptor};
use crate::error::{Error, Result, SchemaError};
use crate::message::Message;
use crate::registry::Registry;
use crate::value::Value;

pub const SIMPLE: &str = "SimpleMessage";
pub const ENUM: &str = "EnumMessage";
pub const DAY_OF_THE_WEEK: &str = "DayOfTheWeek";
pub const DUMMY: &str = "DummyMessage";
pub const COMPLEX: &str = "ComplexMessage";
pub const PERSON: &str = "Person";
pub const PHONE_NUMBER: &str = "Person.PhoneNumber";
pub const PHONE_TYPE: &str = "Person.PhoneType";
pub const ADDRESS_BOOK: &str = "AddressBook";

/// `DayOfTheWeek.THURSDAY`
pub const THURSDAY: i32 = 4;
/// `DayOfTheWeek.MONDAY`
pub const MONDAY: i32 = 1;
/// `Person.PhoneType.HOME`
pub const HOME: i32 = 1;

/// Registry holding every sample type.
pub fn registry() -> Result<Registry, SchemaError> {
    use FieldType::{Bool, Enum, Int32};

    Registry::builder()
        .message(MessageDescriptor::new(
            SIMPLE,
            vec![
                FieldDescriptor::new(1, "id", Int32),
                FieldDescriptor::new(2, "is_simple", Bool),
                FieldDescriptor::new(3, "name", FieldType::String),
                FieldDescriptor::repeated(4, "sample_list", Int32),
            ],
        ))?
        .enumeration(EnumDescriptor::new(
            DAY_OF_THE_WEEK,
            [
                ("UNKNOWN_DAY_OF_THE_WEEK", 0),
                ("MONDAY", 1),
                ("TUESDAY", 2),
                ("WEDNESDAY", 3),
                ("THURSDAY", 4),
                ("FRIDAY", 5),
                ("SATURDAY", 6),
                ("SUNDAY", 7),
            ],
        ))?
        .message(MessageDescriptor::new(
            ENUM,
            vec![
                FieldDescriptor::new(1, "id", Int32),
                FieldDescriptor::new(2, "day_of_the_week", Enum(DAY_OF_THE_WEEK.into())),
            ],
        ))?
        .message(MessageDescriptor::new(
            DUMMY,
            vec![
                FieldDescriptor::new(1, "id", Int32),
                FieldDescriptor::new(2, "name", FieldType::String),
            ],
        ))?
        .message(MessageDescriptor::new(
            COMPLEX,
            vec![
                FieldDescriptor::new(2, "one_dummy", FieldType::Message(DUMMY.into())),
                FieldDescriptor::repeated(3, "multiple_dummy", FieldType::Message(DUMMY.into())),
            ],
        ))?
        .enumeration(EnumDescriptor::new(
            PHONE_TYPE,
            [("MOBILE", 0), ("HOME", 1), ("WORK", 2)],
        ))?
        .message(MessageDescriptor::new(
            PHONE_NUMBER,
            vec![
                FieldDescriptor::new(1, "number", FieldType::String),
                FieldDescriptor::new(2, "type", Enum(PHONE_TYPE.into())),
            ],
        ))?
        .message(MessageDescriptor::new(
            PERSON,
            vec![
                FieldDescriptor::new(1, "name", FieldType::String),
                FieldDescriptor::new(2, "id", Int32),
                FieldDescriptor::new(3, "email", FieldType::String),
                FieldDescriptor::repeated(4, "phones", FieldType::Message(PHONE_NUMBER.into())),
            ],
        ))?
        .message(MessageDescriptor::new(
            ADDRESS_BOOK,
            vec![FieldDescriptor::repeated(
                1,
                "people",
                FieldType::Message(PERSON.into()),
            )],
        ))?
        .build()
}

fn new(registry: &Registry, name: &str) -> Result<Message> {
    registry
        .new_message(name)
        .ok_or_else(|| Error::UnknownType(name.to_string()))
}

/// `{id: 12345, is_simple: true, name: "My Simple Message", sample_list: [1, 4, 7, 8]}`
pub fn simple_message(registry: &Registry) -> Result<Message> {
    Ok(new(registry, SIMPLE)?
        .with(1, 12345)?
        .with(2, true)?
        .with(3, "My Simple Message")?
        .with(4, Value::list([1, 4, 7, 8]))?)
}

/// `{id: 42, day_of_the_week: THURSDAY}`
pub fn enum_message(registry: &Registry) -> Result<Message> {
    Ok(new(registry, ENUM)?
        .with(1, 42)?
        .with(2, Value::Enum(THURSDAY))?)
}

/// Dummy message with the given id and name.
pub fn dummy(registry: &Registry, id: i32, name: &str) -> Result<Message> {
    Ok(new(registry, DUMMY)?.with(1, id)?.with(2, name)?)
}

/// One nested dummy plus a repeated field holding two more.
pub fn complex_message(registry: &Registry) -> Result<Message> {
    Ok(new(registry, COMPLEX)?
        .with(2, dummy(registry, 1, "First message")?)?
        .with(
            3,
            Value::list([
                dummy(registry, 2, "Second message")?,
                dummy(registry, 3, "Third message")?,
            ]),
        )?)
}

fn person(registry: &Registry, id: i32, name: &str, email: &str, phone: &str) -> Result<Message> {
    let phone = new(registry, PHONE_NUMBER)?
        .with(1, phone)?
        .with(2, Value::Enum(HOME))?;
    Ok(new(registry, PERSON)?
        .with(1, name)?
        .with(2, id)?
        .with(3, email)?
        .with(4, Value::list([phone]))?)
}

/// Address book with two people, one home phone each.
pub fn address_book(registry: &Registry) -> Result<Message> {
    Ok(new(registry, ADDRESS_BOOK)?.with(
        1,
        Value::list([
            person(
                registry,
                1,
                "Michael Miranda",
                "mmiranda@example.com",
                "718-555-4321",
            )?,
            person(registry, 2, "John Doe", "jdoe@example.com", "212-555-4321")?,
        ]),
    )?)
}
