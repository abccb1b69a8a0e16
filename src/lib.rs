//! # protowire
//!
//! A schema-driven codec for the protocol buffers binary wire format
//!
//! ## Features
//! * Message types described at runtime in a shared [`Registry`]
//! * Messages as dynamic trees addressed by field number or name
//! * Byte-exact encoding, packed or unpacked repeated scalars
//! * Unknown fields kept on decode and written back on encode
//! * JSON text bridge keyed by field name
//! * Schemaless [`Inspector`] that dumps any wire bytes as JSON keyed by field number
//!
//! ## Limitations
//! * Groups (wire types 3 and 4) are rejected.
//! * proto3 semantics only: a scalar field set to its default is not encoded.
//!
//! ## Examples
//!
//! ``` rust
//! use std::sync::Arc;
//!
//! use protowire::{Codec, FieldDescriptor, FieldType, JsonCodec, MessageDescriptor, Registry, Value};
//!
//! let registry = Registry::builder()
//!     .message(MessageDescriptor::new(
//!         "SimpleMessage",
//!         vec![
//!             FieldDescriptor::new(1, "id", FieldType::Int32),
//!             FieldDescriptor::new(3, "name", FieldType::String),
//!             FieldDescriptor::repeated(4, "sample_list", FieldType::Int32),
//!         ],
//!     ))
//!     .and_then(|builder| builder.build())
//!     .unwrap();
//! let registry = Arc::new(registry);
//!
//! let msg = registry
//!     .new_message("SimpleMessage")
//!     .unwrap()
//!     .with(1, 12345)
//!     .and_then(|msg| msg.with(3, "hello"))
//!     .and_then(|msg| msg.with(4, Value::list([1, 4])))
//!     .unwrap();
//!
//! let codec = Codec::new(Arc::clone(&registry));
//! let bytes = codec.encode(&msg);
//! assert_eq!(bytes, [0x08, 0xb9, 0x60, 0x1a, 0x05, b'h', b'e', b'l', b'l', b'o', 0x22, 0x02, 0x01, 0x04]);
//! assert_eq!(codec.decode_type(&bytes, "SimpleMessage").unwrap(), msg);
//!
//! let json = JsonCodec::new(registry);
//! assert_eq!(json.to_text(&msg), r#"{"id":12345,"name":"hello","sample_list":[1,4]}"#);
//! ```
//!

mod codec;
mod descriptor;
mod error;
pub mod fs;
mod inspect;
mod json;
mod message;
mod registry;
pub mod samples;
mod value;
mod varint;
pub mod wire;

pub use codec::{Codec, CodecOptions, DEFAULT_RECURSION_LIMIT};
pub use descriptor::{
    Cardinality, EnumDescriptor, EnumValueDescriptor, FieldDescriptor, FieldType,
    MessageDescriptor,
};
pub use error::{DecodeError, Error, FieldError, Result, SchemaError};
pub use fs::{FileSystem, LocalFs};
pub use inspect::{BytesEncoding, InspectOptions, Inspector, Scan, ScannedField};
pub use json::{JsonBytes, JsonCodec, JsonOptions, MAX_SAFE_INTEGER};
pub use message::{EnumSymbol, Message, UnknownField};
pub use registry::{Registry, RegistryBuilder};
pub use value::Value;
pub use varint::{decode_var, encode_var, zigzag_decode, zigzag_encode};
pub use wire::WireType;
