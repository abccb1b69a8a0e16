//! Schemaless inspection of wire bytes.
//!
//! Renders any encoded message as JSON keyed by field number. Length-delimited values are
//! guessed: a nested message if the bytes parse as one, otherwise a string or bytes
//! according to [`BytesEncoding`]. The guess may be wrong; use it for debugging.

use base64::prelude::*;
use serde_json::{Map, Value, json};
use tracing::trace;

use crate::message::Message;
use crate::wire::{RESERVED_FIELD_NUMBERS, RawValue, Reader};

/// How to render length-delimited values that are not nested messages.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BytesEncoding {
    #[default]
    /// String if valid UTF-8, otherwise base64.
    Auto,

    /// Base64 string.
    Base64,

    /// JSON array of numbers.
    ByteArray,

    #[cfg(feature = "stfu8")]
    /// [stfu8](https://crates.io/crates/stfu8) encoded string.
    Stfu8,

    /// UTF-8 lossy string.
    StringLossy,
}

/// Inspector settings.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InspectOptions {
    pub bytes_encoding: BytesEncoding,
}

/// One field as read off the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannedField<'a> {
    pub number: u32,
    pub value: RawValue<'a>,
}

/// Result of a single, non-recursive pass over a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan<'a> {
    /// Fields read before the first malformed tag or value.
    pub fields: Vec<ScannedField<'a>>,

    /// Bytes from the first malformed tag onwards, if any.
    pub garbage: Option<&'a [u8]>,
}

/// Converts wire bytes to JSON without a descriptor.
#[derive(Debug, Default, Clone)]
pub struct Inspector {
    options: InspectOptions,
}

impl Inspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: InspectOptions) -> Self {
        Self { options }
    }

    pub fn with_bytes_encoding(bytes_encoding: BytesEncoding) -> Self {
        Self::with_options(InspectOptions { bytes_encoding })
    }

    pub fn options(&self) -> &InspectOptions {
        &self.options
    }

    /// Render `data` as JSON. Returns `None` if not even one field could be read.
    ///
    /// Trailing bytes that do not parse are dropped.
    pub fn inspect(&self, data: &[u8]) -> Option<Value> {
        self.to_json(data, true)
    }

    /// Render the unknown fields kept by `msg`.
    pub fn inspect_unknown(&self, msg: &Message) -> Option<Value> {
        let bytes: Vec<u8> = msg
            .unknown_fields()
            .iter()
            .flat_map(|f| f.bytes.iter().copied())
            .collect();
        self.inspect(&bytes)
    }

    fn to_json(&self, data: &[u8], top_level: bool) -> Option<Value> {
        if data.is_empty() {
            return None;
        }

        // Printable text is a string, not a message.
        let utf8 = simdutf8::basic::from_utf8(data);
        if !top_level && utf8.is_ok_and(|s| s.chars().all(|c| !c.is_control())) {
            return None;
        }

        let Scan { fields, garbage } = self.scan(data);
        if fields.is_empty() {
            return None;
        }
        if !top_level
            && (garbage.is_some()
                || (utf8.is_ok()
                    && fields
                        .iter()
                        .any(|f| RESERVED_FIELD_NUMBERS.contains(&f.number))))
        {
            return None;
        }
        if let Some(garbage) = garbage {
            trace!(dropped = garbage.len(), "trailing bytes do not parse");
        }

        let mut map = Map::new();
        for field in fields {
            let value = match field.value {
                RawValue::Varint(v) => Value::from(v),
                RawValue::Fixed64(v) => Value::from(v),
                RawValue::Fixed32(v) => Value::from(v),
                RawValue::LengthDelimited(bytes) => self
                    .to_json(bytes, false)
                    .unwrap_or_else(|| self.bytes_to_json(bytes)),
            };

            let key = field.number.to_string();
            match map.get_mut(&key) {
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    map.insert(key, value);
                }
            }
        }

        Some(Value::Object(map))
    }

    fn bytes_to_json(&self, bytes: &[u8]) -> Value {
        match self.options.bytes_encoding {
            BytesEncoding::Auto => match simdutf8::basic::from_utf8(bytes) {
                Ok(s) => Value::String(s.to_string()),
                Err(_) => Value::String(BASE64_STANDARD.encode(bytes)),
            },
            BytesEncoding::Base64 => Value::String(BASE64_STANDARD.encode(bytes)),
            BytesEncoding::ByteArray => json!(bytes),
            #[cfg(feature = "stfu8")]
            BytesEncoding::Stfu8 => Value::String(stfu8::encode_u8(bytes)),
            BytesEncoding::StringLossy => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// Read the fields of `data` without descending into length-delimited values.
    pub fn scan<'a>(&self, data: &'a [u8]) -> Scan<'a> {
        let mut scan = Scan {
            fields: vec![],
            garbage: None,
        };

        let mut reader = Reader::new(data);
        while !reader.is_empty() {
            let start = reader.remaining();
            let field = reader.read_tag().and_then(|(number, wire_type)| {
                Ok(ScannedField {
                    number,
                    value: reader.read_value(wire_type)?,
                })
            });
            match field {
                Ok(field) => scan.fields.push(field),
                Err(_) => {
                    scan.garbage = Some(start);
                    break;
                }
            }
        }

        scan
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;
    use crate::codec::Codec;
    use crate::samples;

    #[test]
    fn test_inspect_1() {
        let data = hex!("0d1c0000001203596f751a024d65202b2a0a0a066162633132331200");
        let json = Inspector::new().inspect(&data).unwrap();
        let expected = json!({
            "1": 28,
            "2": "You",
            "3": "Me",
            "4": 43,
            "5": {
                "1": "abc123",
                "2": ""
            }
        });
        assert_eq!(json, expected);
    }

    #[test]
    fn test_inspect_2() {
        let data =
            hex!("0d1c0000001203596f751a024d65202b2a0a0a06616263313233120031ba32a96cc10200003801");
        let json = Inspector::new().inspect(&data).unwrap();
        let expected = json!({"1":28,"2":"You","3":"Me","4":43,"5":{"1":"abc123","2":""},"6":3029774971578u64,"7":1});
        assert_eq!(json, expected);
    }

    #[test]
    fn test_repeated_numbers_become_arrays() {
        // sample_list written unpacked: field 4 three times
        let data = hex!("0801 2001 2004 2007");
        let json = Inspector::new().inspect(&data).unwrap();
        assert_eq!(json, json!({"1": 1, "4": [1, 4, 7]}));
    }

    #[test]
    fn test_encoded_sample() {
        let codec = Codec::new(samples::registry().unwrap().into());
        let book = samples::address_book(codec.registry()).unwrap();
        let json = Inspector::new().inspect(&codec.encode(&book)).unwrap();
        assert_eq!(json["1"][0]["1"], "Michael Miranda");
        assert_eq!(json["1"][1]["2"], 2);
        assert_eq!(json["1"][1]["4"], json!({"1": "212-555-4321", "2": 1}));
    }

    #[test]
    fn test_bytes_encodings() {
        // field 1 holding bytes ff 00
        let data = hex!("0a02ff00");
        let render = |encoding| Inspector::with_bytes_encoding(encoding).inspect(&data).unwrap();
        assert_eq!(render(BytesEncoding::Auto), json!({"1": "/wA="}));
        assert_eq!(render(BytesEncoding::Base64), json!({"1": "/wA="}));
        assert_eq!(render(BytesEncoding::ByteArray), json!({"1": [255, 0]}));
        assert_eq!(render(BytesEncoding::StringLossy), json!({"1": "\u{fffd}\u{0}"}));
        #[cfg(feature = "stfu8")]
        {
            let text = render(BytesEncoding::Stfu8);
            let text = text["1"].as_str().unwrap();
            assert_eq!(stfu8::decode_u8(text).unwrap(), [0xff, 0x00]);
        }
    }

    #[test]
    fn test_garbage() {
        // field 1 = 1, then a tag with wire type 7
        let data = hex!("0801 0f05");
        let inspector = Inspector::new();
        let scan = inspector.scan(&data);
        assert_eq!(scan.fields.len(), 1);
        assert_eq!(scan.garbage, Some(&data[2..]));
        assert_eq!(inspector.inspect(&data), Some(json!({"1": 1})));

        // truncated length-delimited value
        let scan = inspector.scan(&hex!("0801 1205 41"));
        assert_eq!(scan.fields, [ScannedField { number: 1, value: RawValue::Varint(1) }]);
        assert_eq!(scan.garbage, Some(&hex!("1205 41")[..]));

        assert_eq!(inspector.inspect(&[]), None);
        assert_eq!(inspector.inspect(&hex!("ff")), None);
    }

    #[test]
    fn test_inspect_unknown() {
        let codec = Codec::new(samples::registry().unwrap().into());
        // SimpleMessage id = 1 with an extra field 9 = "hi"
        let msg = codec.decode_type(&hex!("0801 4a026869"), samples::SIMPLE).unwrap();
        let json = Inspector::new().inspect_unknown(&msg).unwrap();
        assert_eq!(json, json!({"9": "hi"}));

        let known_only = codec.decode_type(&hex!("0801"), samples::SIMPLE).unwrap();
        assert_eq!(Inspector::new().inspect_unknown(&known_only), None);
    }
}
