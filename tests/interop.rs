//! Bytes written by protowire decode the same with protofish.

use std::sync::Arc;

use protofish::decode::{MessageValue, Value as PfValue};
use protofish::prelude::Context;
use protowire::{Codec, samples};

const SAMPLES_PROTO: &str = r#"
    syntax = "proto3";

    message SimpleMessage {
        int32 id = 1;
        bool is_simple = 2;
        string name = 3;
        repeated int32 sample_list = 4;
    }

    message DummyMessage {
        int32 id = 1;
        string name = 2;
    }

    message ComplexMessage {
        DummyMessage one_dummy = 2;
        repeated DummyMessage multiple_dummy = 3;
    }
"#;

fn codec() -> Codec {
    Codec::new(Arc::new(samples::registry().unwrap()))
}

fn values(msg: &MessageValue, number: u64) -> Vec<&PfValue> {
    msg.fields
        .iter()
        .filter(|f| u64::from(f.number) == number)
        .map(|f| &f.value)
        .collect()
}

fn dummy_fields(value: &PfValue) -> (i32, String) {
    let PfValue::Message(msg) = value else {
        panic!("not a message: {value:?}");
    };
    let id = match values(msg, 1).as_slice() {
        [PfValue::Int32(id)] => *id,
        other => panic!("id: {other:?}"),
    };
    let name = match values(msg, 2).as_slice() {
        [PfValue::String(name)] => name.clone(),
        other => panic!("name: {other:?}"),
    };
    (id, name)
}

#[test]
fn test_simple_message() {
    let codec = codec();
    let bytes = codec.encode(&samples::simple_message(codec.registry()).unwrap());

    let context = Context::parse(&[SAMPLES_PROTO]).unwrap();
    let info = context.get_message("SimpleMessage").unwrap();
    let decoded = info.decode(&bytes, &context);

    assert_eq!(values(&decoded, 1), [&PfValue::Int32(12345)]);
    assert_eq!(values(&decoded, 2), [&PfValue::Bool(true)]);
    assert_eq!(
        values(&decoded, 3),
        [&PfValue::String("My Simple Message".to_string())]
    );
    assert!(!values(&decoded, 4).is_empty());
    assert!(
        decoded
            .fields
            .iter()
            .all(|f| !matches!(f.value, PfValue::Unknown(..) | PfValue::Incomplete(..)))
    );
}

#[test]
fn test_complex_message() {
    let codec = codec();
    let bytes = codec.encode(&samples::complex_message(codec.registry()).unwrap());

    let context = Context::parse(&[SAMPLES_PROTO]).unwrap();
    let info = context.get_message("ComplexMessage").unwrap();
    let decoded = info.decode(&bytes, &context);

    let one = values(&decoded, 2);
    assert_eq!(one.len(), 1);
    assert_eq!(dummy_fields(one[0]), (1, "First message".to_string()));

    let multiple: Vec<_> = values(&decoded, 3).into_iter().map(dummy_fields).collect();
    assert_eq!(
        multiple,
        [
            (2, "Second message".to_string()),
            (3, "Third message".to_string())
        ]
    );
}
