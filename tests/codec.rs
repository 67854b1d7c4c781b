//! Value codec tests: exact encodings, consumed lengths, malformed and truncated input.

use amqpmsg::codec::MAX_ZERO_WIDTH_ELEMENTS;
use amqpmsg::{decode_one, encode_value, CodecError, Data, Format, Message, MessageError, Value};

fn enc(v: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    encode_value(&mut out, v).expect("encode");
    out
}

fn roundtrip(v: Value) {
    let bytes = enc(&v);
    let (decoded, used) = decode_one(&bytes).expect("decode");
    assert_eq!(used, bytes.len());
    assert_eq!(decoded, v);
}

#[test]
fn test_scalar_encodings() {
    assert_eq!(enc(&Value::Null), vec![0x40]);
    assert_eq!(enc(&Value::Bool(true)), vec![0x41]);
    assert_eq!(enc(&Value::Bool(false)), vec![0x42]);
    assert_eq!(enc(&Value::Ulong(0)), vec![0x44]);
    assert_eq!(enc(&Value::Ulong(0x1_0000)), vec![0x80, 0, 0, 0, 0, 0, 1, 0, 0]);
    assert_eq!(enc(&Value::Int(-1)), vec![0x54, 0xff]);
    assert_eq!(enc(&Value::Int(1000)), vec![0x71, 0, 0, 0x03, 0xe8]);
    assert_eq!(enc(&Value::Long(-2)), vec![0x55, 0xfe]);
    assert_eq!(enc(&Value::Timestamp(1)), vec![0x83, 0, 0, 0, 0, 0, 0, 0, 1]);
    assert_eq!(enc(&Value::String("ab".into())), vec![0xa1, 0x02, b'a', b'b']);
    assert_eq!(enc(&Value::Symbol("x".into())), vec![0xa3, 0x01, b'x']);
    assert_eq!(enc(&Value::List(vec![])), vec![0x45]);
}

#[test]
fn test_long_string_uses_str32() {
    let s = "z".repeat(300);
    let bytes = enc(&Value::String(s.clone()));
    assert_eq!(&bytes[..5], &[0xb1, 0x00, 0x00, 0x01, 0x2c]);
    roundtrip(Value::String(s));
}

#[test]
fn test_decode_reports_consumed_bytes_with_trailing_data() {
    let mut bytes = enc(&Value::described(0x75, Value::Binary(b"abc".to_vec())));
    let one = bytes.len();
    bytes.extend_from_slice(&[0x40, 0x41]);
    let (v, used) = decode_one(&bytes).expect("decode");
    assert_eq!(used, one);
    assert_eq!(v.descriptor_code(), Some(0x75));

    let (next, used) = decode_one(&bytes[one..]).expect("decode");
    assert_eq!(next, Value::Null);
    assert_eq!(used, 1);
}

#[test]
fn test_data_decode_appends() {
    let mut bytes = enc(&Value::Uint(5));
    bytes.extend(enc(&Value::Bool(true)));
    let mut data = Data::new();
    let first = data.decode(&bytes).expect("decode");
    data.decode(&bytes[first..]).expect("decode");
    assert_eq!(data.items(), &[Value::Uint(5), Value::Bool(true)]);
    assert_eq!(data.descriptor(), 0);
}

#[test]
fn test_truncated_input_rejected() {
    // uint needs four bytes
    let err = decode_one(&[0x70, 0x00, 0x01]).unwrap_err();
    assert!(matches!(err, CodecError::Io(_) | CodecError::Truncated { .. }));
    // str8 claims 10 bytes, has 2
    let err = decode_one(&[0xa1, 0x0a, b'h', b'i']).unwrap_err();
    assert!(matches!(err, CodecError::Truncated { needed: 10, available: 2 }));
    // list8 claims more than is left
    let err = decode_one(&[0xc0, 0x20, 0x01, 0x40]).unwrap_err();
    assert!(matches!(err, CodecError::Truncated { .. }));
    // described with no value
    assert!(decode_one(&[0x00, 0x53, 0x70]).is_err());
    assert!(decode_one(&[]).is_err());
}

#[test]
fn test_invalid_constructor_rejected() {
    let err = decode_one(&[0xff]).unwrap_err();
    assert!(matches!(err, CodecError::InvalidConstructor(0xff)));
    assert!(matches!(decode_one(&[0x56, 0x02]), Err(CodecError::Malformed(_))));
}

#[test]
fn test_invalid_utf8_rejected() {
    let err = decode_one(&[0xa1, 0x02, 0xc3, 0x28]).unwrap_err();
    assert!(matches!(err, CodecError::Utf8(_)));
}

#[test]
fn test_map_roundtrip() {
    roundtrip(Value::Map(vec![
        (Value::Symbol("key".into()), Value::Int(7)),
        (Value::String("nested".into()), Value::List(vec![Value::Null, Value::Ubyte(1)])),
    ]));
    // odd element count
    assert!(matches!(
        decode_one(&[0xc1, 0x02, 0x01, 0x40]),
        Err(CodecError::Malformed(_))
    ));
}

#[test]
fn test_array_roundtrip() {
    roundtrip(Value::Array(vec![Value::Uint(1), Value::Uint(300), Value::Uint(0)]));
    roundtrip(Value::Array(vec![
        Value::Symbol("a".into()),
        Value::Symbol("bb".into()),
    ]));
    roundtrip(Value::Array(vec![Value::Null, Value::Null, Value::Null]));
    roundtrip(Value::Array(vec![]));
}

#[test]
fn test_mixed_array_rejected() {
    let mut out = Vec::new();
    assert!(encode_value(&mut out, &Value::Array(vec![Value::Uint(1), Value::Bool(true)])).is_err());
}

#[test]
fn test_scalar_roundtrips() {
    for v in [
        Value::Ubyte(200),
        Value::Ushort(65_000),
        Value::Uint(u32::MAX),
        Value::Ulong(u64::MAX),
        Value::Byte(-100),
        Value::Short(-30_000),
        Value::Int(i32::MIN),
        Value::Long(i64::MAX),
        Value::Float(1.5),
        Value::Double(-0.25),
        Value::Decimal32(0x3040_0001),
        Value::Decimal64(0x3040_0000_0000_0001),
        Value::Decimal128([7; 16]),
        Value::Char('é'),
        Value::Timestamp(-1),
        Value::Uuid([0xab; 16]),
        Value::Binary(vec![0, 1, 2, 255]),
    ] {
        roundtrip(v);
    }
}

#[test]
fn test_symbolic_descriptor_resolves() {
    let v = Value::Described(
        Box::new(Value::Symbol("amqp:properties:list".into())),
        Box::new(Value::List(vec![])),
    );
    roundtrip(v.clone());
    assert_eq!(v.descriptor_code(), Some(0x73));
    let unknown = Value::Described(
        Box::new(Value::Symbol("vendor:thing".into())),
        Box::new(Value::Null),
    );
    assert_eq!(unknown.descriptor_code(), None);
}

#[test]
fn test_bounded_encode_overflow_writes_nothing() {
    let data = Data::from(vec![Value::String("hello".into())]);
    let mut small = [0xeeu8; 4];
    match data.encode(&mut small) {
        Err(CodecError::Overflow { required, available }) => {
            assert_eq!(required, 7);
            assert_eq!(available, 4);
        }
        other => panic!("expected overflow, got {:?}", other),
    }
    assert_eq!(small, [0xee; 4]);
    let mut fits = [0u8; 7];
    assert_eq!(data.encode(&mut fits).expect("encode"), 7);
}

/// array32 header (size, count) followed by the element constructor, no elements.
fn zero_width_array(count: u32) -> Vec<u8> {
    let mut b = Vec::new();
    b.extend_from_slice(&5u32.to_be_bytes());
    b.extend_from_slice(&count.to_be_bytes());
    b.push(0x40);
    b
}

#[test]
fn test_zero_width_elements_limited_per_decode() {
    // One array of nulls at the limit is fine.
    let mut single = vec![0xf0];
    single.extend(zero_width_array(MAX_ZERO_WIDTH_ELEMENTS as u32));
    let (v, used) = decode_one(&single).expect("decode");
    assert_eq!(used, single.len());
    match v {
        Value::Array(items) => assert_eq!(items.len(), MAX_ZERO_WIDTH_ELEMENTS as usize),
        other => panic!("expected array, got {:?}", other),
    }

    // 100 such arrays nested in one outer array share the limit: 909 bytes must not
    // expand into millions of values.
    let inner: Vec<u8> = (0..100)
        .flat_map(|_| zero_width_array(MAX_ZERO_WIDTH_ELEMENTS as u32))
        .collect();
    let mut outer = vec![0xf0];
    outer.extend_from_slice(&(4 + 1 + inner.len() as u32).to_be_bytes());
    outer.extend_from_slice(&100u32.to_be_bytes());
    outer.push(0xf0);
    outer.extend(inner);
    assert!(matches!(decode_one(&outer), Err(CodecError::Malformed(_))));
}

#[test]
fn test_zero_width_limit_spans_message_decode() {
    // Each item alone is within the limit, together they are not.
    let half = MAX_ZERO_WIDTH_ELEMENTS as u32 / 2 + 1;
    let mut item = vec![0xf0];
    item.extend(zero_width_array(half));
    assert!(decode_one(&item).is_ok());

    let bytes = [item.clone(), item].concat();
    let mut msg = Message::new();
    let err = msg.decode(Format::Amqp, &bytes).unwrap_err();
    assert!(matches!(err, MessageError::Codec(CodecError::Malformed(_))));
}

fn nested_lists(levels: usize) -> Value {
    let mut v = Value::Null;
    for _ in 0..levels {
        v = Value::List(vec![v]);
    }
    v
}

#[test]
fn test_encode_rejects_undecodable_nesting() {
    roundtrip(nested_lists(60));

    let mut out = Vec::new();
    assert!(matches!(
        encode_value(&mut out, &nested_lists(100)),
        Err(CodecError::Malformed(_))
    ));
    let deep_array = Value::Array(vec![nested_lists(100)]);
    assert!(encode_value(&mut Vec::new(), &deep_array).is_err());

    // A section loaded from text cannot smuggle the nesting into an encoded message.
    let mut msg = Message::new();
    let id = msg.create_section();
    let text = format!("{}null{}", "[".repeat(100), "]".repeat(100));
    msg.load_section(id, &text).expect("load");
    assert!(matches!(msg.to_bytes(), Err(MessageError::Codec(CodecError::Malformed(_)))));
}
