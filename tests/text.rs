//! Text notation tests: parsing, formatting, and section load/save through a message.

use amqpmsg::{parse, Format, Message, ParseError, Value};

fn reparse(v: &Value) -> Value {
    let text = v.to_string();
    let mut values = parse(&text).unwrap_or_else(|e| panic!("reparse {:?}: {}", text, e));
    assert_eq!(values.len(), 1, "one value from {:?}", text);
    values.remove(0)
}

#[test]
fn test_parse_literal_defaults() {
    let values = parse("null true false 42 -7 0x75 1.5 \"s\" b\"b\" :sym :\"two words\"").unwrap();
    assert_eq!(
        values,
        vec![
            Value::Null,
            Value::Bool(true),
            Value::Bool(false),
            Value::Long(42),
            Value::Long(-7),
            Value::Ulong(0x75),
            Value::Double(1.5),
            Value::String("s".into()),
            Value::Binary(b"b".to_vec()),
            Value::Symbol("sym".into()),
            Value::Symbol("two words".into()),
        ]
    );
}

#[test]
fn test_parse_compounds_and_comments() {
    let src = r#"
        # application properties
        @0x74 {"count"=(uint)3, :tags=[:a, :b]}
        @:amqp:data:binary b"\x00\x01"
    "#;
    let values = parse(src).unwrap();
    assert_eq!(values.len(), 2);
    assert_eq!(
        values[0],
        Value::described(
            0x74,
            Value::Map(vec![
                (Value::String("count".into()), Value::Uint(3)),
                (
                    Value::Symbol("tags".into()),
                    Value::List(vec![Value::Symbol("a".into()), Value::Symbol("b".into())])
                ),
            ])
        )
    );
    assert_eq!(values[1].descriptor_code(), Some(0x75));
}

#[test]
fn test_casts() {
    let values = parse(
        "(ubyte)7 (ushort)65535 (byte)-1 (short)-2 (int)-3 (ulong)5 (timestamp)1700000000000 \
         (float)0.5 (double)2 (char)\"x\" (symbol)\"s\" (binary)\"raw\" (array)[(int)1, (int)2]",
    )
    .unwrap();
    assert_eq!(
        values,
        vec![
            Value::Ubyte(7),
            Value::Ushort(65535),
            Value::Byte(-1),
            Value::Short(-2),
            Value::Int(-3),
            Value::Ulong(5),
            Value::Timestamp(1_700_000_000_000),
            Value::Float(0.5),
            Value::Double(2.0),
            Value::Char('x'),
            Value::Symbol("s".into()),
            Value::Binary(b"raw".to_vec()),
            Value::Array(vec![Value::Int(1), Value::Int(2)]),
        ]
    );
}

#[test]
fn test_parse_errors() {
    assert!(matches!(parse("[1, 2"), Err(ParseError::Syntax(_))));
    assert!(matches!(parse("{1}"), Err(ParseError::Syntax(_))));
    assert!(matches!(parse("\"unterminated"), Err(ParseError::Syntax(_))));
    assert!(matches!(parse("\"bad \\q\""), Err(ParseError::Literal(_))));
    assert!(matches!(parse("(char)\"xy\""), Err(ParseError::Literal(_))));
    assert!(matches!(parse("(uuid)\"1234\""), Err(ParseError::Literal(_))));
    assert!(matches!(parse("99999999999999999999"), Err(ParseError::Literal(_))));
    assert!(matches!(parse("(money)1"), Err(ParseError::UnknownType(_))));
}

#[test]
fn test_display_parses_back() {
    let samples = vec![
        Value::Null,
        Value::Ubyte(255),
        Value::Ushort(1),
        Value::Uint(4_000_000_000),
        Value::Ulong(u64::MAX),
        Value::Byte(-128),
        Value::Short(i16::MIN),
        Value::Int(i32::MAX),
        Value::Long(i64::MIN),
        Value::Float(-2.25),
        Value::Double(1e300),
        Value::Double(f64::INFINITY),
        Value::Decimal32(0x2204_0001),
        Value::Decimal64(7),
        Value::Decimal128([0x30; 16]),
        Value::Char('\n'),
        Value::Timestamp(-5),
        Value::Uuid([0x5a; 16]),
        Value::Binary(vec![b'"', b'\\', 0x7f, b'z']),
        Value::String("line\nnext \"q\"".into()),
        Value::Symbol("needs quoting".into()),
        Value::Symbol("amqp:data:binary".into()),
        Value::described(0x77, Value::List(vec![])),
        Value::Map(vec![]),
        Value::Map(vec![(Value::Long(1), Value::Null)]),
        Value::Array(vec![]),
        Value::Array(vec![
            Value::Array(vec![Value::Uint(1)]),
            Value::Array(vec![Value::Uint(2), Value::Uint(3)]),
        ]),
    ];
    for v in samples {
        assert_eq!(reparse(&v), v);
    }
}

#[test]
fn test_section_save_load_roundtrip() {
    let mut msg = Message::new();
    let id = msg.create_section();
    let text = "@0x74 {\"k\"=(int)1} @0x77 [(ubyte)2, :s, b\"\\x00\"]";
    msg.load_section(id, text).expect("load");

    let mut buf = vec![0u8; 256];
    let n = msg.section(id).unwrap().save(&mut buf).expect("save");
    let saved = std::str::from_utf8(&buf[..n]).unwrap().to_string();

    let mut other = Message::new();
    let copy = other.create_section();
    other.load_section(copy, &saved).expect("reload");
    assert_eq!(
        other.section(copy).unwrap().payload(),
        msg.section(id).unwrap().payload()
    );

    // Text format is stored only; sections still encode as binary.
    msg.section_mut(id).unwrap().set_format(Format::Text);
    assert_eq!(msg.section(id).unwrap().format(), Format::Text);
    let bytes = msg.to_bytes().expect("to_bytes");
    let mut decoded = Message::new();
    decoded.decode(Format::Amqp, &bytes).expect("decode");
    assert_eq!(decoded.sections().len(), 2);
}

#[test]
fn test_save_overflow() {
    let mut msg = Message::new();
    let id = msg.create_section();
    msg.load_section(id, "\"a long string value\"").expect("load");
    let mut small = [0u8; 4];
    let err = msg.section(id).unwrap().save(&mut small).unwrap_err();
    assert_eq!(err.code(), amqpmsg::protocol::OVERFLOW);
}

#[test]
fn test_load_unknown_section() {
    let mut msg = Message::new();
    let id = msg.create_section();
    msg.destroy_section(id).expect("destroy");
    assert!(msg.load_section(id, "null").is_err());
}
