//! Text notation for AMQP values: PEST parser and the matching `Display` formatter.
//!
//! ```text
//! @0x77 {"count"=(uint)3, :tags=[:a, :b]}
//! @:amqp:data:binary b"\x00\x01payload"
//! (timestamp)1700000000000 (uuid)"00112233-4455-6677-8899-aabbccddeeff"
//! ```
//!
//! Bare integers are `long`, bare decimals `double`, `0x..` literals `ulong`. Other types
//! are written as a cast: `(ubyte)7`, `(float)1.5`, `(char)"x"`, `(array)[1, 2]`.
//! Formatting a value and parsing the text back yields the same value.

use crate::protocol;
use crate::value::Value;
use pest::Parser;
use pest_derive::Parser as PestParser;
use std::fmt::{self, Write as _};

#[derive(PestParser)]
#[grammar = "text.pest"]
struct TextGrammar;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Syntax: {0}")]
    Syntax(String),
    #[error("Invalid literal: {0}")]
    Literal(String),
    #[error("Unknown type: {0}")]
    UnknownType(String),
}

/// Parse text into the sequence of top-level values it contains.
pub fn parse(source: &str) -> Result<Vec<Value>, ParseError> {
    let pairs = TextGrammar::parse(Rule::document, source)
        .map_err(|e| ParseError::Syntax(e.to_string()))?;
    let document = pairs
        .into_iter()
        .next()
        .ok_or_else(|| ParseError::Syntax("empty parse".to_string()))?;
    document
        .into_inner()
        .filter(|p| p.as_rule() != Rule::EOI)
        .map(build_value)
        .collect()
}

/// Parser that remembers the outcome of its last call, for `errno`/`error` reporting.
#[derive(Debug, Default)]
pub struct TextParser {
    errno: i32,
    error: Option<String>,
}

impl TextParser {
    pub fn new() -> Self {
        TextParser::default()
    }

    pub fn parse(&mut self, source: &str) -> Result<Vec<Value>, ParseError> {
        match parse(source) {
            Ok(values) => {
                self.errno = protocol::OK;
                self.error = None;
                Ok(values)
            }
            Err(e) => {
                self.errno = protocol::ERR;
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Status code of the last parse: 0 on success.
    pub fn errno(&self) -> i32 {
        self.errno
    }

    /// Error text of the last parse, if it failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

type Pair<'i> = pest::iterators::Pair<'i, Rule>;

fn next_pair<'i>(
    it: &mut pest::iterators::Pairs<'i, Rule>,
    what: &str,
) -> Result<Pair<'i>, ParseError> {
    it.next().ok_or_else(|| ParseError::Syntax(format!("{}: missing operand", what)))
}

fn build_value(pair: Pair<'_>) -> Result<Value, ParseError> {
    let text = pair.as_str();
    match pair.as_rule() {
        Rule::null => Ok(Value::Null),
        Rule::boolean => Ok(Value::Bool(text == "true")),
        Rule::int => text.parse().map(Value::Long).map_err(|_| literal(text)),
        Rule::hex => u64::from_str_radix(&text[2..], 16)
            .map(Value::Ulong)
            .map_err(|_| literal(text)),
        Rule::float => text.parse().map(Value::Double).map_err(|_| literal(text)),
        Rule::string => Ok(Value::String(unescape(quoted_inner(pair))?)),
        Rule::binary => Ok(Value::Binary(unescape_bytes(quoted_inner(pair))?)),
        Rule::symbol => {
            let inner = next_pair(&mut pair.into_inner(), "symbol")?;
            match inner.as_rule() {
                Rule::string => Ok(Value::Symbol(unescape(quoted_inner(inner))?)),
                _ => Ok(Value::Symbol(inner.as_str().to_string())),
            }
        }
        Rule::described => {
            let mut it = pair.into_inner();
            let descriptor = build_value(next_pair(&mut it, "described")?)?;
            let value = build_value(next_pair(&mut it, "described")?)?;
            Ok(Value::Described(Box::new(descriptor), Box::new(value)))
        }
        Rule::list => pair
            .into_inner()
            .map(build_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Rule::map => pair
            .into_inner()
            .map(|entry| {
                let mut it = entry.into_inner();
                let k = build_value(next_pair(&mut it, "map entry")?)?;
                let v = build_value(next_pair(&mut it, "map entry")?)?;
                Ok((k, v))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Map),
        Rule::cast => {
            let mut it = pair.into_inner();
            let ty = next_pair(&mut it, "cast")?.as_str();
            let value = build_value(next_pair(&mut it, "cast")?)?;
            cast(ty, value)
        }
        other => Err(ParseError::Syntax(format!("unexpected {:?}", other))),
    }
}

fn literal(text: &str) -> ParseError {
    ParseError::Literal(text.to_string())
}

fn quoted_inner(pair: Pair<'_>) -> &str {
    pair.into_inner().next().map(|p| p.as_str()).unwrap_or("")
}

fn int_of(v: &Value) -> Option<i128> {
    match v {
        Value::Long(x) => Some(*x as i128),
        Value::Ulong(x) => Some(*x as i128),
        _ => None,
    }
}

fn cast(ty: &str, v: Value) -> Result<Value, ParseError> {
    let shown = v.to_string();
    let out = match ty {
        "ubyte" => int_of(&v).and_then(|x| u8::try_from(x).ok()).map(Value::Ubyte),
        "ushort" => int_of(&v).and_then(|x| u16::try_from(x).ok()).map(Value::Ushort),
        "uint" => int_of(&v).and_then(|x| u32::try_from(x).ok()).map(Value::Uint),
        "ulong" => int_of(&v).and_then(|x| u64::try_from(x).ok()).map(Value::Ulong),
        "byte" => int_of(&v).and_then(|x| i8::try_from(x).ok()).map(Value::Byte),
        "short" => int_of(&v).and_then(|x| i16::try_from(x).ok()).map(Value::Short),
        "int" => int_of(&v).and_then(|x| i32::try_from(x).ok()).map(Value::Int),
        "long" => int_of(&v).and_then(|x| i64::try_from(x).ok()).map(Value::Long),
        "timestamp" => int_of(&v).and_then(|x| i64::try_from(x).ok()).map(Value::Timestamp),
        "decimal32" => int_of(&v).and_then(|x| u32::try_from(x).ok()).map(Value::Decimal32),
        "decimal64" => int_of(&v).and_then(|x| u64::try_from(x).ok()).map(Value::Decimal64),
        "decimal128" => match &v {
            Value::Binary(b) => <[u8; 16]>::try_from(b.as_slice()).ok().map(Value::Decimal128),
            _ => None,
        },
        "float" => match &v {
            Value::Double(x) => Some(Value::Float(*x as f32)),
            Value::Long(x) => Some(Value::Float(*x as f32)),
            Value::String(s) => s.parse().ok().map(Value::Float),
            _ => None,
        },
        "double" => match &v {
            Value::Double(x) => Some(Value::Double(*x)),
            Value::Long(x) => Some(Value::Double(*x as f64)),
            Value::String(s) => s.parse().ok().map(Value::Double),
            _ => None,
        },
        "char" => match &v {
            Value::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Value::Char(c)),
                    _ => None,
                }
            }
            _ => None,
        },
        "uuid" => match &v {
            Value::String(s) => parse_uuid(s).map(Value::Uuid),
            _ => None,
        },
        "array" => match v {
            Value::List(items) => Some(Value::Array(items)),
            _ => None,
        },
        "symbol" => match v {
            Value::String(s) => Some(Value::Symbol(s)),
            _ => None,
        },
        "binary" => match v {
            Value::String(s) => Some(Value::Binary(s.into_bytes())),
            _ => None,
        },
        _ => return Err(ParseError::UnknownType(ty.to_string())),
    };
    out.ok_or_else(|| ParseError::Literal(format!("({}){}", ty, shown)))
}

fn parse_uuid(s: &str) -> Option<[u8; 16]> {
    let hex: String = s.chars().filter(|c| *c != '-').collect();
    if hex.len() != 32 {
        return None;
    }
    let mut out = [0u8; 16];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = u8::from_str_radix(hex.get(2 * i..2 * i + 2)?, 16).ok()?;
    }
    Some(out)
}

enum Piece {
    Char(char),
    Byte(u8),
}

/// Resolve backslash escapes. `\xHH` yields a raw byte; everything else yields a char.
fn unescape_into(s: &str, mut emit: impl FnMut(Piece)) -> Result<(), ParseError> {
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            emit(Piece::Char(c));
            continue;
        }
        match chars.next() {
            Some('n') => emit(Piece::Char('\n')),
            Some('r') => emit(Piece::Char('\r')),
            Some('t') => emit(Piece::Char('\t')),
            Some('0') => emit(Piece::Char('\0')),
            Some('\\') => emit(Piece::Char('\\')),
            Some('"') => emit(Piece::Char('"')),
            Some('x') => {
                let digits: String = chars.by_ref().take(2).collect();
                let b = u8::from_str_radix(&digits, 16)
                    .map_err(|_| ParseError::Literal(format!("bad escape \\x{}", digits)))?;
                emit(Piece::Byte(b));
            }
            Some(other) => return Err(ParseError::Literal(format!("bad escape \\{}", other))),
            None => return Err(ParseError::Literal("dangling backslash".to_string())),
        }
    }
    Ok(())
}

fn unescape(s: &str) -> Result<String, ParseError> {
    let mut out = String::with_capacity(s.len());
    unescape_into(s, |piece| match piece {
        Piece::Char(c) => out.push(c),
        Piece::Byte(b) => out.push(b as char),
    })?;
    Ok(out)
}

fn unescape_bytes(s: &str) -> Result<Vec<u8>, ParseError> {
    let mut out = Vec::with_capacity(s.len());
    unescape_into(s, |piece| match piece {
        Piece::Char(c) => {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
        Piece::Byte(b) => out.push(b),
    })?;
    Ok(out)
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if (c as u32) < 0x20 || c == '\x7f' => write!(f, "\\x{:02x}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

fn write_binary(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    f.write_str("b\"")?;
    for &b in bytes {
        match b {
            b'"' => f.write_str("\\\"")?,
            b'\\' => f.write_str("\\\\")?,
            0x20..=0x7e => f.write_char(b as char)?,
            _ => write!(f, "\\x{:02x}", b)?,
        }
    }
    f.write_char('"')
}

fn is_bare_symbol(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | '$' | ':'))
}

fn write_seq<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl IntoIterator<Item = &'a Value>,
) -> fmt::Result {
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Ubyte(x) => write!(f, "(ubyte){}", x),
            Value::Ushort(x) => write!(f, "(ushort){}", x),
            Value::Uint(x) => write!(f, "(uint){}", x),
            Value::Ulong(x) => write!(f, "0x{:x}", x),
            Value::Byte(x) => write!(f, "(byte){}", x),
            Value::Short(x) => write!(f, "(short){}", x),
            Value::Int(x) => write!(f, "(int){}", x),
            Value::Long(x) => write!(f, "{}", x),
            Value::Float(x) if x.is_finite() => write!(f, "(float){:?}", x),
            Value::Float(x) => write!(f, "(float)\"{}\"", x),
            Value::Double(x) if x.is_finite() => write!(f, "{:?}", x),
            Value::Double(x) => write!(f, "(double)\"{}\"", x),
            Value::Decimal32(x) => write!(f, "(decimal32)0x{:x}", x),
            Value::Decimal64(x) => write!(f, "(decimal64)0x{:x}", x),
            Value::Decimal128(b) => {
                f.write_str("(decimal128)")?;
                write_binary(f, b)
            }
            Value::Char(c) => {
                f.write_str("(char)")?;
                write_quoted(f, c.encode_utf8(&mut [0u8; 4]))
            }
            Value::Timestamp(x) => write!(f, "(timestamp){}", x),
            Value::Uuid(b) => {
                f.write_str("(uuid)\"")?;
                for (i, byte) in b.iter().enumerate() {
                    if matches!(i, 4 | 6 | 8 | 10) {
                        f.write_char('-')?;
                    }
                    write!(f, "{:02x}", byte)?;
                }
                f.write_char('"')
            }
            Value::Binary(b) => write_binary(f, b),
            Value::String(s) => write_quoted(f, s),
            Value::Symbol(s) if is_bare_symbol(s) => write!(f, ":{}", s),
            Value::Symbol(s) => {
                f.write_char(':')?;
                write_quoted(f, s)
            }
            Value::Described(descriptor, value) => write!(f, "@{} {}", descriptor, value),
            Value::List(items) => {
                f.write_char('[')?;
                write_seq(f, items)?;
                f.write_char(']')
            }
            Value::Map(pairs) => {
                f.write_char('{')?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                f.write_char('}')
            }
            Value::Array(items) => {
                f.write_str("(array)[")?;
                write_seq(f, items)?;
                f.write_char(']')
            }
        }
    }
}
