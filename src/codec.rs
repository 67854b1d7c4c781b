//! Encode/decode AMQP 1.0 self-describing values.
//!
//! Every value starts with a one-byte constructor (format code) followed by its payload in
//! network byte order. A constructor of `0x00` introduces a described value: descriptor first,
//! then the described value. Compound values (list, map, array) carry a size and a count so
//! a reader always knows how many bytes one item consumes.
//!
//! Encoding picks the most compact form (`uint0`, `smalluint`, `list0`, `list8`, ...). Array
//! elements share one wide constructor and must all have the same type.

use crate::value::Value;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read};

/// Format codes.
mod fc {
    pub const DESCRIBED: u8 = 0x00;
    pub const NULL: u8 = 0x40;
    pub const TRUE: u8 = 0x41;
    pub const FALSE: u8 = 0x42;
    pub const UINT0: u8 = 0x43;
    pub const ULONG0: u8 = 0x44;
    pub const LIST0: u8 = 0x45;
    pub const UBYTE: u8 = 0x50;
    pub const BYTE: u8 = 0x51;
    pub const SMALLUINT: u8 = 0x52;
    pub const SMALLULONG: u8 = 0x53;
    pub const SMALLINT: u8 = 0x54;
    pub const SMALLLONG: u8 = 0x55;
    pub const BOOLEAN: u8 = 0x56;
    pub const USHORT: u8 = 0x60;
    pub const SHORT: u8 = 0x61;
    pub const UINT: u8 = 0x70;
    pub const INT: u8 = 0x71;
    pub const FLOAT: u8 = 0x72;
    pub const CHAR: u8 = 0x73;
    pub const DECIMAL32: u8 = 0x74;
    pub const ULONG: u8 = 0x80;
    pub const LONG: u8 = 0x81;
    pub const DOUBLE: u8 = 0x82;
    pub const TIMESTAMP: u8 = 0x83;
    pub const DECIMAL64: u8 = 0x84;
    pub const DECIMAL128: u8 = 0x94;
    pub const UUID: u8 = 0x98;
    pub const VBIN8: u8 = 0xa0;
    pub const STR8: u8 = 0xa1;
    pub const SYM8: u8 = 0xa3;
    pub const VBIN32: u8 = 0xb0;
    pub const STR32: u8 = 0xb1;
    pub const SYM32: u8 = 0xb3;
    pub const LIST8: u8 = 0xc0;
    pub const MAP8: u8 = 0xc1;
    pub const LIST32: u8 = 0xd0;
    pub const MAP32: u8 = 0xd1;
    pub const ARRAY8: u8 = 0xe0;
    pub const ARRAY32: u8 = 0xf0;
}

/// Deepest nesting of described/compound values accepted on decode.
pub const MAX_DEPTH: usize = 64;

/// Most array elements occupying no bytes (null, true, uint0, ...) accepted by one decode,
/// summed over all its arrays.
pub const MAX_ZERO_WIDTH_ELEMENTS: u64 = 1 << 16;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid constructor: 0x{0:02x}")]
    InvalidConstructor(u8),
    #[error("Truncated: {needed} bytes needed, {available} available")]
    Truncated { needed: usize, available: usize },
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("Malformed: {0}")]
    Malformed(String),
    #[error("Type mismatch in {context} slot {position}: expected {expected}, found {found}")]
    TypeMismatch {
        context: &'static str,
        position: usize,
        expected: &'static str,
        found: &'static str,
    },
    #[error("Overflow: {required} bytes required, {available} available")]
    Overflow { required: usize, available: usize },
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Decode exactly one value from the front of `bytes`. Returns the value and the number of
/// bytes it occupied, which may be less than `bytes.len()`.
pub fn decode_one(bytes: &[u8]) -> Result<(Value, usize), CodecError> {
    let mut zero_width_left = MAX_ZERO_WIDTH_ELEMENTS;
    decode_one_within(bytes, &mut zero_width_left)
}

/// [`decode_one`] drawing zero-width array elements from a budget shared with other calls.
pub(crate) fn decode_one_within(
    bytes: &[u8],
    zero_width_left: &mut u64,
) -> Result<(Value, usize), CodecError> {
    let mut cursor = Cursor::new(bytes);
    let value = decode_value(&mut cursor, 0, zero_width_left)?;
    Ok((value, cursor.position() as usize))
}

/// Encode one value (constructor included) at the end of `w`. Values nested deeper than
/// [`MAX_DEPTH`] are rejected, since they could not be decoded again.
pub fn encode_value(w: &mut Vec<u8>, v: &Value) -> Result<(), CodecError> {
    encode_value_at(w, v, 0)
}

fn check_depth(depth: usize) -> Result<(), CodecError> {
    if depth > MAX_DEPTH {
        return Err(CodecError::Malformed(format!("nesting deeper than {}", MAX_DEPTH)));
    }
    Ok(())
}

fn encode_value_at(w: &mut Vec<u8>, v: &Value, depth: usize) -> Result<(), CodecError> {
    check_depth(depth)?;
    match v {
        Value::Null => w.write_u8(fc::NULL)?,
        Value::Bool(true) => w.write_u8(fc::TRUE)?,
        Value::Bool(false) => w.write_u8(fc::FALSE)?,
        Value::Ubyte(x) => {
            w.write_u8(fc::UBYTE)?;
            w.write_u8(*x)?;
        }
        Value::Ushort(x) => {
            w.write_u8(fc::USHORT)?;
            w.write_u16::<BigEndian>(*x)?;
        }
        Value::Uint(0) => w.write_u8(fc::UINT0)?,
        Value::Uint(x) => match u8::try_from(*x) {
            Ok(small) => {
                w.write_u8(fc::SMALLUINT)?;
                w.write_u8(small)?;
            }
            Err(_) => {
                w.write_u8(fc::UINT)?;
                w.write_u32::<BigEndian>(*x)?;
            }
        },
        Value::Ulong(0) => w.write_u8(fc::ULONG0)?,
        Value::Ulong(x) => match u8::try_from(*x) {
            Ok(small) => {
                w.write_u8(fc::SMALLULONG)?;
                w.write_u8(small)?;
            }
            Err(_) => {
                w.write_u8(fc::ULONG)?;
                w.write_u64::<BigEndian>(*x)?;
            }
        },
        Value::Byte(x) => {
            w.write_u8(fc::BYTE)?;
            w.write_i8(*x)?;
        }
        Value::Short(x) => {
            w.write_u8(fc::SHORT)?;
            w.write_i16::<BigEndian>(*x)?;
        }
        Value::Int(x) => match i8::try_from(*x) {
            Ok(small) => {
                w.write_u8(fc::SMALLINT)?;
                w.write_i8(small)?;
            }
            Err(_) => {
                w.write_u8(fc::INT)?;
                w.write_i32::<BigEndian>(*x)?;
            }
        },
        Value::Long(x) => match i8::try_from(*x) {
            Ok(small) => {
                w.write_u8(fc::SMALLLONG)?;
                w.write_i8(small)?;
            }
            Err(_) => {
                w.write_u8(fc::LONG)?;
                w.write_i64::<BigEndian>(*x)?;
            }
        },
        Value::Described(descriptor, value) => {
            w.write_u8(fc::DESCRIBED)?;
            encode_value_at(w, descriptor, depth + 1)?;
            encode_value_at(w, value, depth + 1)?;
        }
        Value::List(items) if items.is_empty() => w.write_u8(fc::LIST0)?,
        Value::List(items) => {
            let mut body = Vec::new();
            for item in items {
                encode_value_at(&mut body, item, depth + 1)?;
            }
            write_compound(w, fc::LIST8, fc::LIST32, items.len(), &[], &body)?;
        }
        Value::Map(pairs) => {
            let mut body = Vec::new();
            for (k, v) in pairs {
                encode_value_at(&mut body, k, depth + 1)?;
                encode_value_at(&mut body, v, depth + 1)?;
            }
            write_compound(w, fc::MAP8, fc::MAP32, pairs.len() * 2, &[], &body)?;
        }
        Value::Array(items) => {
            let (ctor, body) = encode_array(items, depth)?;
            write_compound(w, fc::ARRAY8, fc::ARRAY32, items.len(), &[ctor], &body)?;
        }
        other => {
            // Remaining types have one fixed-width or variable-width form shared with arrays.
            let ctor = match other {
                Value::Binary(b) if b.len() <= u8::MAX as usize => fc::VBIN8,
                Value::String(s) if s.len() <= u8::MAX as usize => fc::STR8,
                Value::Symbol(s) if s.len() <= u8::MAX as usize => fc::SYM8,
                _ => element_constructor(other)?,
            };
            w.write_u8(ctor)?;
            encode_element(w, ctor, other, depth)?;
        }
    }
    Ok(())
}

/// `zero_width_left` is what remains of the call's [`MAX_ZERO_WIDTH_ELEMENTS`] budget.
fn decode_value(
    r: &mut Cursor<&[u8]>,
    depth: usize,
    zero_width_left: &mut u64,
) -> Result<Value, CodecError> {
    check_depth(depth)?;
    let code = r.read_u8()?;
    if code == fc::DESCRIBED {
        let descriptor = decode_value(r, depth + 1, zero_width_left)?;
        let value = decode_value(r, depth + 1, zero_width_left)?;
        return Ok(Value::Described(Box::new(descriptor), Box::new(value)));
    }
    decode_body(r, code, depth, zero_width_left)
}

/// Decode the payload that follows constructor `code`.
fn decode_body(
    r: &mut Cursor<&[u8]>,
    code: u8,
    depth: usize,
    zero_width_left: &mut u64,
) -> Result<Value, CodecError> {
    let v = match code {
        fc::NULL => Value::Null,
        fc::TRUE => Value::Bool(true),
        fc::FALSE => Value::Bool(false),
        fc::BOOLEAN => match r.read_u8()? {
            0 => Value::Bool(false),
            1 => Value::Bool(true),
            b => return Err(CodecError::Malformed(format!("boolean byte 0x{:02x}", b))),
        },
        fc::UBYTE => Value::Ubyte(r.read_u8()?),
        fc::USHORT => Value::Ushort(r.read_u16::<BigEndian>()?),
        fc::UINT => Value::Uint(r.read_u32::<BigEndian>()?),
        fc::SMALLUINT => Value::Uint(r.read_u8()? as u32),
        fc::UINT0 => Value::Uint(0),
        fc::ULONG => Value::Ulong(r.read_u64::<BigEndian>()?),
        fc::SMALLULONG => Value::Ulong(r.read_u8()? as u64),
        fc::ULONG0 => Value::Ulong(0),
        fc::BYTE => Value::Byte(r.read_i8()?),
        fc::SHORT => Value::Short(r.read_i16::<BigEndian>()?),
        fc::INT => Value::Int(r.read_i32::<BigEndian>()?),
        fc::SMALLINT => Value::Int(r.read_i8()? as i32),
        fc::LONG => Value::Long(r.read_i64::<BigEndian>()?),
        fc::SMALLLONG => Value::Long(r.read_i8()? as i64),
        fc::FLOAT => Value::Float(r.read_f32::<BigEndian>()?),
        fc::DOUBLE => Value::Double(r.read_f64::<BigEndian>()?),
        fc::DECIMAL32 => Value::Decimal32(r.read_u32::<BigEndian>()?),
        fc::DECIMAL64 => Value::Decimal64(r.read_u64::<BigEndian>()?),
        fc::DECIMAL128 => {
            let mut b = [0u8; 16];
            r.read_exact(&mut b)?;
            Value::Decimal128(b)
        }
        fc::CHAR => {
            let c = r.read_u32::<BigEndian>()?;
            let c = char::from_u32(c)
                .ok_or_else(|| CodecError::Malformed(format!("invalid char 0x{:x}", c)))?;
            Value::Char(c)
        }
        fc::TIMESTAMP => Value::Timestamp(r.read_i64::<BigEndian>()?),
        fc::UUID => {
            let mut b = [0u8; 16];
            r.read_exact(&mut b)?;
            Value::Uuid(b)
        }
        fc::VBIN8 | fc::VBIN32 => {
            let n = read_width(r, code == fc::VBIN32)?;
            Value::Binary(read_bytes(r, n)?)
        }
        fc::STR8 | fc::STR32 => {
            let n = read_width(r, code == fc::STR32)?;
            Value::String(String::from_utf8(read_bytes(r, n)?)?)
        }
        fc::SYM8 | fc::SYM32 => {
            let n = read_width(r, code == fc::SYM32)?;
            Value::Symbol(String::from_utf8(read_bytes(r, n)?)?)
        }
        fc::LIST0 => Value::List(Vec::new()),
        fc::LIST8 | fc::LIST32 => {
            let (count, end) = read_compound_header(r, code == fc::LIST32)?;
            check_count(count, end.saturating_sub(r.position()))?;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(decode_value(r, depth + 1, zero_width_left)?);
            }
            expect_end(r, end, "list")?;
            Value::List(items)
        }
        fc::MAP8 | fc::MAP32 => {
            let (count, end) = read_compound_header(r, code == fc::MAP32)?;
            check_count(count, end.saturating_sub(r.position()))?;
            if count % 2 != 0 {
                return Err(CodecError::Malformed(format!("map with odd element count {}", count)));
            }
            let mut pairs = Vec::with_capacity(count / 2);
            for _ in 0..count / 2 {
                let k = decode_value(r, depth + 1, zero_width_left)?;
                let v = decode_value(r, depth + 1, zero_width_left)?;
                pairs.push((k, v));
            }
            expect_end(r, end, "map")?;
            Value::Map(pairs)
        }
        fc::ARRAY8 | fc::ARRAY32 => {
            let (count, end) = read_compound_header(r, code == fc::ARRAY32)?;
            let ctor = r.read_u8()?;
            if ctor == fc::DESCRIBED {
                return Err(CodecError::Unsupported("described array elements".to_string()));
            }
            if is_zero_width(ctor) {
                check_count(count, *zero_width_left)?;
                *zero_width_left -= count as u64;
            } else {
                check_count(count, end.saturating_sub(r.position()))?;
            }
            check_depth(depth + 1)?;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(decode_body(r, ctor, depth + 1, zero_width_left)?);
            }
            expect_end(r, end, "array")?;
            Value::Array(items)
        }
        other => return Err(CodecError::InvalidConstructor(other)),
    };
    Ok(v)
}

fn remaining(r: &Cursor<&[u8]>) -> usize {
    r.get_ref().len().saturating_sub(r.position() as usize)
}

fn read_width(r: &mut Cursor<&[u8]>, wide: bool) -> Result<usize, CodecError> {
    Ok(if wide {
        r.read_u32::<BigEndian>()? as usize
    } else {
        r.read_u8()? as usize
    })
}

fn read_bytes(r: &mut Cursor<&[u8]>, n: usize) -> Result<Vec<u8>, CodecError> {
    let available = remaining(r);
    if n > available {
        return Err(CodecError::Truncated { needed: n, available });
    }
    let mut buf = vec![0u8; n];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

/// Read the size and count of a compound. Returns the count and the position where the
/// compound must end.
fn read_compound_header(r: &mut Cursor<&[u8]>, wide: bool) -> Result<(usize, u64), CodecError> {
    let width = if wide { 4 } else { 1 };
    let size = read_width(r, wide)?;
    let available = remaining(r);
    if size > available {
        return Err(CodecError::Truncated { needed: size, available });
    }
    if size < width {
        return Err(CodecError::Malformed(format!("compound size {} smaller than its count", size)));
    }
    let end = r.position() + size as u64;
    let count = read_width(r, wide)?;
    Ok((count, end))
}

/// Reject a declared element count above `limit` before allocating for it. For most compounds
/// the limit is the bytes left, since every element takes at least one.
fn check_count(count: usize, limit: u64) -> Result<(), CodecError> {
    if count as u64 > limit {
        return Err(CodecError::Malformed(format!("count {} exceeds limit {}", count, limit)));
    }
    Ok(())
}

fn is_zero_width(ctor: u8) -> bool {
    matches!(ctor, fc::NULL | fc::TRUE | fc::FALSE | fc::UINT0 | fc::ULONG0 | fc::LIST0)
}

fn expect_end(r: &Cursor<&[u8]>, end: u64, what: &str) -> Result<(), CodecError> {
    if r.position() != end {
        return Err(CodecError::Malformed(format!(
            "{} size mismatch: declared end {}, decoded to {}",
            what,
            end,
            r.position()
        )));
    }
    Ok(())
}

fn len_u32(n: usize) -> Result<u32, CodecError> {
    u32::try_from(n).map_err(|_| CodecError::Malformed(format!("length {} exceeds 32 bits", n)))
}

/// Write a compound: the short form when size and count fit in a byte, else the wide form.
/// `prefix` sits between count and body (the array element constructor).
fn write_compound(
    w: &mut Vec<u8>,
    short: u8,
    wide: u8,
    count: usize,
    prefix: &[u8],
    body: &[u8],
) -> Result<(), CodecError> {
    let content = prefix.len() + body.len();
    if content < u8::MAX as usize && count <= u8::MAX as usize {
        w.write_u8(short)?;
        w.write_u8((content + 1) as u8)?;
        w.write_u8(count as u8)?;
    } else {
        w.write_u8(wide)?;
        w.write_u32::<BigEndian>(len_u32(content + 4)?)?;
        w.write_u32::<BigEndian>(len_u32(count)?)?;
    }
    w.extend_from_slice(prefix);
    w.extend_from_slice(body);
    Ok(())
}

/// Element constructor and payload of an array sitting at `depth`.
fn encode_array(items: &[Value], depth: usize) -> Result<(u8, Vec<u8>), CodecError> {
    let Some(first) = items.first() else {
        return Ok((fc::NULL, Vec::new()));
    };
    let ctor = element_constructor(first)?;
    let mut body = Vec::new();
    for item in items {
        if std::mem::discriminant(item) != std::mem::discriminant(first) {
            return Err(CodecError::Malformed(format!(
                "array mixes {} and {}",
                first.type_name(),
                item.type_name()
            )));
        }
        encode_element(&mut body, ctor, item, depth + 1)?;
    }
    Ok((ctor, body))
}

/// Wide constructor used for a value inside an array.
fn element_constructor(v: &Value) -> Result<u8, CodecError> {
    Ok(match v {
        Value::Null => fc::NULL,
        Value::Bool(_) => fc::BOOLEAN,
        Value::Ubyte(_) => fc::UBYTE,
        Value::Ushort(_) => fc::USHORT,
        Value::Uint(_) => fc::UINT,
        Value::Ulong(_) => fc::ULONG,
        Value::Byte(_) => fc::BYTE,
        Value::Short(_) => fc::SHORT,
        Value::Int(_) => fc::INT,
        Value::Long(_) => fc::LONG,
        Value::Float(_) => fc::FLOAT,
        Value::Double(_) => fc::DOUBLE,
        Value::Decimal32(_) => fc::DECIMAL32,
        Value::Decimal64(_) => fc::DECIMAL64,
        Value::Decimal128(_) => fc::DECIMAL128,
        Value::Char(_) => fc::CHAR,
        Value::Timestamp(_) => fc::TIMESTAMP,
        Value::Uuid(_) => fc::UUID,
        Value::Binary(_) => fc::VBIN32,
        Value::String(_) => fc::STR32,
        Value::Symbol(_) => fc::SYM32,
        Value::List(_) => fc::LIST32,
        Value::Map(_) => fc::MAP32,
        Value::Array(_) => fc::ARRAY32,
        Value::Described(..) => {
            return Err(CodecError::Unsupported("described array elements".to_string()))
        }
    })
}

/// Write the payload of `v` for constructor `ctor` (no constructor byte).
fn encode_element(w: &mut Vec<u8>, ctor: u8, v: &Value, depth: usize) -> Result<(), CodecError> {
    check_depth(depth)?;
    match v {
        Value::Null => {}
        Value::Bool(b) => w.write_u8(*b as u8)?,
        Value::Ubyte(x) => w.write_u8(*x)?,
        Value::Ushort(x) => w.write_u16::<BigEndian>(*x)?,
        Value::Uint(x) => w.write_u32::<BigEndian>(*x)?,
        Value::Ulong(x) => w.write_u64::<BigEndian>(*x)?,
        Value::Byte(x) => w.write_i8(*x)?,
        Value::Short(x) => w.write_i16::<BigEndian>(*x)?,
        Value::Int(x) => w.write_i32::<BigEndian>(*x)?,
        Value::Long(x) => w.write_i64::<BigEndian>(*x)?,
        Value::Float(x) => w.write_f32::<BigEndian>(*x)?,
        Value::Double(x) => w.write_f64::<BigEndian>(*x)?,
        Value::Decimal32(x) => w.write_u32::<BigEndian>(*x)?,
        Value::Decimal64(x) => w.write_u64::<BigEndian>(*x)?,
        Value::Decimal128(b) | Value::Uuid(b) => w.extend_from_slice(b),
        Value::Char(c) => w.write_u32::<BigEndian>(*c as u32)?,
        Value::Timestamp(x) => w.write_i64::<BigEndian>(*x)?,
        Value::Binary(b) => write_variable(w, ctor, b)?,
        Value::String(s) | Value::Symbol(s) => write_variable(w, ctor, s.as_bytes())?,
        Value::List(items) => {
            let mut body = Vec::new();
            for item in items {
                encode_value_at(&mut body, item, depth + 1)?;
            }
            write_wide_header(w, body.len(), items.len())?;
            w.extend_from_slice(&body);
        }
        Value::Map(pairs) => {
            let mut body = Vec::new();
            for (k, v) in pairs {
                encode_value_at(&mut body, k, depth + 1)?;
                encode_value_at(&mut body, v, depth + 1)?;
            }
            write_wide_header(w, body.len(), pairs.len() * 2)?;
            w.extend_from_slice(&body);
        }
        Value::Array(items) => {
            let (inner, body) = encode_array(items, depth)?;
            write_wide_header(w, body.len() + 1, items.len())?;
            w.write_u8(inner)?;
            w.extend_from_slice(&body);
        }
        Value::Described(..) => {
            return Err(CodecError::Unsupported("described array elements".to_string()))
        }
    }
    Ok(())
}

fn write_variable(w: &mut Vec<u8>, ctor: u8, bytes: &[u8]) -> Result<(), CodecError> {
    match ctor {
        fc::VBIN8 | fc::STR8 | fc::SYM8 => w.write_u8(bytes.len() as u8)?,
        _ => w.write_u32::<BigEndian>(len_u32(bytes.len())?)?,
    }
    w.extend_from_slice(bytes);
    Ok(())
}

fn write_wide_header(w: &mut Vec<u8>, content: usize, count: usize) -> Result<(), CodecError> {
    w.write_u32::<BigEndian>(len_u32(content + 4)?)?;
    w.write_u32::<BigEndian>(len_u32(count)?)?;
    Ok(())
}
