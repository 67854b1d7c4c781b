//! `Data`: an ordered list of top-level values, used as decode staging area, encode assembly
//! area and section payload.
//!
//! [`Fields`] scans the positional slots of a described list (the shape of the header and
//! properties sections). Scanning is non-strict: missing trailing slots and nulls read as
//! `None`, only a present value of the wrong type is an error.

use crate::codec::{self, CodecError};
use crate::value::Value;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Data {
    items: Vec<Value>,
}

impl Data {
    pub fn new() -> Self {
        Data::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Data { items: Vec::with_capacity(n) }
    }

    /// Remove all values, keeping the allocation.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// `self`, emptied, for reuse as a fresh staging area.
    pub fn cleared(mut self) -> Self {
        self.clear();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn push(&mut self, value: Value) {
        self.items.push(value);
    }

    /// Decode one value from the front of `bytes` and append it. Returns the bytes consumed.
    pub fn decode(&mut self, bytes: &[u8]) -> Result<usize, CodecError> {
        let (value, consumed) = codec::decode_one(bytes)?;
        self.items.push(value);
        Ok(consumed)
    }

    /// [`Data::decode`] charging zero-width array elements to `zero_width_left`.
    pub(crate) fn decode_within(
        &mut self,
        bytes: &[u8],
        zero_width_left: &mut u64,
    ) -> Result<usize, CodecError> {
        let (value, consumed) = codec::decode_one_within(bytes, zero_width_left)?;
        self.items.push(value);
        Ok(consumed)
    }

    /// Append the encoding of every value to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        for item in &self.items {
            codec::encode_value(out, item)?;
        }
        Ok(())
    }

    /// Encode every value into `dst`. Fails with `Overflow` (writing nothing) when `dst` is
    /// too small; otherwise returns the bytes written.
    pub fn encode(&self, dst: &mut [u8]) -> Result<usize, CodecError> {
        let mut out = Vec::new();
        self.encode_into(&mut out)?;
        copy_bounded(&out, dst)
    }

    /// Write the text form of the values into `dst`. Returns the bytes written.
    pub fn format(&self, dst: &mut [u8]) -> Result<usize, CodecError> {
        copy_bounded(self.to_string().as_bytes(), dst)
    }

    /// Descriptor code of the first value, 0 when it is not described.
    pub fn descriptor(&self) -> u64 {
        self.items.first().and_then(Value::descriptor_code).unwrap_or(0)
    }

    /// Positional scanner over the described list held by the first value.
    pub fn described_fields(&self, context: &'static str) -> Result<Fields<'_>, CodecError> {
        let first = self
            .items
            .first()
            .ok_or_else(|| CodecError::Malformed(format!("{}: no value to scan", context)))?;
        let body = match first {
            Value::Described(_, body) => body.as_ref(),
            other => {
                return Err(CodecError::TypeMismatch {
                    context,
                    position: 0,
                    expected: "described",
                    found: other.type_name(),
                })
            }
        };
        match body {
            Value::List(items) => Ok(Fields::new(context, items)),
            other => Err(CodecError::TypeMismatch {
                context,
                position: 0,
                expected: "list",
                found: other.type_name(),
            }),
        }
    }
}

impl From<Vec<Value>> for Data {
    fn from(items: Vec<Value>) -> Self {
        Data { items }
    }
}

impl FromIterator<Value> for Data {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Data { items: iter.into_iter().collect() }
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", item)?;
        }
        Ok(())
    }
}

fn copy_bounded(src: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
    if src.len() > dst.len() {
        return Err(CodecError::Overflow { required: src.len(), available: dst.len() });
    }
    dst[..src.len()].copy_from_slice(src);
    Ok(src.len())
}

/// Positional reader over the slots of a described list.
pub struct Fields<'a> {
    context: &'static str,
    items: &'a [Value],
    position: usize,
}

impl<'a> Fields<'a> {
    fn new(context: &'static str, items: &'a [Value]) -> Self {
        Fields { context, items, position: 0 }
    }

    /// Number of slots actually present in the list.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Skip one slot without inspecting it.
    pub fn skip(&mut self) {
        self.position += 1;
    }

    pub fn next_bool(&mut self) -> Result<Option<bool>, CodecError> {
        self.take("bool", |v| match v {
            Value::Bool(b) => Some(*b),
            _ => None,
        })
    }

    pub fn next_ubyte(&mut self) -> Result<Option<u8>, CodecError> {
        self.take("ubyte", |v| match v {
            Value::Ubyte(x) => Some(*x),
            _ => None,
        })
    }

    pub fn next_uint(&mut self) -> Result<Option<u32>, CodecError> {
        self.take("uint", |v| match v {
            Value::Uint(x) => Some(*x),
            _ => None,
        })
    }

    /// 32-bit sequence number; `uint` and `int` encodings are both accepted.
    pub fn next_int(&mut self) -> Result<Option<i32>, CodecError> {
        self.take("int", |v| match v {
            Value::Int(x) => Some(*x),
            Value::Uint(x) => Some(*x as i32),
            _ => None,
        })
    }

    /// Millisecond timestamp; `timestamp`, `ulong` and `long` encodings are accepted.
    pub fn next_timestamp(&mut self) -> Result<Option<i64>, CodecError> {
        self.take("timestamp", |v| match v {
            Value::Timestamp(x) | Value::Long(x) => Some(*x),
            Value::Ulong(x) => Some(*x as i64),
            _ => None,
        })
    }

    pub fn next_binary(&mut self) -> Result<Option<&'a [u8]>, CodecError> {
        self.take("binary", Value::as_bytes)
    }

    /// String or symbol.
    pub fn next_text(&mut self) -> Result<Option<&'a str>, CodecError> {
        self.take("string", Value::as_str)
    }

    fn take<T>(
        &mut self,
        expected: &'static str,
        extract: impl Fn(&'a Value) -> Option<T>,
    ) -> Result<Option<T>, CodecError> {
        let position = self.position;
        self.position += 1;
        let items: &'a [Value] = self.items;
        match items.get(position) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => extract(v).map(Some).ok_or(CodecError::TypeMismatch {
                context: self.context,
                position,
                expected,
                found: v.type_name(),
            }),
        }
    }
}
