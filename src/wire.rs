//! Message encode/decode over the AMQP 1.0 wire format.
//!
//! On the wire a message is a run of concatenated values: the header section, the properties
//! section, then body sections. Decoding takes one value at a time, classifies it by its
//! descriptor and either scans it into fields (header, properties) or keeps it verbatim as a
//! body section. Encoding writes the two fixed sections followed by every section payload,
//! in order, into one bounded buffer.
//!
//! Neither direction is atomic: when a call fails, fields and sections written earlier in the
//! same call keep their new values.

use crate::codec;
use crate::data::Data;
use crate::error::MessageError;
use crate::message::{set_bytes, set_text, Format, Message};
use crate::protocol;
use crate::section::data_section;
use crate::value::Value;
use tracing::{debug, trace};

impl Message {
    /// Decode `bytes` into this message.
    ///
    /// Header and properties values update the fields. The k-th body value of the input
    /// replaces the payload of the k-th section, creating sections as needed.
    pub fn decode(&mut self, format: Format, bytes: &[u8]) -> Result<(), MessageError> {
        if format != Format::Amqp {
            return Err(MessageError::Argument("unsupported format"));
        }
        if bytes.is_empty() {
            return Err(MessageError::Argument("empty input"));
        }

        let mut offset = 0;
        let mut body_index = 0;
        // One budget for the whole message, so many small items cannot each claim the limit.
        let mut zero_width_left = codec::MAX_ZERO_WIDTH_ELEMENTS;
        while offset < bytes.len() {
            self.scratch.clear();
            let consumed = self.scratch.decode_within(&bytes[offset..], &mut zero_width_left)?;
            let descriptor = self.scratch.descriptor();
            trace!(offset, consumed, descriptor, "decoded item");
            offset += consumed;

            match descriptor {
                protocol::HEADER => self.scan_header()?,
                protocol::PROPERTIES => self.scan_properties()?,
                _ => {
                    self.stash_body(body_index);
                    body_index += 1;
                }
            }
        }

        debug!(bytes = bytes.len(), body_sections = body_index, "decoded message");
        self.scratch.clear();
        Ok(())
    }

    /// Encode this message into `dst`. Returns the number of bytes written.
    ///
    /// Fails with [`MessageError::Overflow`] when `dst` cannot hold the whole message; there is
    /// no partial mode, the caller retries with a larger buffer.
    pub fn encode(&mut self, format: Format, dst: &mut [u8]) -> Result<usize, MessageError> {
        if format != Format::Amqp {
            return Err(MessageError::Argument("unsupported format"));
        }
        if dst.is_empty() {
            return Err(MessageError::Argument("empty output buffer"));
        }

        self.fill_scratch();
        let mut written = self.scratch.encode(dst)?;
        for section in &self.sections {
            written += section.encode(&mut dst[written..])?;
        }

        debug!(bytes = written, sections = self.sections.len(), "encoded message");
        Ok(written)
    }

    /// Encode this message into a new buffer sized to fit.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>, MessageError> {
        self.fill_scratch();
        let mut out = Vec::new();
        self.scratch.encode_into(&mut out)?;
        for section in &self.sections {
            if let Some(payload) = section.payload() {
                payload.encode_into(&mut out)?;
            }
        }
        Ok(out)
    }

    /// `[durable, priority, ttl, first-acquirer, delivery-count]`; missing or null slots keep
    /// the current value.
    fn scan_header(&mut self) -> Result<(), MessageError> {
        let mut f = self.scratch.described_fields("header")?;
        let durable = f.next_bool()?;
        let priority = f.next_ubyte()?;
        let ttl = f.next_uint()?;
        let first_acquirer = f.next_bool()?;
        let delivery_count = f.next_uint()?;

        if let Some(v) = durable {
            self.durable = v;
        }
        if let Some(v) = priority {
            self.priority = v;
        }
        if let Some(v) = ttl {
            self.ttl = v;
        }
        if let Some(v) = first_acquirer {
            self.first_acquirer = v;
        }
        if let Some(v) = delivery_count {
            self.delivery_count = v;
        }
        Ok(())
    }

    /// The 13 properties slots. message-id (0) and correlation-id (5) are not read; missing or
    /// null slots reset the field to its default.
    fn scan_properties(&mut self) -> Result<(), MessageError> {
        let mut f = self.scratch.described_fields("properties")?;
        f.skip();
        let user_id = f.next_binary()?;
        let address = f.next_text()?;
        let subject = f.next_text()?;
        let reply_to = f.next_text()?;
        f.skip();
        let content_type = f.next_text()?;
        let content_encoding = f.next_text()?;
        let expiry_time = f.next_timestamp()?;
        let creation_time = f.next_timestamp()?;
        let group_id = f.next_text()?;
        let group_sequence = f.next_int()?;
        let reply_to_group_id = f.next_text()?;

        set_bytes(&mut self.user_id, user_id.unwrap_or_default());
        set_text(&mut self.address, address);
        set_text(&mut self.subject, subject);
        set_text(&mut self.reply_to, reply_to);
        set_text(&mut self.content_type, content_type);
        set_text(&mut self.content_encoding, content_encoding);
        self.expiry_time = expiry_time.unwrap_or(0);
        self.creation_time = creation_time.unwrap_or(0);
        set_text(&mut self.group_id, group_id);
        self.group_sequence = group_sequence.unwrap_or(0);
        set_text(&mut self.reply_to_group_id, reply_to_group_id);
        Ok(())
    }

    /// Move the decoded scratch tree into section `index`; its old payload, emptied, becomes
    /// the next scratch tree.
    fn stash_body(&mut self, index: usize) {
        if self.sections.len() <= index {
            self.create_section();
        }
        let decoded = std::mem::take(&mut self.scratch);
        let previous = self.sections[index].payload.replace(decoded);
        self.scratch = previous.map(Data::cleared).unwrap_or_default();
    }

    fn fill_scratch(&mut self) {
        self.scratch.clear();
        self.scratch.push(Value::described(
            protocol::HEADER,
            Value::List(vec![
                Value::Bool(self.durable),
                Value::Ubyte(self.priority),
                Value::Uint(self.ttl),
                Value::Bool(self.first_acquirer),
                Value::Uint(self.delivery_count),
            ]),
        ));

        let mut properties = Vec::with_capacity(protocol::PROPERTIES_SLOTS);
        properties.push(Value::Null);
        properties.push(if self.user_id.is_empty() {
            Value::Null
        } else {
            Value::Binary(self.user_id.clone())
        });
        properties.push(string_or_null(&self.address));
        properties.push(string_or_null(&self.subject));
        properties.push(string_or_null(&self.reply_to));
        properties.push(Value::Null);
        properties.push(symbol_or_null(&self.content_type));
        properties.push(symbol_or_null(&self.content_encoding));
        properties.push(Value::Timestamp(self.expiry_time));
        properties.push(Value::Timestamp(self.creation_time));
        properties.push(string_or_null(&self.group_id));
        // sequence-no is a uint on the wire; the field keeps its bit pattern.
        properties.push(Value::Uint(self.group_sequence as u32));
        properties.push(string_or_null(&self.reply_to_group_id));
        self.scratch.push(Value::described(protocol::PROPERTIES, Value::List(properties)));
    }
}

fn string_or_null(s: &str) -> Value {
    if s.is_empty() {
        Value::Null
    } else {
        Value::String(s.to_string())
    }
}

fn symbol_or_null(s: &str) -> Value {
    if s.is_empty() {
        Value::Null
    } else {
        Value::Symbol(s.to_string())
    }
}

/// Encode one `data` body section carrying `payload` into `dst`. Returns the bytes written.
pub fn encode_data_section(dst: &mut [u8], payload: &[u8]) -> Result<usize, MessageError> {
    Ok(Data::from(vec![data_section(payload)]).encode(dst)?)
}
