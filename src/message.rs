//! The message record: header and properties fields, body sections, scratch tree.
//!
//! Getters never fail; a `Message::default()` answers every getter with the field's default.
//! Text and binary fields live in owned buffers that are allocated on first write and keep
//! their capacity across [`Message::clear`].

use crate::data::Data;
use crate::protocol::DEFAULT_PRIORITY;
use crate::section::{Section, SectionId};
use crate::text::TextParser;

/// Encoding selector for message and section operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// AMQP 1.0 binary encoding.
    #[default]
    Amqp,
    /// Text notation (section load/save only).
    Text,
}

/// Message or correlation identifier.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MessageId {
    #[default]
    Null,
    Ulong(u64),
    Uuid([u8; 16]),
    Binary(Vec<u8>),
    String(String),
}

impl From<u64> for MessageId {
    fn from(id: u64) -> Self {
        MessageId::Ulong(id)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        MessageId::String(id.to_string())
    }
}

#[derive(Debug)]
pub struct Message {
    pub(crate) durable: bool,
    pub(crate) priority: u8,
    pub(crate) ttl: u32,
    pub(crate) first_acquirer: bool,
    pub(crate) delivery_count: u32,
    pub(crate) id: MessageId,
    pub(crate) user_id: Vec<u8>,
    pub(crate) address: String,
    pub(crate) subject: String,
    pub(crate) reply_to: String,
    pub(crate) correlation_id: MessageId,
    pub(crate) content_type: String,
    pub(crate) content_encoding: String,
    pub(crate) expiry_time: i64,
    pub(crate) creation_time: i64,
    pub(crate) group_id: String,
    pub(crate) group_sequence: i32,
    pub(crate) reply_to_group_id: String,

    /// Decode staging and encode assembly area.
    pub(crate) scratch: Data,
    /// Created on first use by section load or [`Message::parser`].
    pub(crate) parser: Option<TextParser>,
    pub(crate) sections: Vec<Section>,
    pub(crate) next_section_id: u64,
}

impl Default for Message {
    fn default() -> Self {
        Message {
            durable: false,
            priority: DEFAULT_PRIORITY,
            ttl: 0,
            first_acquirer: false,
            delivery_count: 0,
            id: MessageId::Null,
            user_id: Vec::new(),
            address: String::new(),
            subject: String::new(),
            reply_to: String::new(),
            correlation_id: MessageId::Null,
            content_type: String::new(),
            content_encoding: String::new(),
            expiry_time: 0,
            creation_time: 0,
            group_id: String::new(),
            group_sequence: 0,
            reply_to_group_id: String::new(),
            scratch: Data::new(),
            parser: None,
            sections: Vec::new(),
            next_section_id: 0,
        }
    }
}

/// Replace the contents of a text buffer; `None` or `""` leaves it empty.
pub(crate) fn set_text(buf: &mut String, value: Option<&str>) {
    buf.clear();
    if let Some(s) = value {
        buf.push_str(s);
    }
}

pub(crate) fn set_bytes(buf: &mut Vec<u8>, value: &[u8]) {
    buf.clear();
    buf.extend_from_slice(value);
}

fn text(buf: &str) -> Option<&str> {
    if buf.is_empty() {
        None
    } else {
        Some(buf)
    }
}

impl Message {
    pub fn new() -> Self {
        Message::default()
    }

    /// A message whose scratch tree starts with room for `n` top-level values.
    pub fn with_scratch_capacity(n: usize) -> Self {
        Message { scratch: Data::with_capacity(n), ..Message::default() }
    }

    /// Reset every field to its default. Buffers and the scratch tree are emptied but keep
    /// their allocation; sections are left alone.
    pub fn clear(&mut self) {
        self.durable = false;
        self.priority = DEFAULT_PRIORITY;
        self.ttl = 0;
        self.first_acquirer = false;
        self.delivery_count = 0;
        self.id = MessageId::Null;
        self.user_id.clear();
        self.address.clear();
        self.subject.clear();
        self.reply_to.clear();
        self.correlation_id = MessageId::Null;
        self.content_type.clear();
        self.content_encoding.clear();
        self.expiry_time = 0;
        self.creation_time = 0;
        self.group_id.clear();
        self.group_sequence = 0;
        self.reply_to_group_id.clear();
        self.scratch.clear();
    }

    /// The message's text parser, created on first access.
    pub fn parser(&mut self) -> &mut TextParser {
        self.parser.get_or_insert_with(TextParser::new)
    }

    /// Status code of the last section load: 0 when no parser exists or the last load worked.
    pub fn errno(&self) -> i32 {
        self.parser.as_ref().map_or(0, TextParser::errno)
    }

    /// Error text of the last failed section load.
    pub fn error(&self) -> Option<&str> {
        self.parser.as_ref().and_then(TextParser::error)
    }

    pub fn is_durable(&self) -> bool {
        self.durable
    }
    pub fn set_durable(&mut self, durable: bool) {
        self.durable = durable;
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }
    pub fn set_priority(&mut self, priority: u8) {
        self.priority = priority;
    }

    /// Time to live in milliseconds.
    pub fn ttl(&self) -> u32 {
        self.ttl
    }
    pub fn set_ttl(&mut self, ttl: u32) {
        self.ttl = ttl;
    }

    pub fn is_first_acquirer(&self) -> bool {
        self.first_acquirer
    }
    pub fn set_first_acquirer(&mut self, first: bool) {
        self.first_acquirer = first;
    }

    pub fn delivery_count(&self) -> u32 {
        self.delivery_count
    }
    pub fn set_delivery_count(&mut self, count: u32) {
        self.delivery_count = count;
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }
    pub fn set_id(&mut self, id: impl Into<MessageId>) {
        self.id = id.into();
    }

    /// Empty slice when unset.
    pub fn user_id(&self) -> &[u8] {
        &self.user_id
    }
    pub fn set_user_id(&mut self, user_id: &[u8]) {
        set_bytes(&mut self.user_id, user_id);
    }

    pub fn address(&self) -> Option<&str> {
        text(&self.address)
    }
    pub fn set_address<'a>(&mut self, address: impl Into<Option<&'a str>>) {
        set_text(&mut self.address, address.into());
    }

    pub fn subject(&self) -> Option<&str> {
        text(&self.subject)
    }
    pub fn set_subject<'a>(&mut self, subject: impl Into<Option<&'a str>>) {
        set_text(&mut self.subject, subject.into());
    }

    pub fn reply_to(&self) -> Option<&str> {
        text(&self.reply_to)
    }
    pub fn set_reply_to<'a>(&mut self, reply_to: impl Into<Option<&'a str>>) {
        set_text(&mut self.reply_to, reply_to.into());
    }

    pub fn correlation_id(&self) -> &MessageId {
        &self.correlation_id
    }
    pub fn set_correlation_id(&mut self, id: impl Into<MessageId>) {
        self.correlation_id = id.into();
    }

    pub fn content_type(&self) -> Option<&str> {
        text(&self.content_type)
    }
    pub fn set_content_type<'a>(&mut self, content_type: impl Into<Option<&'a str>>) {
        set_text(&mut self.content_type, content_type.into());
    }

    pub fn content_encoding(&self) -> Option<&str> {
        text(&self.content_encoding)
    }
    pub fn set_content_encoding<'a>(&mut self, encoding: impl Into<Option<&'a str>>) {
        set_text(&mut self.content_encoding, encoding.into());
    }

    /// Absolute expiry time, milliseconds since the epoch.
    pub fn expiry_time(&self) -> i64 {
        self.expiry_time
    }
    pub fn set_expiry_time(&mut self, time: i64) {
        self.expiry_time = time;
    }

    pub fn creation_time(&self) -> i64 {
        self.creation_time
    }
    pub fn set_creation_time(&mut self, time: i64) {
        self.creation_time = time;
    }

    pub fn group_id(&self) -> Option<&str> {
        text(&self.group_id)
    }
    pub fn set_group_id<'a>(&mut self, group_id: impl Into<Option<&'a str>>) {
        set_text(&mut self.group_id, group_id.into());
    }

    pub fn group_sequence(&self) -> i32 {
        self.group_sequence
    }
    pub fn set_group_sequence(&mut self, n: i32) {
        self.group_sequence = n;
    }

    pub fn reply_to_group_id(&self) -> Option<&str> {
        text(&self.reply_to_group_id)
    }
    pub fn set_reply_to_group_id<'a>(&mut self, id: impl Into<Option<&'a str>>) {
        set_text(&mut self.reply_to_group_id, id.into());
    }

    pub(crate) fn allocate_section_id(&mut self) -> SectionId {
        let id = SectionId(self.next_section_id);
        self.next_section_id += 1;
        id
    }
}
