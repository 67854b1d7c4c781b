//! Body sections: ordered, owned by the message, each with an optional payload.

use crate::data::Data;
use crate::error::MessageError;
use crate::message::{Format, Message};
use crate::protocol;
use crate::value::Value;
use tracing::debug;

/// Stable handle of a section within its message. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(pub(crate) u64);

#[derive(Debug)]
pub struct Section {
    id: SectionId,
    format: Format,
    pub(crate) payload: Option<Data>,
}

impl Section {
    pub(crate) fn new(id: SectionId) -> Self {
        Section { id, format: Format::Amqp, payload: None }
    }

    pub fn id(&self) -> SectionId {
        self.id
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn set_format(&mut self, format: Format) {
        self.format = format;
    }

    pub fn payload(&self) -> Option<&Data> {
        self.payload.as_ref()
    }

    pub fn set_payload(&mut self, payload: Data) {
        self.payload = Some(payload);
    }

    /// Empty the payload; the section stays linked and its payload (if any) stays present.
    pub fn clear(&mut self) {
        if let Some(payload) = self.payload.as_mut() {
            payload.clear();
        }
    }

    /// Write the payload's text form into `dst`. No payload writes nothing.
    pub fn save(&self, dst: &mut [u8]) -> Result<usize, MessageError> {
        match &self.payload {
            None => Ok(0),
            Some(payload) => Ok(payload.format(dst)?),
        }
    }

    /// Binary-encode the payload into `dst`. No payload writes nothing.
    pub fn encode(&self, dst: &mut [u8]) -> Result<usize, MessageError> {
        match &self.payload {
            None => Ok(0),
            Some(payload) => Ok(payload.encode(dst)?),
        }
    }
}

impl Message {
    /// Append a new, empty section at the end of the body.
    pub fn create_section(&mut self) -> SectionId {
        let id = self.allocate_section_id();
        self.sections.push(Section::new(id));
        id
    }

    /// Remove one section (and its payload). Siblings keep their order.
    pub fn destroy_section(&mut self, id: SectionId) -> Result<(), MessageError> {
        let index = self.section_index(id)?;
        self.sections.remove(index);
        Ok(())
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn section_mut(&mut self, id: SectionId) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == id)
    }

    /// Error text of the last failed load. Loads share the message's parser, so this is the
    /// same report as [`Message::error`]; unknown ids are an argument error.
    pub fn section_error(&self, id: SectionId) -> Result<Option<&str>, MessageError> {
        self.section_index(id)?;
        Ok(self.error())
    }

    /// Sections in body order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Replace the section's payload with the values parsed from `text`. A parse failure
    /// is also recorded for [`Message::errno`] / [`Message::error`].
    pub fn load_section(&mut self, id: SectionId, text: &str) -> Result<(), MessageError> {
        let index = self.section_index(id)?;
        let parser = self.parser.get_or_insert_with(Default::default);
        let values = parser.parse(text)?;
        debug!(section = id.0, values = values.len(), "loaded section from text");
        let payload = self.sections[index].payload.get_or_insert_with(Data::new);
        payload.clear();
        for value in values {
            payload.push(value);
        }
        Ok(())
    }

    /// Append a `data` body section holding `bytes`.
    pub fn append_data(&mut self, bytes: &[u8]) -> SectionId {
        let id = self.allocate_section_id();
        let mut section = Section::new(id);
        section.payload = Some(Data::from(vec![data_section(bytes)]));
        self.sections.push(section);
        id
    }

    fn section_index(&self, id: SectionId) -> Result<usize, MessageError> {
        self.sections
            .iter()
            .position(|s| s.id == id)
            .ok_or(MessageError::Argument("unknown section"))
    }
}

/// A `data` body section value wrapping `bytes`.
pub fn data_section(bytes: &[u8]) -> Value {
    Value::described(protocol::DATA, Value::Binary(bytes.to_vec()))
}
