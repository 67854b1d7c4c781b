//! Errors reported by message-level operations.

use crate::codec::CodecError;
use crate::protocol;
use crate::text::ParseError;

#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// Wrong format selector, empty buffer where data is required, unknown section.
    #[error("Invalid argument: {0}")]
    Argument(&'static str),
    /// Destination buffer too small; the caller may retry with a larger one.
    #[error("Overflow: {required} bytes required, {available} available")]
    Overflow { required: usize, available: usize },
    #[error("Codec: {0}")]
    Codec(CodecError),
    #[error("Parse: {0}")]
    Parse(#[from] ParseError),
}

impl MessageError {
    /// Integer status code (`protocol::ARG_ERR`, `protocol::OVERFLOW` or `protocol::ERR`).
    pub fn code(&self) -> i32 {
        match self {
            MessageError::Argument(_) => protocol::ARG_ERR,
            MessageError::Overflow { .. } => protocol::OVERFLOW,
            MessageError::Codec(_) | MessageError::Parse(_) => protocol::ERR,
        }
    }
}

impl From<CodecError> for MessageError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::Overflow { required, available } => {
                MessageError::Overflow { required, available }
            }
            other => MessageError::Codec(other),
        }
    }
}
