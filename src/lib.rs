//! # amqpmsg: AMQP 1.0 message encoding
//!
//! Translates an in-memory [`Message`] to and from the AMQP 1.0 binary encoding. On the wire
//! a message is an ordered run of self-describing sections:
//!
//! - **header** (`0x70`): durable, priority, ttl, first-acquirer, delivery-count
//! - **properties** (`0x73`): user-id, address, subject, reply-to, content type/encoding,
//!   expiry/creation time, group id/sequence, reply-to-group-id
//! - **body sections**: anything else, kept verbatim and in order as [`Section`]s
//!
//! ## Layers
//!
//! - [`value`] / [`codec`]: the AMQP type system and its encoding, one value at a time
//! - [`data`]: `Data`, an ordered list of values (scratch tree and section payload)
//! - [`text`]: text notation for values (section load/save)
//! - [`message`], [`section`], [`wire`]: the message record and its decode/encode pipelines
//!
//! ## Example
//!
//! ```
//! use amqpmsg::{Format, Message};
//!
//! let mut msg = Message::new();
//! msg.set_durable(true);
//! msg.set_address("queue/orders");
//! msg.append_data(b"payload");
//!
//! let mut buf = [0u8; 256];
//! let n = msg.encode(Format::Amqp, &mut buf).unwrap();
//!
//! let mut decoded = Message::new();
//! decoded.decode(Format::Amqp, &buf[..n]).unwrap();
//! assert!(decoded.is_durable());
//! assert_eq!(decoded.address(), Some("queue/orders"));
//! assert_eq!(decoded.sections().len(), 1);
//! ```

pub mod codec;
pub mod data;
pub mod dump;
pub mod error;
pub mod message;
pub mod protocol;
pub mod section;
pub mod text;
pub mod value;
pub mod wire;

pub use codec::{decode_one, encode_value, CodecError};
pub use data::{Data, Fields};
pub use error::MessageError;
pub use message::{Format, Message, MessageId};
pub use section::{data_section, Section, SectionId};
pub use text::{parse, ParseError, TextParser};
pub use value::Value;
pub use wire::encode_data_section;
