//! Format decoded messages for display (dump text), and read message bytes from files.

use crate::message::{Message, MessageId};
use crate::protocol;
use crate::value::Value;
use std::fmt::Write as _;
use std::path::Path;

/// Space-separated lowercase hex.
pub fn hex_string(b: &[u8]) -> String {
    b.iter().map(|x| format!("{:02x}", x)).collect::<Vec<_>>().join(" ")
}

/// Parse hex digits, ignoring whitespace (and `#` comments to end of line).
pub fn parse_hex(text: &str) -> Result<Vec<u8>, String> {
    let digits: Vec<u8> = text
        .lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .flat_map(|line| line.bytes())
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits ({})", digits.len()));
    }
    digits
        .chunks(2)
        .map(|pair| {
            let s = std::str::from_utf8(pair).map_err(|e| e.to_string())?;
            u8::from_str_radix(s, 16).map_err(|_| format!("invalid hex byte {:?}", s))
        })
        .collect()
}

/// Read a file of encoded message bytes, raw or as hex text.
pub fn load_bytes(path: &Path, hex: bool) -> Result<Vec<u8>, String> {
    if hex {
        let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
        parse_hex(&text).map_err(|e| format!("{}: {}", path.display(), e))
    } else {
        std::fs::read(path).map_err(|e| format!("{}: {}", path.display(), e))
    }
}

fn id_text(id: &MessageId) -> Option<String> {
    match id {
        MessageId::Null => None,
        MessageId::Ulong(x) => Some(x.to_string()),
        MessageId::Uuid(b) => Some(Value::Uuid(*b).to_string()),
        MessageId::Binary(b) => Some(Value::Binary(b.clone()).to_string()),
        MessageId::String(s) => Some(Value::String(s.clone()).to_string()),
    }
}

/// Multi-line dump: header, the properties that are set, then each body section as text.
pub fn describe_message(msg: &Message) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "header: durable={} priority={} ttl={} first_acquirer={} delivery_count={}",
        msg.is_durable(),
        msg.priority(),
        msg.ttl(),
        msg.is_first_acquirer(),
        msg.delivery_count()
    );

    let mut props: Vec<(&str, String)> = Vec::new();
    if let Some(id) = id_text(msg.id()) {
        props.push(("id", id));
    }
    if !msg.user_id().is_empty() {
        props.push(("user_id", Value::Binary(msg.user_id().to_vec()).to_string()));
    }
    let texts = [
        ("address", msg.address()),
        ("subject", msg.subject()),
        ("reply_to", msg.reply_to()),
        ("content_type", msg.content_type()),
        ("content_encoding", msg.content_encoding()),
        ("group_id", msg.group_id()),
        ("reply_to_group_id", msg.reply_to_group_id()),
    ];
    for (name, value) in texts {
        if let Some(v) = value {
            props.push((name, Value::from(v).to_string()));
        }
    }
    if let Some(id) = id_text(msg.correlation_id()) {
        props.push(("correlation_id", id));
    }
    if msg.expiry_time() != 0 {
        props.push(("expiry_time", msg.expiry_time().to_string()));
    }
    if msg.creation_time() != 0 {
        props.push(("creation_time", msg.creation_time().to_string()));
    }
    if msg.group_sequence() != 0 {
        props.push(("group_sequence", msg.group_sequence().to_string()));
    }
    let _ = write!(out, "properties:");
    for (name, value) in &props {
        let _ = write!(out, " {}={}", name, value);
    }
    out.push('\n');

    for (i, section) in msg.sections().iter().enumerate() {
        match section.payload() {
            None => {
                let _ = writeln!(out, "section {}: <none>", i);
            }
            Some(payload) => {
                let name = protocol::section_name(payload.descriptor()).unwrap_or("value");
                let _ = writeln!(out, "section {} [{}]: {}", i, name, payload);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip_with_comments() {
        let bytes = parse_hex("00 53 70 # header\n c0 01 00\n").unwrap();
        assert_eq!(bytes, vec![0x00, 0x53, 0x70, 0xc0, 0x01, 0x00]);
        assert_eq!(hex_string(&bytes), "00 53 70 c0 01 00");
    }

    #[test]
    fn odd_hex_rejected() {
        assert!(parse_hex("abc").is_err());
        assert!(parse_hex("zz").is_err());
    }

    #[test]
    fn describe_lists_set_properties_only() {
        let mut msg = Message::new();
        msg.set_subject("greeting");
        msg.append_data(b"hi");
        let text = describe_message(&msg);
        assert!(text.contains("priority=4"));
        assert!(text.contains("subject=\"greeting\""));
        assert!(!text.contains("address="));
        assert!(text.contains("section 0 [amqp:data:binary]: @0x75 b\"hi\""));
    }
}
