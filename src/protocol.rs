//! AMQP 1.0 message-format constants: section descriptors, defaults, status codes.

/// Framing section (`amqp:header:list`).
pub const HEADER: u64 = 0x70;
pub const DELIVERY_ANNOTATIONS: u64 = 0x71;
pub const MESSAGE_ANNOTATIONS: u64 = 0x72;
/// Properties section (`amqp:properties:list`).
pub const PROPERTIES: u64 = 0x73;
pub const APPLICATION_PROPERTIES: u64 = 0x74;
/// Opaque binary body section (`amqp:data:binary`).
pub const DATA: u64 = 0x75;
pub const AMQP_SEQUENCE: u64 = 0x76;
pub const AMQP_VALUE: u64 = 0x77;
pub const FOOTER: u64 = 0x78;

/// Priority a message carries until one is set or decoded.
pub const DEFAULT_PRIORITY: u8 = 4;

/// Number of positional slots in the properties list.
pub const PROPERTIES_SLOTS: usize = 13;

/// Integer status codes, as reported by `errno`-style accessors.
pub const OK: i32 = 0;
pub const ERR: i32 = -2;
pub const OVERFLOW: i32 = -3;
pub const ARG_ERR: i32 = -6;

const SECTIONS: [(u64, &str); 9] = [
    (HEADER, "amqp:header:list"),
    (DELIVERY_ANNOTATIONS, "amqp:delivery-annotations:map"),
    (MESSAGE_ANNOTATIONS, "amqp:message-annotations:map"),
    (PROPERTIES, "amqp:properties:list"),
    (APPLICATION_PROPERTIES, "amqp:application-properties:map"),
    (DATA, "amqp:data:binary"),
    (AMQP_SEQUENCE, "amqp:amqp-sequence:list"),
    (AMQP_VALUE, "amqp:amqp-value:*"),
    (FOOTER, "amqp:footer:map"),
];

/// Numeric code of a symbolic section descriptor.
pub fn symbolic_descriptor(name: &str) -> Option<u64> {
    SECTIONS.iter().find(|(_, n)| *n == name).map(|(code, _)| *code)
}

/// Symbolic name of a section descriptor code.
pub fn section_name(code: u64) -> Option<&'static str> {
    SECTIONS.iter().find(|(c, _)| *c == code).map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbolic_and_numeric_descriptors_agree() {
        assert_eq!(symbolic_descriptor("amqp:header:list"), Some(HEADER));
        assert_eq!(symbolic_descriptor("amqp:properties:list"), Some(PROPERTIES));
        assert_eq!(section_name(DATA), Some("amqp:data:binary"));
        assert_eq!(symbolic_descriptor("amqp:unknown"), None);
        assert_eq!(section_name(0), None);
    }
}
