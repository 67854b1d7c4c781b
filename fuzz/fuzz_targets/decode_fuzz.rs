//! Decode fuzz target: feed arbitrary bytes to the message decoder.
//! Decoding must not panic. Whatever decodes must encode again, and the re-encoded bytes must
//! decode to the same fields.
//! Build with: cargo fuzz run decode_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    use amqpmsg::{Format, Message};

    let mut msg = Message::new();
    if msg.decode(Format::Amqp, data).is_err() {
        return;
    }
    let bytes = msg.to_bytes().expect("decoded message re-encodes");
    let mut again = Message::new();
    again.decode(Format::Amqp, &bytes).expect("re-encoded message decodes");
    assert_eq!(again.address(), msg.address());
    assert_eq!(again.priority(), msg.priority());
    assert_eq!(again.sections().len(), msg.sections().len());
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run decode_fuzz");
}
