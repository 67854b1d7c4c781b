//! Text fuzz target: feed arbitrary strings to the value text parser.
//! The parser must not panic; every value it returns must format to text that parses back.
//! Build with: cargo fuzz run text_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    if let Ok(values) = amqpmsg::parse(s) {
        for v in values {
            let _ = amqpmsg::parse(&v.to_string()).expect("formatted value parses");
        }
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run text_fuzz");
}
