//! Decode AMQP-encoded messages and print their header, properties and body sections.
//!
//! Usage:
//!   amqp_dump [OPTIONS] [FILE ...]
//!   amqp_dump < message.bin
//!
//! Options:
//!   --hex, -x        Input is hex text (whitespace and `#` comments ignored)
//!   --roundtrip, -r  Re-encode each decoded message and report whether the bytes match
//!   --verbose, -v    Log decode/encode steps (tracing, DEBUG level)
//!
//! Exit status is 1 when any input fails to decode.

use amqpmsg::dump::{describe_message, hex_string, load_bytes, parse_hex};
use amqpmsg::{Format, Message};
use std::io::{self, Read};
use std::path::Path;
use tracing::Level;

fn take_flag(args: &mut Vec<String>, long: &str, short: &str) -> bool {
    if let Some(pos) = args.iter().position(|a| a == long || a == short) {
        args.remove(pos);
        true
    } else {
        false
    }
}

/// Decode and print one input. Returns false when decoding failed.
fn dump(name: &str, bytes: &[u8], roundtrip: bool) -> anyhow::Result<bool> {
    let mut msg = Message::new();
    if let Err(e) = msg.decode(Format::Amqp, bytes) {
        eprintln!("{}: decode failed ({}): {}", name, e.code(), e);
        return Ok(false);
    }
    println!("== {} ({} bytes)", name, bytes.len());
    print!("{}", describe_message(&msg));

    if roundtrip {
        let encoded = msg.to_bytes()?;
        if encoded == bytes {
            println!("roundtrip: identical");
        } else {
            println!("roundtrip: differs ({} bytes)", encoded.len());
            println!("  {}", hex_string(&encoded));
        }
    }
    Ok(true)
}

fn main() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let hex = take_flag(&mut args, "--hex", "-x");
    let roundtrip = take_flag(&mut args, "--roundtrip", "-r");
    let verbose = take_flag(&mut args, "--verbose", "-v");

    tracing_subscriber::fmt()
        .with_max_level(if verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(io::stderr)
        .init();

    let mut ok = true;
    if args.is_empty() {
        let mut raw = Vec::new();
        io::stdin().read_to_end(&mut raw)?;
        let bytes = if hex {
            parse_hex(&String::from_utf8_lossy(&raw)).map_err(anyhow::Error::msg)?
        } else {
            raw
        };
        ok &= dump("<stdin>", &bytes, roundtrip)?;
    } else {
        for path in &args {
            let bytes = match load_bytes(Path::new(path), hex) {
                Ok(b) => b,
                Err(e) => {
                    eprintln!("{}", e);
                    ok = false;
                    continue;
                }
            };
            ok &= dump(path, &bytes, roundtrip)?;
        }
    }

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
