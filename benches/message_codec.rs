//! Benchmark: message encode, decode, and decode+encode round trip for a message carrying a
//! full header, populated properties and a few body sections (data, sequence, value).

use amqpmsg::{Format, Message};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn sample_message() -> Message {
    let mut msg = Message::new();
    msg.set_durable(true);
    msg.set_priority(6);
    msg.set_ttl(30_000);
    msg.set_delivery_count(1);
    msg.set_user_id(b"bench-user");
    msg.set_address("queue/bench");
    msg.set_subject("order created");
    msg.set_reply_to("queue/replies");
    msg.set_content_type("application/octet-stream");
    msg.set_creation_time(1_700_000_000_000);
    msg.set_group_id("group-1");
    msg.set_group_sequence(42);
    msg.append_data(&[0x5a; 512]);
    let seq = msg.create_section();
    let _ = msg.load_section(seq, "@0x76 [1, 2, 3, \"four\", :five, (uint)6]");
    let value = msg.create_section();
    let _ = msg.load_section(value, "@0x77 {\"k\"=(array)[(int)1, (int)2], :flag=true}");
    msg
}

fn bench_message_codec(c: &mut Criterion) {
    let mut msg = sample_message();
    let bytes = match msg.to_bytes() {
        Ok(b) => b,
        Err(e) => {
            eprintln!("sample message does not encode: {}", e);
            return;
        }
    };
    let mut buf = vec![0u8; bytes.len() * 2];

    c.bench_function("encode", |b| {
        b.iter(|| msg.encode(Format::Amqp, black_box(&mut buf)).map(black_box))
    });

    let mut decoded = Message::new();
    c.bench_function("decode", |b| {
        b.iter(|| decoded.decode(Format::Amqp, black_box(&bytes)))
    });

    let mut scratch = Message::with_scratch_capacity(4);
    let mut out = vec![0u8; bytes.len() * 2];
    c.bench_function("decode_encode", |b| {
        b.iter(|| {
            scratch.decode(Format::Amqp, black_box(&bytes))?;
            scratch.encode(Format::Amqp, &mut out).map(black_box)
        })
    });
}

criterion_group!(benches, bench_message_codec);
criterion_main!(benches);
