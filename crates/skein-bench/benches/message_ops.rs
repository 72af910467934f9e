//! Criterion micro-benchmarks for the message codec.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use skein_bench::{record_definition, sample_record};
use skein_message::{Message, ResetMode};

/// Benchmark: Encode a record with 256 packed samples.
fn bench_message_encode_record(c: &mut Criterion) {
    let record = sample_record(42, 256).unwrap();

    c.bench_function("message_encode_record", |b| {
        b.iter(|| {
            let bytes = record.encode().unwrap();
            black_box(&bytes);
        });
    });
}

/// Benchmark: Decode the same record into a fresh message.
fn bench_message_decode_record(c: &mut Criterion) {
    let encoded = sample_record(42, 256).unwrap().encode().unwrap();
    let def = record_definition();

    c.bench_function("message_decode_record", |b| {
        b.iter(|| {
            let decoded = Message::decode(def.clone(), &encoded).unwrap();
            black_box(&decoded);
        });
    });
}

/// Benchmark: Merge the record into a reused message, resetting to defaults.
fn bench_message_merge_reuse(c: &mut Criterion) {
    let encoded = sample_record(42, 256).unwrap().encode().unwrap();
    let mut target = Message::new(record_definition());

    c.bench_function("message_merge_reuse", |b| {
        b.iter(|| {
            target.merge_from(&encoded, ResetMode::Defaults).unwrap();
            black_box(&target);
        });
    });
}

/// Benchmark: Decode a payload that is entirely unknown fields.
fn bench_message_skip_unknown(c: &mut Criterion) {
    // Encoded against the record schema, decoded against one with no fields.
    let encoded = sample_record(42, 256).unwrap().encode().unwrap();
    let opaque = skein_message::MessageDefinition::builder("Opaque")
        .build()
        .unwrap();

    c.bench_function("message_skip_unknown", |b| {
        b.iter(|| {
            let decoded = Message::decode(opaque.clone(), &encoded).unwrap();
            black_box(decoded.unknown_fields().len());
        });
    });
}

criterion_group!(
    benches,
    bench_message_encode_record,
    bench_message_decode_record,
    bench_message_merge_reuse,
    bench_message_skip_unknown
);
criterion_main!(benches);
