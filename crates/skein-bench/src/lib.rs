//! Benchmark profiles for the Skein protocol stack.
//!
//! Provides deterministic inputs shared by the benchmarks:
//!
//! - [`record_definition`]: a mixed-kind schema with a nested message and
//!   a packed repeated field
//! - [`sample_record`]: a populated record, varied by seed
//! - [`stream_profile`]: an encoded slice stream of fixed shape

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::{Arc, OnceLock};

use skein_message::{FieldDescriptor, Message, MessageDefinition, MessageError, Value, ValueKind};
use skein_stream::encode_slice;

fn cached(
    cell: &'static OnceLock<Arc<MessageDefinition>>,
    build: fn() -> skein_message::MessageDefinitionBuilder,
) -> Arc<MessageDefinition> {
    Arc::clone(cell.get_or_init(|| match build().build() {
        Ok(def) => def,
        Err(e) => panic!("benchmark schema is invalid: {e}"),
    }))
}

/// `Point { x: sint32 = 1; y: sint32 = 2; }`
pub fn point_definition() -> Arc<MessageDefinition> {
    static DEF: OnceLock<Arc<MessageDefinition>> = OnceLock::new();
    cached(&DEF, || {
        MessageDefinition::builder("Point")
            .field(FieldDescriptor::new("x", 1, ValueKind::Sint32))
            .field(FieldDescriptor::new("y", 2, ValueKind::Sint32))
    })
}

/// A record mixing varint, fixed-width, length-delimited, nested, and
/// packed repeated fields.
pub fn record_definition() -> Arc<MessageDefinition> {
    static DEF: OnceLock<Arc<MessageDefinition>> = OnceLock::new();
    cached(&DEF, || {
        MessageDefinition::builder("Record")
            .field(FieldDescriptor::new("id", 1, ValueKind::Uint64))
            .field(FieldDescriptor::new("score", 2, ValueKind::Double))
            .field(FieldDescriptor::new("label", 3, ValueKind::String))
            .field(FieldDescriptor::new("active", 4, ValueKind::Bool))
            .field(FieldDescriptor::new("checksum", 5, ValueKind::Fixed32))
            .field(FieldDescriptor::message("origin", 6, point_definition))
            .field(FieldDescriptor::new("samples", 7, ValueKind::Sint64).repeated())
            .field(FieldDescriptor::new("blob", 8, ValueKind::Bytes))
    })
}

/// A fully populated record with `samples` list entries.
pub fn sample_record(seed: u64, samples: usize) -> Result<Message, MessageError> {
    let mut origin = Message::empty(point_definition());
    origin.set("x", (seed % 1000) as i32 - 500)?;
    origin.set("y", -((seed % 77) as i32))?;

    let mut record = Message::empty(record_definition());
    record.set("id", seed)?;
    record.set("score", seed as f64 * 0.25)?;
    record.set("label", format!("record-{seed}"))?;
    record.set("active", seed % 2 == 0)?;
    record.set("checksum", Value::UInt32(seed as u32 ^ 0xDEAD_BEEF))?;
    record.set("origin", origin)?;
    for i in 0..samples as i64 {
        record.push("samples", i * 37 - 1000)?;
    }
    record.set("blob", vec![seed as u8; 32])?;
    Ok(record)
}

/// Encode `slice_count` slices of `payload_len` bytes, cycling through
/// types 1 to 4.
pub fn stream_profile(slice_count: usize, payload_len: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for i in 0..slice_count {
        let payload: Vec<u8> = (0..payload_len).map(|j| (i + j) as u8).collect();
        out.extend(encode_slice((i % 4) as u32 + 1, &payload));
    }
    out
}
