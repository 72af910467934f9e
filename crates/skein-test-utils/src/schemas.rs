//! Fixture message schemas.
//!
//! Each definition is built once per process and shared, the way a real
//! schema module would declare its types.

use std::sync::{Arc, OnceLock};

use skein_message::{FieldDescriptor, MessageDefinition, Value, ValueKind};

fn cached(
    cell: &'static OnceLock<Arc<MessageDefinition>>,
    build: fn() -> skein_message::MessageDefinitionBuilder,
) -> Arc<MessageDefinition> {
    Arc::clone(cell.get_or_init(|| match build().build() {
        Ok(def) => def,
        Err(e) => panic!("fixture schema is invalid: {e}"),
    }))
}

/// `Person { id: int32 = 1; name: string = 2; }`
pub fn person() -> Arc<MessageDefinition> {
    static DEF: OnceLock<Arc<MessageDefinition>> = OnceLock::new();
    cached(&DEF, || {
        MessageDefinition::builder("Person")
            .field(FieldDescriptor::new("id", 1, ValueKind::Int32))
            .field(FieldDescriptor::new("name", 2, ValueKind::String))
    })
}

/// One field of every scalar kind, numbered 1..=16 in declaration order,
/// plus a repeated `sint32` list (17) and a nested [`person`] (18).
pub fn all_kinds() -> Arc<MessageDefinition> {
    static DEF: OnceLock<Arc<MessageDefinition>> = OnceLock::new();
    cached(&DEF, || {
        MessageDefinition::builder("AllKinds")
            .field(FieldDescriptor::new("double", 1, ValueKind::Double))
            .field(FieldDescriptor::new("float", 2, ValueKind::Float))
            .field(FieldDescriptor::new("int32", 3, ValueKind::Int32))
            .field(FieldDescriptor::new("int64", 4, ValueKind::Int64))
            .field(FieldDescriptor::new("uint32", 5, ValueKind::Uint32))
            .field(FieldDescriptor::new("uint64", 6, ValueKind::Uint64))
            .field(FieldDescriptor::new("sint32", 7, ValueKind::Sint32))
            .field(FieldDescriptor::new("sint64", 8, ValueKind::Sint64))
            .field(FieldDescriptor::new("fixed32", 9, ValueKind::Fixed32))
            .field(FieldDescriptor::new("fixed64", 10, ValueKind::Fixed64))
            .field(FieldDescriptor::new("sfixed32", 11, ValueKind::Sfixed32))
            .field(FieldDescriptor::new("sfixed64", 12, ValueKind::Sfixed64))
            .field(FieldDescriptor::new("bool", 13, ValueKind::Bool))
            .field(
                FieldDescriptor::new("status", 14, ValueKind::Enum).with_default(|| Value::Int32(1)),
            )
            .field(FieldDescriptor::new("string", 15, ValueKind::String))
            .field(FieldDescriptor::new("bytes", 16, ValueKind::Bytes))
            .field(FieldDescriptor::new("samples", 17, ValueKind::Sint32).repeated())
            .field(FieldDescriptor::message("owner", 18, person))
    })
}

/// `Tree { value: sint64 = 1; children: repeated Tree = 2; parent: Tree = 3; }`
pub fn tree() -> Arc<MessageDefinition> {
    static DEF: OnceLock<Arc<MessageDefinition>> = OnceLock::new();
    cached(&DEF, || {
        MessageDefinition::builder("Tree")
            .field(FieldDescriptor::new("value", 1, ValueKind::Sint64))
            .field(FieldDescriptor::message("children", 2, tree).repeated())
            .field(FieldDescriptor::message("parent", 3, tree))
    })
}
