//! Field descriptors: one entry of a message schema.

use std::sync::Arc;

use skein_core::{Tag, WireType};

use crate::definition::MessageDefinition;
use crate::kind::ValueKind;
use crate::value::Value;

/// Factory for a field's default value.
pub type DefaultFn = fn() -> Value;

/// Factory resolving the definition of a nested message field.
///
/// A function pointer rather than a stored `Arc` so that a schema can refer
/// to itself (directly or through a cycle) without being built first.
pub type DefinitionFn = fn() -> Arc<MessageDefinition>;

/// Description of one field in a [`MessageDefinition`].
///
/// # Examples
///
/// ```
/// use skein_message::{FieldDescriptor, ValueKind};
///
/// let ids = FieldDescriptor::new("ids", 4, ValueKind::Uint64).repeated();
/// assert!(ids.repeated);
/// assert_eq!(ids.tag().raw(), 4 << 3);
/// ```
#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    /// Field name, unique within its definition.
    pub name: String,
    /// Field number, `1..=MAX_FIELD_NUMBER`, unique within its definition.
    pub number: u32,
    /// Declared kind.
    pub kind: ValueKind,
    /// Whether the field holds a list of values.
    pub repeated: bool,
    /// Default used by [`Message::new`](crate::Message::new) instead of the
    /// kind's zero value.
    pub default: Option<DefaultFn>,
    /// Definition of the nested message; required for
    /// [`ValueKind::Message`] and forbidden otherwise.
    pub message: Option<DefinitionFn>,
}

impl FieldDescriptor {
    /// A singular field with no default and no nested definition.
    pub fn new(name: impl Into<String>, number: u32, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            number,
            kind,
            repeated: false,
            default: None,
            message: None,
        }
    }

    /// A singular nested-message field.
    pub fn message(name: impl Into<String>, number: u32, definition: DefinitionFn) -> Self {
        Self::new(name, number, ValueKind::Message).message_type(definition)
    }

    /// Mark the field repeated.
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    /// Attach a default factory.
    pub fn with_default(mut self, default: DefaultFn) -> Self {
        self.default = Some(default);
        self
    }

    /// Attach the nested message definition factory.
    pub fn message_type(mut self, definition: DefinitionFn) -> Self {
        self.message = Some(definition);
        self
    }

    /// Wire type of the field's tag when written unpacked.
    pub fn wire_type(&self) -> WireType {
        self.kind.wire_type()
    }

    /// Tag written before each unpacked value.
    pub fn tag(&self) -> Tag {
        Tag::new(self.number, self.wire_type())
    }

    /// Resolve the nested definition, if this is a message field.
    pub fn definition(&self) -> Option<Arc<MessageDefinition>> {
        self.message.map(|factory| factory())
    }

    /// Whether a length-delimited tag for this field carries packed values.
    pub fn accepts_packed(&self) -> bool {
        self.repeated && self.kind.is_packable()
    }
}
