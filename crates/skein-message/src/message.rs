//! Structured message values.

use std::sync::Arc;

use skein_core::Tag;

use crate::codec::MAX_MESSAGE_DEPTH;
use crate::definition::MessageDefinition;
use crate::descriptor::FieldDescriptor;
use crate::error::MessageError;
use crate::value::Value;

/// What a message's fields hold after a reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetMode {
    /// Schema defaults: zero scalars, empty lists, default-constructed
    /// nested messages, and any declared default factories.
    Defaults,
    /// Every field absent.
    Absent,
}

/// A field the definition does not declare, kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownField {
    /// The decoded tag.
    pub tag: Tag,
    /// The whole field exactly as it arrived: tag bytes (even a
    /// non-minimal encoding) followed by the value bytes. For a group this
    /// runs through the closing END_GROUP tag. Encoding writes it back
    /// unchanged.
    pub raw: Vec<u8>,
}

/// One value of a [`MessageDefinition`].
///
/// Holds one optional [`Value`] slot per declared field, in declaration
/// order, plus every unknown field seen while decoding.
///
/// # Examples
///
/// ```
/// use skein_message::{FieldDescriptor, Message, MessageDefinition, Value, ValueKind};
///
/// let def = MessageDefinition::builder("Person")
///     .field(FieldDescriptor::new("id", 1, ValueKind::Int32))
///     .field(FieldDescriptor::new("name", 2, ValueKind::String))
///     .build()
///     .unwrap();
///
/// let mut person = Message::empty(def.clone());
/// person.set("id", 5).unwrap();
/// person.set("name", "hi").unwrap();
///
/// let bytes = person.encode().unwrap();
/// assert_eq!(bytes, [0x08, 0x05, 0x12, 0x02, b'h', b'i']);
/// assert_eq!(Message::decode(def, &bytes).unwrap(), person);
/// ```
#[derive(Clone, Debug)]
pub struct Message {
    pub(crate) definition: Arc<MessageDefinition>,
    pub(crate) values: Vec<Option<Value>>,
    pub(crate) unknown: Vec<UnknownField>,
}

impl Message {
    /// A message holding schema defaults.
    ///
    /// Nested message fields are default-constructed too, except where the
    /// nested definition is already being constructed further up (a
    /// recursive schema); such fields start absent.
    pub fn new(definition: Arc<MessageDefinition>) -> Self {
        let values = default_values(&definition, &mut Vec::new());
        Self {
            definition,
            values,
            unknown: Vec::new(),
        }
    }

    /// A message with every field absent.
    pub fn empty(definition: Arc<MessageDefinition>) -> Self {
        let values = vec![None; definition.len()];
        Self {
            definition,
            values,
            unknown: Vec::new(),
        }
    }

    /// A message holding exactly the supplied values; every other field is
    /// absent. Values are kind-checked like [`Message::set`].
    pub fn from_values<'a, I, V>(
        definition: Arc<MessageDefinition>,
        values: I,
    ) -> Result<Self, MessageError>
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Into<Value>,
    {
        let mut message = Self::empty(definition);
        for (name, value) in values {
            message.set(name, value)?;
        }
        Ok(message)
    }

    /// The message's definition.
    pub fn definition(&self) -> &Arc<MessageDefinition> {
        &self.definition
    }

    /// Reset every field per `mode` and forget unknown fields.
    pub fn reset(&mut self, mode: ResetMode) {
        self.values = match mode {
            ResetMode::Defaults => default_values(&self.definition, &mut Vec::new()),
            ResetMode::Absent => vec![None; self.definition.len()],
        };
        self.unknown.clear();
    }

    // ── Field access ────────────────────────────────────────────

    fn index(&self, name: &str) -> Result<usize, MessageError> {
        self.definition
            .index_of(name)
            .ok_or_else(|| MessageError::UnknownField {
                message: self.definition.name().to_owned(),
                name: name.to_owned(),
            })
    }

    /// The named field's value; `None` if absent or not declared.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self.definition.index_of(name)?;
        self.values[index].as_ref()
    }

    /// Mutable access to the named field's value.
    ///
    /// Edits made through this reference bypass kind checks;
    /// [`Message::encode`] re-checks every value.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        let index = self.definition.index_of(name)?;
        self.values[index].as_mut()
    }

    /// The value of the field with this number.
    pub fn field_by_number(&self, number: u32) -> Option<&Value> {
        let index = self.definition.index_of_number(number)?;
        self.values[index].as_ref()
    }

    /// Whether the named field holds a value.
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set the named field.
    ///
    /// Repeated fields take a [`Value::List`]; each element is checked.
    ///
    /// # Errors
    ///
    /// [`MessageError::UnknownField`] for undeclared names,
    /// [`MessageError::KindMismatch`] or
    /// [`MessageError::DefinitionMismatch`] for values of the wrong type.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), MessageError> {
        let index = self.index(name)?;
        let value = value.into();
        let definition = Arc::clone(&self.definition);
        if let Some(fd) = definition.field_at(index) {
            check_slot(fd, &value)?;
        }
        self.values[index] = Some(value);
        Ok(())
    }

    /// Append to a repeated field.
    pub fn push(&mut self, name: &str, value: impl Into<Value>) -> Result<(), MessageError> {
        let index = self.index(name)?;
        let value = value.into();
        let definition = Arc::clone(&self.definition);
        if let Some(fd) = definition.field_at(index) {
            if !fd.repeated {
                return Err(MessageError::NotRepeated {
                    field: fd.name.clone(),
                });
            }
            check_element(fd, &value)?;
        }
        append(&mut self.values[index], value);
        Ok(())
    }

    /// Make the named field absent.
    pub fn clear(&mut self, name: &str) -> Result<(), MessageError> {
        let index = self.index(name)?;
        self.values[index] = None;
        Ok(())
    }

    /// Set fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldDescriptor, &Value)> {
        self.definition
            .fields()
            .zip(&self.values)
            .filter_map(|(fd, slot)| slot.as_ref().map(|v| (fd, v)))
    }

    /// Fields the definition does not declare, in arrival order.
    pub fn unknown_fields(&self) -> &[UnknownField] {
        &self.unknown
    }

    /// Forget every unknown field so the next encode omits them.
    pub fn clear_unknown_fields(&mut self) {
        self.unknown.clear();
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.definition.name() == other.definition.name()
            && self.values == other.values
            && self.unknown == other.unknown
    }
}

// ── Helpers ─────────────────────────────────────────────────────

/// Append `value` to a repeated slot, starting a list if needed.
pub(crate) fn append(slot: &mut Option<Value>, value: Value) {
    match slot {
        Some(Value::List(items)) => items.push(value),
        _ => *slot = Some(Value::List(vec![value])),
    }
}

/// Check a whole slot value: a list of elements for repeated fields, one
/// element otherwise.
pub(crate) fn check_slot(fd: &FieldDescriptor, value: &Value) -> Result<(), MessageError> {
    match (fd.repeated, value) {
        (true, Value::List(items)) => items.iter().try_for_each(|v| check_element(fd, v)),
        (true, other) => Err(MessageError::KindMismatch {
            field: fd.name.clone(),
            expected: fd.kind,
            found: other.variant_name(),
        }),
        (false, v) => check_element(fd, v),
    }
}

/// Check one element against the field's kind and nested definition.
pub(crate) fn check_element(fd: &FieldDescriptor, value: &Value) -> Result<(), MessageError> {
    if !fd.kind.accepts(value) {
        return Err(MessageError::KindMismatch {
            field: fd.name.clone(),
            expected: fd.kind,
            found: value.variant_name(),
        });
    }
    if let (Value::Message(nested), Some(expected)) = (value, fd.definition()) {
        if nested.definition.name() != expected.name() {
            return Err(MessageError::DefinitionMismatch {
                field: fd.name.clone(),
                expected: expected.name().to_owned(),
                found: nested.definition.name().to_owned(),
            });
        }
    }
    Ok(())
}

/// Default slots for `definition`. `path` holds the definitions currently
/// under construction; a nested field naming one of them starts absent.
fn default_values(
    definition: &Arc<MessageDefinition>,
    path: &mut Vec<Arc<MessageDefinition>>,
) -> Vec<Option<Value>> {
    path.push(Arc::clone(definition));
    let values = definition
        .fields()
        .map(|fd| default_slot(fd, path))
        .collect();
    path.pop();
    values
}

fn default_slot(fd: &FieldDescriptor, path: &mut Vec<Arc<MessageDefinition>>) -> Option<Value> {
    if fd.repeated {
        return Some(Value::List(Vec::new()));
    }
    if let Some(default) = fd.default {
        return Some(default());
    }
    let Some(nested) = fd.definition() else {
        return fd.kind.zero();
    };
    let recursive = path.iter().any(|d| d.name() == nested.name());
    if recursive || path.len() >= MAX_MESSAGE_DEPTH {
        return None;
    }
    let values = default_values(&nested, path);
    Some(Value::Message(Message {
        definition: nested,
        values,
        unknown: Vec::new(),
    }))
}
