//! Message definitions: named, ordered field tables.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use skein_core::{Tag, WireType, MAX_FIELD_NUMBER};

use crate::descriptor::FieldDescriptor;
use crate::error::DefinitionError;
use crate::kind::ValueKind;

/// How a decoded tag maps onto a declared field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TagMatch {
    /// One value in the field's own wire type.
    Single,
    /// A length-delimited run of packed values.
    Packed,
}

/// An immutable message schema.
///
/// Fields keep their declaration order, which is also the order
/// [`Message::encode`](crate::Message::encode) writes them in. The
/// number-to-field index is built once by the builder.
///
/// # Examples
///
/// ```
/// use skein_message::{FieldDescriptor, MessageDefinition, ValueKind};
///
/// let person = MessageDefinition::builder("Person")
///     .field(FieldDescriptor::new("id", 1, ValueKind::Int32))
///     .field(FieldDescriptor::new("name", 2, ValueKind::String))
///     .build()
///     .unwrap();
///
/// assert_eq!(person.len(), 2);
/// assert_eq!(person.field_by_number(2).unwrap().name, "name");
/// ```
#[derive(Debug)]
pub struct MessageDefinition {
    name: String,
    fields: IndexMap<String, FieldDescriptor>,
    by_number: HashMap<u32, usize>,
}

impl MessageDefinition {
    /// Start declaring a definition called `name`.
    pub fn builder(name: impl Into<String>) -> MessageDefinitionBuilder {
        MessageDefinitionBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// The definition's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the definition declares no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    /// Declaration index of the named field.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.get_index_of(name)
    }

    /// Field at a declaration index.
    pub fn field_at(&self, index: usize) -> Option<&FieldDescriptor> {
        self.fields.get_index(index).map(|(_, fd)| fd)
    }

    /// Look up a field by number.
    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.index_of_number(number)
            .and_then(|index| self.field_at(index))
    }

    /// Declaration index of the field with this number.
    pub fn index_of_number(&self, number: u32) -> Option<usize> {
        self.by_number.get(&number).copied()
    }

    /// Resolve a decoded tag. `None` means the tag is unknown to this
    /// definition, either by number or by an incompatible wire type.
    pub(crate) fn resolve(&self, tag: Tag) -> Option<(usize, &FieldDescriptor, TagMatch)> {
        let index = self.index_of_number(tag.number)?;
        let fd = self.field_at(index)?;
        if tag.wire_type == fd.wire_type() {
            Some((index, fd, TagMatch::Single))
        } else if tag.wire_type == WireType::LengthDelimited && fd.accepts_packed() {
            Some((index, fd, TagMatch::Packed))
        } else {
            None
        }
    }
}

/// Builder returned by [`MessageDefinition::builder`].
#[derive(Debug)]
pub struct MessageDefinitionBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl MessageDefinitionBuilder {
    /// Declare the next field.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Validate the field table and freeze it.
    ///
    /// Nested definition factories are not called here, so a definition may
    /// name itself as a field type.
    pub fn build(self) -> Result<Arc<MessageDefinition>, DefinitionError> {
        let mut fields: IndexMap<String, FieldDescriptor> = IndexMap::new();
        let mut by_number: HashMap<u32, usize> = HashMap::new();

        for fd in self.fields {
            // 1. Name and number.
            if fd.name.is_empty() {
                return Err(DefinitionError::EmptyName { number: fd.number });
            }
            if fd.number == 0 || fd.number > MAX_FIELD_NUMBER {
                return Err(DefinitionError::InvalidFieldNumber {
                    field: fd.name,
                    number: fd.number,
                });
            }
            if fields.contains_key(&fd.name) {
                return Err(DefinitionError::DuplicateName { name: fd.name });
            }
            if let Some(&index) = by_number.get(&fd.number) {
                let first = fields
                    .get_index(index)
                    .map(|(name, _)| name.clone())
                    .unwrap_or_default();
                return Err(DefinitionError::DuplicateNumber {
                    number: fd.number,
                    first,
                    second: fd.name,
                });
            }

            // 2. Kind and factories agree.
            match (fd.kind, fd.message.is_some()) {
                (ValueKind::Message, false) => {
                    return Err(DefinitionError::MissingMessageType { field: fd.name });
                }
                (kind, true) if kind != ValueKind::Message => {
                    return Err(DefinitionError::UnexpectedMessageType {
                        field: fd.name,
                        kind,
                    });
                }
                _ => {}
            }

            // 3. Defaults produce the declared kind.
            if let Some(default) = fd.default {
                if fd.repeated {
                    return Err(DefinitionError::RepeatedDefault { field: fd.name });
                }
                let value = default();
                if !fd.kind.accepts(&value) {
                    return Err(DefinitionError::DefaultMismatch {
                        field: fd.name,
                        expected: fd.kind,
                        found: value.variant_name(),
                    });
                }
            }

            by_number.insert(fd.number, fields.len());
            fields.insert(fd.name.clone(), fd);
        }

        Ok(Arc::new(MessageDefinition {
            name: self.name,
            fields,
            by_number,
        }))
    }
}
