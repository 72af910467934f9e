//! Error types for schema construction and message encoding.

use std::error::Error;
use std::fmt;

use skein_core::WireError;

use crate::kind::ValueKind;

/// Errors from [`MessageDefinitionBuilder::build`](crate::MessageDefinitionBuilder::build).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DefinitionError {
    /// A field number is zero or past the 29-bit limit.
    InvalidFieldNumber {
        /// The field's name.
        field: String,
        /// The rejected number.
        number: u32,
    },
    /// Two fields share a number.
    DuplicateNumber {
        /// The shared number.
        number: u32,
        /// Name of the field declared first.
        first: String,
        /// Name of the field declared second.
        second: String,
    },
    /// Two fields share a name.
    DuplicateName {
        /// The shared name.
        name: String,
    },
    /// A field name is empty.
    EmptyName {
        /// Number of the unnamed field.
        number: u32,
    },
    /// A message field has no definition factory.
    MissingMessageType {
        /// The field's name.
        field: String,
    },
    /// A non-message field carries a definition factory.
    UnexpectedMessageType {
        /// The field's name.
        field: String,
        /// The field's declared kind.
        kind: ValueKind,
    },
    /// A repeated field carries a default factory.
    RepeatedDefault {
        /// The field's name.
        field: String,
    },
    /// A default factory produced a value of the wrong kind.
    DefaultMismatch {
        /// The field's name.
        field: String,
        /// The field's declared kind.
        expected: ValueKind,
        /// Variant the factory produced.
        found: &'static str,
    },
}

impl fmt::Display for DefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFieldNumber { field, number } => {
                write!(f, "field '{field}' has invalid number {number}")
            }
            Self::DuplicateNumber {
                number,
                first,
                second,
            } => write!(
                f,
                "fields '{first}' and '{second}' share field number {number}"
            ),
            Self::DuplicateName { name } => write!(f, "duplicate field name '{name}'"),
            Self::EmptyName { number } => write!(f, "field {number} has an empty name"),
            Self::MissingMessageType { field } => {
                write!(f, "message field '{field}' has no definition")
            }
            Self::UnexpectedMessageType { field, kind } => {
                write!(f, "{kind} field '{field}' cannot carry a message definition")
            }
            Self::RepeatedDefault { field } => {
                write!(f, "repeated field '{field}' cannot carry a default")
            }
            Self::DefaultMismatch {
                field,
                expected,
                found,
            } => write!(
                f,
                "default for {expected} field '{field}' produced a {found} value"
            ),
        }
    }
}

impl Error for DefinitionError {}

/// Errors from building, encoding, or decoding a [`Message`](crate::Message).
#[derive(Clone, Debug, PartialEq)]
pub enum MessageError {
    /// Malformed or truncated wire data.
    Wire(WireError),
    /// No field with this name exists in the definition.
    UnknownField {
        /// Name of the definition.
        message: String,
        /// The requested field name.
        name: String,
    },
    /// A value does not match its field's kind.
    KindMismatch {
        /// The field's name.
        field: String,
        /// The field's declared kind.
        expected: ValueKind,
        /// Variant that was supplied.
        found: &'static str,
    },
    /// A nested message was built from a different definition than the
    /// field declares.
    DefinitionMismatch {
        /// The field's name.
        field: String,
        /// Definition the field declares.
        expected: String,
        /// Definition of the supplied message.
        found: String,
    },
    /// A list operation targeted a singular field.
    NotRepeated {
        /// The field's name.
        field: String,
    },
    /// A message field's definition factory is missing.
    MissingDefinition {
        /// The field's name.
        field: String,
    },
    /// An error inside the value of a known field.
    Nested {
        /// The field being read or written.
        field: String,
        /// The underlying error.
        source: Box<MessageError>,
    },
    /// Nested messages exceed the depth limit.
    RecursionLimit {
        /// The depth limit.
        limit: usize,
    },
}

impl MessageError {
    pub(crate) fn nested(field: &str, source: MessageError) -> Self {
        Self::Nested {
            field: field.to_owned(),
            source: Box::new(source),
        }
    }

    /// Field names from the outermost message down to the failure.
    pub fn field_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = self;
        while let Self::Nested { field, source } = current {
            path.push(field.as_str());
            current = source;
        }
        path
    }

    /// The innermost error, past every [`MessageError::Nested`] layer.
    pub fn root_cause(&self) -> &MessageError {
        let mut current = self;
        while let Self::Nested { source, .. } = current {
            current = source;
        }
        current
    }
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wire(e) => write!(f, "wire error: {e}"),
            Self::UnknownField { message, name } => {
                write!(f, "message '{message}' has no field '{name}'")
            }
            Self::KindMismatch {
                field,
                expected,
                found,
            } => write!(f, "field '{field}' expects {expected}, got {found}"),
            Self::DefinitionMismatch {
                field,
                expected,
                found,
            } => write!(
                f,
                "field '{field}' expects message '{expected}', got '{found}'"
            ),
            Self::NotRepeated { field } => write!(f, "field '{field}' is not repeated"),
            Self::MissingDefinition { field } => {
                write!(f, "message field '{field}' has no definition")
            }
            Self::Nested { field, source } => write!(f, "field '{field}': {source}"),
            Self::RecursionLimit { limit } => {
                write!(f, "message nesting exceeds the depth limit of {limit}")
            }
        }
    }
}

impl Error for MessageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Wire(e) => Some(e),
            Self::Nested { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<WireError> for MessageError {
    fn from(e: WireError) -> Self {
        Self::Wire(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_chain_exposes_path_and_cause() {
        let err = MessageError::nested(
            "child",
            MessageError::nested("name", MessageError::Wire(WireError::InvalidUtf8)),
        );
        assert_eq!(err.field_path(), vec!["child", "name"]);
        assert_eq!(err.root_cause(), &MessageError::Wire(WireError::InvalidUtf8));
        assert_eq!(
            err.to_string(),
            "field 'child': field 'name': wire error: string field is not valid UTF-8"
        );
    }

    #[test]
    fn source_walks_the_chain() {
        let err = MessageError::nested("a", MessageError::Wire(WireError::InvalidUtf8));
        let first = err.source().expect("nested has a source");
        let second = first.source().expect("wire error is the source");
        assert_eq!(second.to_string(), WireError::InvalidUtf8.to_string());
    }
}
