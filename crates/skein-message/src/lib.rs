//! Schema-driven message codec for the Skein protocol stack.
//!
//! Schemas are declared at runtime as [`MessageDefinition`]s: ordered
//! tables of [`FieldDescriptor`]s built once and shared through `Arc`. A
//! [`Message`] holds one optional [`Value`] per declared field and encodes
//! to bytes that are wire-compatible with Protocol Buffers. Fields a
//! definition does not declare survive a decode/encode round trip
//! byte-for-byte.
//!
//! Recursive schemas refer to their nested definitions through plain
//! `fn() -> Arc<MessageDefinition>` factories, resolved only when a nested
//! value is actually constructed or decoded.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod definition;
pub mod descriptor;
pub mod error;
pub mod kind;
pub mod message;
pub mod value;

pub use codec::MAX_MESSAGE_DEPTH;
pub use definition::{MessageDefinition, MessageDefinitionBuilder};
pub use descriptor::{DefaultFn, DefinitionFn, FieldDescriptor};
pub use error::{DefinitionError, MessageError};
pub use kind::ValueKind;
pub use message::{Message, ResetMode, UnknownField};
pub use value::Value;
