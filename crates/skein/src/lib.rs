//! Skein: a Protocol Buffers compatible message codec and a chunked slice
//! stream demultiplexer.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Skein sub-crates. For most users, adding `skein` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use futures::executor::block_on;
//! use skein::prelude::*;
//!
//! let person = MessageDefinition::builder("Person")
//!     .field(FieldDescriptor::new("id", 1, ValueKind::Int32))
//!     .field(FieldDescriptor::new("name", 2, ValueKind::String))
//!     .build()
//!     .unwrap();
//!
//! // Bump every person's id as it passes through the stream.
//! let def = person.clone();
//! let mut stream = SliceStream::builder()
//!     .handler(1, sync_handler(move |slice| {
//!         let mut message = slice.decode_message(def.clone())?;
//!         let id = message.get("id").and_then(Value::as_i32).unwrap_or_default();
//!         message.set("id", id + 1)?;
//!         slice.replace_with_message(&message)?;
//!         Ok(())
//!     }))
//!     .build()
//!     .unwrap();
//!
//! let message = Message::from_values(person.clone(), [("id", 41)]).unwrap();
//! let input = encode_slice(1, &message.encode().unwrap());
//!
//! // Feed the stream in two halves; the slice comes out whole and edited.
//! let (first, second) = input.split_at(3);
//! block_on(stream.feed(first.to_vec(), false)).unwrap();
//! assert!(stream.buffer().is_empty());
//! block_on(stream.feed(second.to_vec(), false)).unwrap();
//!
//! let (header, end) = SliceHeader::decode(stream.buffer(), 0).unwrap();
//! assert_eq!(header.slice_type, 1);
//! let edited = Message::decode(person, &stream.buffer()[end..]).unwrap();
//! assert_eq!(edited.get("id"), Some(&Value::Int32(42)));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`wire`] | `skein-core` | Varints, zigzag, wire types, tags, `ByteCursor` |
//! | [`message`] | `skein-message` | Definitions, descriptors, values, the message codec |
//! | [`stream`] | `skein-stream` | Slices, handlers, the slice stream |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Wire-level primitives (`skein-core`).
///
/// Varint and zigzag arithmetic, [`wire::WireType`] and [`wire::Tag`], and
/// [`wire::ByteCursor`], the buffer both higher layers read and write.
pub use skein_core as wire;

/// Schema-driven message codec (`skein-message`).
///
/// Declare schemas with [`message::MessageDefinition::builder`], then
/// build, encode, and decode [`message::Message`] values.
pub use skein_message as message;

/// Chunked slice stream demultiplexer (`skein-stream`).
///
/// [`stream::SliceStream`] dispatches slices to [`stream::SliceHandler`]s
/// and rewrites each chunk according to their decisions.
pub use skein_stream as stream;

/// Common imports for typical Skein usage.
///
/// ```rust
/// use skein::prelude::*;
/// ```
pub mod prelude {
    // Wire
    pub use skein_core::{ByteCursor, Tag, WireError, WireType};

    // Messages
    pub use skein_message::{
        FieldDescriptor, Message, MessageDefinition, MessageError, ResetMode, Value, ValueKind,
    };

    // Stream
    pub use skein_stream::{
        async_handler, encode_slice, sync_handler, Disposition, HandlerError, Slice,
        SliceHandler, SliceHeader, SliceStream, StreamConfig, StreamError,
    };
}
