//! Wire-level primitives for the Skein protocol stack.
//!
//! This is the leaf crate with no internal dependencies. It defines the
//! pieces every other layer builds on: base-128 varints and zigzag
//! transforms, wire types and field tags, and [`ByteCursor`], the growable
//! buffer with a single read/write position that both the message codec and
//! the slice stream operate on.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cursor;
pub mod error;
pub mod varint;
pub mod wire;

pub use cursor::{ByteCursor, MAX_GROUP_DEPTH};
pub use error::WireError;
pub use varint::{
    decode_varint, decode_varint32, encode_varint, encode_varint32, unzigzag32, unzigzag64,
    varint_len, write_varint, zigzag32, zigzag64, VarintBytes, MAX_VARINT32_LEN, MAX_VARINT_LEN,
};
pub use wire::{make_tag, Tag, WireType, MAX_FIELD_NUMBER};
