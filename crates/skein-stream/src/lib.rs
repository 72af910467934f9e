//! Chunked slice stream demultiplexer for the Skein protocol stack.
//!
//! A slice stream is a sequence of `varint32(type) varint32(size) payload`
//! records arriving in arbitrarily sized chunks. [`SliceStream`] parses the
//! chunks incrementally, hands each completed [`Slice`] to the handler
//! registered for its type, and rewrites the chunk in place (forward,
//! replace, or drop) before it is passed downstream.
//!
//! Handlers are asynchronous ([`SliceHandler`] returns a boxed future) and
//! are awaited one at a time, in stream order. [`sync_handler`] and
//! [`async_handler`] adapt plain closures.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod ext;
pub mod handler;
pub mod metrics;
pub mod slice;
pub mod stream;

pub use config::{ConfigError, StreamConfig, DEFAULT_MAX_SLICE_SIZE};
pub use error::{HandlerError, SliceInfo, StreamError};
pub use handler::{async_handler, sync_handler, AsyncFnHandler, FnHandler, SliceHandler};
pub use metrics::StreamMetrics;
pub use slice::{encode_slice, Disposition, Slice, SliceHeader};
pub use stream::{SliceStream, SliceStreamBuilder};
