//! Error types for slice handlers and the stream.

use std::error::Error;
use std::fmt;

use skein_core::WireError;
use skein_message::MessageError;

/// Failure reported by a [`SliceHandler`](crate::SliceHandler).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandlerError {
    /// Human-readable description of the failure.
    pub reason: String,
}

impl HandlerError {
    /// A handler error with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler failed: {}", self.reason)
    }
}

impl Error for HandlerError {}

impl From<MessageError> for HandlerError {
    fn from(e: MessageError) -> Self {
        Self::new(e.to_string())
    }
}

/// Identity of the slice a stream error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliceInfo {
    /// The slice's type id.
    pub slice_type: u32,
    /// Payload size declared in its header.
    pub declared_size: usize,
    /// Payload bytes received before the error.
    pub received: usize,
}

impl fmt::Display for SliceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "slice type {} ({}/{} bytes)",
            self.slice_type, self.received, self.declared_size
        )
    }
}

/// Errors from [`SliceStream::feed`](crate::SliceStream::feed).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamError {
    /// A slice header can never decode (overlong or out-of-range varint).
    Malformed {
        /// Offset of the header in the working buffer.
        offset: usize,
        /// The underlying wire error.
        source: WireError,
    },
    /// A header declares, or a handler produced, a payload past
    /// [`StreamConfig::max_slice_size`](crate::StreamConfig::max_slice_size).
    SliceTooLarge {
        /// The slice's type id.
        slice_type: u32,
        /// The offending size.
        size: usize,
        /// The configured limit.
        limit: usize,
    },
    /// A handler failed; the rest of the feed was abandoned.
    Handler {
        /// The slice being handled.
        slice: SliceInfo,
        /// The handler's error.
        source: HandlerError,
    },
    /// A buffer edit fell outside the working buffer.
    Buffer(WireError),
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { offset, source } => {
                write!(f, "malformed slice header at offset {offset}: {source}")
            }
            Self::SliceTooLarge {
                slice_type,
                size,
                limit,
            } => write!(
                f,
                "slice type {slice_type} has size {size}, over the limit of {limit}"
            ),
            Self::Handler { slice, source } => write!(f, "{slice}: {source}"),
            Self::Buffer(e) => write!(f, "buffer edit failed: {e}"),
        }
    }
}

impl Error for StreamError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Malformed { source, .. } => Some(source),
            Self::Handler { source, .. } => Some(source),
            Self::Buffer(e) => Some(e),
            Self::SliceTooLarge { .. } => None,
        }
    }
}
