//! Error types for wire-level reading and skipping.

use std::error::Error;
use std::fmt;

/// Errors raised by the varint codec and [`ByteCursor`](crate::ByteCursor).
///
/// [`Truncated`](WireError::Truncated) is the only variant that means
/// "the input stopped early"; every other variant describes bytes that can
/// never decode, no matter how much more input arrives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WireError {
    /// A read needed more bytes than remain in the buffer.
    Truncated {
        /// Bytes the read required, counted from the read position.
        needed: usize,
        /// Bytes that were actually available.
        available: usize,
    },
    /// A varint does not fit its target width (more than 10 bytes for the
    /// 64-bit domain, or a value past `2^bits - 1`).
    VarintOverflow {
        /// Width of the addressed integer domain.
        bits: u32,
    },
    /// A tag carried one of the reserved wire types 6 or 7.
    InvalidWireType {
        /// The raw 3-bit wire type.
        value: u32,
    },
    /// A tag carried field number zero, or a number past the 29-bit limit.
    InvalidFieldNumber {
        /// The offending field number.
        number: u32,
    },
    /// An END_GROUP tag closed a different field than the open START_GROUP.
    MismatchedEndGroup {
        /// Field number of the open group.
        expected: u32,
        /// Field number carried by the END_GROUP tag.
        found: u32,
    },
    /// Input ended before the END_GROUP tag of an open group.
    TruncatedGroup {
        /// Field number of the unterminated group.
        field: u32,
    },
    /// An END_GROUP tag appeared with no open group.
    UnexpectedEndGroup {
        /// Field number carried by the stray tag.
        field: u32,
    },
    /// Nesting exceeded the recursion guard.
    RecursionLimit {
        /// The configured depth limit.
        limit: usize,
    },
    /// A length-delimited string was not valid UTF-8.
    InvalidUtf8,
    /// A length does not fit the 32-bit length prefix.
    LengthOverflow {
        /// The length that was rejected.
        len: usize,
    },
    /// A position or range lies outside the buffer.
    OutOfBounds {
        /// The offending offset.
        offset: usize,
        /// Current buffer length.
        len: usize,
    },
}

impl WireError {
    /// Whether this error only means the input ended early.
    ///
    /// Incremental parsers treat exhaustion as "wait for more data"; every
    /// other error is fatal.
    pub fn is_exhaustion(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { needed, available } => {
                write!(f, "truncated input: needed {needed} bytes, {available} available")
            }
            Self::VarintOverflow { bits } => {
                write!(f, "varint exceeds the {bits}-bit domain")
            }
            Self::InvalidWireType { value } => write!(f, "invalid wire type {value}"),
            Self::InvalidFieldNumber { number } => write!(f, "invalid field number {number}"),
            Self::MismatchedEndGroup { expected, found } => {
                write!(
                    f,
                    "mismatched end-group tag: expected field {expected}, found {found}"
                )
            }
            Self::TruncatedGroup { field } => {
                write!(f, "truncated message: group {field} has no end-group tag")
            }
            Self::UnexpectedEndGroup { field } => {
                write!(f, "end-group tag for field {field} outside of a group")
            }
            Self::RecursionLimit { limit } => {
                write!(f, "nesting exceeds the recursion limit of {limit}")
            }
            Self::InvalidUtf8 => write!(f, "string field is not valid UTF-8"),
            Self::LengthOverflow { len } => {
                write!(f, "length {len} does not fit a 32-bit length prefix")
            }
            Self::OutOfBounds { offset, len } => {
                write!(f, "offset {offset} is outside the buffer (len {len})")
            }
        }
    }
}

impl Error for WireError {}
