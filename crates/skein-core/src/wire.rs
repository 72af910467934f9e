//! Wire types and field tags.
//!
//! A tag is `varint(field_number << 3 | wire_type)`. The wire type tells a
//! reader how to find the end of the value without knowing the schema.

use std::fmt;

use crate::error::WireError;

/// Largest field number a tag can carry (29 bits).
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// Physical encoding of a field value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WireType {
    /// Base-128 varint.
    Varint = 0,
    /// Eight little-endian bytes.
    Fixed64 = 1,
    /// Varint length followed by that many bytes.
    LengthDelimited = 2,
    /// Opens a group; fields follow until the matching [`WireType::EndGroup`].
    StartGroup = 3,
    /// Closes the group opened with the same field number.
    EndGroup = 4,
    /// Four little-endian bytes.
    Fixed32 = 5,
}

impl WireType {
    /// Parse the low three bits of a tag.
    pub fn from_u32(value: u32) -> Result<Self, WireError> {
        match value {
            0 => Ok(Self::Varint),
            1 => Ok(Self::Fixed64),
            2 => Ok(Self::LengthDelimited),
            3 => Ok(Self::StartGroup),
            4 => Ok(Self::EndGroup),
            5 => Ok(Self::Fixed32),
            other => Err(WireError::InvalidWireType { value: other }),
        }
    }

    /// The 3-bit wire value.
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Varint => "varint",
            Self::Fixed64 => "fixed64",
            Self::LengthDelimited => "length-delimited",
            Self::StartGroup => "start-group",
            Self::EndGroup => "end-group",
            Self::Fixed32 => "fixed32",
        };
        f.write_str(name)
    }
}

/// Combine a field number and wire type into a raw tag value.
pub fn make_tag(number: u32, wire_type: WireType) -> u32 {
    (number << 3) | wire_type.as_u32()
}

/// A decoded field tag.
///
/// # Examples
///
/// ```
/// use skein_core::{Tag, WireType};
///
/// let tag = Tag::from_raw(0x12).unwrap();
/// assert_eq!(tag.number, 2);
/// assert_eq!(tag.wire_type, WireType::LengthDelimited);
/// assert_eq!(tag.raw(), 0x12);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tag {
    /// Field number, `1..=MAX_FIELD_NUMBER`.
    pub number: u32,
    /// How the value that follows is encoded.
    pub wire_type: WireType,
}

impl Tag {
    /// Build a tag from its parts.
    pub fn new(number: u32, wire_type: WireType) -> Self {
        Self { number, wire_type }
    }

    /// Split a raw tag value, rejecting field number zero and wire types 6/7.
    pub fn from_raw(raw: u32) -> Result<Self, WireError> {
        let wire_type = WireType::from_u32(raw & 0x7)?;
        let number = raw >> 3;
        if number == 0 {
            return Err(WireError::InvalidFieldNumber { number });
        }
        Ok(Self { number, wire_type })
    }

    /// The raw `number << 3 | wire_type` value.
    pub fn raw(self) -> u32 {
        make_tag(self.number, self.wire_type)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.number, self.wire_type)
    }
}
