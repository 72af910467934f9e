//! Field value kinds and their wire encodings.

use std::fmt;

use skein_core::WireType;

use crate::value::Value;

/// The declared type of a message field.
///
/// The kind fixes both the wire type of the field's tag and which
/// [`Value`] variant the field holds:
///
/// | Kind | Value | Wire |
/// |---|---|---|
/// | `Double` | `Double` | fixed64 |
/// | `Float` | `Float` | fixed32 |
/// | `Int32`, `Sint32`, `Sfixed32`, `Enum` | `Int32` | varint / zigzag / fixed32 / varint |
/// | `Int64`, `Sint64`, `Sfixed64` | `Int64` | varint / zigzag / fixed64 |
/// | `Uint32`, `Fixed32` | `UInt32` | varint / fixed32 |
/// | `Uint64`, `Fixed64` | `UInt64` | varint / fixed64 |
/// | `Bool` | `Bool` | varint |
/// | `String`, `Bytes`, `Message` | `String`, `Bytes`, `Message` | length-delimited |
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// 64-bit IEEE-754.
    Double,
    /// 32-bit IEEE-754.
    Float,
    /// Signed 32-bit varint; negatives take ten bytes.
    Int32,
    /// Signed 64-bit varint.
    Int64,
    /// Unsigned 32-bit varint.
    Uint32,
    /// Unsigned 64-bit varint.
    Uint64,
    /// Zigzag-encoded signed 32-bit varint.
    Sint32,
    /// Zigzag-encoded signed 64-bit varint.
    Sint64,
    /// Four little-endian bytes, unsigned.
    Fixed32,
    /// Eight little-endian bytes, unsigned.
    Fixed64,
    /// Four little-endian bytes, signed.
    Sfixed32,
    /// Eight little-endian bytes, signed.
    Sfixed64,
    /// Varint `0` or `1`.
    Bool,
    /// Enumeration, encoded like `Int32`.
    Enum,
    /// UTF-8 text.
    String,
    /// Opaque bytes.
    Bytes,
    /// A nested message.
    Message,
}

impl ValueKind {
    /// Wire type of a single (unpacked) value of this kind.
    pub fn wire_type(self) -> WireType {
        match self {
            Self::Double | Self::Fixed64 | Self::Sfixed64 => WireType::Fixed64,
            Self::Float | Self::Fixed32 | Self::Sfixed32 => WireType::Fixed32,
            Self::String | Self::Bytes | Self::Message => WireType::LengthDelimited,
            Self::Int32
            | Self::Int64
            | Self::Uint32
            | Self::Uint64
            | Self::Sint32
            | Self::Sint64
            | Self::Bool
            | Self::Enum => WireType::Varint,
        }
    }

    /// Whether repeated fields of this kind may arrive in packed form.
    pub fn is_packable(self) -> bool {
        self.wire_type() != WireType::LengthDelimited
    }

    /// Whether `value` is the variant this kind stores.
    ///
    /// Lists are never accepted here; repeated fields check each element.
    pub fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Double, Value::Double(_))
                | (Self::Float, Value::Float(_))
                | (
                    Self::Int32 | Self::Sint32 | Self::Sfixed32 | Self::Enum,
                    Value::Int32(_)
                )
                | (Self::Int64 | Self::Sint64 | Self::Sfixed64, Value::Int64(_))
                | (Self::Uint32 | Self::Fixed32, Value::UInt32(_))
                | (Self::Uint64 | Self::Fixed64, Value::UInt64(_))
                | (Self::Bool, Value::Bool(_))
                | (Self::String, Value::String(_))
                | (Self::Bytes, Value::Bytes(_))
                | (Self::Message, Value::Message(_))
        )
    }

    /// The zero value for scalar kinds; `None` for [`ValueKind::Message`].
    pub fn zero(self) -> Option<Value> {
        let value = match self {
            Self::Double => Value::Double(0.0),
            Self::Float => Value::Float(0.0),
            Self::Int32 | Self::Sint32 | Self::Sfixed32 | Self::Enum => Value::Int32(0),
            Self::Int64 | Self::Sint64 | Self::Sfixed64 => Value::Int64(0),
            Self::Uint32 | Self::Fixed32 => Value::UInt32(0),
            Self::Uint64 | Self::Fixed64 => Value::UInt64(0),
            Self::Bool => Value::Bool(false),
            Self::String => Value::String(String::new()),
            Self::Bytes => Value::Bytes(Vec::new()),
            Self::Message => return None,
        };
        Some(value)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Double => "double",
            Self::Float => "float",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Sint32 => "sint32",
            Self::Sint64 => "sint64",
            Self::Fixed32 => "fixed32",
            Self::Fixed64 => "fixed64",
            Self::Sfixed32 => "sfixed32",
            Self::Sfixed64 => "sfixed64",
            Self::Bool => "bool",
            Self::Enum => "enum",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Message => "message",
        };
        f.write_str(name)
    }
}
