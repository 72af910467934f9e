//! Wire encoding and decoding of [`Message`] values.
//!
//! Encoding walks declared fields in declaration order and then appends
//! unknown fields verbatim. Decoding reads tags until the input ends;
//! known tags are read by their field's kind, anything else is captured
//! verbatim, tag bytes included, as an [`UnknownField`] using the bounds
//! [`ByteCursor::skip_field`] finds. Nested bodies are decoded in place
//! from one input buffer.

use std::sync::Arc;

use skein_core::{unzigzag32, unzigzag64, zigzag32, zigzag64, ByteCursor, WireError};

use crate::definition::{MessageDefinition, TagMatch};
use crate::descriptor::FieldDescriptor;
use crate::error::MessageError;
use crate::kind::ValueKind;
use crate::message::{append, Message, ResetMode, UnknownField};
use crate::value::Value;

/// Deepest nesting of message values the codec accepts.
pub const MAX_MESSAGE_DEPTH: usize = 64;

impl Message {
    /// Serialize to wire bytes.
    ///
    /// # Errors
    ///
    /// [`MessageError::KindMismatch`] if a slot holds a value of the wrong
    /// kind (possible after edits through [`Message::get_mut`]), wrapped in
    /// [`MessageError::Nested`] with the field name.
    pub fn encode(&self) -> Result<Vec<u8>, MessageError> {
        let mut out = ByteCursor::new();
        self.write_to(&mut out, 0)?;
        Ok(out.into_inner())
    }

    /// Decode `bytes` into a new message whose fields start absent.
    pub fn decode(
        definition: Arc<MessageDefinition>,
        bytes: &[u8],
    ) -> Result<Message, MessageError> {
        let mut message = Message::empty(definition);
        message.merge_from(bytes, ResetMode::Absent)?;
        Ok(message)
    }

    /// Reset per `mode`, then read `bytes` into this message.
    ///
    /// On error the message is left in its reset state, never half-filled.
    pub fn merge_from(&mut self, bytes: &[u8], mode: ResetMode) -> Result<(), MessageError> {
        self.reset(mode);
        let mut input = ByteCursor::from_vec(bytes.to_vec());
        let end = input.len();
        let result = self.read_fields(&mut input, end, 0);
        if let Err(e) = &result {
            tracing::debug!(
                definition = %self.definition.name(),
                error = %e,
                "decode failed, message reset"
            );
            self.reset(mode);
        }
        result
    }

    // ── Encoding ────────────────────────────────────────────────

    fn write_to(&self, out: &mut ByteCursor, depth: usize) -> Result<(), MessageError> {
        if depth > MAX_MESSAGE_DEPTH {
            return Err(MessageError::RecursionLimit {
                limit: MAX_MESSAGE_DEPTH,
            });
        }
        for (fd, slot) in self.definition.fields().zip(&self.values) {
            let Some(value) = slot else { continue };
            match (fd.repeated, value) {
                (true, Value::List(items)) => {
                    for item in items {
                        write_field(out, fd, item, depth)?;
                    }
                }
                (true, other) => {
                    return Err(MessageError::KindMismatch {
                        field: fd.name.clone(),
                        expected: fd.kind,
                        found: other.variant_name(),
                    });
                }
                (false, v) => write_field(out, fd, v, depth)?,
            }
        }
        for field in &self.unknown {
            out.write_raw_bytes(&field.raw);
        }
        Ok(())
    }

    // ── Decoding ────────────────────────────────────────────────

    /// Read fields from the cursor position up to `end`, which marks the
    /// end of this message's body within `input`. Nested bodies are read
    /// in place, never copied.
    fn read_fields(
        &mut self,
        input: &mut ByteCursor,
        end: usize,
        depth: usize,
    ) -> Result<(), MessageError> {
        if depth > MAX_MESSAGE_DEPTH {
            return Err(MessageError::RecursionLimit {
                limit: MAX_MESSAGE_DEPTH,
            });
        }
        let definition = Arc::clone(&self.definition);

        while input.position() < end {
            let field_start = input.position();
            let tag = input.read_tag()?;
            match definition.resolve(tag) {
                Some((index, fd, TagMatch::Single)) => {
                    let value = read_bounded(input, fd, field_start, end, depth)
                        .map_err(|e| MessageError::nested(&fd.name, e))?;
                    if fd.repeated {
                        append(&mut self.values[index], value);
                    } else {
                        self.values[index] = Some(value);
                    }
                }
                Some((index, fd, TagMatch::Packed)) => {
                    let run_end = body_end(input, field_start, end)
                        .map_err(|e| MessageError::nested(&fd.name, e.into()))?;
                    while input.position() < run_end {
                        let value_start = input.position();
                        let value = read_bounded(input, fd, value_start, run_end, depth)
                            .map_err(|e| MessageError::nested(&fd.name, e))?;
                        append(&mut self.values[index], value);
                    }
                    // An empty run still marks the field present.
                    if self.values[index].is_none() {
                        self.values[index] = Some(Value::List(Vec::new()));
                    }
                }
                None => {
                    input.skip_field(tag, 0)?;
                    within(input, field_start, end)?;
                    // Tag bytes included, so a non-minimal tag survives.
                    let raw = input.as_slice()[field_start..input.position()].to_vec();
                    tracing::trace!(
                        definition = %definition.name(),
                        field = tag.number,
                        wire_type = %tag.wire_type,
                        len = raw.len(),
                        "captured unknown field"
                    );
                    self.unknown.push(UnknownField { tag, raw });
                }
            }
        }
        Ok(())
    }
}

/// Fail if the field that began at `start` ran past `end`.
fn within(input: &ByteCursor, start: usize, end: usize) -> Result<(), WireError> {
    if input.position() > end {
        return Err(WireError::Truncated {
            needed: input.position() - start,
            available: end - start,
        });
    }
    Ok(())
}

/// Read a varint32 length and return where the body it prefixes ends.
/// The body must fit before `end`.
fn body_end(input: &mut ByteCursor, start: usize, end: usize) -> Result<usize, WireError> {
    let len = input.read_varint32()? as usize;
    within(input, start, end)?;
    let available = end - input.position();
    if len > available {
        return Err(WireError::Truncated {
            needed: len,
            available,
        });
    }
    Ok(input.position() + len)
}

fn write_field(
    out: &mut ByteCursor,
    fd: &FieldDescriptor,
    value: &Value,
    depth: usize,
) -> Result<(), MessageError> {
    if !fd.kind.accepts(value) {
        return Err(MessageError::KindMismatch {
            field: fd.name.clone(),
            expected: fd.kind,
            found: value.variant_name(),
        });
    }
    out.write_tag(fd.number, fd.wire_type());
    write_value(out, fd.kind, value, depth).map_err(|e| MessageError::nested(&fd.name, e))
}

fn write_value(
    out: &mut ByteCursor,
    kind: ValueKind,
    value: &Value,
    depth: usize,
) -> Result<(), MessageError> {
    match (kind, value) {
        (ValueKind::Double, Value::Double(v)) => out.write_double(*v),
        (ValueKind::Float, Value::Float(v)) => out.write_float(*v),
        // Negative int32 values are sign-extended to the 64-bit domain.
        (ValueKind::Int32 | ValueKind::Enum, Value::Int32(v)) => {
            out.write_varint64(i64::from(*v) as u64)
        }
        (ValueKind::Int64, Value::Int64(v)) => out.write_varint64(*v as u64),
        (ValueKind::Uint32, Value::UInt32(v)) => out.write_varint32(*v),
        (ValueKind::Uint64, Value::UInt64(v)) => out.write_varint64(*v),
        (ValueKind::Sint32, Value::Int32(v)) => out.write_varint32(zigzag32(*v)),
        (ValueKind::Sint64, Value::Int64(v)) => out.write_varint64(zigzag64(*v)),
        (ValueKind::Fixed32, Value::UInt32(v)) => out.write_fixed32(*v),
        (ValueKind::Fixed64, Value::UInt64(v)) => out.write_fixed64(*v),
        (ValueKind::Sfixed32, Value::Int32(v)) => out.write_sfixed32(*v),
        (ValueKind::Sfixed64, Value::Int64(v)) => out.write_sfixed64(*v),
        (ValueKind::Bool, Value::Bool(v)) => out.write_bool(*v),
        (ValueKind::String, Value::String(v)) => out.write_string(v)?,
        (ValueKind::Bytes, Value::Bytes(v)) => out.write_length_delimited(v)?,
        (ValueKind::Message, Value::Message(nested)) => {
            let mut body = ByteCursor::new();
            nested.write_to(&mut body, depth + 1)?;
            out.write_length_delimited(body.as_slice())?;
        }
        (kind, other) => {
            return Err(MessageError::KindMismatch {
                field: String::new(),
                expected: kind,
                found: other.variant_name(),
            })
        }
    }
    Ok(())
}

/// Read one value of `fd` that began at `start` and must end by `end`.
fn read_bounded(
    input: &mut ByteCursor,
    fd: &FieldDescriptor,
    start: usize,
    end: usize,
    depth: usize,
) -> Result<Value, MessageError> {
    let value = read_value(input, fd, depth)?;
    within(input, start, end)?;
    Ok(value)
}

fn read_value(
    input: &mut ByteCursor,
    fd: &FieldDescriptor,
    depth: usize,
) -> Result<Value, MessageError> {
    // 32-bit varint kinds are read in the 64-bit domain and truncated, so
    // sign-extended negatives decode.
    let value = match fd.kind {
        ValueKind::Double => Value::Double(input.read_double()?),
        ValueKind::Float => Value::Float(input.read_float()?),
        ValueKind::Int32 | ValueKind::Enum => Value::Int32(input.read_varint64()? as i32),
        ValueKind::Int64 => Value::Int64(input.read_varint64()? as i64),
        ValueKind::Uint32 => Value::UInt32(input.read_varint64()? as u32),
        ValueKind::Uint64 => Value::UInt64(input.read_varint64()?),
        ValueKind::Sint32 => Value::Int32(unzigzag32(input.read_varint64()? as u32)),
        ValueKind::Sint64 => Value::Int64(unzigzag64(input.read_varint64()?)),
        ValueKind::Fixed32 => Value::UInt32(input.read_fixed32()?),
        ValueKind::Fixed64 => Value::UInt64(input.read_fixed64()?),
        ValueKind::Sfixed32 => Value::Int32(input.read_sfixed32()?),
        ValueKind::Sfixed64 => Value::Int64(input.read_sfixed64()?),
        ValueKind::Bool => Value::Bool(input.read_bool()?),
        ValueKind::String => Value::String(input.read_string()?.to_owned()),
        ValueKind::Bytes => Value::Bytes(input.read_length_delimited()?.to_vec()),
        ValueKind::Message => {
            let definition = fd.definition().ok_or_else(|| MessageError::MissingDefinition {
                field: fd.name.clone(),
            })?;
            let (start, limit) = (input.position(), input.len());
            let end = body_end(input, start, limit)?;
            let mut nested = Message::empty(definition);
            nested.read_fields(input, end, depth + 1)?;
            Value::Message(nested)
        }
    };
    Ok(value)
}
