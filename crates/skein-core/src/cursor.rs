//! Growable byte buffer with a single read/write position.
//!
//! [`ByteCursor`] is the substrate for both the message codec and the
//! slice stream. Reads advance the position and fail with
//! [`WireError::Truncated`] instead of returning short data; a failed read
//! leaves the position where it was. Writes land at the position and grow
//! the buffer first, never truncating.

use std::ops::Range;

use crate::error::WireError;
use crate::varint::{decode_varint, decode_varint32, encode_varint};
use crate::wire::{Tag, WireType, MAX_FIELD_NUMBER};

/// Maximum START_GROUP nesting accepted by [`ByteCursor::skip_field`].
pub const MAX_GROUP_DEPTH: usize = 64;

/// Sequential read/write cursor over an owned byte buffer.
///
/// # Examples
///
/// ```
/// use skein_core::{ByteCursor, WireType};
///
/// let mut out = ByteCursor::new();
/// out.write_tag(2, WireType::LengthDelimited);
/// out.write_string("hi").unwrap();
///
/// let mut input = ByteCursor::from_vec(out.into_inner());
/// let tag = input.read_tag().unwrap();
/// assert_eq!(tag.number, 2);
/// assert_eq!(input.read_string().unwrap(), "hi");
/// assert!(input.is_at_end());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ByteCursor {
    buf: Vec<u8>,
    pos: usize,
}

impl ByteCursor {
    /// Empty cursor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty cursor with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            pos: 0,
        }
    }

    /// Take ownership of `buf`, positioned at its start.
    pub fn from_vec(buf: Vec<u8>) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current read/write position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move the position. `pos` may equal the buffer length.
    pub fn set_position(&mut self, pos: usize) -> Result<(), WireError> {
        if pos > self.buf.len() {
            return Err(WireError::OutOfBounds {
                offset: pos,
                len: self.buf.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Total buffer length.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer holds no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes between the position and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Whether the position has reached the end of the buffer.
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// The whole buffer, independent of the position.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Release the buffer.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    /// Drop all bytes and rewind.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.pos = 0;
    }

    // ── Reads ───────────────────────────────────────────────────

    fn ensure_remaining(&self, needed: usize) -> Result<(), WireError> {
        let available = self.remaining();
        if needed > available {
            return Err(WireError::Truncated { needed, available });
        }
        Ok(())
    }

    /// Read exactly `len` bytes.
    pub fn read_raw_bytes(&mut self, len: usize) -> Result<&[u8], WireError> {
        self.ensure_remaining(len)?;
        let start = self.pos;
        self.pos += len;
        Ok(&self.buf[start..self.pos])
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_raw_bytes(N)?);
        Ok(out)
    }

    /// Little-endian `u32`.
    pub fn read_fixed32(&mut self) -> Result<u32, WireError> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Little-endian `u64`.
    pub fn read_fixed64(&mut self) -> Result<u64, WireError> {
        self.read_array().map(u64::from_le_bytes)
    }

    /// Little-endian `i32`.
    pub fn read_sfixed32(&mut self) -> Result<i32, WireError> {
        self.read_array().map(i32::from_le_bytes)
    }

    /// Little-endian `i64`.
    pub fn read_sfixed64(&mut self) -> Result<i64, WireError> {
        self.read_array().map(i64::from_le_bytes)
    }

    /// Little-endian IEEE-754 single.
    pub fn read_float(&mut self) -> Result<f32, WireError> {
        self.read_array().map(f32::from_le_bytes)
    }

    /// Little-endian IEEE-754 double.
    pub fn read_double(&mut self) -> Result<f64, WireError> {
        self.read_array().map(f64::from_le_bytes)
    }

    /// A varint in the full 64-bit domain.
    pub fn read_varint64(&mut self) -> Result<u64, WireError> {
        let (value, next) = decode_varint(&self.buf, self.pos)?;
        self.pos = next;
        Ok(value)
    }

    /// A varint that must fit in 32 bits.
    pub fn read_varint32(&mut self) -> Result<u32, WireError> {
        let (value, next) = decode_varint32(&self.buf, self.pos)?;
        self.pos = next;
        Ok(value)
    }

    /// A varint interpreted as a boolean (any non-zero value is `true`).
    pub fn read_bool(&mut self) -> Result<bool, WireError> {
        Ok(self.read_varint64()? != 0)
    }

    /// A field tag.
    pub fn read_tag(&mut self) -> Result<Tag, WireError> {
        let start = self.pos;
        let raw = self.read_varint32()?;
        Tag::from_raw(raw).inspect_err(|_| self.pos = start)
    }

    /// A varint32 length followed by that many bytes.
    pub fn read_length_delimited(&mut self) -> Result<&[u8], WireError> {
        let start = self.pos;
        let len = self.read_varint32()? as usize;
        if let Err(e) = self.ensure_remaining(len) {
            self.pos = start;
            return Err(e);
        }
        self.read_raw_bytes(len)
    }

    /// A length-delimited UTF-8 string.
    pub fn read_string(&mut self) -> Result<&str, WireError> {
        let bytes = self.read_length_delimited()?;
        std::str::from_utf8(bytes).map_err(|_| WireError::InvalidUtf8)
    }

    // ── Writes ──────────────────────────────────────────────────

    /// Grow capacity so `len` bytes fit at the position: double the
    /// current capacity or fit exactly, whichever is larger.
    fn reserve_for_write(&mut self, len: usize) {
        let end = self.pos + len;
        if end > self.buf.capacity() {
            let target = end.max(self.buf.capacity() * 2);
            self.buf.reserve_exact(target - self.buf.len());
        }
    }

    /// Write `bytes` at the position, overwriting or extending the buffer.
    pub fn write_raw_bytes(&mut self, bytes: &[u8]) {
        self.reserve_for_write(bytes.len());
        let end = self.pos + bytes.len();
        if end > self.buf.len() {
            self.buf.resize(end, 0);
        }
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
    }

    /// Little-endian `u32`.
    pub fn write_fixed32(&mut self, v: u32) {
        self.write_raw_bytes(&v.to_le_bytes());
    }

    /// Little-endian `u64`.
    pub fn write_fixed64(&mut self, v: u64) {
        self.write_raw_bytes(&v.to_le_bytes());
    }

    /// Little-endian `i32`.
    pub fn write_sfixed32(&mut self, v: i32) {
        self.write_raw_bytes(&v.to_le_bytes());
    }

    /// Little-endian `i64`.
    pub fn write_sfixed64(&mut self, v: i64) {
        self.write_raw_bytes(&v.to_le_bytes());
    }

    /// Little-endian IEEE-754 single.
    pub fn write_float(&mut self, v: f32) {
        self.write_raw_bytes(&v.to_le_bytes());
    }

    /// Little-endian IEEE-754 double.
    pub fn write_double(&mut self, v: f64) {
        self.write_raw_bytes(&v.to_le_bytes());
    }

    /// A 64-bit varint.
    pub fn write_varint64(&mut self, v: u64) {
        self.write_raw_bytes(&encode_varint(v));
    }

    /// A 32-bit varint.
    pub fn write_varint32(&mut self, v: u32) {
        self.write_varint64(u64::from(v));
    }

    /// `0x01` or `0x00`.
    pub fn write_bool(&mut self, v: bool) {
        self.write_raw_bytes(&[u8::from(v)]);
    }

    /// A field tag.
    pub fn write_tag(&mut self, number: u32, wire_type: WireType) {
        debug_assert!((1..=MAX_FIELD_NUMBER).contains(&number));
        self.write_varint32(Tag::new(number, wire_type).raw());
    }

    /// A varint32 length prefix followed by `bytes`.
    pub fn write_length_delimited(&mut self, bytes: &[u8]) -> Result<(), WireError> {
        let len = u32::try_from(bytes.len())
            .map_err(|_| WireError::LengthOverflow { len: bytes.len() })?;
        self.write_varint32(len);
        self.write_raw_bytes(bytes);
        Ok(())
    }

    /// A length-delimited UTF-8 string.
    pub fn write_string(&mut self, s: &str) -> Result<(), WireError> {
        self.write_length_delimited(s.as_bytes())
    }

    // ── Unknown fields ──────────────────────────────────────────

    /// Advance past the value of a field whose tag was just read.
    ///
    /// Groups are skipped recursively until the END_GROUP carrying the same
    /// field number; `depth` counts the groups already open.
    pub fn skip_field(&mut self, tag: Tag, depth: usize) -> Result<(), WireError> {
        match tag.wire_type {
            WireType::Varint => self.read_varint64().map(drop),
            WireType::Fixed64 => self.read_raw_bytes(8).map(drop),
            WireType::Fixed32 => self.read_raw_bytes(4).map(drop),
            WireType::LengthDelimited => self.read_length_delimited().map(drop),
            WireType::StartGroup => self.skip_group(tag.number, depth + 1),
            WireType::EndGroup => Err(WireError::UnexpectedEndGroup { field: tag.number }),
        }
    }

    fn skip_group(&mut self, number: u32, depth: usize) -> Result<(), WireError> {
        if depth > MAX_GROUP_DEPTH {
            return Err(WireError::RecursionLimit {
                limit: MAX_GROUP_DEPTH,
            });
        }
        loop {
            if self.is_at_end() {
                return Err(WireError::TruncatedGroup { field: number });
            }
            let inner = match self.read_tag() {
                Ok(tag) => tag,
                Err(e) if e.is_exhaustion() => {
                    return Err(WireError::TruncatedGroup { field: number })
                }
                Err(e) => return Err(e),
            };
            if inner.wire_type == WireType::EndGroup {
                if inner.number != number {
                    return Err(WireError::MismatchedEndGroup {
                        expected: number,
                        found: inner.number,
                    });
                }
                return Ok(());
            }
            self.skip_field(inner, depth)?;
        }
    }

    // ── Buffer surgery ──────────────────────────────────────────

    fn check_range(&self, range: &Range<usize>) -> Result<(), WireError> {
        if range.start > range.end || range.end > self.buf.len() {
            return Err(WireError::OutOfBounds {
                offset: range.end.max(range.start),
                len: self.buf.len(),
            });
        }
        Ok(())
    }

    /// Replace `range` with `replacement`. The position is not adjusted.
    pub fn splice(&mut self, range: Range<usize>, replacement: &[u8]) -> Result<(), WireError> {
        self.check_range(&range)?;
        self.buf.splice(range, replacement.iter().copied());
        Ok(())
    }

    /// Remove `range`, shifting later bytes left. The position is clamped
    /// to the new length but otherwise not adjusted.
    pub fn remove(&mut self, range: Range<usize>) -> Result<(), WireError> {
        self.check_range(&range)?;
        self.buf.drain(range);
        self.pos = self.pos.min(self.buf.len());
        Ok(())
    }

    /// Shorten the buffer to `len` bytes.
    pub fn truncate(&mut self, len: usize) {
        self.buf.truncate(len);
        self.pos = self.pos.min(self.buf.len());
    }
}
