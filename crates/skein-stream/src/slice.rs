//! Slices: the units of a multiplexed stream.
//!
//! On the wire a slice is `varint32(type) varint32(size)` followed by
//! `size` payload bytes. A [`Slice`] accumulates its payload across feeds
//! until the declared size is reached; only then is it handed to a
//! handler, which decides its [`Disposition`].

use skein_core::{decode_varint32, varint_len, write_varint, WireError};

use crate::error::SliceInfo;

/// What happens to a concluded slice's bytes in the output buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Disposition {
    /// Leave the bytes as they arrived.
    #[default]
    Forward,
    /// Re-encode the slice from its (possibly new) type and payload.
    Replace,
    /// Remove the slice from the buffer.
    Drop,
}

/// A decoded slice header.
///
/// # Examples
///
/// ```
/// use skein_stream::SliceHeader;
///
/// let header = SliceHeader { slice_type: 1, size: 300 };
/// let bytes = header.encode();
/// assert_eq!(bytes, [0x01, 0xAC, 0x02]);
/// assert_eq!(SliceHeader::decode(&bytes, 0).unwrap(), (header, 3));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliceHeader {
    /// Slice type id.
    pub slice_type: u32,
    /// Declared payload size.
    pub size: u32,
}

impl SliceHeader {
    /// Decode a header at `offset`, returning it and the offset past it.
    ///
    /// # Errors
    ///
    /// [`WireError::Truncated`] when the header is cut short, which a
    /// stream treats as "wait for more data"; any other error is fatal.
    pub fn decode(bytes: &[u8], offset: usize) -> Result<(Self, usize), WireError> {
        let (slice_type, next) = decode_varint32(bytes, offset)?;
        let (size, next) = decode_varint32(bytes, next)?;
        Ok((Self { slice_type, size }, next))
    }

    /// Encoded header bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.write(&mut out);
        out
    }

    /// Append the encoded header to `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        write_varint(out, u64::from(self.slice_type));
        write_varint(out, u64::from(self.size));
    }

    /// Length of the encoded header.
    pub fn encoded_len(&self) -> usize {
        varint_len(u64::from(self.slice_type)) + varint_len(u64::from(self.size))
    }
}

/// Encode one complete slice: header followed by `payload`.
///
/// Payloads must be shorter than 4 GiB; streams check replacements
/// against their configured limit before calling this.
pub fn encode_slice(slice_type: u32, payload: &[u8]) -> Vec<u8> {
    let header = SliceHeader {
        slice_type,
        size: payload.len() as u32,
    };
    let mut out = Vec::with_capacity(header.encoded_len() + payload.len());
    header.write(&mut out);
    out.extend_from_slice(payload);
    out
}

/// One slice, possibly still accumulating.
///
/// Handlers receive fulfilled slices only. They read the payload, and may
/// change the type, swap the payload, or drop the slice; the last such
/// call decides the disposition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slice {
    slice_type: u32,
    declared_size: usize,
    header: Vec<u8>,
    data: Vec<u8>,
    received: usize,
    chunks: usize,
    disposition: Disposition,
    deferred: bool,
    /// Earlier bytes already went downstream with a read-only feed.
    emitted: bool,
}

impl Slice {
    /// A slice whose header has just been read. `header` holds the header
    /// bytes exactly as they arrived.
    pub fn new(slice_type: u32, declared_size: usize, header: Vec<u8>) -> Self {
        Self::with_capacity(slice_type, declared_size, header, 0)
    }

    /// Like [`Slice::new`], reserving up to `capacity` payload bytes.
    pub fn with_capacity(
        slice_type: u32,
        declared_size: usize,
        header: Vec<u8>,
        capacity: usize,
    ) -> Self {
        Self {
            slice_type,
            declared_size,
            header,
            data: Vec::with_capacity(capacity.min(declared_size)),
            received: 0,
            chunks: 0,
            disposition: Disposition::Forward,
            deferred: false,
            emitted: false,
        }
    }

    /// Build a fulfilled slice from a whole payload, as a stream would
    /// present it to a handler.
    pub fn from_payload(slice_type: u32, payload: Vec<u8>) -> Self {
        let header = SliceHeader {
            slice_type,
            size: payload.len() as u32,
        };
        let mut slice = Self::new(slice_type, payload.len(), header.encode());
        slice.push(&payload);
        slice
    }

    /// Append received bytes. Clears the deferred marker.
    pub fn push(&mut self, chunk: &[u8]) {
        self.data.extend_from_slice(chunk);
        self.received += chunk.len();
        self.chunks += 1;
        self.deferred = false;
    }

    /// The slice type id.
    pub fn slice_type(&self) -> u32 {
        self.slice_type
    }

    /// Payload size declared by the header.
    pub fn declared_size(&self) -> usize {
        self.declared_size
    }

    /// Payload bytes received so far.
    pub fn received(&self) -> usize {
        self.received
    }

    /// Bytes still missing before the slice is fulfilled.
    pub fn missing(&self) -> usize {
        self.declared_size.saturating_sub(self.received)
    }

    /// Whether every declared byte has arrived.
    pub fn is_fulfilled(&self) -> bool {
        self.received >= self.declared_size
    }

    /// Whether the slice ran past the end of the last feed.
    pub fn is_deferred(&self) -> bool {
        self.deferred
    }

    pub(crate) fn mark_deferred(&mut self) {
        self.deferred = true;
    }

    /// Whether some of the slice's bytes have already been passed
    /// downstream unedited by a read-only feed. Such a slice can only be
    /// forwarded.
    pub fn is_emitted(&self) -> bool {
        self.emitted
    }

    pub(crate) fn mark_emitted(&mut self) {
        self.emitted = true;
    }

    /// Whether the payload arrived over more than one feed.
    pub fn is_spanned(&self) -> bool {
        self.chunks > 1
    }

    /// Header bytes as they arrived.
    pub fn header(&self) -> &[u8] {
        &self.header
    }

    /// Current payload.
    pub fn payload(&self) -> &[u8] {
        &self.data
    }

    /// Current disposition.
    pub fn disposition(&self) -> Disposition {
        self.disposition
    }

    /// Substitute the payload; the slice will be re-encoded.
    pub fn replace_payload(&mut self, payload: Vec<u8>) {
        self.data = payload;
        self.disposition = Disposition::Replace;
    }

    /// Change the type id; the slice will be re-encoded.
    pub fn set_type(&mut self, slice_type: u32) {
        self.slice_type = slice_type;
        self.disposition = Disposition::Replace;
    }

    /// Remove the slice from the output.
    pub fn drop_slice(&mut self) {
        self.disposition = Disposition::Drop;
    }

    /// Take back a previous replace or drop decision.
    pub fn forward(&mut self) {
        self.disposition = Disposition::Forward;
    }

    /// Identity for error reporting.
    pub fn info(&self) -> SliceInfo {
        SliceInfo {
            slice_type: self.slice_type,
            declared_size: self.declared_size,
            received: self.received,
        }
    }

    /// The bytes this slice occupies in the output when forwarded whole.
    pub(crate) fn original_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.header.len() + self.data.len());
        out.extend_from_slice(&self.header);
        out.extend_from_slice(&self.data);
        out
    }
}
