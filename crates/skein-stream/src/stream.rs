//! The slice stream demultiplexer.
//!
//! [`SliceStream::feed`] scans one chunk of the stream, dispatches every
//! slice it completes, and rewrites the chunk in place so that what is left
//! in [`SliceStream::buffer`] is what should travel downstream.
//!
//! Bytes that cannot be concluded within a feed are withheld from its
//! output: a header cut short is carried and re-parsed at the front of the
//! next feed, and a slice whose payload runs past the end is removed and
//! re-emitted whole (or rewritten, or dropped) by the feed that completes
//! it. Concatenating the outputs of any sequence of feeds therefore gives
//! the same bytes as feeding the whole stream at once.
//!
//! Read-only feeds pass their chunk through unchanged, so state they leave
//! behind records what already went downstream. A read-only feed that
//! meets withheld bytes (a carried header or a parked slice) emits them in
//! place first; a later rewriting feed strips header bytes a read-only feed
//! already emitted and forwards, unedited, any slice part of which is
//! already downstream. Mixed sequences thus never lose or repeat a byte.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use skein_core::ByteCursor;

use crate::config::{ConfigError, StreamConfig};
use crate::error::StreamError;
use crate::handler::SliceHandler;
use crate::metrics::StreamMetrics;
use crate::slice::{encode_slice, Disposition, Slice, SliceHeader};

type BoxedHandler = Box<dyn SliceHandler>;

// ── Builder ────────────────────────────────────────────────────────

/// Builder returned by [`SliceStream::builder`].
#[derive(Default)]
pub struct SliceStreamBuilder {
    handlers: HashMap<u32, BoxedHandler>,
    fallback: Option<BoxedHandler>,
    config: StreamConfig,
}

impl SliceStreamBuilder {
    /// Register the handler for `slice_type`, replacing any earlier one.
    pub fn handler(mut self, slice_type: u32, handler: impl SliceHandler + 'static) -> Self {
        self.handlers.insert(slice_type, Box::new(handler));
        self
    }

    /// Register the handler for types with no handler of their own.
    pub fn fallback(mut self, handler: impl SliceHandler + 'static) -> Self {
        self.fallback = Some(Box::new(handler));
        self
    }

    /// Use `config` instead of [`StreamConfig::default`].
    pub fn config(mut self, config: StreamConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the configuration and create the stream.
    pub fn build(self) -> Result<SliceStream, ConfigError> {
        self.config.validate()?;
        Ok(SliceStream {
            handlers: self.handlers,
            fallback: self.fallback,
            config: self.config,
            pending: IndexMap::new(),
            active: None,
            carry: Vec::new(),
            carry_sent: 0,
            cursor: ByteCursor::new(),
            metrics: StreamMetrics::default(),
        })
    }
}

impl fmt::Debug for SliceStreamBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.handlers.keys().copied().collect();
        types.sort_unstable();
        f.debug_struct("SliceStreamBuilder")
            .field("handler_types", &types)
            .field("fallback", &self.fallback.is_some())
            .field("config", &self.config)
            .finish()
    }
}

// ── SliceStream ────────────────────────────────────────────────────

/// One multiplexed-stream session.
///
/// # Examples
///
/// ```
/// use futures::executor::block_on;
/// use skein_stream::{encode_slice, sync_handler, SliceStream};
///
/// let mut stream = SliceStream::builder()
///     .handler(1, sync_handler(|slice| {
///         slice.replace_payload(b"BB".to_vec());
///         Ok(())
///     }))
///     .handler(2, sync_handler(|slice| {
///         slice.drop_slice();
///         Ok(())
///     }))
///     .build()
///     .unwrap();
///
/// let mut input = encode_slice(1, b"AAAA");
/// input.extend(encode_slice(2, b""));
/// block_on(stream.feed(input, false)).unwrap();
/// assert_eq!(stream.buffer(), encode_slice(1, b"BB").as_slice());
/// ```
pub struct SliceStream {
    handlers: HashMap<u32, BoxedHandler>,
    fallback: Option<BoxedHandler>,
    config: StreamConfig,
    /// Slices whose payload is still arriving, by type id.
    pending: IndexMap<u32, Slice>,
    /// Type of the pending slice the next feed continues.
    active: Option<u32>,
    /// Partial header bytes left over from the previous feed.
    carry: Vec<u8>,
    /// How many leading `carry` bytes that feed already emitted.
    carry_sent: usize,
    cursor: ByteCursor,
    metrics: StreamMetrics,
}

impl SliceStream {
    /// Start configuring a stream.
    pub fn builder() -> SliceStreamBuilder {
        SliceStreamBuilder::default()
    }

    /// The output of the most recent feed.
    pub fn buffer(&self) -> &[u8] {
        self.cursor.as_slice()
    }

    /// Move the output of the most recent feed out of the stream.
    pub fn take_buffer(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.cursor).into_inner()
    }

    /// Cumulative counters.
    pub fn metrics(&self) -> &StreamMetrics {
        &self.metrics
    }

    /// The active configuration.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Number of slices still accumulating.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Bytes of a split header waiting for the next feed.
    pub fn carried_len(&self) -> usize {
        self.carry.len()
    }

    /// Forget all in-flight state: pending slices, carried header bytes,
    /// and the output buffer. Handlers and metrics are kept.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.active = None;
        self.carry.clear();
        self.carry_sent = 0;
        self.cursor.clear();
    }

    /// Scan `chunk`, dispatching every slice it completes.
    ///
    /// Unless `readonly` is set, the chunk is rewritten per each handler's
    /// decision and bytes that belong to an unfinished slice or header are
    /// withheld; read [`SliceStream::buffer`] afterwards for the output. In
    /// read-only mode the output is always `chunk` unchanged.
    ///
    /// # Errors
    ///
    /// [`StreamError::Malformed`] or [`StreamError::SliceTooLarge`] for
    /// headers that can never be valid, [`StreamError::Handler`] when a
    /// handler fails. Edits made before the error stay in the buffer.
    pub async fn feed(&mut self, chunk: Vec<u8>, readonly: bool) -> Result<(), StreamError> {
        self.metrics.feeds += 1;
        self.metrics.bytes_fed += chunk.len() as u64;

        let carried = std::mem::take(&mut self.carry);
        let sent = std::mem::take(&mut self.carry_sent);
        let buffer = if carried.is_empty() {
            chunk
        } else {
            let mut buffer = carried;
            buffer.extend_from_slice(&chunk);
            buffer
        };
        self.cursor = ByteCursor::from_vec(buffer);

        let result = self.scan(readonly, sent).await;

        if sent > 0 {
            // Those bytes went out with the previous feed.
            let sent = sent.min(self.cursor.len());
            self.cursor.remove(0..sent).map_err(StreamError::Buffer)?;
        }
        result
    }

    // ── Scan loop ───────────────────────────────────────────────

    /// `sent` leading bytes of the buffer were already emitted.
    async fn scan(&mut self, readonly: bool, sent: usize) -> Result<(), StreamError> {
        while !self.cursor.is_at_end() {
            let slice_pos = self.cursor.position();

            let continued = self
                .active
                .take()
                .and_then(|ty| self.pending.shift_remove(&ty));
            let mut slice = match continued {
                Some(mut slice) => {
                    if readonly && !slice.is_emitted() {
                        self.flush_withheld(&mut slice, slice_pos)?;
                    }
                    slice
                }
                None => match self.read_header(slice_pos)? {
                    Some(mut slice) => {
                        if slice_pos < sent {
                            slice.mark_emitted();
                        }
                        slice
                    }
                    None => {
                        self.stall(slice_pos, readonly, sent);
                        break;
                    }
                },
            };

            let take = slice.missing().min(self.cursor.remaining());
            slice.push(
                self.cursor
                    .read_raw_bytes(take)
                    .map_err(StreamError::Buffer)?,
            );

            if !slice.is_fulfilled() {
                self.defer(slice, slice_pos, readonly)?;
                break;
            }
            self.conclude(slice, slice_pos, readonly).await?;
        }
        Ok(())
    }

    /// Read the header at `slice_pos`; `None` if it is cut short.
    fn read_header(&mut self, slice_pos: usize) -> Result<Option<Slice>, StreamError> {
        let (header, end) = match SliceHeader::decode(self.cursor.as_slice(), slice_pos) {
            Ok(decoded) => decoded,
            Err(e) if e.is_exhaustion() => return Ok(None),
            Err(source) => {
                return Err(StreamError::Malformed {
                    offset: slice_pos,
                    source,
                })
            }
        };

        let size = header.size as usize;
        if size > self.config.max_slice_size {
            return Err(StreamError::SliceTooLarge {
                slice_type: header.slice_type,
                size,
                limit: self.config.max_slice_size,
            });
        }
        tracing::trace!(
            slice_type = header.slice_type,
            size,
            offset = slice_pos,
            "parsed slice header"
        );

        let raw_header = self.cursor.as_slice()[slice_pos..end].to_vec();
        self.cursor.set_position(end).map_err(StreamError::Buffer)?;
        Ok(Some(Slice::with_capacity(
            header.slice_type,
            size,
            raw_header,
            self.config.initial_capacity,
        )))
    }

    /// Carry a partial header into the next feed.
    fn stall(&mut self, slice_pos: usize, readonly: bool, sent: usize) {
        self.carry = self.cursor.as_slice()[slice_pos..].to_vec();
        if readonly {
            self.carry_sent = self.carry.len();
        } else {
            // Already-emitted bytes stay in place so the feed strips them.
            self.carry_sent = sent.saturating_sub(slice_pos);
            self.cursor.truncate(slice_pos.max(sent));
        }
        self.metrics.header_stalls += 1;
        tracing::trace!(
            carried = self.carry.len(),
            emitted = self.carry_sent,
            "slice header split across feeds"
        );
    }

    /// Emit the withheld bytes of a parked slice at `slice_pos`, ahead of
    /// the bytes this read-only feed passes through.
    fn flush_withheld(&mut self, slice: &mut Slice, slice_pos: usize) -> Result<(), StreamError> {
        let withheld = slice.original_bytes();
        self.splice(slice_pos..slice_pos, &withheld)?;
        slice.mark_emitted();
        tracing::debug!(
            slice_type = slice.slice_type(),
            len = withheld.len(),
            "emitted withheld slice bytes in read-only feed"
        );
        Ok(())
    }

    /// Hold an unfinished slice until the next feed.
    fn defer(&mut self, mut slice: Slice, slice_pos: usize, readonly: bool) -> Result<(), StreamError> {
        if readonly {
            slice.mark_emitted();
        } else if !slice.is_emitted() {
            let end = self.cursor.position();
            self.cursor
                .remove(slice_pos..end)
                .map_err(StreamError::Buffer)?;
        }
        slice.mark_deferred();
        tracing::debug!(
            slice_type = slice.slice_type(),
            received = slice.received(),
            declared = slice.declared_size(),
            "slice deferred to next feed"
        );
        let slice_type = slice.slice_type();
        self.pending.insert(slice_type, slice);
        self.active = Some(slice_type);
        self.metrics.slices_deferred += 1;
        Ok(())
    }

    /// Dispatch a fulfilled slice, then apply its disposition to the bytes
    /// from `slice_pos` to the cursor.
    async fn conclude(
        &mut self,
        slice: Slice,
        slice_pos: usize,
        readonly: bool,
    ) -> Result<(), StreamError> {
        let end = self.cursor.position();
        let slice = self.dispatch(slice).await?;

        if readonly {
            self.metrics.slices_forwarded += 1;
            return Ok(());
        }
        if slice.is_emitted() {
            if slice.disposition() != Disposition::Forward {
                self.metrics.edits_skipped += 1;
                tracing::debug!(
                    slice_type = slice.slice_type(),
                    disposition = ?slice.disposition(),
                    "slice partly emitted by a read-only feed, edit skipped"
                );
            }
            self.metrics.slices_forwarded += 1;
            return Ok(());
        }

        match slice.disposition() {
            Disposition::Drop => {
                self.cursor
                    .remove(slice_pos..end)
                    .map_err(StreamError::Buffer)?;
                self.cursor
                    .set_position(slice_pos)
                    .map_err(StreamError::Buffer)?;
                self.metrics.slices_dropped += 1;
                tracing::debug!(slice_type = slice.slice_type(), "slice dropped");
            }
            Disposition::Replace => {
                if slice.payload().len() > self.config.max_slice_size {
                    return Err(StreamError::SliceTooLarge {
                        slice_type: slice.slice_type(),
                        size: slice.payload().len(),
                        limit: self.config.max_slice_size,
                    });
                }
                let bytes = encode_slice(slice.slice_type(), slice.payload());
                self.splice(slice_pos..end, &bytes)?;
                self.metrics.slices_rewritten += 1;
                tracing::debug!(
                    slice_type = slice.slice_type(),
                    size = slice.payload().len(),
                    "slice rewritten"
                );
            }
            Disposition::Forward if slice.is_spanned() => {
                // Earlier bytes were withheld; emit the slice whole here.
                self.splice(slice_pos..end, &slice.original_bytes())?;
                self.metrics.slices_forwarded += 1;
            }
            Disposition::Forward => {
                self.metrics.slices_forwarded += 1;
            }
        }
        Ok(())
    }

    fn splice(&mut self, range: std::ops::Range<usize>, bytes: &[u8]) -> Result<(), StreamError> {
        let start = range.start;
        self.cursor
            .splice(range, bytes)
            .and_then(|()| self.cursor.set_position(start + bytes.len()))
            .map_err(StreamError::Buffer)
    }

    async fn dispatch(&mut self, slice: Slice) -> Result<Slice, StreamError> {
        let info = slice.info();
        let handler = match self.handlers.get_mut(&info.slice_type) {
            Some(handler) => Some(handler),
            None => self.fallback.as_mut(),
        };
        let Some(handler) = handler else {
            self.metrics.unhandled_slices += 1;
            tracing::trace!(slice_type = info.slice_type, "no handler, forwarding");
            return Ok(slice);
        };

        match handler.on_slice(slice).await {
            Ok(slice) => {
                self.metrics.slices_dispatched += 1;
                tracing::debug!(
                    slice_type = info.slice_type,
                    size = info.declared_size,
                    disposition = ?slice.disposition(),
                    "slice dispatched"
                );
                Ok(slice)
            }
            Err(source) => {
                self.metrics.slices_dispatched += 1;
                tracing::warn!(
                    slice_type = info.slice_type,
                    size = info.declared_size,
                    error = %source,
                    "slice handler failed, abandoning feed"
                );
                Err(StreamError::Handler {
                    slice: info,
                    source,
                })
            }
        }
    }
}

impl fmt::Debug for SliceStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.handlers.keys().copied().collect();
        types.sort_unstable();
        f.debug_struct("SliceStream")
            .field("handler_types", &types)
            .field("fallback", &self.fallback.is_some())
            .field("config", &self.config)
            .field("pending", &self.pending.len())
            .field("active", &self.active)
            .field("carried", &self.carry.len())
            .field("carried_emitted", &self.carry_sent)
            .field("buffered", &self.cursor.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::handler::sync_handler;
    use futures::executor::block_on;
    use skein_core::WireError;
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<(u32, Vec<u8>)>>>;

    fn recorder(seen: &Seen) -> impl SliceHandler + 'static {
        let seen = Arc::clone(seen);
        sync_handler(move |slice: &mut Slice| {
            seen.lock()
                .unwrap()
                .push((slice.slice_type(), slice.payload().to_vec()));
            Ok(())
        })
    }

    fn stream(a: &[u8], b: &[u8]) -> Vec<u8> {
        let mut out = encode_slice(1, a);
        out.extend(encode_slice(2, b));
        out
    }

    #[test]
    fn replace_and_drop_example() {
        let mut s = SliceStream::builder()
            .handler(
                1,
                sync_handler(|slice: &mut Slice| {
                    slice.replace_payload(b"BB".to_vec());
                    Ok(())
                }),
            )
            .handler(
                2,
                sync_handler(|slice: &mut Slice| {
                    slice.drop_slice();
                    Ok(())
                }),
            )
            .build()
            .unwrap();
        block_on(s.feed(stream(b"AAAA", b""), false)).unwrap();
        assert_eq!(s.buffer(), &[0x01, 0x02, b'B', b'B']);
        assert_eq!(s.metrics().slices_rewritten, 1);
        assert_eq!(s.metrics().slices_dropped, 1);
    }

    #[test]
    fn drop_shrinks_by_exactly_the_slice_length() {
        let mut s = SliceStream::builder()
            .handler(
                1,
                sync_handler(|slice: &mut Slice| {
                    slice.drop_slice();
                    Ok(())
                }),
            )
            .build()
            .unwrap();
        let input = stream(b"hello", b"world");
        let dropped_len = encode_slice(1, b"hello").len();
        block_on(s.feed(input.clone(), false)).unwrap();
        assert_eq!(s.buffer().len(), input.len() - dropped_len);
        assert_eq!(s.buffer(), &input[dropped_len..]);
    }

    #[test]
    fn unhandled_slices_are_forwarded() {
        let mut s = SliceStream::builder().build().unwrap();
        let input = stream(b"a", b"b");
        block_on(s.feed(input.clone(), false)).unwrap();
        assert_eq!(s.buffer(), input.as_slice());
        assert_eq!(s.metrics().unhandled_slices, 2);
        assert_eq!(s.metrics().slices_dispatched, 0);
    }

    #[test]
    fn fallback_sees_unclaimed_types() {
        let seen = Seen::default();
        let mut s = SliceStream::builder()
            .handler(1, sync_handler(|_: &mut Slice| Ok(())))
            .fallback(recorder(&seen))
            .build()
            .unwrap();
        block_on(s.feed(stream(b"a", b"b"), false)).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![(2, b"b".to_vec())]);
    }

    #[test]
    fn readonly_dispatches_without_editing() {
        let seen = Seen::default();
        let mut s = SliceStream::builder()
            .handler(
                1,
                sync_handler(|slice: &mut Slice| {
                    slice.drop_slice();
                    Ok(())
                }),
            )
            .fallback(recorder(&seen))
            .build()
            .unwrap();
        let input = stream(b"abc", b"de");
        // Split inside the second header.
        let (first, rest) = input.split_at(6);
        block_on(s.feed(first.to_vec(), true)).unwrap();
        assert_eq!(s.buffer(), first);
        block_on(s.feed(rest.to_vec(), true)).unwrap();
        assert_eq!(s.buffer(), rest);
        assert_eq!(*seen.lock().unwrap(), vec![(2, b"de".to_vec())]);
    }

    #[test]
    fn slice_across_feeds_is_withheld_then_emitted_whole() {
        let seen = Seen::default();
        let mut s = SliceStream::builder()
            .fallback(recorder(&seen))
            .build()
            .unwrap();
        let input = encode_slice(5, b"abcdef");

        block_on(s.feed(input[..4].to_vec(), false)).unwrap();
        assert!(s.buffer().is_empty());
        assert_eq!(s.pending_len(), 1);
        assert!(seen.lock().unwrap().is_empty());

        block_on(s.feed(input[4..].to_vec(), false)).unwrap();
        assert_eq!(s.buffer(), input.as_slice());
        assert_eq!(s.pending_len(), 0);
        assert_eq!(*seen.lock().unwrap(), vec![(5, b"abcdef".to_vec())]);
        assert_eq!(s.metrics().slices_deferred, 1);
    }

    #[test]
    fn split_header_is_carried() {
        let mut s = SliceStream::builder().build().unwrap();
        // Type 300 needs two header bytes.
        let input = encode_slice(300, b"x");
        block_on(s.feed(input[..1].to_vec(), false)).unwrap();
        assert!(s.buffer().is_empty());
        assert_eq!(s.carried_len(), 1);
        assert_eq!(s.metrics().header_stalls, 1);

        block_on(s.feed(input[1..].to_vec(), false)).unwrap();
        assert_eq!(s.buffer(), input.as_slice());
        assert_eq!(s.carried_len(), 0);
    }

    // ── Mixed read-only and rewriting feeds ─────────────────────

    fn dropper() -> SliceStream {
        SliceStream::builder()
            .fallback(sync_handler(|slice: &mut Slice| {
                slice.drop_slice();
                Ok(())
            }))
            .build()
            .unwrap()
    }

    #[test]
    fn carried_header_withheld_by_rewrite_is_emitted_by_readonly() {
        let mut s = SliceStream::builder().build().unwrap();
        let input = encode_slice(300, b"xy");
        block_on(s.feed(input[..1].to_vec(), false)).unwrap();
        let mut out = s.buffer().to_vec();
        block_on(s.feed(input[1..].to_vec(), true)).unwrap();
        out.extend_from_slice(s.buffer());
        assert_eq!(out, input);
    }

    #[test]
    fn carried_header_emitted_by_readonly_is_not_repeated() {
        let mut s = dropper();
        let input = encode_slice(300, b"xy");
        block_on(s.feed(input[..1].to_vec(), true)).unwrap();
        assert_eq!(s.buffer(), &input[..1]);
        block_on(s.feed(input[1..].to_vec(), false)).unwrap();
        // The header byte is already downstream, so the drop cannot apply.
        assert_eq!(s.buffer(), &input[1..]);
        assert_eq!(s.metrics().edits_skipped, 1);
        assert_eq!(s.carried_len(), 0);
    }

    #[test]
    fn header_split_three_ways_across_modes() {
        let mut s = SliceStream::builder().build().unwrap();
        // Type 300 and size 200 both need two bytes.
        let input = encode_slice(300, &[7u8; 200]);
        let mut out = Vec::new();
        for (chunk, readonly) in [(&input[..1], true), (&input[1..3], false), (&input[3..], true)] {
            block_on(s.feed(chunk.to_vec(), readonly)).unwrap();
            out.extend_from_slice(s.buffer());
        }
        assert_eq!(out, input);
    }

    #[test]
    fn readonly_prefix_then_rewriting_completion_emits_each_byte_once() {
        let seen = Seen::default();
        let mut s = SliceStream::builder()
            .fallback(recorder(&seen))
            .build()
            .unwrap();
        let input = encode_slice(5, b"abcdef");
        block_on(s.feed(input[..4].to_vec(), true)).unwrap();
        let mut out = s.buffer().to_vec();
        block_on(s.feed(input[4..].to_vec(), false)).unwrap();
        out.extend_from_slice(s.buffer());
        assert_eq!(out, input);
        assert_eq!(*seen.lock().unwrap(), vec![(5, b"abcdef".to_vec())]);
    }

    #[test]
    fn withheld_slice_is_flushed_by_readonly_completion() {
        let mut s = dropper();
        let input = encode_slice(5, b"abcdef");
        block_on(s.feed(input[..4].to_vec(), false)).unwrap();
        assert!(s.buffer().is_empty());
        block_on(s.feed(input[4..].to_vec(), true)).unwrap();
        assert_eq!(s.buffer(), input.as_slice());
        assert_eq!(s.metrics().slices_dropped, 0);
    }

    #[test]
    fn readonly_middle_feed_commits_a_long_slice() {
        let mut s = dropper();
        let input = encode_slice(5, b"abcdefgh");
        let mut out = Vec::new();
        for (chunk, readonly) in [(&input[..4], false), (&input[4..7], true), (&input[7..], false)] {
            block_on(s.feed(chunk.to_vec(), readonly)).unwrap();
            out.extend_from_slice(s.buffer());
        }
        assert_eq!(out, input);
        assert_eq!(s.metrics().edits_skipped, 1);
        assert_eq!(s.pending_len(), 0);
    }

    #[test]
    fn handler_error_aborts_but_keeps_committed_edits() {
        let mut s = SliceStream::builder()
            .handler(
                1,
                sync_handler(|slice: &mut Slice| {
                    slice.drop_slice();
                    Ok(())
                }),
            )
            .handler(2, sync_handler(|_: &mut Slice| Err(HandlerError::new("boom"))))
            .build()
            .unwrap();
        let mut input = stream(b"gone", b"bad");
        input.extend(encode_slice(1, b"never reached"));

        let err = block_on(s.feed(input, false)).unwrap_err();
        match err {
            StreamError::Handler { slice, source } => {
                assert_eq!(slice.slice_type, 2);
                assert_eq!(slice.declared_size, 3);
                assert_eq!(slice.received, 3);
                assert_eq!(source.reason, "boom");
            }
            other => panic!("expected Handler, got {other:?}"),
        }
        // First slice dropped, the failing slice and the rest untouched.
        let mut expected = encode_slice(2, b"bad");
        expected.extend(encode_slice(1, b"never reached"));
        assert_eq!(s.buffer(), expected.as_slice());
        assert_eq!(s.metrics().slices_dropped, 1);
    }

    #[test]
    fn oversized_header_is_fatal() {
        let mut s = SliceStream::builder()
            .config(StreamConfig {
                max_slice_size: 4,
                ..StreamConfig::default()
            })
            .build()
            .unwrap();
        let err = block_on(s.feed(encode_slice(1, b"12345"), false)).unwrap_err();
        assert_eq!(
            err,
            StreamError::SliceTooLarge {
                slice_type: 1,
                size: 5,
                limit: 4
            }
        );
    }

    #[test]
    fn oversized_replacement_is_fatal() {
        let mut s = SliceStream::builder()
            .config(StreamConfig {
                max_slice_size: 4,
                ..StreamConfig::default()
            })
            .handler(
                1,
                sync_handler(|slice: &mut Slice| {
                    slice.replace_payload(vec![0; 5]);
                    Ok(())
                }),
            )
            .build()
            .unwrap();
        let err = block_on(s.feed(encode_slice(1, b"ok"), false)).unwrap_err();
        assert!(matches!(err, StreamError::SliceTooLarge { size: 5, .. }));
    }

    #[test]
    fn malformed_header_is_fatal() {
        let mut s = SliceStream::builder().build().unwrap();
        let err = block_on(s.feed(vec![0xFF, 0xFF, 0xFF, 0xFF, 0x7F, 0x00], false)).unwrap_err();
        match err {
            StreamError::Malformed { offset, source } => {
                assert_eq!(offset, 0);
                assert_eq!(source, WireError::VarintOverflow { bits: 32 });
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn set_type_rewrites_header() {
        let mut s = SliceStream::builder()
            .handler(
                1,
                sync_handler(|slice: &mut Slice| {
                    slice.set_type(300);
                    Ok(())
                }),
            )
            .build()
            .unwrap();
        block_on(s.feed(encode_slice(1, b"xy"), false)).unwrap();
        assert_eq!(s.buffer(), encode_slice(300, b"xy").as_slice());
    }

    #[test]
    fn reset_forgets_in_flight_state() {
        let mut s = SliceStream::builder().build().unwrap();
        block_on(s.feed(encode_slice(1, b"abcdef")[..3].to_vec(), false)).unwrap();
        assert_eq!(s.pending_len(), 1);
        s.reset();
        assert_eq!(s.pending_len(), 0);
        assert!(s.buffer().is_empty());

        let input = encode_slice(2, b"z");
        block_on(s.feed(input.clone(), false)).unwrap();
        assert_eq!(s.take_buffer(), input);
        assert!(s.buffer().is_empty());
        assert_eq!(s.metrics().feeds, 2);
    }

    #[test]
    fn invalid_config_rejected_at_build() {
        let err = SliceStream::builder()
            .config(StreamConfig {
                max_slice_size: 0,
                ..StreamConfig::default()
            })
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::ZeroMaxSliceSize);
    }
}
