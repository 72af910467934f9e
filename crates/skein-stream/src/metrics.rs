//! Cumulative counters for a slice stream session.
//!
//! [`StreamMetrics`] is updated by every [`SliceStream::feed`](crate::SliceStream::feed)
//! call and survives [`SliceStream::reset`](crate::SliceStream::reset).

/// Counters collected across all feeds of one stream.
#[derive(Clone, Debug, Default)]
pub struct StreamMetrics {
    /// Number of `feed` calls.
    pub feeds: u64,
    /// Bytes passed to `feed`, excluding carried header bytes.
    pub bytes_fed: u64,
    /// Fulfilled slices passed to a handler.
    pub slices_dispatched: u64,
    /// Fulfilled slices whose bytes were left in place (including every
    /// slice concluded in read-only mode).
    pub slices_forwarded: u64,
    /// Fulfilled slices re-encoded with a new type or payload.
    pub slices_rewritten: u64,
    /// Fulfilled slices removed from the buffer.
    pub slices_dropped: u64,
    /// Times a slice ran past the end of a feed and was held back.
    pub slices_deferred: u64,
    /// Fulfilled slices with neither a type handler nor a fallback.
    pub unhandled_slices: u64,
    /// Times a header was split by the end of a feed.
    pub header_stalls: u64,
    /// Handler edits ignored because a read-only feed had already emitted
    /// part of the slice.
    pub edits_skipped: u64,
}
