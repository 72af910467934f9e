//! Test utilities and fixtures for Skein development.
//!
//! Provides shared message schemas ([`person`], [`all_kinds`], [`tree`]),
//! recording and failing slice handlers, and helpers for building slice
//! streams and feeding them in chunks.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod schemas;

pub use fixtures::{Action, FailingHandler, RecordingHandler, SliceLog};
pub use schemas::{all_kinds, person, tree};

use futures::executor::block_on;
use skein_stream::{encode_slice, SliceStream, StreamError};

/// Concatenate encoded slices.
pub fn encode_stream(slices: &[(u32, &[u8])]) -> Vec<u8> {
    slices
        .iter()
        .flat_map(|(slice_type, payload)| encode_slice(*slice_type, payload))
        .collect()
}

/// Split `bytes` at the given cut points (sorted, deduplicated, clamped).
pub fn split_at_points(bytes: &[u8], cuts: &[usize]) -> Vec<Vec<u8>> {
    let mut cuts: Vec<usize> = cuts.iter().map(|&c| c.min(bytes.len())).collect();
    cuts.sort_unstable();
    cuts.dedup();
    let mut chunks = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts {
        chunks.push(bytes[start..cut].to_vec());
        start = cut;
    }
    chunks.push(bytes[start..].to_vec());
    chunks
}

/// Chunks of at most `size` bytes (`size` of zero is treated as one).
pub fn chunks_of(bytes: &[u8], size: usize) -> Vec<Vec<u8>> {
    bytes.chunks(size.max(1)).map(<[u8]>::to_vec).collect()
}

/// Feed every chunk in order and return the concatenated outputs.
pub fn feed_all(
    stream: &mut SliceStream,
    chunks: Vec<Vec<u8>>,
    readonly: bool,
) -> Result<Vec<u8>, StreamError> {
    feed_with_modes(stream, chunks.into_iter().map(|chunk| (chunk, readonly)))
}

/// Like [`feed_all`], with a read-only flag per chunk.
pub fn feed_with_modes(
    stream: &mut SliceStream,
    chunks: impl IntoIterator<Item = (Vec<u8>, bool)>,
) -> Result<Vec<u8>, StreamError> {
    let mut out = Vec::new();
    for (chunk, readonly) in chunks {
        block_on(stream.feed(chunk, readonly))?;
        out.extend(stream.take_buffer());
    }
    Ok(out)
}
