//! Chunking invariance: however a stream is cut into feeds, handlers see
//! the same slices in the same order and the concatenated output is the
//! same as feeding it whole. Mixing read-only and rewriting feeds never
//! loses or repeats a byte.

use proptest::prelude::*;
use skein_stream::{encode_slice, SliceStream, StreamError};
use skein_test_utils::{
    chunks_of, encode_stream, feed_all, feed_with_modes, split_at_points, Action,
    RecordingHandler,
};

// ── Helpers ─────────────────────────────────────────────────────

/// A stream with a rewriting handler (1), a dropping handler (2), a
/// retyping handler (3), and a forwarding fallback, all sharing one log.
fn build() -> (SliceStream, RecordingHandler) {
    let recorder = RecordingHandler::new(Action::Forward);
    let stream = SliceStream::builder()
        .handler(1, recorder.with_action(Action::Replace(b"BB".to_vec())))
        .handler(2, recorder.with_action(Action::Drop))
        .handler(3, recorder.with_action(Action::Retype(300)))
        .fallback(recorder.clone())
        .build()
        .unwrap();
    (stream, recorder)
}

type Run = (Vec<u8>, Vec<(u32, Vec<u8>)>);

fn run(chunks: Vec<Vec<u8>>, readonly: bool) -> Result<Run, StreamError> {
    let (mut stream, recorder) = build();
    let out = feed_all(&mut stream, chunks, readonly)?;
    assert_eq!(stream.pending_len(), 0, "stream ended mid-slice");
    assert_eq!(stream.carried_len(), 0, "stream ended mid-header");
    Ok((out, recorder.seen()))
}

fn run_mixed(chunks: Vec<(Vec<u8>, bool)>) -> Result<Run, StreamError> {
    let (mut stream, recorder) = build();
    let out = feed_with_modes(&mut stream, chunks)?;
    assert_eq!(stream.pending_len(), 0, "stream ended mid-slice");
    assert_eq!(stream.carried_len(), 0, "stream ended mid-header");
    Ok((out, recorder.seen()))
}

/// Pair each chunk with a mode, cycling through `modes`.
fn with_modes(chunks: Vec<Vec<u8>>, modes: &[bool]) -> Vec<(Vec<u8>, bool)> {
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let readonly = !modes.is_empty() && modes[i % modes.len()];
            (chunk, readonly)
        })
        .collect()
}

/// What `build` turns a slice into when it can edit it.
fn edited(slice_type: u32, payload: &[u8]) -> Vec<u8> {
    match slice_type {
        1 => encode_slice(1, b"BB"),
        2 => Vec::new(),
        3 => encode_slice(300, payload),
        _ => encode_slice(slice_type, payload),
    }
}

/// Check that `out` holds every input slice in order, each either as it
/// arrived or as `build` edits it.
fn assert_each_slice_whole(out: &[u8], slices: &[(u32, Vec<u8>)]) {
    let mut pos = 0;
    for (i, (slice_type, payload)) in slices.iter().enumerate() {
        let original = encode_slice(*slice_type, payload);
        let rest = &out[pos..];
        if rest.starts_with(&original) {
            pos += original.len();
        } else {
            let edit = edited(*slice_type, payload);
            assert!(rest.starts_with(&edit), "slice {i} is torn or repeated");
            pos += edit.len();
        }
    }
    assert_eq!(pos, out.len(), "trailing bytes after the last slice");
}

fn sample() -> Vec<u8> {
    let big = vec![0x5A; 200];
    encode_stream(&[
        (1, b"AAAA"),
        (2, b""),
        (7, b"forwarded as is"),
        (3, b"retype me"),
        (2, b"drop this one"),
        (500, &big),
        (1, b""),
    ])
}

// ── Fixed cases ─────────────────────────────────────────────────

#[test]
fn whole_stream_output() {
    let (out, seen) = run(vec![sample()], false).unwrap();
    let big = vec![0x5A; 200];
    let expected = encode_stream(&[
        (1, b"BB"),
        (7, b"forwarded as is"),
        (300, b"retype me"),
        (500, &big),
        (1, b"BB"),
    ]);
    assert_eq!(out, expected);
    assert_eq!(seen.len(), 7);
    assert_eq!(seen[0], (1, b"AAAA".to_vec()));
    assert_eq!(seen[1], (2, Vec::new()));
}

#[test]
fn every_two_way_split_matches_whole() {
    let input = sample();
    let whole = run(vec![input.clone()], false).unwrap();
    for cut in 0..=input.len() {
        let split = run(split_at_points(&input, &[cut]), false).unwrap();
        assert_eq!(split, whole, "split at byte {cut}");
    }
}

#[test]
fn byte_at_a_time_matches_whole() {
    let input = sample();
    let whole = run(vec![input.clone()], false).unwrap();
    assert_eq!(run(chunks_of(&input, 1), false).unwrap(), whole);
}

#[test]
fn readonly_output_is_the_input() {
    let input = sample();
    let whole = run(vec![input.clone()], false).unwrap();
    for size in [1, 2, 3, 7, 64, input.len()] {
        let (out, seen) = run(chunks_of(&input, size), true).unwrap();
        assert_eq!(out, input, "chunk size {size}");
        assert_eq!(seen, whole.1, "chunk size {size}");
    }
}

#[test]
fn empty_feeds_are_harmless() {
    let input = sample();
    let whole = run(vec![input.clone()], false).unwrap();
    let mut chunks = vec![Vec::new()];
    for chunk in chunks_of(&input, 5) {
        chunks.push(chunk);
        chunks.push(Vec::new());
    }
    assert_eq!(run(chunks, false).unwrap(), whole);
}

#[test]
fn mixed_modes_keep_every_slice_whole() {
    let input = sample();
    let whole = run(vec![input.clone()], false).unwrap();
    let slices = vec![
        (1, b"AAAA".to_vec()),
        (2, Vec::new()),
        (7, b"forwarded as is".to_vec()),
        (3, b"retype me".to_vec()),
        (2, b"drop this one".to_vec()),
        (500, vec![0x5A; 200]),
        (1, Vec::new()),
    ];
    for size in [1, 2, 3, 7, 64] {
        for modes in [&[true, false][..], &[false, true], &[false, false, true]] {
            let (out, seen) = run_mixed(with_modes(chunks_of(&input, size), modes)).unwrap();
            assert_eq!(seen, whole.1, "chunk size {size}, modes {modes:?}");
            assert_each_slice_whole(&out, &slices);
        }
    }
}

#[test]
fn mixed_modes_without_edits_reproduce_the_input() {
    let input = sample();
    for size in [1, 2, 5, 64] {
        let recorder = RecordingHandler::new(Action::Forward);
        let mut stream = SliceStream::builder().fallback(recorder).build().unwrap();
        let chunks = with_modes(chunks_of(&input, size), &[false, true, true]);
        let out = feed_with_modes(&mut stream, chunks).unwrap();
        assert_eq!(out, input, "chunk size {size}");
    }
}

// ── Properties ──────────────────────────────────────────────────

fn slice_specs() -> impl Strategy<Value = Vec<(u32, Vec<u8>)>> {
    proptest::collection::vec(
        (
            prop_oneof![Just(1u32), Just(2), Just(3), Just(9), 128u32..20_000],
            proptest::collection::vec(any::<u8>(), 0..300),
        ),
        0..8,
    )
}

proptest! {
    #[test]
    fn arbitrary_cuts_match_whole(
        slices in slice_specs(),
        cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..6),
    ) {
        let refs: Vec<(u32, &[u8])> = slices.iter().map(|(t, p)| (*t, p.as_slice())).collect();
        let input = encode_stream(&refs);
        let points: Vec<usize> = cuts.iter().map(|i| i.index(input.len() + 1)).collect();

        let whole = run(vec![input.clone()], false).unwrap();
        let split = run(split_at_points(&input, &points), false).unwrap();
        prop_assert_eq!(&split, &whole);
        prop_assert_eq!(whole.1.len(), slices.len());

        let (readonly_out, readonly_seen) = run(split_at_points(&input, &points), true).unwrap();
        prop_assert_eq!(&readonly_out, &input);
        prop_assert_eq!(&readonly_seen, &whole.1);
    }

    #[test]
    fn arbitrary_cuts_and_modes_keep_every_slice_whole(
        slices in slice_specs(),
        cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..6),
        modes in proptest::collection::vec(any::<bool>(), 7),
    ) {
        let refs: Vec<(u32, &[u8])> = slices.iter().map(|(t, p)| (*t, p.as_slice())).collect();
        let input = encode_stream(&refs);
        let points: Vec<usize> = cuts.iter().map(|i| i.index(input.len() + 1)).collect();
        let chunks: Vec<(Vec<u8>, bool)> = split_at_points(&input, &points)
            .into_iter()
            .zip(modes)
            .collect();
        let all_rewrite = chunks.iter().all(|(_, readonly)| !readonly);
        let all_readonly = chunks.iter().all(|(_, readonly)| *readonly);

        let whole = run(vec![input.clone()], false).unwrap();
        let (out, seen) = run_mixed(chunks).unwrap();
        prop_assert_eq!(&seen, &whole.1);
        assert_each_slice_whole(&out, &slices);
        if all_rewrite {
            prop_assert_eq!(&out, &whole.0);
        }
        if all_readonly {
            prop_assert_eq!(&out, &input);
        }
    }
}
