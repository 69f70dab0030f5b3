//! Fuzz target: `PackDecoder::feed`
//!
//! Drives arbitrary byte sequences into the streaming pack decoder and
//! asserts that it never panics, never yields a chunk larger than its
//! capacity, and never yields an empty chunk except as a whole empty pack.
//!
//! cargo fuzz run fuzz_pack_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use lumen::pack::{Decoded, PackDecoder};

const CHUNK: usize = 64;

fuzz_target!(|data: &[u8]| {
    let mut decoder: PackDecoder<CHUNK> = PackDecoder::new();

    // First byte picks a split point so partial feeds are exercised too.
    let split = data.first().map_or(0, |b| usize::from(*b) % (data.len() + 1));
    let (a, b) = data.split_at(split);

    for part in [a, b] {
        decoder.feed(part, |d| {
            if let Decoded::Chunk { path, data, last } = d {
                assert!(!path.is_empty());
                assert!(data.len() <= CHUNK, "chunk exceeds capacity");
                assert!(!data.is_empty() || last, "empty non-final chunk");
            }
        });
    }

    // After a reset the decoder must accept bytes cleanly again.
    decoder.reset();
    assert!(decoder.is_idle());
    decoder.feed(data, |_| {});
});
