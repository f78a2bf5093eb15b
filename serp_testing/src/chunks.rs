//! Helpers for cutting encoded streams into arbitrary chunks.

use bytes::{Bytes, BytesMut};
use serp::{Message, codec};

/// Encode `messages` back to back into one buffer.
///
/// # Panics
///
/// Panics if any message cannot be encoded.
#[must_use]
pub fn encode_all<I>(messages: I) -> Bytes
where
    I: IntoIterator,
    I::Item: Into<Message>,
{
    let mut buf = BytesMut::new();
    for message in messages {
        codec::encode_into(&message.into(), &mut buf).expect("test message must encode");
    }
    buf.freeze()
}

/// Split `bytes` into chunks of `size` bytes; the last chunk may be shorter.
///
/// # Panics
///
/// Panics if `size` is zero.
#[must_use]
pub fn split_every(bytes: &Bytes, size: usize) -> Vec<Bytes> {
    assert!(size > 0, "chunk size must be positive");
    (0..bytes.len())
        .step_by(size)
        .map(|start| bytes.slice(start..(start + size).min(bytes.len())))
        .collect()
}

/// Split `bytes` at the given offsets.
///
/// Offsets outside the buffer are ignored, and so are duplicates, so the
/// result never contains an empty chunk.
#[must_use]
pub fn split_at(bytes: &Bytes, offsets: &[usize]) -> Vec<Bytes> {
    let mut cuts: Vec<usize> = offsets
        .iter()
        .copied()
        .filter(|&offset| offset > 0 && offset < bytes.len())
        .collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut chunks = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts.into_iter().chain(std::iter::once(bytes.len())) {
        if cut > start {
            chunks.push(bytes.slice(start..cut));
        }
        start = cut;
    }
    chunks
}
