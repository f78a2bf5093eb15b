//! Streaming reassembly of length-delimited frames from arbitrary chunks.
//!
//! A transport hands over bytes in whatever chunk sizes it likes. [`Framer`]
//! buffers those chunks and yields complete [`Frame`]s once a header and all
//! of the body it declares are available. How a header is recognised is
//! delegated to a [`FrameRule`], which lets the binary SERP protocol and the
//! header-line text protocol share one state machine.

pub mod framer;
pub mod rule;

use bytes::Bytes;
pub use framer::{Fed, Framer};
pub use rule::{BodyLength, FrameRule, ParsedHeader};

/// Minimum frame length in bytes.
///
/// Frame lengths passed to framer constructors are clamped to at least this
/// value so that every protocol header fits.
pub const MIN_FRAME_LENGTH: usize = 64;

/// Maximum frame length in bytes (16 MiB).
///
/// Frame lengths passed to framer constructors are clamped to at most this
/// value to prevent unbounded buffering.
pub const MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;

/// Default frame length bound (1 MiB).
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 1024 * 1024;

pub(crate) fn clamp_frame_length(value: usize) -> usize {
    value.clamp(MIN_FRAME_LENGTH, MAX_FRAME_LENGTH)
}

/// One complete, undecoded message: a header followed by its full body.
///
/// The frame keeps the exact bytes taken from the stream so that they can be
/// compared with, or retransmitted as, the original.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame<H> {
    header: H,
    header_len: usize,
    bytes: Bytes,
}

impl<H> Frame<H> {
    pub(crate) fn new(header: H, header_len: usize, bytes: Bytes) -> Self {
        debug_assert!(header_len <= bytes.len());
        Self {
            header,
            header_len,
            bytes,
        }
    }

    /// Parsed header.
    #[must_use]
    pub fn header(&self) -> &H { &self.header }

    /// Body bytes following the header.
    #[must_use]
    pub fn body(&self) -> &[u8] { &self.bytes[self.header_len..] }

    /// Body bytes as a cheap clone of the underlying buffer.
    #[must_use]
    pub fn body_bytes(&self) -> Bytes { self.bytes.slice(self.header_len..) }

    /// Every byte of the frame, header included, exactly as received.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] { &self.bytes }

    /// Total frame size in bytes.
    #[must_use]
    pub fn len(&self) -> usize { self.bytes.len() }

    /// Returns true if the frame carries no bytes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.bytes.is_empty() }

    /// Consume the frame, returning the header and the raw bytes.
    #[must_use]
    pub fn into_parts(self) -> (H, Bytes) { (self.header, self.bytes) }
}
