//! Header recognition rules plugged into [`Framer`](super::Framer).

use crate::codec::FramingError;

/// How much body follows a parsed header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyLength {
    /// Exactly this many bytes follow the header.
    Exact(usize),
    /// The body is whatever is currently buffered after the header.
    ///
    /// Used by the text protocol when no length header is present. A sender
    /// relying on this must not pipeline another message into the same chunk.
    RestOfBuffer,
}

/// Result of successfully parsing a header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedHeader<H> {
    /// Protocol-specific header value.
    pub header: H,
    /// Number of bytes the header occupies at the start of the buffer.
    pub header_len: usize,
    /// Size of the body that follows.
    pub body: BodyLength,
}

/// Rule for locating the header at the start of a buffer.
///
/// Implementations must not consume anything; the framer slices the buffer
/// once the whole frame is available.
pub trait FrameRule {
    /// Parsed header type carried by each frame.
    type Header;

    /// Attempt to parse a header from the start of `buf`.
    ///
    /// Returns `Ok(None)` while more bytes are needed. On success the
    /// returned `header_len` must not exceed `buf.len()`.
    ///
    /// # Errors
    ///
    /// Returns a [`FramingError`] when the bytes cannot be a valid header.
    fn parse_header(&self, buf: &[u8]) -> Result<Option<ParsedHeader<Self::Header>>, FramingError>;
}
