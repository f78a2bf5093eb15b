//! Chunk-to-frame state machine shared by every protocol rule.

use std::{fmt, mem};

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use super::{BodyLength, Frame, FrameRule, ParsedHeader, clamp_frame_length};
use crate::codec::{CodecError, EofError, FramingError};

/// Frames produced by a single [`Framer::feed`] call.
#[derive(Debug)]
pub struct Fed<H> {
    /// Complete frames in stream order.
    pub frames: Vec<Frame<H>>,
    /// Header failure that discarded the rest of the buffer, if any.
    ///
    /// Frames completed before the failure are still returned.
    pub error: Option<FramingError>,
}

impl<H> Default for Fed<H> {
    fn default() -> Self {
        Self {
            frames: Vec::new(),
            error: None,
        }
    }
}

enum State<H> {
    AwaitingHeader,
    Body {
        header: H,
        header_len: usize,
        frame_len: usize,
    },
}

/// Streaming framer that carries partial frames across calls.
///
/// Bytes are buffered until the rule recognises a header, then until the
/// full body it declares has arrived. A header that straddles a chunk
/// boundary is simply re-examined once more bytes are available.
///
/// # Examples
///
/// ```
/// use serp::{
///     codec::{self, Message, Method, Request, SerpRule},
///     frame::Framer,
/// };
///
/// let request = Request::new(Method::Get, "/status");
/// let wire = codec::encode(&Message::Request(request)).expect("encodes");
///
/// let mut framer = Framer::new(SerpRule, 1024);
/// let (head, tail) = wire.split_at(5);
/// assert!(framer.feed(head).frames.is_empty());
///
/// let fed = framer.feed(tail);
/// assert_eq!(fed.frames.len(), 1);
/// assert_eq!(fed.frames[0].as_bytes(), &wire[..]);
/// ```
pub struct Framer<R: FrameRule> {
    rule: R,
    max_frame_length: usize,
    buffer: BytesMut,
    state: State<R::Header>,
}

impl<R: FrameRule + fmt::Debug> fmt::Debug for Framer<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Framer")
            .field("rule", &self.rule)
            .field("max_frame_length", &self.max_frame_length)
            .field("buffered", &self.buffer.len())
            .field("mid_frame", &self.is_mid_frame())
            .finish()
    }
}

impl<R: FrameRule> Framer<R> {
    /// Create a framer bounded by `max_frame_length`.
    ///
    /// The bound is clamped to
    /// [`MIN_FRAME_LENGTH`](super::MIN_FRAME_LENGTH)..=[`MAX_FRAME_LENGTH`](super::MAX_FRAME_LENGTH).
    #[must_use]
    pub fn new(rule: R, max_frame_length: usize) -> Self {
        Self {
            rule,
            max_frame_length: clamp_frame_length(max_frame_length),
            buffer: BytesMut::new(),
            state: State::AwaitingHeader,
        }
    }

    /// Return the maximum frame length accepted by this framer.
    #[must_use]
    pub fn max_frame_length(&self) -> usize { self.max_frame_length }

    /// Borrow the header rule.
    #[must_use]
    pub fn rule(&self) -> &R { &self.rule }

    /// Number of bytes buffered towards the next frame.
    #[must_use]
    pub fn buffered_len(&self) -> usize { self.buffer.len() }

    /// Returns true if a header has been parsed and its body is incomplete.
    #[must_use]
    pub fn is_mid_frame(&self) -> bool { matches!(self.state, State::Body { .. }) }

    /// Drop all buffered bytes and forget any partially received frame.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.state = State::AwaitingHeader;
    }

    /// Append `chunk` and return every frame it completes.
    ///
    /// If a header fails to parse, every buffered byte after the last
    /// complete frame is discarded and the error is reported alongside the
    /// frames that were completed first. Framing resumes fresh on the next
    /// call.
    pub fn feed(&mut self, chunk: &[u8]) -> Fed<R::Header> {
        let mut buffer = mem::take(&mut self.buffer);
        buffer.extend_from_slice(chunk);

        let mut fed = Fed::default();
        loop {
            match self.next_frame(&mut buffer) {
                Ok(Some(frame)) => fed.frames.push(frame),
                Ok(None) => break,
                Err(err) => {
                    fed.error = Some(err);
                    break;
                }
            }
        }

        self.buffer = buffer;
        fed
    }

    /// Extract the next complete frame from `src`, leaving partial data in
    /// place.
    ///
    /// # Errors
    ///
    /// Returns a [`FramingError`] if the header is malformed or declares an
    /// oversized frame. `src` is cleared before the error is returned.
    pub fn next_frame(
        &mut self,
        src: &mut BytesMut,
    ) -> Result<Option<Frame<R::Header>>, FramingError> {
        loop {
            match mem::replace(&mut self.state, State::AwaitingHeader) {
                State::AwaitingHeader => {
                    let parsed = match self.rule.parse_header(src) {
                        Ok(Some(parsed)) => parsed,
                        Ok(None) => return Ok(None),
                        Err(err) => {
                            src.clear();
                            return Err(err);
                        }
                    };
                    match self.body_state(parsed, src.len()) {
                        Ok(state) => self.state = state,
                        Err(err) => {
                            src.clear();
                            return Err(err);
                        }
                    }
                }
                State::Body {
                    header,
                    header_len,
                    frame_len,
                } => {
                    if src.len() < frame_len {
                        self.state = State::Body {
                            header,
                            header_len,
                            frame_len,
                        };
                        return Ok(None);
                    }
                    let bytes = src.split_to(frame_len).freeze();
                    return Ok(Some(Frame::new(header, header_len, bytes)));
                }
            }
        }
    }

    fn body_state(
        &self,
        parsed: ParsedHeader<R::Header>,
        buffered: usize,
    ) -> Result<State<R::Header>, FramingError> {
        let ParsedHeader {
            header,
            header_len,
            body,
        } = parsed;
        let body_len = match body {
            BodyLength::Exact(len) => len,
            BodyLength::RestOfBuffer => buffered.saturating_sub(header_len),
        };
        let frame_len = header_len
            .checked_add(body_len)
            .filter(|len| *len <= self.max_frame_length)
            .ok_or(FramingError::OversizedFrame {
                size: header_len.saturating_add(body_len),
                max: self.max_frame_length,
            })?;
        Ok(State::Body {
            header,
            header_len,
            frame_len,
        })
    }

    fn eof_error(&self, buffered: usize) -> EofError {
        match &self.state {
            State::Body { frame_len, .. } => EofError::MidFrame {
                bytes_received: buffered,
                expected: *frame_len,
            },
            State::AwaitingHeader => EofError::MidHeader {
                bytes_received: buffered,
            },
        }
    }
}

impl<R: FrameRule> Decoder for Framer<R> {
    type Item = Frame<R::Header>;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.next_frame(src).map_err(CodecError::from)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if src.is_empty() {
            return Ok(None);
        }
        let err = self.eof_error(src.len());
        src.clear();
        self.state = State::AwaitingHeader;
        Err(err.into())
    }
}
