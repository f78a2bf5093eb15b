//! Binary SERP message codec.
//!
//! Every message is a fixed [`FrameHeader`] followed by `content_length`
//! bytes of body. Request bodies start with a method byte, a 16-bit target
//! length and the UTF-8 target; response bodies start with a 16-bit status
//! code. Whatever remains of the body is opaque payload.
//!
//! [`decode`] and [`encode`] work on single frames and messages.
//! [`SerpCodec`] composes them with the streaming [`Framer`] and implements
//! the `tokio_util` codec traits for use with `Framed`.
//!
//! # Error Handling
//!
//! Header failures are [`FramingError`]s and cost the rest of the buffered
//! stream; body failures are [`ProtocolError`]s and cost only their frame.
//! See the [`error`] module for the full taxonomy.

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{
    byte_order::{read_network_u16_at, read_u8_at},
    frame::{BodyLength, DEFAULT_MAX_FRAME_LENGTH, Frame, FrameRule, Framer, ParsedHeader},
};

pub mod error;
mod header;
mod message;
mod method;

pub use error::{CodecError, EofError, FramingError, ProtocolError};
pub use header::{FrameHeader, HEADER_LEN, Header, MessageId, MessageKind, PeerId};
pub use message::{Message, Request, Response};
pub use method::{Method, StatusCode};

/// Bytes preceding the target in a request body: method and target length.
const REQUEST_PREFIX_LEN: usize = 3;
/// Bytes preceding the payload in a response body: the status code.
const RESPONSE_PREFIX_LEN: usize = 2;

/// A complete, undecoded SERP frame.
pub type SerpFrame = Frame<FrameHeader>;

/// Frame rule for the fixed 13-byte SERP header.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerpRule;

impl FrameRule for SerpRule {
    type Header = FrameHeader;

    fn parse_header(&self, buf: &[u8]) -> Result<Option<ParsedHeader<FrameHeader>>, FramingError> {
        let Some(header) = FrameHeader::parse(buf)? else {
            return Ok(None);
        };
        let body = usize::try_from(header.content_length).map_err(|_| {
            FramingError::InvalidLength {
                value: header.content_length.to_string(),
            }
        })?;
        Ok(Some(ParsedHeader {
            header,
            header_len: HEADER_LEN,
            body: BodyLength::Exact(body),
        }))
    }
}

/// Decode a complete frame into a message.
///
/// # Errors
///
/// Returns a [`ProtocolError`] if the body does not match the layout its
/// kind requires.
pub fn decode(frame: &SerpFrame) -> Result<Message, ProtocolError> {
    let FrameHeader { header, kind, .. } = *frame.header();
    let body = frame.body_bytes();
    match kind {
        MessageKind::Request => decode_request(header, &body).map(Message::Request),
        MessageKind::Response => decode_response(header, &body).map(Message::Response),
    }
}

fn decode_request(header: Header, body: &Bytes) -> Result<Request, ProtocolError> {
    let method = read_u8_at(body, 0).ok_or(ProtocolError::TruncatedBody { field: "method" })?;
    let method = Method::try_from(method)?;
    let target_len = read_network_u16_at(body, 1).ok_or(ProtocolError::TruncatedBody {
        field: "target length",
    })?;
    let target_end = REQUEST_PREFIX_LEN + usize::from(target_len);
    let target = body
        .get(REQUEST_PREFIX_LEN..target_end)
        .ok_or(ProtocolError::TruncatedBody { field: "target" })?;
    let target = std::str::from_utf8(target).map_err(|_| ProtocolError::InvalidTarget)?;
    Ok(Request {
        header,
        method,
        target: target.to_owned(),
        body: body.slice(target_end..),
    })
}

fn decode_response(header: Header, body: &Bytes) -> Result<Response, ProtocolError> {
    let code = read_network_u16_at(body, 0).ok_or(ProtocolError::TruncatedBody {
        field: "status code",
    })?;
    Ok(Response {
        header,
        status: StatusCode::try_from(code)?,
        body: body.slice(RESPONSE_PREFIX_LEN..),
    })
}

/// Total encoded size of `message`, header included.
#[must_use]
pub fn encoded_len(message: &Message) -> usize {
    let body = match message {
        Message::Request(request) => {
            REQUEST_PREFIX_LEN + request.target.len() + request.body.len()
        }
        Message::Response(response) => RESPONSE_PREFIX_LEN + response.body.len(),
    };
    HEADER_LEN.saturating_add(body)
}

/// Encode `message` into a fresh buffer.
///
/// # Errors
///
/// Returns a [`CodecError`] if the target or body cannot be represented in
/// the header's length fields.
///
/// # Examples
///
/// ```
/// use serp::codec::{self, HEADER_LEN, Message, StatusCode, Response};
///
/// let wire = codec::encode(&Message::Response(Response::new(StatusCode::Ok)))
///     .expect("encodes");
/// assert_eq!(wire.len(), HEADER_LEN + 2);
/// ```
pub fn encode(message: &Message) -> Result<Bytes, CodecError> {
    let mut dst = BytesMut::with_capacity(encoded_len(message));
    encode_into(message, &mut dst)?;
    Ok(dst.freeze())
}

/// Append the encoding of `message` to `dst`.
///
/// Nothing is written if an error is returned.
///
/// # Errors
///
/// Returns a [`CodecError`] if the target or body cannot be represented in
/// the header's length fields.
pub fn encode_into(message: &Message, dst: &mut BytesMut) -> Result<(), CodecError> {
    match message {
        Message::Request(request) => encode_request(request, dst),
        Message::Response(response) => encode_response(response, dst),
    }
}

fn encode_request(request: &Request, dst: &mut BytesMut) -> Result<(), CodecError> {
    let target = request.target.as_bytes();
    let target_len = u16::try_from(target.len())
        .map_err(|_| ProtocolError::TargetTooLong { len: target.len() })?;
    let content_length = content_length(REQUEST_PREFIX_LEN + target.len() + request.body.len())?;

    FrameHeader {
        header: request.header,
        content_length,
        kind: MessageKind::Request,
    }
    .write(dst);
    dst.reserve(content_length as usize);
    dst.put_u8(request.method as u8);
    dst.put_u16(target_len);
    dst.extend_from_slice(target);
    dst.extend_from_slice(&request.body);
    Ok(())
}

fn encode_response(response: &Response, dst: &mut BytesMut) -> Result<(), CodecError> {
    let content_length = content_length(RESPONSE_PREFIX_LEN + response.body.len())?;

    FrameHeader {
        header: response.header,
        content_length,
        kind: MessageKind::Response,
    }
    .write(dst);
    dst.reserve(content_length as usize);
    dst.put_u16(response.status.code());
    dst.extend_from_slice(&response.body);
    Ok(())
}

fn content_length(len: usize) -> Result<u32, CodecError> {
    u32::try_from(len).map_err(|_| {
        CodecError::Framing(FramingError::OversizedFrame {
            size: len.saturating_add(HEADER_LEN),
            max: u32::MAX as usize,
        })
    })
}

/// Streaming SERP codec for use with `tokio_util::codec::Framed`.
///
/// Decoding yields whole [`Message`]s. A malformed body surfaces as a
/// [`CodecError::Protocol`]; `Framed` stops the stream after any decoder
/// error, so callers that want to skip bad frames should drive a
/// [`Framer`] and [`decode`] directly.
#[derive(Debug)]
pub struct SerpCodec {
    framer: Framer<SerpRule>,
}

impl SerpCodec {
    /// Construct a codec with a maximum frame length.
    #[must_use]
    pub fn new(max_frame_length: usize) -> Self {
        Self {
            framer: Framer::new(SerpRule, max_frame_length),
        }
    }

    /// Return the maximum frame length accepted by this codec.
    #[must_use]
    pub fn max_frame_length(&self) -> usize { self.framer.max_frame_length() }
}

impl Default for SerpCodec {
    fn default() -> Self { Self::new(DEFAULT_MAX_FRAME_LENGTH) }
}

impl Decoder for SerpCodec {
    type Item = Message;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.framer.decode(src)? {
            Some(frame) => Ok(Some(decode(&frame)?)),
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.framer.decode_eof(src)? {
            Some(frame) => Ok(Some(decode(&frame)?)),
            None => Ok(None),
        }
    }
}

impl Encoder<Message> for SerpCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let size = encoded_len(&item);
        let max = self.max_frame_length();
        if size > max {
            return Err(FramingError::OversizedFrame { size, max }.into());
        }
        encode_into(&item, dst)
    }
}

#[cfg(test)]
mod tests;
