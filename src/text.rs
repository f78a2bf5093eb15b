//! HTTP-like text protocol sharing the streaming framer.
//!
//! A message is a start line, `name: value` header lines and a blank line,
//! followed by the body:
//!
//! ```text
//! SERP/1.0 PUT /lights/hall
//! content-length: 2
//!
//! on
//! ```
//!
//! The second token of the start line decides the kind: a method name makes
//! a request, a numeric status makes a response. The encoder always emits
//! `content-length`; on decode a message without one takes the rest of the
//! buffered chunk as its body.

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{
    codec::{CodecError, FramingError, Method, ProtocolError, StatusCode},
    frame::{DEFAULT_MAX_FRAME_LENGTH, Frame, Framer},
};

mod message;
mod rule;

pub use message::{Headers, TextMessage, TextRequest, TextResponse};
pub use rule::{DEFAULT_MAX_HEADER_LENGTH, TextHead, TextRule};
use rule::CONTENT_LENGTH;

/// Version token used by [`TextRequest::new`] and [`TextResponse::new`].
pub const DEFAULT_VERSION: &str = "SERP/1.0";

/// A complete, undecoded text frame.
pub type TextFrame = Frame<TextHead>;

/// Decode a complete text frame.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidStartLine`] if the start line has fewer
/// than three parts or its second token is neither a method nor a number,
/// [`ProtocolError::UnknownStatus`] for an unrecognised numeric status.
pub fn decode(frame: &TextFrame) -> Result<TextMessage, ProtocolError> {
    let head = frame.header();
    let invalid = || ProtocolError::InvalidStartLine {
        line: head.start_line.clone(),
    };
    let mut parts = head.start_line.splitn(3, ' ');
    let (Some(version), Some(token), Some(rest)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };
    if version.is_empty() {
        return Err(invalid());
    }

    if let Ok(method) = token.parse::<Method>() {
        return Ok(TextMessage::Request(TextRequest {
            version: version.to_owned(),
            method,
            path: rest.to_owned(),
            headers: head.headers.clone(),
            body: frame.body_bytes(),
        }));
    }
    if token.len() != 3 {
        return Err(invalid());
    }
    let code = token.parse::<u16>().map_err(|_| invalid())?;
    Ok(TextMessage::Response(TextResponse {
        version: version.to_owned(),
        status: StatusCode::try_from(code)?,
        reason: rest.to_owned(),
        headers: head.headers.clone(),
        body: frame.body_bytes(),
    }))
}

/// Encode `message` into a fresh buffer.
///
/// # Errors
///
/// Returns a [`ProtocolError`] if a start-line part or header cannot be
/// written without changing its meaning on decode.
///
/// # Examples
///
/// ```
/// use serp::text::{self, TextResponse};
/// use serp::codec::StatusCode;
///
/// let wire = text::encode(&TextResponse::new(StatusCode::Ok).with_body("hi").into())
///     .expect("encodes");
/// assert_eq!(&wire[..], b"SERP/1.0 200 OK\ncontent-length: 2\n\nhi");
/// ```
pub fn encode(message: &TextMessage) -> Result<Bytes, ProtocolError> {
    let mut dst = BytesMut::new();
    encode_into(message, &mut dst)?;
    Ok(dst.freeze())
}

/// Append the encoding of `message` to `dst`.
///
/// Nothing is written if an error is returned.
///
/// # Errors
///
/// See [`encode`].
pub fn encode_into(message: &TextMessage, dst: &mut BytesMut) -> Result<(), ProtocolError> {
    let start_line = match message {
        TextMessage::Request(request) => {
            check_start_line(&request.version, &request.path)?;
            format!("{} {} {}", request.version, request.method, request.path)
        }
        TextMessage::Response(response) => {
            check_start_line(&response.version, &response.reason)?;
            format!(
                "{} {} {}",
                response.version,
                response.status.code(),
                response.reason
            )
        }
    };
    let headers = message.headers();
    for (name, value) in headers {
        check_header(name, value)?;
    }

    let body = message.body();
    dst.reserve(start_line.len() + body.len() + 32);
    dst.put_slice(start_line.as_bytes());
    dst.put_u8(b'\n');
    for (name, value) in headers {
        dst.put_slice(name.as_bytes());
        dst.put_slice(b": ");
        dst.put_slice(value.as_bytes());
        dst.put_u8(b'\n');
    }
    dst.put_slice(format!("{CONTENT_LENGTH}: {}\n\n", body.len()).as_bytes());
    dst.put_slice(body);
    Ok(())
}

fn check_start_line(version: &str, tail: &str) -> Result<(), ProtocolError> {
    let breaks_line = |part: &str| part.contains(['\n', '\r']);
    if version.is_empty() || version.contains(' ') || breaks_line(version) || breaks_line(tail) {
        return Err(ProtocolError::InvalidStartLine {
            line: format!("{version} {tail}"),
        });
    }
    Ok(())
}

fn check_header(name: &str, value: &str) -> Result<(), ProtocolError> {
    let valid_name = !name.is_empty()
        && name.trim() == name
        && !name.contains([':', '\n', '\r'])
        && !name.eq_ignore_ascii_case(CONTENT_LENGTH);
    let valid_value = value.trim() == value && !value.contains(['\n', '\r']);
    if valid_name && valid_value {
        Ok(())
    } else {
        Err(ProtocolError::InvalidHeaderLine {
            name: name.to_owned(),
        })
    }
}

/// Streaming text codec for use with `tokio_util::codec::Framed`.
#[derive(Debug)]
pub struct TextCodec {
    framer: Framer<TextRule>,
}

impl TextCodec {
    /// Construct a codec with frame and header section limits.
    #[must_use]
    pub fn new(max_frame_length: usize, max_header_length: usize) -> Self {
        Self {
            framer: Framer::new(TextRule::new(max_header_length), max_frame_length),
        }
    }

    /// Return the maximum frame length accepted by this codec.
    #[must_use]
    pub fn max_frame_length(&self) -> usize { self.framer.max_frame_length() }
}

impl Default for TextCodec {
    fn default() -> Self { Self::new(DEFAULT_MAX_FRAME_LENGTH, DEFAULT_MAX_HEADER_LENGTH) }
}

impl Decoder for TextCodec {
    type Item = TextMessage;
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

impl Encoder<TextMessage> for TextCodec {
    type Error = CodecError;

    fn encode(&mut self, item: TextMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let wire = encode(&item)?;
        let max = self.max_frame_length();
        if wire.len() > max {
            return Err(FramingError::OversizedFrame {
                size: wire.len(),
                max,
            }
            .into());
        }
        dst.extend_from_slice(&wire);
        Ok(())
    }
}

#[cfg(test)]
mod tests;
