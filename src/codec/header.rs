//! Identifiers and the fixed-size SERP header.

use bytes::{BufMut, BytesMut};
use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

use super::FramingError;
use crate::byte_order::{read_network_u16_at, read_network_u32_at, read_u8_at};

/// Size of the encoded [`FrameHeader`] in bytes.
pub const HEADER_LEN: usize = 13;

/// Identifier correlating a request, its retries, and its response.
///
/// Zero is never used for a real request.
///
/// # Examples
///
/// ```
/// use serp::codec::MessageId;
///
/// assert_eq!(MessageId::new(7).next(), MessageId::new(8));
/// assert_eq!(MessageId::new(u32::MAX).next(), MessageId::new(1));
/// ```
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    From,
    Into,
    Serialize,
    Deserialize,
)]
#[display("{_0}")]
pub struct MessageId(u32);

impl MessageId {
    /// Create a new identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self { Self(value) }

    /// Return the inner numeric identifier.
    #[must_use]
    pub const fn get(self) -> u32 { self.0 }

    /// Returns true for any identifier other than zero.
    #[must_use]
    pub const fn is_assigned(self) -> bool { self.0 != 0 }

    /// The identifier after this one, skipping zero on wrap-around.
    #[must_use]
    pub const fn next(self) -> Self {
        match self.0.checked_add(1) {
            Some(next) => Self(next),
            None => Self(1),
        }
    }
}

/// Numeric address of a participant (the SERP ID).
///
/// # Examples
///
/// ```
/// use serp::codec::PeerId;
///
/// assert!(PeerId::UNASSIGNED.is_unassigned());
/// assert_eq!(PeerId::from(42).to_string(), "42");
/// ```
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    From,
    Into,
    Serialize,
    Deserialize,
)]
#[display("{_0}")]
pub struct PeerId(u16);

impl PeerId {
    /// Reserved identifier for a peer that has not been assigned an id yet.
    pub const UNASSIGNED: PeerId = PeerId(0);

    /// Create a new peer identifier.
    #[must_use]
    pub const fn new(value: u16) -> Self { Self(value) }

    /// Return the inner numeric identifier.
    #[must_use]
    pub const fn get(self) -> u16 { self.0 }

    /// Returns true for the reserved "unknown" identifier.
    #[must_use]
    pub const fn is_unassigned(self) -> bool { self.0 == 0 }
}

/// Discriminant distinguishing the two message kinds on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    /// A request addressed to a path on the destination peer.
    Request = 0,
    /// A response to an earlier request.
    Response = 1,
}

impl TryFrom<u8> for MessageKind {
    type Error = FramingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Request),
            1 => Ok(Self::Response),
            value => Err(FramingError::UnknownKind { value }),
        }
    }
}

/// Addressing fields shared by every message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Header {
    /// Correlation identifier, reused verbatim on retries and the response.
    pub message_id: MessageId,
    /// Sender of the message.
    pub source: PeerId,
    /// Intended recipient of the message.
    pub destination: PeerId,
}

/// The fixed 13-byte header preceding every SERP body.
///
/// Layout, all fields big-endian:
///
/// | offset | size | field |
/// |--------|------|-------|
/// | 0 | 4 | message id |
/// | 4 | 2 | source |
/// | 6 | 2 | destination |
/// | 8 | 4 | content length |
/// | 12 | 1 | kind |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    /// Addressing fields.
    pub header: Header,
    /// Number of body bytes following the header.
    pub content_length: u32,
    /// Message kind of the body.
    pub kind: MessageKind,
}

impl FrameHeader {
    /// Parse a header from the start of `buf`.
    ///
    /// Returns `Ok(None)` if fewer than [`HEADER_LEN`] bytes are available.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::UnknownKind`] if the kind byte is invalid.
    pub fn parse(buf: &[u8]) -> Result<Option<Self>, FramingError> {
        let (Some(message_id), Some(source), Some(destination), Some(content_length), Some(kind)) = (
            read_network_u32_at(buf, 0),
            read_network_u16_at(buf, 4),
            read_network_u16_at(buf, 6),
            read_network_u32_at(buf, 8),
            read_u8_at(buf, 12),
        ) else {
            return Ok(None);
        };
        Ok(Some(Self {
            header: Header {
                message_id: MessageId::new(message_id),
                source: PeerId::new(source),
                destination: PeerId::new(destination),
            },
            content_length,
            kind: MessageKind::try_from(kind)?,
        }))
    }

    /// Append the encoded header to `dst`.
    pub fn write(&self, dst: &mut BytesMut) {
        dst.reserve(HEADER_LEN);
        dst.put_u32(self.header.message_id.get());
        dst.put_u16(self.header.source.get());
        dst.put_u16(self.header.destination.get());
        dst.put_u32(self.content_length);
        dst.put_u8(self.kind as u8);
    }
}
