//! Request and response messages.

use bincode::error::{DecodeError, EncodeError};
use bytes::Bytes;

use super::{Header, MessageId, MessageKind, Method, PeerId, StatusCode};
use crate::payload::Payload;

/// A request addressed to a `/`-delimited path on the destination peer.
///
/// # Examples
///
/// ```
/// use serp::codec::{Method, PeerId, Request};
///
/// let request = Request::new(Method::Put, "/lights/kitchen")
///     .to(PeerId::new(3))
///     .with_body("on");
/// assert_eq!(request.header.destination, PeerId::new(3));
/// assert_eq!(request.segments().collect::<Vec<_>>(), ["lights", "kitchen"]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    /// Addressing fields.
    pub header: Header,
    /// Request verb.
    pub method: Method,
    /// Target path.
    pub target: String,
    /// Opaque payload.
    pub body: Bytes,
}

impl Request {
    /// Create a request with an empty body and unassigned addressing.
    #[must_use]
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            header: Header::default(),
            method,
            target: target.into(),
            body: Bytes::new(),
        }
    }

    /// Address the request to `destination`.
    #[must_use]
    pub fn to(mut self, destination: PeerId) -> Self {
        self.header.destination = destination;
        self
    }

    /// Replace the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Replace the body with a bincode-encoded payload.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] if the payload cannot be serialized.
    pub fn with_payload<P: Payload>(self, payload: &P) -> Result<Self, EncodeError> {
        Ok(self.with_body(payload.to_bytes()?))
    }

    /// Decode the body as a bincode payload.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the body is not a valid `P`.
    pub fn decode_payload<P: Payload>(&self) -> Result<P, DecodeError> {
        let (payload, _) = P::from_bytes(&self.body)?;
        Ok(payload)
    }

    /// Non-empty `/`-separated segments of the target.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.target.split('/').filter(|segment| !segment.is_empty())
    }
}

/// A response correlated with a request by message id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    /// Addressing fields.
    pub header: Header,
    /// Outcome of the request.
    pub status: StatusCode,
    /// Opaque payload.
    pub body: Bytes,
}

impl Response {
    /// Create a response with an empty body and unassigned addressing.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            header: Header::default(),
            status,
            body: Bytes::new(),
        }
    }

    /// Create a response addressed back to the sender of `request`.
    ///
    /// # Examples
    ///
    /// ```
    /// use serp::codec::{Method, PeerId, Request, Response, StatusCode};
    ///
    /// let mut request = Request::new(Method::Get, "/ping");
    /// request.header.source = PeerId::new(9);
    ///
    /// let response = Response::reply_to(&request, StatusCode::Ok);
    /// assert_eq!(response.header.destination, PeerId::new(9));
    /// assert_eq!(response.header.message_id, request.header.message_id);
    /// ```
    #[must_use]
    pub fn reply_to(request: &Request, status: StatusCode) -> Self {
        Self {
            header: Header {
                message_id: request.header.message_id,
                source: request.header.destination,
                destination: request.header.source,
            },
            status,
            body: Bytes::new(),
        }
    }

    /// Replace the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Replace the body with a bincode-encoded payload.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] if the payload cannot be serialized.
    pub fn with_payload<P: Payload>(self, payload: &P) -> Result<Self, EncodeError> {
        Ok(self.with_body(payload.to_bytes()?))
    }

    /// Decode the body as a bincode payload.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the body is not a valid `P`.
    pub fn decode_payload<P: Payload>(&self) -> Result<P, DecodeError> {
        let (payload, _) = P::from_bytes(&self.body)?;
        Ok(payload)
    }
}

/// Either kind of SERP message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    /// An inbound or outbound request.
    Request(Request),
    /// An inbound or outbound response.
    Response(Response),
}

impl Message {
    /// Wire discriminant for this message.
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Request(_) => MessageKind::Request,
            Self::Response(_) => MessageKind::Response,
        }
    }

    /// Borrow the addressing fields.
    #[must_use]
    pub fn header(&self) -> &Header {
        match self {
            Self::Request(request) => &request.header,
            Self::Response(response) => &response.header,
        }
    }

    /// Mutably borrow the addressing fields.
    pub fn header_mut(&mut self) -> &mut Header {
        match self {
            Self::Request(request) => &mut request.header,
            Self::Response(response) => &mut response.header,
        }
    }

    /// Correlation identifier of the message.
    #[must_use]
    pub fn message_id(&self) -> MessageId { self.header().message_id }
}

impl From<Request> for Message {
    fn from(request: Request) -> Self { Self::Request(request) }
}

impl From<Response> for Message {
    fn from(response: Response) -> Self { Self::Response(response) }
}
