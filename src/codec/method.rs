//! Request verbs and response status codes.

use std::{fmt, str::FromStr};

use super::ProtocolError;

/// Request verb carried in the first body byte of a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Method {
    /// Read a resource.
    Get = 0,
    /// Replace a resource.
    Put = 1,
    /// Submit data to a resource.
    Post = 2,
    /// Remove a resource.
    Delete = 3,
    /// Open a session with the destination.
    Connect = 4,
    /// Close a session with the destination.
    Disconnect = 5,
}

impl Method {
    /// Every method, in discriminant order.
    pub const ALL: [Method; 6] = [
        Method::Get,
        Method::Put,
        Method::Post,
        Method::Delete,
        Method::Connect,
        Method::Disconnect,
    ];

    /// Upper-case token used by the text protocol.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
            Method::Connect => "CONNECT",
            Method::Disconnect => "DISCONNECT",
        }
    }
}

impl TryFrom<u8> for Method {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Method::ALL
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| ProtocolError::UnknownMethod {
                method: value.to_string(),
            })
    }
}

impl FromStr for Method {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownMethod {
                method: s.to_owned(),
            })
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Outcome of a request, carried as a 16-bit code.
///
/// # Examples
///
/// ```
/// use serp::codec::StatusCode;
///
/// assert_eq!(StatusCode::try_from(404), Ok(StatusCode::NotFound));
/// assert_eq!(StatusCode::NotFound.reason(), "Not Found");
/// assert!(StatusCode::try_from(299).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum StatusCode {
    /// The request succeeded.
    Ok = 200,
    /// The request created a resource.
    Created = 201,
    /// The request succeeded with no body to return.
    NoContent = 204,
    /// The request was malformed.
    BadRequest = 400,
    /// The sender is not authenticated.
    Unauthorized = 401,
    /// The sender may not perform the request.
    Forbidden = 403,
    /// No resource exists at the target.
    NotFound = 404,
    /// The target does not accept the method.
    MethodNotAllowed = 405,
    /// The request was not completed in time.
    RequestTimeout = 408,
    /// The request conflicts with the resource state.
    Conflict = 409,
    /// The handler failed.
    InternalServerError = 500,
    /// The handler does not support the request.
    NotImplemented = 501,
    /// The handler cannot serve requests right now.
    ServiceUnavailable = 503,
}

impl StatusCode {
    /// Every status code, in ascending numeric order.
    pub const ALL: [StatusCode; 13] = [
        StatusCode::Ok,
        StatusCode::Created,
        StatusCode::NoContent,
        StatusCode::BadRequest,
        StatusCode::Unauthorized,
        StatusCode::Forbidden,
        StatusCode::NotFound,
        StatusCode::MethodNotAllowed,
        StatusCode::RequestTimeout,
        StatusCode::Conflict,
        StatusCode::InternalServerError,
        StatusCode::NotImplemented,
        StatusCode::ServiceUnavailable,
    ];

    /// Numeric value sent on the wire.
    #[must_use]
    pub const fn code(self) -> u16 { self as u16 }

    /// Canonical reason phrase.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::NoContent => "No Content",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Unauthorized => "Unauthorized",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::RequestTimeout => "Request Timeout",
            StatusCode::Conflict => "Conflict",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
            StatusCode::ServiceUnavailable => "Service Unavailable",
        }
    }

    /// Returns true for 2xx codes.
    #[must_use]
    pub const fn is_success(self) -> bool { matches!(self.code(), 200..=299) }
}

impl TryFrom<u16> for StatusCode {
    type Error = ProtocolError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        StatusCode::ALL
            .into_iter()
            .find(|status| status.code() == code)
            .ok_or(ProtocolError::UnknownStatus { code })
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}
