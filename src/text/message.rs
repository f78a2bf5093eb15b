//! Text request and response messages.

use bytes::Bytes;

use super::DEFAULT_VERSION;
use crate::codec::{Method, StatusCode};

/// Ordered `name: value` header lines.
pub type Headers = Vec<(String, String)>;

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// A text-protocol request.
///
/// # Examples
///
/// ```
/// use serp::{codec::Method, text::TextRequest};
///
/// let request = TextRequest::new(Method::Get, "/status").with_header("Accept", "text/plain");
/// assert_eq!(request.header("accept"), Some("text/plain"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextRequest {
    /// Protocol version token, e.g. `SERP/1.0`.
    pub version: String,
    /// Request verb.
    pub method: Method,
    /// Target path.
    pub path: String,
    /// Header lines, excluding `content-length`.
    pub headers: Headers,
    /// Message body.
    pub body: Bytes,
}

impl TextRequest {
    /// Create a request with the default version, no headers and no body.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            version: DEFAULT_VERSION.to_owned(),
            method,
            path: path.into(),
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// Append a header line.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Replace the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Value of the first header called `name`, ignoring ASCII case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> { find_header(&self.headers, name) }
}

/// A text-protocol response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextResponse {
    /// Protocol version token.
    pub version: String,
    /// Outcome of the request.
    pub status: StatusCode,
    /// Free-form reason phrase.
    pub reason: String,
    /// Header lines, excluding `content-length`.
    pub headers: Headers,
    /// Message body.
    pub body: Bytes,
}

impl TextResponse {
    /// Create a response with the default version and the status's
    /// canonical reason phrase.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            version: DEFAULT_VERSION.to_owned(),
            status,
            reason: status.reason().to_owned(),
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// Append a header line.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Replace the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Value of the first header called `name`, ignoring ASCII case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> { find_header(&self.headers, name) }
}

/// Either kind of text message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextMessage {
    /// A request line message.
    Request(TextRequest),
    /// A status line message.
    Response(TextResponse),
}

impl TextMessage {
    /// Borrow the header lines.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        match self {
            Self::Request(request) => &request.headers,
            Self::Response(response) => &response.headers,
        }
    }

    /// Borrow the body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        match self {
            Self::Request(request) => &request.body,
            Self::Response(response) => &response.body,
        }
    }
}

impl From<TextRequest> for TextMessage {
    fn from(request: TextRequest) -> Self { Self::Request(request) }
}

impl From<TextResponse> for TextMessage {
    fn from(response: TextResponse) -> Self { Self::Response(response) }
}
