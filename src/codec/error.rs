//! Error types for the framing and codec layers.
//!
//! The taxonomy separates failures by where they are detected and how the
//! stream recovers from them:
//!
//! - [`FramingError`]: the header of the next frame could not be parsed, or it declares a frame
//!   larger than the configured bound. Frame boundaries are lost, so the framer discards every
//!   buffered byte and resynchronises on the next chunk.
//! - [`ProtocolError`]: the frame boundaries were intact but the body did not decode into a valid
//!   message. Only that frame is dropped.
//! - [`EofError`]: the stream ended with a partial frame still buffered.
//! - [`CodecError`]: top-level enum wrapping all categories plus I/O errors.
//!
//! None of these are fatal to a connection; callers log and continue.

use std::io;

use thiserror::Error;

/// Header-level failures detected while locating frame boundaries.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// The header declares a frame larger than the configured maximum.
    #[error("frame exceeds max length: {size} > {max}")]
    OversizedFrame {
        /// Total frame size (header plus body) declared by the header.
        size: usize,
        /// Maximum allowed frame size.
        max: usize,
    },

    /// The message kind byte is not a known discriminant.
    #[error("unknown message kind: {value:#04x}")]
    UnknownKind {
        /// Raw discriminant read from the header.
        value: u8,
    },

    /// A text header section grew past its limit without a terminator.
    #[error("header section exceeds {limit} bytes without a terminator")]
    HeaderTooLong {
        /// Maximum permitted header section size.
        limit: usize,
    },

    /// A text header section is not well formed.
    #[error("malformed header: {reason}")]
    MalformedHeader {
        /// Description of the offending line or field.
        reason: String,
    },

    /// A length field could not be interpreted.
    #[error("invalid content length: {value}")]
    InvalidLength {
        /// Raw value of the length field.
        value: String,
    },
}

/// Body-level failures detected after a complete frame was extracted.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The request method byte or token is not recognised.
    #[error("unknown request method: {method}")]
    UnknownMethod {
        /// Raw method value as received.
        method: String,
    },

    /// The response status code is not recognised.
    #[error("unknown status code: {code}")]
    UnknownStatus {
        /// Raw status code as received.
        code: u16,
    },

    /// The body ended before a required field was complete.
    #[error("truncated body: missing {field}")]
    TruncatedBody {
        /// Name of the field that could not be read.
        field: &'static str,
    },

    /// A request target is not valid UTF-8.
    #[error("request target is not valid UTF-8")]
    InvalidTarget,

    /// A request target does not fit in the 16-bit length field.
    #[error("request target too long: {len} bytes")]
    TargetTooLong {
        /// Encoded length of the rejected target.
        len: usize,
    },

    /// A text start line is neither a request line nor a status line.
    #[error("invalid start line: {line:?}")]
    InvalidStartLine {
        /// The rejected start line.
        line: String,
    },

    /// A text header cannot be represented on the wire.
    #[error("invalid header line: {name:?}")]
    InvalidHeaderLine {
        /// Name of the rejected header.
        name: String,
    },
}

/// End-of-stream with a partially received frame.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum EofError {
    /// The stream ended before a complete header arrived.
    #[error("premature EOF during header: {bytes_received} bytes buffered")]
    MidHeader {
        /// Header bytes received before EOF.
        bytes_received: usize,
    },

    /// The stream ended while a frame body was being received.
    #[error("premature EOF: {bytes_received} bytes of {expected} byte frame received")]
    MidFrame {
        /// Frame bytes received before EOF.
        bytes_received: usize,
        /// Total frame size declared by the header.
        expected: usize,
    },
}

/// Top-level codec error taxonomy.
///
/// # Examples
///
/// ```
/// use serp::codec::{CodecError, FramingError};
///
/// let err = CodecError::Framing(FramingError::UnknownKind { value: 9 });
/// assert_eq!(err.error_type(), "framing");
/// assert!(err.discards_buffer());
/// ```
#[derive(Debug, Error)]
pub enum CodecError {
    /// Header-level framing failure.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// Body-level decoding failure.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Transport layer I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// End-of-stream with a partial frame.
    #[error("EOF: {0}")]
    Eof(#[from] EofError),
}

impl CodecError {
    /// Returns true if recovering from this error throws away buffered bytes
    /// beyond the offending frame.
    #[must_use]
    pub fn discards_buffer(&self) -> bool { matches!(self, Self::Framing(_) | Self::Eof(_)) }

    /// Returns the error category as a string for logging and metrics.
    ///
    /// One of: `"framing"`, `"protocol"`, `"io"`, or `"eof"`.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Framing(_) => "framing",
            Self::Protocol(_) => "protocol",
            Self::Io(_) => "io",
            Self::Eof(_) => "eof",
        }
    }
}

impl From<CodecError> for io::Error {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(e) => e,
            CodecError::Framing(e) => io::Error::new(io::ErrorKind::InvalidData, e),
            CodecError::Protocol(e) => io::Error::new(io::ErrorKind::InvalidData, e),
            CodecError::Eof(e) => io::Error::new(io::ErrorKind::UnexpectedEof, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::framing(
        CodecError::Framing(FramingError::OversizedFrame { size: 70, max: 64 }),
        "framing",
        io::ErrorKind::InvalidData
    )]
    #[case::protocol(
        CodecError::Protocol(ProtocolError::UnknownStatus { code: 299 }),
        "protocol",
        io::ErrorKind::InvalidData
    )]
    #[case::eof(
        CodecError::Eof(EofError::MidHeader { bytes_received: 3 }),
        "eof",
        io::ErrorKind::UnexpectedEof
    )]
    fn codec_errors_map_to_io_kinds(
        #[case] err: CodecError,
        #[case] category: &str,
        #[case] kind: io::ErrorKind,
    ) {
        assert_eq!(err.error_type(), category);
        let io_err: io::Error = err.into();
        assert_eq!(io_err.kind(), kind);
    }

    #[test]
    fn protocol_errors_keep_the_rest_of_the_buffer() {
        let err = CodecError::from(ProtocolError::InvalidTarget);
        assert!(!err.discards_buffer());
    }

    #[test]
    fn io_errors_pass_through_unchanged() {
        let err = CodecError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        let io_err: io::Error = err.into();
        assert_eq!(io_err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(io_err.to_string(), "gone");
    }

    #[test]
    fn framing_error_display_names_sizes() {
        let err = FramingError::OversizedFrame { size: 2000, max: 1024 };
        assert_eq!(err.to_string(), "frame exceeds max length: 2000 > 1024");
    }
}
