//! Engine-level error and result types.
//!
//! Framing and body errors live in [`codec::error`](crate::codec::error);
//! this module covers failures of engine operations and of the id
//! handshake.

use std::io;

use thiserror::Error;

use crate::{
    codec::{CodecError, StatusCode},
    correlation::CorrelationError,
};

/// Failure of an engine operation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The transport refused the bytes.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// The message could not be encoded within the frame bound.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The request could not be tracked for a response.
    #[error("correlation error: {0}")]
    Correlation(#[from] CorrelationError),
}

/// Failure of the id-assignment handshake run by
/// [`Engine::connect`](crate::engine::Engine::connect).
///
/// The transport has been closed by the time this is reported, so a later
/// `connect` starts clean.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The transport could not be opened.
    #[error("failed to open transport: {0}")]
    Transport(#[source] io::Error),

    /// The id request could not be sent.
    #[error("failed to send id request: {0}")]
    Request(#[source] EngineError),

    /// The peer answered with a non-success status.
    #[error("id request rejected: {0}")]
    Rejected(StatusCode),

    /// The peer answered OK but the body is not a usable peer id.
    #[error("invalid assigned id: {0:?}")]
    InvalidId(String),

    /// The id request exhausted its retries.
    #[error("id request timed out")]
    TimedOut,

    /// The engine was closed while the handshake was in flight.
    #[error("handshake aborted by close")]
    Aborted,
}

/// Result type for engine operations.
pub type Result<T, E = EngineError> = std::result::Result<T, E>;
