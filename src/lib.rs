#![doc(html_root_url = "https://docs.rs/serp/latest")]
//! Public API for the `serp` library.
//!
//! SERP is a small request/response protocol carried over any streaming
//! byte transport. This crate provides the binary codec, an HTTP-like text
//! codec, the streaming framer both are built on, and an [`Engine`] that
//! adds message-id correlation, retries, duplicate suppression and response
//! replay on top of a [`Transport`].

pub mod byte_order;
pub mod cache;
pub mod codec;
pub mod correlation;
pub mod engine;
pub mod error;
pub mod frame;
pub mod metrics;
pub mod payload;
pub mod router;
pub mod text;
pub mod transport;

pub use codec::{
    CodecError,
    Message,
    MessageId,
    Method,
    PeerId,
    Request,
    Response,
    SerpCodec,
    StatusCode,
};
pub use correlation::{PendingResponse, ResponseState, RetryPolicy};
pub use engine::{ConnectStatus, Engine, EngineConfig, TickReport};
pub use error::{EngineError, HandshakeError, Result};
pub use transport::{MemoryTransport, TcpTransport, Transport};
