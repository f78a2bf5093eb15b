//! Byte transports driven by the engine.
//!
//! The engine never blocks: [`Transport::receive`] returns whatever bytes
//! are available right now, possibly none, and [`Transport::send`] must not
//! wait for the peer. Chunk boundaries carry no meaning; the framer
//! reassembles messages from whatever sizes arrive.

use std::io;

use bytes::Bytes;

mod memory;
mod tcp;

pub use memory::MemoryTransport;
pub use tcp::TcpTransport;

/// Reliable, ordered, non-blocking byte stream to one peer.
pub trait Transport {
    /// Establish the connection. Calling this on an open transport is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    fn open(&mut self) -> io::Result<()>;

    /// Queue `bytes` for delivery.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport is closed or the peer has gone.
    fn send(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Take the bytes that have arrived since the last call.
    ///
    /// An empty buffer means nothing is available yet.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::UnexpectedEof`] once the peer has closed
    /// the stream, or any other error reported by the underlying I/O.
    fn receive(&mut self) -> io::Result<Bytes>;

    /// Tear down the connection and discard anything unsent.
    ///
    /// # Errors
    ///
    /// Returns an error if shutting down the underlying I/O fails.
    fn close(&mut self) -> io::Result<()>;

    /// Returns true while the transport can send and receive.
    fn is_open(&self) -> bool;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&mut self) -> io::Result<()> { (**self).open() }

    fn send(&mut self, bytes: &[u8]) -> io::Result<()> { (**self).send(bytes) }

    fn receive(&mut self) -> io::Result<Bytes> { (**self).receive() }

    fn close(&mut self) -> io::Result<()> { (**self).close() }

    fn is_open(&self) -> bool { (**self).is_open() }
}

pub(crate) fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "transport is not open")
}
