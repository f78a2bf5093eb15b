//! Non-blocking TCP transport.

use std::{
    io::{self, Read, Write},
    net::{Shutdown, SocketAddr, TcpStream},
};

use bytes::{Buf, Bytes, BytesMut};
use tracing::debug;

use super::{Transport, not_connected};

const READ_CHUNK: usize = 8 * 1024;

/// TCP stream in non-blocking mode.
///
/// Writes the socket cannot take immediately are queued and flushed on the
/// next `send` or `receive`.
#[derive(Debug)]
pub struct TcpTransport {
    addr: Option<SocketAddr>,
    stream: Option<TcpStream>,
    unsent: BytesMut,
    read_buf: Box<[u8]>,
}

impl TcpTransport {
    /// Transport that connects to `addr` when opened.
    #[must_use]
    pub fn connect_to(addr: SocketAddr) -> Self {
        Self {
            addr: Some(addr),
            stream: None,
            unsent: BytesMut::new(),
            read_buf: vec![0; READ_CHUNK].into_boxed_slice(),
        }
    }

    /// Wrap an already connected stream, such as one returned by `accept`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot be switched to non-blocking
    /// mode.
    pub fn from_stream(stream: TcpStream) -> io::Result<Self> {
        configure(&stream)?;
        Ok(Self {
            addr: stream.peer_addr().ok(),
            stream: Some(stream),
            unsent: BytesMut::new(),
            read_buf: vec![0; READ_CHUNK].into_boxed_slice(),
        })
    }

    /// Address of the remote peer, if known.
    #[must_use]
    pub fn peer_addr(&self) -> Option<SocketAddr> { self.addr }

    /// Bytes accepted by `send` but not yet written to the socket.
    #[must_use]
    pub fn unsent_len(&self) -> usize { self.unsent.len() }

    fn flush_unsent(&mut self) -> io::Result<()> {
        let stream = self.stream.as_mut().ok_or_else(not_connected)?;
        while !self.unsent.is_empty() {
            match stream.write(&self.unsent) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(written) => self.unsent.advance(written),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

fn configure(stream: &TcpStream) -> io::Result<()> {
    stream.set_nonblocking(true)?;
    stream.set_nodelay(true)
}

impl Transport for TcpTransport {
    fn open(&mut self) -> io::Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }
        let addr = self.addr.ok_or_else(not_connected)?;
        let stream = TcpStream::connect(addr)?;
        configure(&stream)?;
        debug!("tcp transport connected: peer_addr={addr}");
        self.stream = Some(stream);
        Ok(())
    }

    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.stream.is_none() {
            return Err(not_connected());
        }
        self.unsent.extend_from_slice(bytes);
        self.flush_unsent()
    }

    fn receive(&mut self) -> io::Result<Bytes> {
        self.flush_unsent()?;
        let stream = self.stream.as_mut().ok_or_else(not_connected)?;
        loop {
            match stream.read(&mut self.read_buf) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "peer closed the connection",
                    ));
                }
                Ok(read) => return Ok(Bytes::copy_from_slice(&self.read_buf[..read])),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(Bytes::new()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }

    fn close(&mut self) -> io::Result<()> {
        self.unsent.clear();
        let Some(stream) = self.stream.take() else {
            return Ok(());
        };
        match stream.shutdown(Shutdown::Both) {
            Err(e) if e.kind() != io::ErrorKind::NotConnected => Err(e),
            _ => Ok(()),
        }
    }

    fn is_open(&self) -> bool { self.stream.is_some() }
}
