//! In-process transport pair.

use std::io;

use bytes::Bytes;
use tokio::sync::mpsc::{
    self,
    UnboundedReceiver,
    UnboundedSender,
    error::TryRecvError,
};

use super::{Transport, not_connected};

/// One end of an in-memory byte pipe.
///
/// Each [`send`](Transport::send) arrives at the other end as one chunk, so
/// tests control exactly how the stream is split. No async runtime is
/// needed.
///
/// # Examples
///
/// ```
/// use serp::transport::{MemoryTransport, Transport};
///
/// let (mut a, mut b) = MemoryTransport::pair();
/// a.send(b"hello").expect("send");
/// assert_eq!(&b.receive().expect("receive")[..], b"hello");
/// assert!(b.receive().expect("receive").is_empty());
/// ```
#[derive(Debug)]
pub struct MemoryTransport {
    tx: UnboundedSender<Bytes>,
    rx: UnboundedReceiver<Bytes>,
    open: bool,
}

impl MemoryTransport {
    /// Two connected endpoints, both open.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();
        (
            Self {
                tx: a_tx,
                rx: a_rx,
                open: true,
            },
            Self {
                tx: b_tx,
                rx: b_rx,
                open: true,
            },
        )
    }
}

impl Transport for MemoryTransport {
    fn open(&mut self) -> io::Result<()> {
        if self.tx.is_closed() {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "peer endpoint dropped",
            ));
        }
        self.open = true;
        Ok(())
    }

    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        if !self.open {
            return Err(not_connected());
        }
        self.tx
            .send(Bytes::copy_from_slice(bytes))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "peer endpoint dropped"))
    }

    fn receive(&mut self) -> io::Result<Bytes> {
        if !self.open {
            return Err(not_connected());
        }
        match self.rx.try_recv() {
            Ok(chunk) => Ok(chunk),
            Err(TryRecvError::Empty) => Ok(Bytes::new()),
            Err(TryRecvError::Disconnected) => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "peer endpoint dropped",
            )),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        self.open = false;
        while self.rx.try_recv().is_ok() {}
        Ok(())
    }

    fn is_open(&self) -> bool { self.open }
}
