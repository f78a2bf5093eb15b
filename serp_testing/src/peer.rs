//! A hand-driven SERP peer for engine tests.

use bytes::Bytes;
use serp::{
    Engine,
    EngineConfig,
    MemoryTransport,
    Message,
    PeerId,
    Request,
    Response,
    Transport,
    codec::{self, SerpFrame, SerpRule},
    frame::{DEFAULT_MAX_FRAME_LENGTH, Framer},
};

use crate::chunks::split_every;

/// The far end of a [`MemoryTransport`] pair, speaking SERP by hand.
///
/// Outgoing messages are encoded with [`codec::encode`] and may be split
/// into arbitrary chunks; incoming bytes are framed and decoded on demand.
/// Every method panics on transport or codec failure, which is what a test
/// wants.
#[derive(Debug)]
pub struct ScriptedPeer {
    transport: MemoryTransport,
    framer: Framer<SerpRule>,
}

impl ScriptedPeer {
    /// Wrap one end of a transport pair.
    #[must_use]
    pub fn new(transport: MemoryTransport) -> Self {
        Self {
            transport,
            framer: Framer::new(SerpRule, DEFAULT_MAX_FRAME_LENGTH),
        }
    }

    /// Encode `message` and send it as one chunk.
    ///
    /// # Panics
    ///
    /// Panics if the message cannot be encoded or sent.
    pub fn send(&mut self, message: impl Into<Message>) {
        let wire = codec::encode(&message.into()).expect("test message must encode");
        self.send_raw(&wire);
    }

    /// Encode `message` and send it in chunks of `size` bytes.
    ///
    /// # Panics
    ///
    /// Panics if the message cannot be encoded or sent, or if `size` is zero.
    pub fn send_chunked(&mut self, message: impl Into<Message>, size: usize) {
        let wire = codec::encode(&message.into()).expect("test message must encode");
        for chunk in split_every(&wire, size) {
            self.send_raw(&chunk);
        }
    }

    /// Send raw bytes as one chunk.
    ///
    /// # Panics
    ///
    /// Panics if the engine end has been dropped.
    pub fn send_raw(&mut self, bytes: &[u8]) {
        self.transport.send(bytes).expect("engine end must be alive");
    }

    /// Drain every chunk the engine has sent so far.
    ///
    /// # Panics
    ///
    /// Panics if the engine end has been dropped.
    pub fn received_bytes(&mut self) -> Vec<Bytes> {
        let mut chunks = Vec::new();
        loop {
            let chunk = self.transport.receive().expect("engine end must be alive");
            if chunk.is_empty() {
                return chunks;
            }
            chunks.push(chunk);
        }
    }

    /// Drain and frame everything the engine has sent so far.
    ///
    /// # Panics
    ///
    /// Panics if the engine sent bytes that do not frame cleanly.
    pub fn frames(&mut self) -> Vec<SerpFrame> {
        let mut frames = Vec::new();
        for chunk in self.received_bytes() {
            let fed = self.framer.feed(&chunk);
            if let Some(err) = fed.error {
                panic!("engine sent an unframeable stream: {err}");
            }
            frames.extend(fed.frames);
        }
        frames
    }

    /// Drain and decode everything the engine has sent so far.
    ///
    /// # Panics
    ///
    /// Panics if the engine sent anything undecodable.
    pub fn received(&mut self) -> Vec<Message> {
        self.frames()
            .iter()
            .map(|frame| codec::decode(frame).expect("engine sent an undecodable frame"))
            .collect()
    }

    /// Drain received messages, keeping the requests.
    pub fn requests(&mut self) -> Vec<Request> {
        self.received()
            .into_iter()
            .filter_map(|message| match message {
                Message::Request(request) => Some(request),
                Message::Response(_) => None,
            })
            .collect()
    }

    /// Drain received messages, keeping the responses.
    pub fn responses(&mut self) -> Vec<Response> {
        self.received()
            .into_iter()
            .filter_map(|message| match message {
                Message::Response(response) => Some(response),
                Message::Request(_) => None,
            })
            .collect()
    }

    /// Borrow the underlying transport.
    pub fn transport_mut(&mut self) -> &mut MemoryTransport { &mut self.transport }
}

/// An engine configured with `config` and the scripted peer at the far end.
#[must_use]
pub fn engine_pair(config: EngineConfig) -> (Engine<MemoryTransport>, ScriptedPeer) {
    let (near, far) = MemoryTransport::pair();
    (Engine::new(near, config), ScriptedPeer::new(far))
}

/// An engine that already has local id `id`, with its scripted peer.
#[must_use]
pub fn connected_pair(id: PeerId) -> (Engine<MemoryTransport>, ScriptedPeer) {
    engine_pair(EngineConfig::default().local_id(id))
}
