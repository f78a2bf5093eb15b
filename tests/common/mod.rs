//! Shared utilities for integration tests.

// Items in this shared module may not be used by all test binaries that import it.
#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use std::{
    net::{Ipv4Addr, SocketAddr, TcpListener},
    time::Duration,
};

use serp::{
    Engine,
    MemoryTransport,
    MessageId,
    Method,
    PeerId,
    Request,
    codec::Header,
};

/// Peer id of the engine under test.
pub const LOCAL: PeerId = PeerId::new(5);
/// Peer id of the scripted remote peer.
pub const REMOTE: PeerId = PeerId::new(9);
/// Half-second tick used by the retry scenarios.
pub const HALF_SECOND: Duration = Duration::from_millis(500);

/// Create a TCP listener bound to a free local port.
#[expect(
    clippy::expect_used,
    reason = "binding to an ephemeral localhost port must abort the test immediately"
)]
pub fn unused_listener() -> TcpListener {
    let addr = SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0);
    TcpListener::bind(addr).expect("failed to bind port")
}

/// A request as the remote peer would send it to the engine under test.
pub fn inbound(method: Method, target: &str, id: u32) -> Request {
    let mut request = Request::new(method, target);
    request.header = Header {
        message_id: MessageId::new(id),
        source: REMOTE,
        destination: LOCAL,
    };
    request
}

/// Tick `engine` `times` times by `dt`.
pub fn tick_n(engine: &mut Engine<MemoryTransport>, times: usize, dt: Duration) {
    for _ in 0..times {
        engine.tick(dt);
    }
}
