//! The SERP protocol engine.
//!
//! [`Engine`] ties the framer, codec, outstanding-request table, response
//! cache and router to one [`Transport`]. It has no background tasks: the
//! caller drives everything through [`Engine::tick`], which drains the
//! transport, dispatches decoded messages and ages every timer by the
//! elapsed time it is given.
//!
//! # Examples
//!
//! A hub with a fixed id hands an id to a client over an in-memory pipe:
//!
//! ```
//! use std::time::Duration;
//!
//! use serp::{
//!     codec::{PeerId, Response, StatusCode},
//!     engine::{ConnectStatus, Engine, EngineConfig},
//!     transport::MemoryTransport,
//! };
//!
//! let (hub_end, client_end) = MemoryTransport::pair();
//! let mut hub = Engine::new(hub_end, EngineConfig::default().local_id(PeerId::new(1)));
//! hub.register_path("/assign-id");
//! let mut client = Engine::new(client_end, EngineConfig::default());
//!
//! assert_eq!(client.connect().expect("handshake starts"), ConnectStatus::Pending);
//!
//! hub.tick(Duration::ZERO);
//! let request = hub.pop_incoming("/assign-id").expect("id request");
//! hub.send_response(Response::reply_to(&request, StatusCode::Ok).with_body("42"))
//!     .expect("reply sent");
//!
//! client.tick(Duration::ZERO);
//! assert_eq!(client.local_id(), PeerId::new(42));
//! ```

use std::{io, mem, time::Duration};

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::{
    cache::ResponseCache,
    codec::{
        self,
        CodecError,
        FramingError,
        Message,
        MessageId,
        Method,
        PeerId,
        Request,
        Response,
        SerpFrame,
        SerpRule,
        StatusCode,
    },
    correlation::{Fulfillment, OutstandingRequests, PendingResponse, ResponseState, RetryPolicy},
    error::{HandshakeError, Result},
    frame::Framer,
    metrics,
    router::{InboundRouter, RouteOutcome},
    transport::Transport,
};

mod config;

pub use config::{DEFAULT_ASSIGN_ID_PATH, DEFAULT_MAX_READS_PER_TICK, EngineConfig};

/// Progress of [`Engine::connect`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectStatus {
    /// The id request is in flight; keep calling `tick`.
    Pending,
    /// The engine has a local id.
    Connected(PeerId),
}

#[derive(Debug)]
enum Connection {
    Disconnected,
    Connecting(PendingResponse),
    Connected,
    Failed(HandshakeError),
}

/// Everything one [`Engine::tick`] call did.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Complete frames taken from the transport.
    pub frames: usize,
    /// Requests queued on a registered path.
    pub routed: usize,
    /// Requests dropped because an identical one was already queued.
    pub duplicates: usize,
    /// Requests answered by replaying a cached response.
    pub replayed: usize,
    /// Requests answered by the built-in fallback.
    pub fallbacks: usize,
    /// Responses matched to an outstanding request.
    pub fulfilled: usize,
    /// Outstanding requests put back on the wire.
    pub resent: usize,
    /// Framing and body errors. Framing errors cost the rest of the chunk.
    pub errors: Vec<CodecError>,
    /// Ids of responses that matched no outstanding request.
    pub unmatched: Vec<MessageId>,
    /// Ids of requests that exhausted their retries.
    pub timed_out: Vec<MessageId>,
    /// Transport failure that stopped draining, if any.
    pub transport_error: Option<io::Error>,
}

/// Request/response engine for one peer connection.
#[derive(Debug)]
pub struct Engine<T> {
    transport: T,
    config: EngineConfig,
    framer: Framer<SerpRule>,
    outstanding: OutstandingRequests,
    cache: ResponseCache,
    router: InboundRouter,
    local_id: PeerId,
    last_message_id: MessageId,
    connection: Connection,
}

impl<T: Transport> Engine<T> {
    /// Create an engine over `transport`.
    ///
    /// With a fixed local id in `config` the engine starts connected and
    /// assumes the transport is already open.
    #[must_use]
    pub fn new(transport: T, config: EngineConfig) -> Self {
        let (local_id, connection) = match config.local_id_value() {
            Some(id) => (id, Connection::Connected),
            None => (PeerId::UNASSIGNED, Connection::Disconnected),
        };
        Self {
            transport,
            framer: Framer::new(SerpRule, config.max_frame_length_value()),
            outstanding: OutstandingRequests::default(),
            cache: ResponseCache::new(config.response_ttl_value()),
            router: InboundRouter::new(config.liveness_path_value()),
            local_id,
            last_message_id: MessageId::default(),
            connection,
            config,
        }
    }

    /// Obtain a local id.
    ///
    /// The first call opens the transport and sends `GET` to the
    /// id-assignment path with source 0. While the answer is outstanding
    /// this returns [`ConnectStatus::Pending`] and the caller must keep
    /// calling [`tick`](Self::tick), which resolves the handshake. An engine
    /// with a fixed local id starts connected, so this returns
    /// [`ConnectStatus::Connected`] without touching the transport; after
    /// [`close`](Self::close) the next call reopens the transport and skips
    /// the id request.
    ///
    /// # Errors
    ///
    /// Returns the [`HandshakeError`] that ended the last attempt. The
    /// transport has already been closed and the engine is disconnected, so
    /// calling `connect` again starts over.
    pub fn connect(&mut self) -> Result<ConnectStatus, HandshakeError> {
        match mem::replace(&mut self.connection, Connection::Disconnected) {
            Connection::Connected => {
                self.connection = Connection::Connected;
                Ok(ConnectStatus::Connected(self.local_id))
            }
            Connection::Connecting(pending) => {
                self.connection = Connection::Connecting(pending);
                Ok(ConnectStatus::Pending)
            }
            Connection::Failed(err) => Err(err),
            Connection::Disconnected => self.begin_handshake(),
        }
    }

    fn begin_handshake(&mut self) -> Result<ConnectStatus, HandshakeError> {
        self.transport.open().map_err(HandshakeError::Transport)?;
        if let Some(id) = self.config.local_id_value() {
            self.local_id = id;
            self.connection = Connection::Connected;
            return Ok(ConnectStatus::Connected(id));
        }

        self.local_id = PeerId::UNASSIGNED;
        let request = Request::new(Method::Get, self.config.assign_id_path_value());
        match self.send_request(request, self.config.handshake_policy_value()) {
            Ok(pending) => {
                debug!(
                    "handshake started: message_id={}, path={}",
                    pending.message_id(),
                    self.config.assign_id_path_value()
                );
                self.connection = Connection::Connecting(pending);
                Ok(ConnectStatus::Pending)
            }
            Err(err) => {
                self.reset_transport();
                Err(HandshakeError::Request(err))
            }
        }
    }

    fn poll_handshake(&mut self) {
        let Connection::Connecting(pending) = &self.connection else {
            return;
        };
        let outcome = match pending.state() {
            ResponseState::Pending => return,
            ResponseState::TimedOut => Err(HandshakeError::TimedOut),
            ResponseState::Obtained => pending
                .take_response()
                .ok_or_else(|| HandshakeError::InvalidId(String::new()))
                .and_then(|response| assigned_id(&response)),
        };
        match outcome {
            Ok(id) => {
                info!("handshake complete: local_id={id}");
                self.local_id = id;
                self.connection = Connection::Connected;
            }
            Err(err) => {
                warn!("handshake failed: error={err}");
                self.reset_transport();
                self.connection = Connection::Failed(err);
            }
        }
    }

    fn reset_transport(&mut self) {
        self.framer.reset();
        if let Err(e) = self.transport.close() {
            debug!("transport close failed during reset: error={e}");
        }
    }

    /// Send `request` to its destination and track it for a response.
    ///
    /// The source is set to the local id and a fresh message id is assigned;
    /// both are visible on the returned handle and in the resends. The
    /// request is resent on `policy`'s schedule until answered.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`](crate::error::EngineError) if the request
    /// cannot be encoded or the transport rejects it. Nothing is tracked in
    /// that case.
    pub fn send_request(
        &mut self,
        mut request: Request,
        policy: RetryPolicy,
    ) -> Result<PendingResponse> {
        request.header.source = self.local_id;
        request.header.message_id = self.next_message_id();
        let wire = self.encode(Message::Request(request.clone()))?;
        self.transport.send(&wire)?;
        let pending = self.outstanding.register(request, wire, policy)?;
        metrics::inc_requests_sent();
        Ok(pending)
    }

    /// Send `response` and keep it for replay to resent requests.
    ///
    /// The source is set to the local id. Address the response with
    /// [`Response::reply_to`].
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`](crate::error::EngineError) if the response
    /// cannot be encoded or the transport rejects it. Unsent responses are
    /// not cached.
    pub fn send_response(&mut self, mut response: Response) -> Result<()> {
        response.header.source = self.local_id;
        let wire = self.encode(Message::Response(response.clone()))?;
        self.transport.send(&wire)?;
        self.cache.record(response, wire);
        Ok(())
    }

    fn encode(&self, message: Message) -> Result<Bytes> {
        let wire = codec::encode(&message)?;
        let max = self.framer.max_frame_length();
        if wire.len() > max {
            return Err(CodecError::from(FramingError::OversizedFrame {
                size: wire.len(),
                max,
            })
            .into());
        }
        Ok(wire)
    }

    fn next_message_id(&mut self) -> MessageId {
        let mut id = self.last_message_id.next();
        while self.outstanding.contains(id) {
            id = id.next();
        }
        self.last_message_id = id;
        id
    }

    /// Drain the transport, dispatch what arrived, then age every timer by
    /// `dt`.
    ///
    /// Requests are answered from the response cache when possible and
    /// routed otherwise; responses resolve their outstanding requests.
    /// Expired requests are resent or timed out, cached responses expire,
    /// and a pending handshake is resolved.
    pub fn tick(&mut self, dt: Duration) -> TickReport {
        let mut report = TickReport::default();
        if self.transport.is_open() {
            self.drain(&mut report);
        }

        let advance = self.outstanding.advance(dt);
        for (id, wire) in advance.resend {
            match self.transport.send(&wire) {
                Ok(()) => {
                    debug!("request resent: message_id={id}");
                    report.resent += 1;
                }
                Err(e) => warn!("request resend failed: message_id={id}, error={e}"),
            }
        }
        metrics::inc_resends(report.resent as u64);
        metrics::inc_timeouts(advance.timed_out.len() as u64);
        report.timed_out = advance.timed_out;

        self.cache.advance(dt);
        self.poll_handshake();
        report
    }

    fn drain(&mut self, report: &mut TickReport) {
        for _ in 0..self.config.max_reads_per_tick_value() {
            let chunk = match self.transport.receive() {
                Ok(chunk) if chunk.is_empty() => return,
                Ok(chunk) => chunk,
                Err(e) => {
                    warn!("transport receive failed: error={e}");
                    report.transport_error = Some(e);
                    return;
                }
            };
            let fed = self.framer.feed(&chunk);
            for frame in fed.frames {
                self.dispatch(&frame, report);
            }
            if let Some(err) = fed.error {
                warn!("framing error, discarding buffered bytes: error={err}");
                let err = CodecError::from(err);
                metrics::inc_framing_errors(err.error_type());
                report.errors.push(err);
            }
        }
    }

    fn dispatch(&mut self, frame: &SerpFrame, report: &mut TickReport) {
        report.frames += 1;
        match codec::decode(frame) {
            Ok(Message::Request(request)) => self.handle_request(request, report),
            Ok(Message::Response(response)) => self.handle_response(response, report),
            Err(err) => {
                warn!(
                    "undecodable frame dropped: message_id={}, error={err}",
                    frame.header().header.message_id
                );
                let err = CodecError::from(err);
                metrics::inc_framing_errors(err.error_type());
                report.errors.push(err);
            }
        }
    }

    fn handle_request(&mut self, request: Request, report: &mut TickReport) {
        let (id, source) = (request.header.message_id, request.header.source);
        if let Some(wire) = self.cache.lookup_wire(id, source) {
            debug!("replaying cached response: message_id={id}, source={source}");
            match self.transport.send(&wire) {
                Ok(()) => {
                    report.replayed += 1;
                    metrics::inc_cache_replays();
                }
                Err(e) => warn!("cached response replay failed: message_id={id}, error={e}"),
            }
            return;
        }

        match self.router.route(request) {
            RouteOutcome::Queued { .. } => report.routed += 1,
            RouteOutcome::Duplicate { .. } => report.duplicates += 1,
            RouteOutcome::Fallback(response) => {
                report.fallbacks += 1;
                if response.status == StatusCode::NotFound {
                    metrics::inc_routing_misses();
                }
                if let Err(e) = self.send_response(response) {
                    warn!("fallback response failed: message_id={id}, error={e}");
                }
            }
        }
    }

    fn handle_response(&mut self, response: Response, report: &mut TickReport) {
        let id = response.header.message_id;
        match self.outstanding.fulfill(response) {
            Fulfillment::Fulfilled | Fulfillment::Detached => report.fulfilled += 1,
            Fulfillment::Unmatched => {
                metrics::inc_unmatched_responses();
                report.unmatched.push(id);
            }
        }
    }

    /// Start queueing inbound requests for `path` and everything below it.
    ///
    /// Returns `false` if `path` was already registered.
    pub fn register_path(&mut self, path: &str) -> bool { self.router.register_path(path) }

    /// Stop queueing requests for `path`, returning any still queued.
    pub fn unregister_path(&mut self, path: &str) -> Option<Vec<Request>> {
        self.router.unregister_path(path)
    }

    /// Take the oldest request queued for `path`.
    pub fn pop_incoming(&mut self, path: &str) -> Option<Request> { self.router.pop(path) }

    /// Local peer id; [`PeerId::UNASSIGNED`] until the handshake succeeds.
    #[must_use]
    pub fn local_id(&self) -> PeerId { self.local_id }

    /// Returns true once the engine has a local id.
    #[must_use]
    pub fn is_connected(&self) -> bool { matches!(self.connection, Connection::Connected) }

    /// Close the transport and forget any partial frame.
    ///
    /// A handshake in flight fails with [`HandshakeError::Aborted`], which
    /// the next `connect` reports. Outstanding requests keep their timers.
    ///
    /// # Errors
    ///
    /// Returns any error from closing the transport.
    pub fn close(&mut self) -> io::Result<()> {
        self.connection = match mem::replace(&mut self.connection, Connection::Disconnected) {
            Connection::Connecting(_) => Connection::Failed(HandshakeError::Aborted),
            _ => Connection::Disconnected,
        };
        self.framer.reset();
        self.transport.close()
    }

    /// Number of requests awaiting a response.
    #[must_use]
    pub fn outstanding_len(&self) -> usize { self.outstanding.len() }

    /// Number of responses held for replay.
    #[must_use]
    pub fn cached_responses(&self) -> usize { self.cache.len() }

    /// Number of requests queued for `path`, or `None` if unregistered.
    #[must_use]
    pub fn queue_len(&self, path: &str) -> Option<usize> { self.router.queue_len(path) }

    /// Borrow the configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig { &self.config }

    /// Borrow the transport.
    #[must_use]
    pub fn transport(&self) -> &T { &self.transport }

    /// Mutably borrow the transport.
    pub fn transport_mut(&mut self) -> &mut T { &mut self.transport }
}

/// Interpret the answer to an id request.
fn assigned_id(response: &Response) -> Result<PeerId, HandshakeError> {
    if response.status != StatusCode::Ok {
        return Err(HandshakeError::Rejected(response.status));
    }
    let body = String::from_utf8_lossy(&response.body);
    body.trim()
        .parse::<u16>()
        .ok()
        .map(PeerId::new)
        .filter(|id| !id.is_unassigned())
        .ok_or_else(|| HandshakeError::InvalidId(body.to_string()))
}
