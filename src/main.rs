//! `serp` binary: an id-assigning hub and a liveness probe over TCP.
//!
//! Both commands drive their engines from a fixed-interval tick loop on a
//! single-threaded runtime.

mod cli;

use std::{
    error::Error,
    io,
    net::TcpListener,
    time::Duration,
};

use clap::Parser;
use cli::{Cli, Command, PingArgs, ServeArgs};
use serp::{
    ConnectStatus,
    Engine,
    EngineConfig,
    Method,
    PeerId,
    Request,
    Response,
    ResponseState,
    RetryPolicy,
    StatusCode,
    TcpTransport,
};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let tick = Duration::from_millis(cli.tick_ms.max(1));
    match cli.command {
        Command::Serve(args) => serve(args, tick).await?,
        Command::Ping(args) => ping(args, tick).await?,
    }
    Ok(())
}

/// Hub state: one engine per accepted connection.
struct Hub {
    config: EngineConfig,
    peers: Vec<Engine<TcpTransport>>,
    next_id: u16,
}

impl Hub {
    fn accept(&mut self, listener: &TcpListener) -> io::Result<()> {
        loop {
            let (stream, addr) = match listener.accept() {
                Ok(accepted) => accepted,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) => return Err(e),
            };
            let transport = match TcpTransport::from_stream(stream) {
                Ok(transport) => transport,
                Err(e) => {
                    warn!("failed to configure connection: addr={addr}, error={e}");
                    continue;
                }
            };
            let mut engine = Engine::new(transport, self.config.clone());
            engine.register_path(self.config.assign_id_path_value());
            debug!("connection accepted: addr={addr}");
            self.peers.push(engine);
        }
    }

    fn allocate(&mut self) -> PeerId {
        let local = self.config.local_id_value().unwrap_or_default();
        loop {
            let id = PeerId::new(self.next_id);
            self.next_id = self.next_id.checked_add(1).unwrap_or(1);
            if !id.is_unassigned() && id != local {
                return id;
            }
        }
    }

    fn tick(&mut self, dt: Duration) {
        let path = self.config.assign_id_path_value().to_owned();
        let mut peers = std::mem::take(&mut self.peers);
        peers.retain_mut(|engine| {
            let report = engine.tick(dt);
            while let Some(request) = engine.pop_incoming(&path) {
                let id = self.allocate();
                let response = Response::reply_to(&request, StatusCode::Ok).with_body(id.to_string());
                match engine.send_response(response) {
                    Ok(()) => info!("peer id assigned: id={id}, addr={:?}", engine.transport().peer_addr()),
                    Err(e) => warn!("failed to assign peer id: error={e}"),
                }
            }
            match report.transport_error {
                Some(e) => {
                    debug!("connection closed: addr={:?}, error={e}", engine.transport().peer_addr());
                    false
                }
                None => true,
            }
        });
        self.peers = peers;
    }
}

async fn serve(args: ServeArgs, tick: Duration) -> io::Result<()> {
    let listener = TcpListener::bind(args.listen)?;
    listener.set_nonblocking(true)?;
    info!("listening: addr={}", listener.local_addr()?);

    let mut hub = Hub {
        config: EngineConfig::default().local_id(PeerId::new(args.local_id)),
        peers: Vec::new(),
        next_id: args.first_id,
    };
    let mut interval = time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();
    loop {
        let now = interval.tick().await;
        hub.accept(&listener)?;
        hub.tick(now.saturating_duration_since(last));
        last = now;
    }
}

async fn ping(args: PingArgs, tick: Duration) -> Result<(), Box<dyn Error>> {
    let policy = RetryPolicy::new(Duration::from_millis(args.timeout_ms)).with_retries(args.retries);
    let mut engine = Engine::new(
        TcpTransport::connect_to(args.connect),
        EngineConfig::default().handshake_policy(policy),
    );
    let mut interval = time::interval(tick);
    let mut last = Instant::now();
    let started = last;

    let local_id = loop {
        if let ConnectStatus::Connected(id) = engine.connect()? {
            break id;
        }
        let now = interval.tick().await;
        if let Some(e) = engine.tick(now.saturating_duration_since(last)).transport_error {
            return Err(e.into());
        }
        last = now;
    };
    info!("connected: local_id={local_id}, addr={}", args.connect);

    let path = engine.config().liveness_path_value().to_owned();
    let pending = engine.send_request(
        Request::new(Method::Get, path).to(PeerId::new(args.hub_id)),
        policy,
    )?;
    loop {
        match pending.state() {
            ResponseState::Pending => {}
            ResponseState::Obtained => {
                let status = pending.response().map_or(StatusCode::InternalServerError, |r| r.status);
                println!(
                    "{status} from {} as peer {local_id} in {:?}",
                    args.connect,
                    last.saturating_duration_since(started)
                );
                engine.close()?;
                return Ok(());
            }
            ResponseState::TimedOut => {
                engine.close()?;
                return Err(Box::new(io::Error::new(io::ErrorKind::TimedOut, "ping timed out")));
            }
        }
        let now = interval.tick().await;
        if let Some(e) = engine.tick(now.saturating_duration_since(last)).transport_error {
            return Err(e.into());
        }
        last = now;
    }
}
