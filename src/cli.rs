//! Command line interface for the `serp` binary.
//!
//! `serve` runs an id-assigning hub on a TCP listener; `ping` connects to a
//! hub, obtains an id and probes its liveness path.

use std::net::SocketAddr;

use clap::{Args, Parser, Subcommand};

/// Command line arguments for the `serp` binary.
#[derive(Debug, Parser)]
#[command(name = "serp", version, about = "SERP request/response peer")]
pub struct Cli {
    /// Interval between engine ticks in milliseconds.
    #[arg(long, global = true, default_value_t = 50)]
    pub tick_ms: u64,

    /// Operation to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands of the `serp` binary.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Accept connections and hand out peer ids.
    Serve(ServeArgs),
    /// Connect to a hub, obtain an id and probe its liveness path.
    Ping(PingArgs),
}

/// Options for `serp serve`.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(short, long, default_value = "127.0.0.1:7878")]
    pub listen: SocketAddr,

    /// Peer id of the hub itself.
    #[arg(long, default_value_t = 1)]
    pub local_id: u16,

    /// First id handed to a connecting peer.
    #[arg(long, default_value_t = 2)]
    pub first_id: u16,
}

/// Options for `serp ping`.
#[derive(Debug, Args)]
pub struct PingArgs {
    /// Address of the hub.
    #[arg(short, long, default_value = "127.0.0.1:7878")]
    pub connect: SocketAddr,

    /// Peer id of the hub, used as the probe's destination.
    #[arg(long, default_value_t = 1)]
    pub hub_id: u16,

    /// Time to wait for each answer before resending, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub timeout_ms: u64,

    /// Number of resends before giving up.
    #[arg(long, default_value_t = 3)]
    pub retries: u32,
}
