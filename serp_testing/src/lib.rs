//! Utilities for exercising a [`serp::Engine`] in tests.
//!
//! [`ScriptedPeer`] speaks SERP by hand over one end of a
//! [`MemoryTransport`](serp::MemoryTransport) pair, so a test controls exactly
//! which bytes the engine sees and in which chunks. The [`chunks`] helpers
//! split encoded streams at chosen boundaries, [`logger`] captures log
//! records and [`counters`] captures metrics.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use serp::{Method, PeerId, Request};
//! use serp_testing::connected_pair;
//!
//! let (mut engine, mut peer) = connected_pair(PeerId::new(1));
//! peer.send(Request::new(Method::Get, "/ping").to(PeerId::new(1)));
//! engine.tick(Duration::ZERO);
//! assert_eq!(peer.responses().len(), 1);
//! ```

pub mod chunks;
pub mod logging;
pub mod peer;
pub mod recorder;

pub use chunks::{encode_all, split_at, split_every};
pub use logging::{LoggerHandle, logger};
pub use peer::{ScriptedPeer, connected_pair, engine_pair};
pub use recorder::{Counters, counters};
