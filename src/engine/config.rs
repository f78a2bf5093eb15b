//! Engine configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::{
    cache::DEFAULT_RESPONSE_TTL,
    codec::PeerId,
    correlation::RetryPolicy,
    frame::{DEFAULT_MAX_FRAME_LENGTH, clamp_frame_length},
    router::{DEFAULT_LIVENESS_PATH, normalise_path},
};

/// Default path of the id-assignment request sent by `connect`.
pub const DEFAULT_ASSIGN_ID_PATH: &str = "/assign-id";

/// Default number of transport reads drained per tick.
pub const DEFAULT_MAX_READS_PER_TICK: usize = 64;

/// Settings for one [`Engine`](super::Engine).
///
/// Setters consume and return the config; each has a `*_value` getter.
/// The struct also deserialises from any `serde` format, with missing
/// fields taking their defaults.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use serp::{codec::PeerId, engine::EngineConfig};
///
/// let config = EngineConfig::default()
///     .local_id(PeerId::new(1))
///     .response_ttl(Duration::from_secs(10));
/// assert_eq!(config.local_id_value(), Some(PeerId::new(1)));
/// assert_eq!(config.liveness_path_value(), "/ping");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    local_id: Option<PeerId>,
    response_ttl: Duration,
    liveness_path: String,
    assign_id_path: String,
    handshake_policy: RetryPolicy,
    max_frame_length: usize,
    max_reads_per_tick: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            local_id: None,
            response_ttl: DEFAULT_RESPONSE_TTL,
            liveness_path: DEFAULT_LIVENESS_PATH.to_owned(),
            assign_id_path: DEFAULT_ASSIGN_ID_PATH.to_owned(),
            handshake_policy: RetryPolicy::new(Duration::from_secs(1)).with_retries(3),
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            max_reads_per_tick: DEFAULT_MAX_READS_PER_TICK,
        }
    }
}

impl EngineConfig {
    /// Use a fixed local id instead of running the handshake.
    ///
    /// An engine configured this way starts connected; this is how the peer
    /// that hands out ids is set up.
    #[must_use]
    pub fn local_id(mut self, id: PeerId) -> Self {
        self.local_id = Some(id).filter(|id| !id.is_unassigned());
        self
    }

    /// Set how long sent responses stay available for replay.
    #[must_use]
    pub fn response_ttl(mut self, ttl: Duration) -> Self {
        self.response_ttl = ttl;
        self
    }

    /// Set the path answered by the built-in liveness probe.
    #[must_use]
    pub fn liveness_path(mut self, path: &str) -> Self {
        self.liveness_path = normalise_path(path);
        self
    }

    /// Set the path of the id request sent by `connect`.
    #[must_use]
    pub fn assign_id_path(mut self, path: &str) -> Self {
        self.assign_id_path = normalise_path(path);
        self
    }

    /// Set the retry schedule of the id request.
    #[must_use]
    pub fn handshake_policy(mut self, policy: RetryPolicy) -> Self {
        self.handshake_policy = policy;
        self
    }

    /// Set the maximum frame length for encoding and decoding.
    ///
    /// The value is clamped between 64 bytes and 16 MiB.
    #[must_use]
    pub fn max_frame_length(mut self, max_frame_length: usize) -> Self {
        self.max_frame_length = clamp_frame_length(max_frame_length);
        self
    }

    /// Set how many transport reads one tick drains at most.
    ///
    /// Zero is treated as one.
    #[must_use]
    pub fn max_reads_per_tick(mut self, reads: usize) -> Self {
        self.max_reads_per_tick = reads.max(1);
        self
    }

    /// Return the fixed local id, if any.
    #[must_use]
    pub fn local_id_value(&self) -> Option<PeerId> {
        self.local_id.filter(|id| !id.is_unassigned())
    }

    /// Return the response replay lifetime.
    #[must_use]
    pub const fn response_ttl_value(&self) -> Duration { self.response_ttl }

    /// Return the liveness probe path.
    #[must_use]
    pub fn liveness_path_value(&self) -> &str { &self.liveness_path }

    /// Return the id request path.
    #[must_use]
    pub fn assign_id_path_value(&self) -> &str { &self.assign_id_path }

    /// Return the id request retry schedule.
    #[must_use]
    pub const fn handshake_policy_value(&self) -> RetryPolicy { self.handshake_policy }

    /// Return the configured maximum frame length, clamped.
    #[must_use]
    pub fn max_frame_length_value(&self) -> usize { clamp_frame_length(self.max_frame_length) }

    /// Return the per-tick read limit.
    #[must_use]
    pub fn max_reads_per_tick_value(&self) -> usize { self.max_reads_per_tick.max(1) }
}
