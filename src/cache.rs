//! Short-lived cache of responses this peer has sent.
//!
//! A requester that misses a response resends the request with the same
//! message id. Answering from [`ResponseCache`] replays the exact bytes sent
//! the first time instead of running the application handler again.

use std::{collections::HashMap, time::Duration};

use bytes::Bytes;
use tracing::debug;

use crate::codec::{MessageId, PeerId, Response};

/// Default time a sent response stays available for replay.
pub const DEFAULT_RESPONSE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug)]
struct CachedResponse {
    response: Response,
    wire: Bytes,
    ttl: Duration,
}

/// Responses keyed by `(message id, destination)`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use bytes::Bytes;
/// use serp::{
///     cache::ResponseCache,
///     codec::{MessageId, PeerId, Response, StatusCode},
/// };
///
/// let mut cache = ResponseCache::new(Duration::from_secs(2));
/// let mut response = Response::new(StatusCode::Ok);
/// response.header.message_id = MessageId::new(4);
/// response.header.destination = PeerId::new(9);
///
/// assert!(cache.record(response, Bytes::from_static(b"wire")));
/// assert!(cache.lookup(MessageId::new(4), PeerId::new(9)).is_some());
///
/// cache.advance(Duration::from_secs(2));
/// assert!(cache.is_empty());
/// ```
#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: HashMap<(MessageId, PeerId), CachedResponse>,
}

impl Default for ResponseCache {
    fn default() -> Self { Self::new(DEFAULT_RESPONSE_TTL) }
}

impl ResponseCache {
    /// Create a cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Lifetime given to new entries.
    #[must_use]
    pub fn ttl(&self) -> Duration { self.ttl }

    /// Remember `response` and its encoded form `wire`.
    ///
    /// The first response recorded for a key wins: returns `false`, and
    /// leaves the existing entry and its remaining lifetime untouched, if the
    /// key is already cached.
    pub fn record(&mut self, response: Response, wire: Bytes) -> bool {
        let key = (response.header.message_id, response.header.destination);
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(
            key,
            CachedResponse {
                response,
                wire,
                ttl: self.ttl,
            },
        );
        true
    }

    /// Cached response to the request `message_id` from `destination`.
    #[must_use]
    pub fn lookup(&self, message_id: MessageId, destination: PeerId) -> Option<&Response> {
        self.entries
            .get(&(message_id, destination))
            .map(|entry| &entry.response)
    }

    /// Encoded bytes of the cached response, ready to retransmit.
    #[must_use]
    pub fn lookup_wire(&self, message_id: MessageId, destination: PeerId) -> Option<Bytes> {
        self.entries
            .get(&(message_id, destination))
            .map(|entry| entry.wire.clone())
    }

    /// Age every entry by `dt`, evicting those whose lifetime is used up.
    ///
    /// Returns the number of evicted entries.
    pub fn advance(&mut self, dt: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(id, destination), entry| {
            if dt >= entry.ttl {
                debug!("cached response expired: message_id={id}, destination={destination}");
                return false;
            }
            entry.ttl -= dt;
            true
        });
        before - self.entries.len()
    }

    /// Number of cached responses.
    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}
