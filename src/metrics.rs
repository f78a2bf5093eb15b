//! Metric helpers for `serp`.
//!
//! This module defines metric names and simple helper functions
//! wrapping the [`metrics`](https://docs.rs/metrics) crate. Without the
//! `metrics` feature the helpers compile to nothing.

#[cfg(feature = "metrics")]
use metrics::counter;

/// Name of the counter tracking requests put on the wire for the first time.
pub const REQUESTS_SENT: &str = "serp_requests_sent_total";
/// Name of the counter tracking request resends.
pub const RESENDS: &str = "serp_request_resends_total";
/// Name of the counter tracking requests that exhausted their retries.
pub const TIMEOUTS: &str = "serp_request_timeouts_total";
/// Name of the counter tracking responses with no outstanding request.
pub const UNMATCHED_RESPONSES: &str = "serp_unmatched_responses_total";
/// Name of the counter tracking responses replayed from the cache.
pub const CACHE_REPLAYS: &str = "serp_cache_replays_total";
/// Name of the counter tracking frames or bodies that failed to decode.
pub const FRAMING_ERRORS: &str = "serp_framing_errors_total";
/// Name of the counter tracking requests answered by the fallback handler.
pub const ROUTING_MISSES: &str = "serp_routing_misses_total";

/// Record a request sent for the first time.
pub fn inc_requests_sent() {
    #[cfg(feature = "metrics")]
    counter!(REQUESTS_SENT).increment(1);
}

/// Record `count` request resends.
pub fn inc_resends(count: u64) {
    #[cfg(feature = "metrics")]
    counter!(RESENDS).increment(count);
    #[cfg(not(feature = "metrics"))]
    let _ = count;
}

/// Record `count` requests timing out.
pub fn inc_timeouts(count: u64) {
    #[cfg(feature = "metrics")]
    counter!(TIMEOUTS).increment(count);
    #[cfg(not(feature = "metrics"))]
    let _ = count;
}

/// Record a response that matched no outstanding request.
pub fn inc_unmatched_responses() {
    #[cfg(feature = "metrics")]
    counter!(UNMATCHED_RESPONSES).increment(1);
}

/// Record a response replayed from the cache.
pub fn inc_cache_replays() {
    #[cfg(feature = "metrics")]
    counter!(CACHE_REPLAYS).increment(1);
}

/// Record a decode failure, labelled `framing` or `protocol`.
pub fn inc_framing_errors(kind: &'static str) {
    #[cfg(feature = "metrics")]
    counter!(FRAMING_ERRORS, "kind" => kind).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = kind;
}

/// Record a request answered by the fallback handler.
pub fn inc_routing_misses() {
    #[cfg(feature = "metrics")]
    counter!(ROUTING_MISSES).increment(1);
}
