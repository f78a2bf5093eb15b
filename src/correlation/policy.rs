//! Per-request retry configuration.

use std::time::Duration;

use serde::Deserialize;

/// Resend schedule for one outgoing request.
///
/// The request is sent once immediately and resent every `timeout` until a
/// response arrives or `retries` resends have been used up. The request
/// times out one further `timeout` after its last resend, so the total
/// waiting time is `(retries + 1) * timeout`.
///
/// # Default Values
/// - `timeout`: 1 second
/// - `retries`: 1
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use serp::correlation::RetryPolicy;
///
/// let policy = RetryPolicy::new(Duration::from_millis(250)).with_retries(3);
/// assert_eq!(policy.deadline(), Duration::from_secs(1));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Interval between sends.
    pub timeout: Duration,
    /// Number of resends after the initial send.
    pub retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self { Self::new(Duration::from_secs(1)) }
}

impl RetryPolicy {
    /// Policy with one resend.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            retries: 1,
        }
    }

    /// Replace the resend budget.
    #[must_use]
    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Total time from the first send until the request times out.
    #[must_use]
    pub fn deadline(&self) -> Duration { self.timeout.saturating_mul(self.retries.saturating_add(1)) }
}
