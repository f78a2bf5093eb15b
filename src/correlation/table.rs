//! Bookkeeping for requests awaiting a response.

use std::{collections::HashMap, time::Duration};

use bytes::Bytes;
use tracing::{debug, warn};

use super::{
    CorrelationError,
    RetryPolicy,
    pending::{Completer, PendingResponse},
};
use crate::codec::{MessageId, Request, Response};

#[derive(Debug)]
struct Outstanding {
    request: Request,
    wire: Bytes,
    retries_remaining: u32,
    interval: Duration,
    remaining: Duration,
    completer: Completer,
}

/// Result of matching an inbound response against the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fulfillment {
    /// The waiting handle received the response.
    Fulfilled,
    /// The entry matched but its handle had been dropped.
    Detached,
    /// No outstanding request has this id.
    Unmatched,
}

/// Work produced by one [`OutstandingRequests::advance`] call.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Advance {
    /// Original encoded requests to put back on the wire, by id.
    pub resend: Vec<(MessageId, Bytes)>,
    /// Requests whose retries were exhausted; their entries are gone.
    pub timed_out: Vec<MessageId>,
}

/// Requests sent by this peer that have not been answered yet.
///
/// Keyed by message id, with at most one entry per id. Each entry owns a
/// copy of the request and its encoded bytes so resends are bit-identical to
/// the first transmission.
#[derive(Debug, Default)]
pub struct OutstandingRequests {
    entries: HashMap<MessageId, Outstanding>,
}

impl OutstandingRequests {
    /// Track `request`, whose encoded form is `wire`, under its message id.
    ///
    /// The first resend is due one `policy.timeout` from now.
    ///
    /// # Errors
    ///
    /// Returns [`CorrelationError::UnassignedId`] for message id zero and
    /// [`CorrelationError::DuplicateMessageId`] if the id is already
    /// outstanding.
    pub fn register(
        &mut self,
        request: Request,
        wire: Bytes,
        policy: RetryPolicy,
    ) -> Result<PendingResponse, CorrelationError> {
        let id = request.header.message_id;
        if !id.is_assigned() {
            return Err(CorrelationError::UnassignedId);
        }
        if self.entries.contains_key(&id) {
            return Err(CorrelationError::DuplicateMessageId(id));
        }

        let (pending, completer) = PendingResponse::new(id);
        self.entries.insert(
            id,
            Outstanding {
                request,
                wire,
                retries_remaining: policy.retries,
                interval: policy.timeout,
                remaining: policy.timeout,
                completer,
            },
        );
        Ok(pending)
    }

    /// Resolve the request answered by `response` and forget it.
    ///
    /// A response with no outstanding request, for example one that already
    /// timed out or was answered, is reported as
    /// [`Fulfillment::Unmatched`] and logged.
    pub fn fulfill(&mut self, response: Response) -> Fulfillment {
        let id = response.header.message_id;
        let Some(entry) = self.entries.remove(&id) else {
            warn!(
                "unmatched response discarded: message_id={id}, source={}, status={}",
                response.header.source, response.status
            );
            return Fulfillment::Unmatched;
        };
        if entry.completer.fulfill(response) {
            debug!("request fulfilled: message_id={id}, target={}", entry.request.target);
            Fulfillment::Fulfilled
        } else {
            debug!("response arrived after handle was dropped: message_id={id}");
            Fulfillment::Detached
        }
    }

    /// Age every entry by `dt`.
    ///
    /// An entry expires once `dt` reaches its remaining time. With retries
    /// left it is queued for resend and its countdown restarts at the full
    /// interval; otherwise its handle times out and the entry is removed.
    /// Results are ordered by message id.
    pub fn advance(&mut self, dt: Duration) -> Advance {
        let mut advance = Advance::default();
        for (id, entry) in &mut self.entries {
            if dt < entry.remaining {
                entry.remaining -= dt;
                continue;
            }
            if entry.retries_remaining > 0 {
                entry.retries_remaining -= 1;
                entry.remaining = entry.interval;
                advance.resend.push((*id, entry.wire.clone()));
            } else {
                advance.timed_out.push(*id);
            }
        }

        advance.resend.sort_unstable_by_key(|(id, _)| *id);
        advance.timed_out.sort_unstable();
        for id in &advance.timed_out {
            let Some(entry) = self.entries.remove(id) else {
                continue;
            };
            if !entry.completer.time_out() {
                debug!("request timed out after handle was dropped: message_id={id}");
            }
            warn!(
                "request timed out: message_id={id}, target={}, destination={}",
                entry.request.target, entry.request.header.destination
            );
        }
        advance
    }

    /// Returns true if `id` is awaiting a response.
    #[must_use]
    pub fn contains(&self, id: MessageId) -> bool { self.entries.contains_key(&id) }

    /// Borrow the outstanding request with `id`.
    #[must_use]
    pub fn request(&self, id: MessageId) -> Option<&Request> {
        self.entries.get(&id).map(|entry| &entry.request)
    }

    /// Resends still available to the request with `id`.
    #[must_use]
    pub fn retries_remaining(&self, id: MessageId) -> Option<u32> {
        self.entries.get(&id).map(|entry| entry.retries_remaining)
    }

    /// Number of outstanding requests.
    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    /// Returns true if nothing is outstanding.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Number of entries whose handles have been dropped.
    #[must_use]
    pub fn detached(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.completer.is_detached())
            .count()
    }
}
