//! Caller-held handle to the outcome of one request.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::codec::{MessageId, Response};

/// Resolution state of a [`PendingResponse`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResponseState {
    /// No response yet and retries remain.
    Pending,
    /// A matching response arrived.
    Obtained,
    /// Every retry expired without a response.
    TimedOut,
}

#[derive(Debug)]
pub(crate) struct Slot {
    state: ResponseState,
    response: Option<Response>,
}

pub(crate) type SharedSlot = Arc<Mutex<Slot>>;

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Write side of a slot, held weakly by the outstanding-request table.
///
/// The table never keeps a caller's handle alive: once the
/// [`PendingResponse`] is dropped, upgrades fail and resolution is skipped.
#[derive(Debug)]
pub(crate) struct Completer(Weak<Mutex<Slot>>);

impl Completer {
    /// Store `response` and mark the slot obtained.
    ///
    /// Returns `false` if the handle has been dropped.
    pub(crate) fn fulfill(&self, response: Response) -> bool {
        self.resolve(ResponseState::Obtained, Some(response))
    }

    /// Mark the slot timed out.
    ///
    /// Returns `false` if the handle has been dropped.
    pub(crate) fn time_out(&self) -> bool { self.resolve(ResponseState::TimedOut, None) }

    pub(crate) fn is_detached(&self) -> bool { self.0.strong_count() == 0 }

    fn resolve(&self, state: ResponseState, response: Option<Response>) -> bool {
        let Some(slot) = self.0.upgrade() else {
            return false;
        };
        let mut slot = lock(&slot);
        slot.state = state;
        slot.response = response;
        true
    }
}

/// Single-consumer future for the response to one request.
///
/// The handle is polled, not awaited: check [`state`](Self::state) after
/// each engine tick. Dropping the handle detaches it from its table entry;
/// the request keeps its resend schedule regardless.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use bytes::Bytes;
/// use serp::{
///     codec::{MessageId, Method, Request, Response, StatusCode},
///     correlation::{OutstandingRequests, ResponseState, RetryPolicy},
/// };
///
/// let mut request = Request::new(Method::Get, "/ping");
/// request.header.message_id = MessageId::new(7);
///
/// let mut table = OutstandingRequests::default();
/// let pending = table
///     .register(request, Bytes::new(), RetryPolicy::new(Duration::from_secs(1)))
///     .expect("fresh id");
/// assert_eq!(pending.state(), ResponseState::Pending);
///
/// let mut response = Response::new(StatusCode::Ok);
/// response.header.message_id = MessageId::new(7);
/// table.fulfill(response);
/// assert_eq!(pending.state(), ResponseState::Obtained);
/// ```
#[derive(Debug)]
pub struct PendingResponse {
    message_id: MessageId,
    slot: SharedSlot,
}

impl PendingResponse {
    pub(crate) fn new(message_id: MessageId) -> (Self, Completer) {
        let slot = Arc::new(Mutex::new(Slot {
            state: ResponseState::Pending,
            response: None,
        }));
        let completer = Completer(Arc::downgrade(&slot));
        (Self { message_id, slot }, completer)
    }

    /// Identifier shared by the request, its resends and its response.
    #[must_use]
    pub fn message_id(&self) -> MessageId { self.message_id }

    /// Current resolution state.
    #[must_use]
    pub fn state(&self) -> ResponseState { lock(&self.slot).state }

    /// Returns true once the request has been answered or has timed out.
    #[must_use]
    pub fn is_resolved(&self) -> bool { self.state() != ResponseState::Pending }

    /// Copy of the response, if one was obtained and not yet taken.
    #[must_use]
    pub fn response(&self) -> Option<Response> { lock(&self.slot).response.clone() }

    /// Move the response out of the handle.
    ///
    /// The state stays [`ResponseState::Obtained`]; later calls return
    /// `None`.
    pub fn take_response(&self) -> Option<Response> { lock(&self.slot).response.take() }
}
