//! Request/response correlation.
//!
//! Every request this peer sends is tracked in [`OutstandingRequests`] until
//! a response with the same message id arrives or its [`RetryPolicy`] runs
//! out. The caller observes the outcome through a [`PendingResponse`].
//!
//! The table and the handle share a slot: the handle owns it, the table
//! holds only a weak reference. Neither side ever points into the other, so
//! dropping a handle early or removing an entry cannot leave a dangling
//! link.

use thiserror::Error;

use crate::codec::MessageId;

mod pending;
mod policy;
mod table;

pub use pending::{PendingResponse, ResponseState};
pub use policy::RetryPolicy;
pub use table::{Advance, Fulfillment, OutstandingRequests};

/// Errors raised when registering an outstanding request.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum CorrelationError {
    /// Message id zero is reserved and cannot be correlated.
    #[error("message id 0 cannot be correlated")]
    UnassignedId,
    /// A request with this id is already awaiting a response.
    #[error("message id {0} is already outstanding")]
    DuplicateMessageId(MessageId),
}
