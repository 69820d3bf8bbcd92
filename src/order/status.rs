//! Order lifecycle state machine.
//!
//! `PENDING -> ACCEPTED -> (PARTIAL*) -> FILLED | CANCELLED | REJECTED`.
//! Transitions to `Rejected` are terminal and emit no book state change.

use serde::{Deserialize, Serialize};

/// The current status of an order as observed through execution reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Accepted by the dispatcher but not yet evaluated against the book.
    Pending,
    /// Validated and live (resting or fully processed with no residual).
    Accepted,
    /// Partially filled; remaining quantity still resting.
    PartiallyFilled,
    /// Fully filled; no longer present in any index.
    Filled,
    /// Cancelled by explicit request or TIF residual handling.
    Cancelled,
    /// Rejected before any book mutation occurred.
    Rejected,
}

impl OrderStatus {
    /// True if the order may still receive fills or be cancelled.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Accepted | Self::PartiallyFilled)
    }

    /// True if the order has reached a terminal state.
    pub fn is_terminated(self) -> bool {
        matches!(self, Self::Filled | Self::Cancelled | Self::Rejected)
    }
}
