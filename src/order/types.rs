//! Order identity, side, kind, and time-in-force.

use crate::tick::{Tick, Timestamp};
use serde::{Deserialize, Serialize};

/// Externally supplied, globally unique order identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier used for self-trade prevention. Two orders with the
/// same owner tag can never trade against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerTag(pub u64);

/// Buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// +1 for Buy, -1 for Sell. Used by the impact accounting's signed
    /// cost formulas.
    pub fn sign(self) -> i64 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }
}

/// Residual handling qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Rests until the end of the simulated session.
    Day,
    /// Immediate-or-cancel: unmatched remainder is discarded.
    Ioc,
    /// Fill-or-kill: the entire order must match atomically or nothing does.
    Fok,
    /// Good-till-cancelled: rests indefinitely.
    Gtc,
    /// Rejected outright if it would cross the book on arrival.
    PostOnly,
}

impl TimeInForce {
    /// IOC and FOK never rest a residual quantity.
    pub fn never_rests(self) -> bool {
        matches!(self, Self::Ioc | Self::Fok)
    }
}

/// The kind of order, carrying any variant-specific data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    Limit,
    Market,
    /// Held in the dispatcher's stop side table until triggered, at which
    /// point it re-enters matching as a `Market` order.
    Stop { trigger_price: Tick },
    /// Held until triggered, then re-enters matching as a `Limit` order
    /// at `limit_price`.
    StopLimit { trigger_price: Tick, limit_price: Tick },
    /// Displays only `display_quantity` of the order's remaining
    /// quantity at a time; replenishes after each fill that exhausts
    /// the displayed slice.
    Iceberg { display_quantity: u64 },
}

impl OrderKind {
    pub fn is_stop(self) -> bool {
        matches!(self, Self::Stop { .. } | Self::StopLimit { .. })
    }

    pub fn display_quantity(self) -> Option<u64> {
        match self {
            Self::Iceberg { display_quantity } => Some(display_quantity),
            _ => None,
        }
    }
}

/// Immutable identity plus mutable residual quantity.
///
/// `remaining_quantity` is the only field the matching engine mutates in
/// place; every other field is fixed at submission time (a MODIFY that
/// changes price or increases quantity is implemented as cancel + fresh
/// submit, per §4.2, rather than as in-place mutation of those fields).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub kind: OrderKind,
    /// Unused for `Market`.
    pub price: Option<Tick>,
    pub original_quantity: u64,
    pub remaining_quantity: u64,
    pub time_in_force: TimeInForce,
    pub submit_ts: Timestamp,
    pub owner_tag: OwnerTag,
    /// Quantity currently visible to matching. Equal to
    /// `remaining_quantity` for every kind except `Iceberg`, where it is
    /// capped by `display_quantity` and replenished by refresh events.
    pub displayed_quantity: u64,
}

impl Order {
    /// True once `remaining_quantity` has reached zero.
    pub fn is_filled(&self) -> bool {
        self.remaining_quantity == 0
    }

    pub fn cumulative_filled(&self) -> u64 {
        self.original_quantity - self.remaining_quantity
    }
}
