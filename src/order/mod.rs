//! Order identity, side, kind, time-in-force, and lifecycle state.

mod status;
mod types;

pub use status::OrderStatus;
pub use types::{Order, OrderId, OrderKind, OwnerTag, Side, TimeInForce};
