//! The trade tape and per-order execution reports.

use crate::order::{OrderId, OrderStatus, Side};
use crate::tick::{Tick, Timestamp};
use serde::{Deserialize, Serialize};

/// An immutable, append-only trade record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub sequence: u64,
    pub ts: Timestamp,
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,
    pub price_ticks: Tick,
    pub quantity: u64,
    pub aggressor_side: Side,
}

/// Emitted once per order state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub order_id: OrderId,
    pub new_state: OrderStatus,
    pub cumulative_filled: u64,
    pub average_fill_price_ticks: Option<Tick>,
    pub reason: Option<String>,
}

/// Invoked synchronously after each trade, in emission order. A listener
/// that submits new orders must enqueue them with `ts >= current_ts`
/// (enforced by the dispatcher, not by the listener itself).
pub type TradeListener = Box<dyn FnMut(&Trade)>;

/// Invoked synchronously after each execution report is produced.
pub type ExecutionListener = Box<dyn FnMut(&ExecutionReport)>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trade_is_plain_data() {
        let trade = Trade {
            sequence: 1,
            ts: 10,
            maker_order_id: OrderId(1),
            taker_order_id: OrderId(2),
            price_ticks: Tick(10_000),
            quantity: 60,
            aggressor_side: Side::Buy,
        };
        let json = serde_json::to_string(&trade).unwrap();
        let back: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, back);
    }
}
