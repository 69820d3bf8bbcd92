//! Construction-time configuration for an [`crate::orderbook::book::OrderBook`].

use serde::{Deserialize, Serialize};

/// Self-trade prevention policy applied when a resting order's
/// `owner_tag` matches the incoming order's `owner_tag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelfTradePolicy {
    /// Cancel the resting maker and continue matching the taker against
    /// the rest of the book.
    CancelOldest,
    /// Cancel the remainder of the incoming taker; no further matching
    /// occurs for this event.
    CancelNewest,
    /// Terminate the remainder of the incoming taker with
    /// `SelfTradePrevented`; trades already committed earlier in the
    /// same match stand.
    RejectTaker,
}

/// Almgren-Chriss coefficients for slippage/impact accounting.
/// Basis-point fields follow the fixed-point convention of the rest of
/// this crate's numeric configuration: an integer count of basis points
/// over a `10_000` denominator, not a floating-point fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactConfig {
    /// Temporary impact coefficient, in basis points per unit participation.
    pub eta_bps: i64,
    /// Permanent impact coefficient, in basis points per unit participation.
    pub gamma_bps: i64,
    /// Average daily volume, in shares per session.
    pub adv: u64,
    /// Half-life of temporary impact decay, in ticks of logical time.
    pub decay_half_life: i64,
}

/// Configuration object supplied at book construction. Unrecognized keys
/// are rejected at construction (`#[serde(deny_unknown_fields)]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookConfig {
    pub tick_size: i64,
    pub self_trade_policy: SelfTradePolicy,
    pub allow_market_orders: bool,
    pub impact: ImpactConfig,
    /// Ticks of logical time between an iceberg slice exhausting and its
    /// replenishment becoming eligible to match; 0 yields in-order
    /// refresh behavior.
    pub iceberg_refresh_delay: i64,
    /// Bound on chained `STOP_TRIGGER` re-entries caused by a single
    /// originating event, guarding against pathological feedback loops.
    pub max_cascade_depth: u32,
}

impl BookConfig {
    /// A configuration with no impact model and no cascade cap beyond a
    /// conservative default, suitable for unit tests exercising matching
    /// in isolation.
    pub fn for_tests(tick_size: i64) -> Self {
        Self {
            tick_size,
            self_trade_policy: SelfTradePolicy::CancelOldest,
            allow_market_orders: true,
            impact: ImpactConfig { eta_bps: 0, gamma_bps: 0, adv: 1, decay_half_life: 1 },
            iceberg_refresh_delay: 0,
            max_cascade_depth: 8,
        }
    }
}
