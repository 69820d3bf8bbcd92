//! Error taxonomy for order book and matching operations.

use crate::order::OrderId;
use thiserror::Error;

/// Errors surfaced from book/matching operations. Every variant is
/// reported as an execution-report `reason`, never silently dropped;
/// validation errors are local and terminal to the offending event and
/// never mutate book state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderBookError {
    #[error("order {0} is already live")]
    DuplicateOrderId(OrderId),

    #[error("order {0} is not resting")]
    UnknownOrderId(OrderId),

    #[error("quantity must be positive, got {0}")]
    NonPositiveQuantity(u64),

    #[error("price must be non-negative, got {0}")]
    NegativePrice(i64),

    #[error("price {price} is not a multiple of tick_size {tick_size}")]
    PriceNotTickAligned { price: i64, tick_size: i64 },

    #[error("event ts {ts} precedes current logical time {current_ts}")]
    TimestampRegression { ts: i64, current_ts: i64 },

    #[error("POST_ONLY order {0} would have crossed the book")]
    PostOnlyWouldCross(OrderId),

    #[error("FOK order {0} could not be fully matched")]
    FOKInsufficientLiquidity(OrderId),

    #[error("market orders are disabled for this book")]
    MarketOrdersDisabled,

    #[error("order {0} terminated by self-trade prevention")]
    SelfTradePrevented(OrderId),

    #[error("stop-trigger cascade exceeded max depth {max_depth} originating from order {origin}")]
    CascadeDepthExceeded { origin: OrderId, max_depth: u32 },
}
