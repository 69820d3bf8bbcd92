//! High-level order submission: validation, then hand-off to the
//! matching engine.
//!
//! `STOP`/`STOP_LIMIT` orders are deliberately absent here: per §4.3 they
//! never rest directly in a price level, and are instead tracked by the
//! dispatcher's stop side table until triggered, at which point the
//! dispatcher re-submits them through this same API as a `Market` or
//! `Limit` order.

use crate::order::{Order, OrderId, OrderKind};
use crate::orderbook::book::OrderBook;
use crate::orderbook::error::OrderBookError;
use crate::orderbook::matching::{match_incoming, MatchOutcome};
use tracing::trace;

fn validate(book: &OrderBook, order: &Order, check_duplicate: bool) -> Result<(), OrderBookError> {
    debug_assert!(!order.kind.is_stop(), "stop orders are routed through the dispatcher, not the book");

    if order.original_quantity == 0 || order.remaining_quantity == 0 {
        return Err(OrderBookError::NonPositiveQuantity(order.original_quantity));
    }
    if order.remaining_quantity > order.original_quantity {
        return Err(OrderBookError::NonPositiveQuantity(order.remaining_quantity));
    }

    if !matches!(order.kind, OrderKind::Market) {
        let price = order
            .price
            .expect("non-market orders must carry a price; this is a producer-side invariant, not a runtime rejection");
        if price.value() < 0 {
            return Err(OrderBookError::NegativePrice(price.value()));
        }
        let tick_size = book.config.tick_size;
        if !price.is_aligned(tick_size) {
            return Err(OrderBookError::PriceNotTickAligned { price: price.value(), tick_size });
        }
    }

    if order.submit_ts < book.current_ts {
        return Err(OrderBookError::TimestampRegression { ts: order.submit_ts, current_ts: book.current_ts });
    }

    if check_duplicate && book.has_been_seen(order.id) {
        return Err(OrderBookError::DuplicateOrderId(order.id));
    }

    Ok(())
}

impl OrderBook {
    /// Validate and run `order` through the matching engine, advancing
    /// the book's logical clock to `order.submit_ts`. The order's id is
    /// checked against every id ever seen in this run (§3's run-wide
    /// uniqueness), not just currently-resting ones.
    ///
    /// `Stop`/`StopLimit` orders must not be passed here; see the module
    /// documentation.
    pub fn submit_order(&mut self, order: Order) -> Result<MatchOutcome, OrderBookError> {
        validate(self, &order, true)?;
        self.current_ts = order.submit_ts;
        self.mark_seen(order.id);
        trace!(order_id = order.id.0, kind = ?order.kind, "submitting order to matching engine");
        match_incoming(self, order)
    }

    /// As [`Self::submit_order`], but skips the duplicate-id check: used
    /// exclusively by the dispatcher to re-submit a triggered stop order
    /// under the id it was already registered (and marked seen) under.
    pub(crate) fn submit_triggered_order(&mut self, order: Order) -> Result<MatchOutcome, OrderBookError> {
        validate(self, &order, false)?;
        self.current_ts = order.submit_ts;
        trace!(order_id = order.id.0, kind = ?order.kind, "submitting triggered stop order to matching engine");
        match_incoming(self, order)
    }

    /// Cancel a resting order, advancing the book's logical clock to
    /// `ts`. A cancel against an already-filled or already-cancelled id
    /// is a no-op that surfaces `UnknownOrderId`, matching §5's
    /// "cancel for an already-filled id is a no-op that emits
    /// UnknownOrderId".
    pub fn cancel_order(&mut self, order_id: OrderId, ts: i64) -> Result<Order, OrderBookError> {
        if ts < self.current_ts {
            return Err(OrderBookError::TimestampRegression { ts, current_ts: self.current_ts });
        }
        self.current_ts = ts;
        self.cancel(order_id)
    }

    /// Modify a resting order, advancing the book's logical clock to `ts`.
    pub fn modify_order(
        &mut self,
        order_id: OrderId,
        new_qty: u64,
        new_price: Option<crate::tick::Tick>,
        ts: i64,
    ) -> Result<(), OrderBookError> {
        if ts < self.current_ts {
            return Err(OrderBookError::TimestampRegression { ts, current_ts: self.current_ts });
        }
        self.current_ts = ts;
        self.modify(order_id, new_qty, new_price, ts)
    }
}
