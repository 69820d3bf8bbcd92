//! The min-heap event dispatcher: total-orders events by `(ts, sequence)`,
//! drives them through the [`OrderBook`], and owns the stop-order side
//! table and the in-flight iceberg-refresh/stop-trigger bookkeeping that
//! the matching engine itself cannot see.

use crate::dispatcher::types::{Event, EventKind, HeapEntry};
use crate::impact::{FillObservation, SlippageAccounting};
use crate::order::{Order, OrderId, OrderKind, OrderStatus};
use crate::orderbook::book::OrderBook;
use crate::orderbook::error::OrderBookError;
use crate::orderbook::matching::{MatchOutcome, Residual};
use crate::orderbook::trade::{ExecutionListener, ExecutionReport, Trade, TradeListener};
use crate::tick::Tick;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap};
use tracing::{debug, trace, warn};

/// A resting stop order, tracked outside the book until its trigger
/// condition fires.
#[derive(Debug, Clone)]
struct StopOrder {
    order: Order,
}

fn stop_triggered(stop: &StopOrder, last_trade_price: Tick) -> bool {
    use crate::order::Side;
    let trigger = match stop.order.kind {
        OrderKind::Stop { trigger_price } => trigger_price,
        OrderKind::StopLimit { trigger_price, .. } => trigger_price,
        _ => return false,
    };
    match stop.order.side {
        Side::Buy => last_trade_price >= trigger,
        Side::Sell => last_trade_price <= trigger,
    }
}

/// Converts a triggered stop order into the `Market`/`Limit` order it
/// becomes once it re-enters matching.
fn convert_triggered(mut order: Order, ts: i64) -> Order {
    order.kind = match order.kind {
        OrderKind::Stop { .. } => {
            order.price = None;
            OrderKind::Market
        }
        OrderKind::StopLimit { limit_price, .. } => {
            order.price = Some(limit_price);
            OrderKind::Limit
        }
        other => other,
    };
    order.submit_ts = ts;
    order
}

/// Drives an [`OrderBook`] through a total order of externally submitted
/// and internally scheduled events.
///
/// Externally submitted events are accepted with [`Dispatcher::submit`]
/// and queued; [`Dispatcher::run_until`] pops and applies them (and any
/// events they schedule in turn — stop triggers, iceberg refreshes) up to
/// a logical time bound, invoking trade and execution-report listeners
/// synchronously as state transitions occur.
pub struct Dispatcher {
    pub book: OrderBook,
    heap: BinaryHeap<Reverse<HeapEntry>>,
    next_heap_sequence: u64,
    /// A `BTreeMap`, not a `HashMap`: iterated every trade to check
    /// trigger conditions, and must yield a deterministic order so two
    /// stops triggered by the same trade enqueue in a stable sequence.
    stop_orders: BTreeMap<OrderId, StopOrder>,
    pending_iceberg: HashMap<OrderId, Order>,
    pending_stop_trigger: HashMap<OrderId, (StopOrder, u32)>,
    trade_listeners: Vec<TradeListener>,
    execution_listeners: Vec<ExecutionListener>,
    impact: SlippageAccounting,
    /// Doubled mid observed at each processed event's `ts`, used to look
    /// up the mid that stood at an order's `submit_ts` even when the
    /// event processing it runs later, for latency-cost attribution.
    mid_history: BTreeMap<i64, i64>,
}

impl Dispatcher {
    pub fn new(book: OrderBook) -> Self {
        let impact = SlippageAccounting::new(book.config().impact);
        Self {
            book,
            heap: BinaryHeap::new(),
            next_heap_sequence: 0,
            stop_orders: BTreeMap::new(),
            pending_iceberg: HashMap::new(),
            pending_stop_trigger: HashMap::new(),
            trade_listeners: Vec::new(),
            execution_listeners: Vec::new(),
            impact,
            mid_history: BTreeMap::new(),
        }
    }

    /// Accumulated Almgren-Chriss cost accounting across every fill
    /// processed so far.
    pub fn impact(&self) -> &SlippageAccounting {
        &self.impact
    }

    fn snapshot_mid(&self, ts: i64) -> Option<i64> {
        self.mid_history.range(..=ts).next_back().map(|(_, &mid)| mid)
    }

    fn record_mid_snapshot(&mut self, ts: i64) {
        if let Some(mid) = self.book.mid_doubled() {
            self.mid_history.insert(ts, mid);
        }
    }

    pub fn on_trade(&mut self, listener: TradeListener) {
        self.trade_listeners.push(listener);
    }

    pub fn on_execution_report(&mut self, listener: ExecutionListener) {
        self.execution_listeners.push(listener);
    }

    /// Enqueue an externally originated event. Returns `false` (and logs
    /// a warning) if `event.ts` precedes the dispatcher's current
    /// logical time instead of panicking or silently reordering it.
    pub fn submit(&mut self, event: Event) -> bool {
        if event.ts < self.book.current_ts {
            warn!(ts = event.ts, current_ts = self.book.current_ts, "rejected event ts regression");
            return false;
        }
        self.enqueue(event);
        true
    }

    fn enqueue(&mut self, event: Event) {
        let sequence = self.next_heap_sequence;
        self.next_heap_sequence += 1;
        self.heap.push(Reverse(HeapEntry { ts: event.ts, sequence, event }));
    }

    /// Pop and apply every event with `ts <= horizon`, including any
    /// derived events (stop triggers, iceberg refreshes) they schedule,
    /// as long as those derived events also fall within the horizon.
    pub fn run_until(&mut self, horizon: i64) {
        while let Some(Reverse(top)) = self.heap.peek() {
            if top.ts > horizon {
                break;
            }
            let Reverse(HeapEntry { event, .. }) = self.heap.pop().unwrap();
            self.apply(event);
        }
    }

    /// Drain the entire queue regardless of timestamp.
    pub fn run_to_completion(&mut self) {
        while let Some(Reverse(HeapEntry { event, .. })) = self.heap.pop() {
            self.apply(event);
        }
    }

    fn apply(&mut self, event: Event) {
        let cascade_depth = event.cascade_depth;
        let ts = event.ts;
        match event.kind {
            EventKind::Submit(order) if order.kind.is_stop() => {
                self.register_stop(order, ts);
            }
            EventKind::Submit(order) => {
                let order_id = order.id;
                let submit_ts = order.submit_ts;
                let reference_mid = self.book.mid_doubled().unwrap_or(0);
                let mid_at_submit = self.snapshot_mid(submit_ts).unwrap_or(reference_mid);
                match self.book.submit_order(order) {
                    Ok(outcome) => {
                        self.handle_outcome(order_id, outcome, cascade_depth, ts, submit_ts, reference_mid, mid_at_submit)
                    }
                    Err(err) => self.report_rejection(order_id, 0, err),
                }
            }
            EventKind::Cancel(order_id) => match self.book.cancel_order(order_id, ts) {
                Ok(_) => self.emit_report(order_id, OrderStatus::Cancelled, 0, None, None),
                Err(err) => self.report_rejection(order_id, 0, err),
            },
            EventKind::Modify { order_id, new_qty, new_price } => {
                match self.book.modify_order(order_id, new_qty, new_price, ts) {
                    Ok(()) => {
                        let filled = self.book.order(order_id).map(|o| o.cumulative_filled()).unwrap_or(0);
                        self.emit_report(order_id, OrderStatus::Accepted, filled, None, None);
                    }
                    Err(err) => self.report_rejection(order_id, 0, err),
                }
            }
            EventKind::StopTrigger(order_id) => {
                let Some((stop, depth)) = self.pending_stop_trigger.remove(&order_id) else {
                    trace!(order_id = order_id.0, "stop trigger fired for an order no longer pending");
                    return;
                };
                let converted = convert_triggered(stop.order, ts);
                let submit_ts = converted.submit_ts;
                let reference_mid = self.book.mid_doubled().unwrap_or(0);
                let mid_at_submit = self.snapshot_mid(submit_ts).unwrap_or(reference_mid);
                match self.book.submit_triggered_order(converted) {
                    Ok(outcome) => {
                        self.handle_outcome(order_id, outcome, depth, ts, submit_ts, reference_mid, mid_at_submit)
                    }
                    Err(err) => self.report_rejection(order_id, 0, err),
                }
            }
            EventKind::IcebergRefresh(order_id) => {
                let Some(mut order) = self.pending_iceberg.remove(&order_id) else {
                    trace!(order_id = order_id.0, "iceberg refresh fired for an order no longer pending");
                    return;
                };
                order.submit_ts = ts;
                if let Err(err) = self.book.insert_resting(order) {
                    self.report_rejection(order_id, 0, err);
                }
            }
        }
        self.record_mid_snapshot(ts);
    }

    fn register_stop(&mut self, order: Order, ts: i64) {
        if self.book.has_been_seen(order.id) || self.stop_orders.contains_key(&order.id) {
            self.report_rejection(order.id, 0, OrderBookError::DuplicateOrderId(order.id));
            return;
        }
        if ts < self.book.current_ts {
            self.report_rejection(order.id, 0, OrderBookError::TimestampRegression { ts, current_ts: self.book.current_ts });
            return;
        }
        debug!(order_id = order.id.0, "stop order registered in side table");
        let order_id = order.id;
        self.book.mark_seen(order_id);
        self.stop_orders.insert(order_id, StopOrder { order });
        self.emit_report(order_id, OrderStatus::Accepted, 0, None, None);
    }

    fn handle_outcome(
        &mut self,
        submitted_id: OrderId,
        outcome: MatchOutcome,
        cascade_depth: u32,
        ts: i64,
        submit_ts: i64,
        reference_mid_doubled: i64,
        mid_at_submit_doubled: i64,
    ) {
        for trade in &outcome.trades {
            self.publish_trade(trade);
            let observation = FillObservation {
                side: trade.aggressor_side,
                quantity: trade.quantity,
                fill_price_ticks: trade.price_ticks,
                reference_mid_doubled,
                mid_at_submit_doubled,
                submit_ts,
                ts,
            };
            self.impact.record_fill(&observation);
        }
        for maker_id in &outcome.cancelled_makers {
            self.emit_report(*maker_id, OrderStatus::Cancelled, 0, None, Some("self-trade prevention".into()));
        }
        for pending in outcome.pending_iceberg_refreshes {
            let order_id = pending.order.id;
            let refresh_ts = pending.refresh_ts;
            self.pending_iceberg.insert(order_id, pending.order);
            self.enqueue(Event::new(refresh_ts, EventKind::IcebergRefresh(order_id)));
        }

        if let Some(last_trade) = outcome.trades.last() {
            self.check_stop_triggers(last_trade, cascade_depth);
        }

        let filled = self.book.order(submitted_id).map(|o| o.cumulative_filled());
        match outcome.residual {
            Residual::Rested => {
                let cum = filled.unwrap_or(0);
                self.emit_report(submitted_id, OrderStatus::PartiallyFilled, cum, None, None);
            }
            Residual::FullyFilled => {
                self.emit_report(submitted_id, OrderStatus::Filled, filled.unwrap_or(0), None, None);
            }
            Residual::Discarded => {
                let cum: u64 = outcome
                    .trades
                    .iter()
                    .filter(|t| t.taker_order_id == submitted_id)
                    .map(|t| t.quantity)
                    .sum();
                let state = if cum > 0 { OrderStatus::PartiallyFilled } else { OrderStatus::Cancelled };
                self.emit_report(submitted_id, state, cum, None, None);
            }
            Residual::Rejected(err) => {
                let cum: u64 = outcome
                    .trades
                    .iter()
                    .filter(|t| t.taker_order_id == submitted_id)
                    .map(|t| t.quantity)
                    .sum();
                self.report_rejection(submitted_id, cum, err);
            }
        }
    }

    fn check_stop_triggers(&mut self, last_trade: &Trade, cascade_depth: u32) {
        let triggered: Vec<OrderId> = self
            .stop_orders
            .iter()
            .filter(|(_, stop)| stop_triggered(stop, last_trade.price_ticks))
            .map(|(id, _)| *id)
            .collect();

        for order_id in triggered {
            let stop = self.stop_orders.remove(&order_id).expect("just filtered from this map");
            let next_depth = cascade_depth + 1;
            if next_depth > self.book.config().max_cascade_depth {
                warn!(order_id = order_id.0, depth = next_depth, "stop-trigger cascade depth exceeded, dropping trigger");
                self.emit_report(
                    order_id,
                    OrderStatus::Rejected,
                    0,
                    None,
                    Some(format!(
                        "{}",
                        OrderBookError::CascadeDepthExceeded { origin: order_id, max_depth: self.book.config().max_cascade_depth }
                    )),
                );
                continue;
            }
            self.pending_stop_trigger.insert(order_id, (stop, next_depth));
            self.enqueue(Event { ts: last_trade.ts, kind: EventKind::StopTrigger(order_id), cascade_depth: next_depth });
        }
    }

    fn publish_trade(&mut self, trade: &Trade) {
        for listener in &mut self.trade_listeners {
            listener(trade);
        }
    }

    fn emit_report(
        &mut self,
        order_id: OrderId,
        new_state: OrderStatus,
        cumulative_filled: u64,
        average_fill_price_ticks: Option<Tick>,
        reason: Option<String>,
    ) {
        let report = ExecutionReport { order_id, new_state, cumulative_filled, average_fill_price_ticks, reason };
        for listener in &mut self.execution_listeners {
            listener(&report);
        }
    }

    fn report_rejection(&mut self, order_id: OrderId, cumulative_filled: u64, err: OrderBookError) {
        self.emit_report(order_id, OrderStatus::Rejected, cumulative_filled, None, Some(err.to_string()));
    }

    /// Whether an order is sitting in the stop side table, awaiting its
    /// trigger condition.
    pub fn is_pending_stop(&self, order_id: OrderId) -> bool {
        self.stop_orders.contains_key(&order_id) || self.pending_stop_trigger.contains_key(&order_id)
    }

    /// Whether an order has been popped off a level for iceberg refresh
    /// and is not yet re-rested.
    pub fn is_pending_iceberg_refresh(&self, order_id: OrderId) -> bool {
        self.pending_iceberg.contains_key(&order_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{OwnerTag, Side, TimeInForce};
    use crate::orderbook::config::BookConfig;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn limit(id: u64, side: Side, price: i64, qty: u64, ts: i64, owner: u64) -> Order {
        Order {
            id: OrderId(id),
            side,
            kind: OrderKind::Limit,
            price: Some(Tick(price)),
            original_quantity: qty,
            remaining_quantity: qty,
            time_in_force: TimeInForce::Gtc,
            submit_ts: ts,
            owner_tag: OwnerTag(owner),
            displayed_quantity: qty,
        }
    }

    fn stop(id: u64, side: Side, trigger: i64, qty: u64, ts: i64, owner: u64) -> Order {
        Order {
            id: OrderId(id),
            side,
            kind: OrderKind::Stop { trigger_price: Tick(trigger) },
            price: None,
            original_quantity: qty,
            remaining_quantity: qty,
            time_in_force: TimeInForce::Day,
            submit_ts: ts,
            owner_tag: OwnerTag(owner),
            displayed_quantity: qty,
        }
    }

    #[test]
    fn events_at_same_ts_apply_in_submission_order() {
        let mut dispatcher = Dispatcher::new(OrderBook::new(BookConfig::for_tests(1)));
        dispatcher.submit(Event::new(1, EventKind::Submit(limit(1, Side::Buy, 100, 10, 1, 1))));
        dispatcher.submit(Event::new(1, EventKind::Submit(limit(2, Side::Buy, 100, 5, 1, 2))));
        dispatcher.run_until(1);
        assert!(dispatcher.book.is_resting(OrderId(1)));
        assert!(dispatcher.book.is_resting(OrderId(2)));
    }

    #[test]
    fn rejects_event_ts_regression() {
        let mut dispatcher = Dispatcher::new(OrderBook::new(BookConfig::for_tests(1)));
        dispatcher.submit(Event::new(5, EventKind::Submit(limit(1, Side::Buy, 100, 10, 5, 1))));
        dispatcher.run_until(5);
        let accepted = dispatcher.submit(Event::new(1, EventKind::Submit(limit(2, Side::Buy, 100, 10, 1, 2))));
        assert!(!accepted);
    }

    #[test]
    fn stop_order_triggers_on_crossing_trade() {
        let mut dispatcher = Dispatcher::new(OrderBook::new(BookConfig::for_tests(1)));
        let trades = Rc::new(RefCell::new(Vec::new()));
        let sink = trades.clone();
        dispatcher.on_trade(Box::new(move |t: &Trade| sink.borrow_mut().push(t.clone())));

        dispatcher.submit(Event::new(1, EventKind::Submit(stop(1, Side::Buy, 105, 10, 1, 1))));
        dispatcher.run_until(1);
        assert!(dispatcher.is_pending_stop(OrderId(1)));

        dispatcher.submit(Event::new(2, EventKind::Submit(limit(2, Side::Sell, 105, 20, 2, 2))));
        dispatcher.submit(Event::new(2, EventKind::Submit(limit(3, Side::Buy, 105, 10, 2, 3))));
        dispatcher.run_until(2);

        assert!(!dispatcher.is_pending_stop(OrderId(1)));
        assert_eq!(trades.borrow().len(), 2, "the crossing trade plus the triggered stop's own market fill");
    }

    #[test]
    fn cascade_depth_exceeded_rejects_further_triggers() {
        let mut book = OrderBook::new(BookConfig::for_tests(1));
        book.config.max_cascade_depth = 0;
        let mut dispatcher = Dispatcher::new(book);
        let reports = Rc::new(RefCell::new(Vec::new()));
        let sink = reports.clone();
        dispatcher.on_execution_report(Box::new(move |r: &ExecutionReport| sink.borrow_mut().push(r.clone())));

        dispatcher.submit(Event::new(1, EventKind::Submit(stop(1, Side::Buy, 105, 10, 1, 1))));
        dispatcher.submit(Event::new(2, EventKind::Submit(limit(2, Side::Sell, 105, 20, 2, 2))));
        dispatcher.submit(Event::new(2, EventKind::Submit(limit(3, Side::Buy, 105, 10, 2, 3))));
        dispatcher.run_until(2);

        let rejected = reports
            .borrow()
            .iter()
            .any(|r| r.order_id == OrderId(1) && r.new_state == OrderStatus::Rejected);
        assert!(rejected, "stop trigger should be rejected once cascade depth 1 exceeds max depth 0");
    }

    #[test]
    fn iceberg_refresh_reposts_after_delay() {
        let mut book = OrderBook::new(BookConfig::for_tests(1));
        book.config.iceberg_refresh_delay = 5;
        let mut dispatcher = Dispatcher::new(book);

        let iceberg = Order {
            id: OrderId(1),
            side: Side::Sell,
            kind: OrderKind::Iceberg { display_quantity: 5 },
            price: Some(Tick(100)),
            original_quantity: 15,
            remaining_quantity: 15,
            time_in_force: TimeInForce::Gtc,
            submit_ts: 1,
            owner_tag: OwnerTag(1),
            displayed_quantity: 5,
        };
        dispatcher.submit(Event::new(1, EventKind::Submit(iceberg)));
        dispatcher.run_until(1);

        dispatcher.submit(Event::new(2, EventKind::Submit(limit(2, Side::Buy, 100, 5, 2, 2))));
        dispatcher.run_until(2);

        assert!(!dispatcher.book.is_resting(OrderId(1)));
        assert!(dispatcher.is_pending_iceberg_refresh(OrderId(1)));

        dispatcher.run_until(7);
        assert!(dispatcher.book.is_resting(OrderId(1)));
        assert_eq!(dispatcher.book.order(OrderId(1)).unwrap().displayed_quantity, 5);
    }
}
