//! The two-sided order book: price-ordered maps of resting orders plus an
//! id index for O(log n) cancel/modify.

use crate::order::{Order, OrderId, OrderKind, Side};
use crate::orderbook::config::BookConfig;
use crate::orderbook::error::OrderBookError;
use crate::orderbook::snapshot::{BookSnapshot, DepthLevel};
use crate::orderbook::trade::Trade;
use crate::price_level::{ArenaKey, OrderArena, PriceLevel};
use crate::tick::Tick;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, trace};

pub(crate) struct Location {
    pub(crate) side: Side,
    pub(crate) price: Tick,
    pub(crate) key: ArenaKey,
}

/// A pair of sorted maps keyed by price, plus an order-id index.
///
/// `bids` is iterated in reverse (greatest key first) to realize the
/// "descending" ordering the spec calls for; `asks` is iterated forward.
/// The book is the sole owner of every resting [`Order`]; the `id_index`
/// holds only a non-owning back-reference (side, price, arena key).
pub struct OrderBook {
    pub(crate) config: BookConfig,
    pub(crate) bids: BTreeMap<Tick, PriceLevel>,
    pub(crate) asks: BTreeMap<Tick, PriceLevel>,
    pub(crate) arena: OrderArena,
    pub(crate) id_index: HashMap<OrderId, Location>,
    /// Every order id ever submitted or registered, kept even past
    /// removal from `id_index` so duplicate detection covers the whole
    /// run's id space, not just currently-resting orders.
    pub(crate) seen_ids: HashSet<OrderId>,
    pub(crate) current_ts: i64,
    pub(crate) last_trade: Option<Trade>,
    pub(crate) next_sequence: u64,
}

impl OrderBook {
    pub fn new(config: BookConfig) -> Self {
        Self {
            config,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            arena: OrderArena::new(),
            id_index: HashMap::new(),
            seen_ids: HashSet::new(),
            current_ts: 0,
            last_trade: None,
            next_sequence: 0,
        }
    }

    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    pub(crate) fn side_map(&self, side: Side) -> &BTreeMap<Tick, PriceLevel> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    pub(crate) fn side_map_mut(&mut self, side: Side) -> &mut BTreeMap<Tick, PriceLevel> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    pub fn best_bid(&self) -> Option<Tick> {
        self.bids.keys().next_back().copied()
    }

    pub fn best_ask(&self) -> Option<Tick> {
        self.asks.keys().next().copied()
    }

    /// Defined only when both sides are non-empty.
    pub fn spread(&self) -> Option<i64> {
        Some(crate::tick::spread(self.best_bid()?, self.best_ask()?))
    }

    /// Defined only when both sides are non-empty. Doubled to represent
    /// a possible half-tick exactly.
    pub fn mid_doubled(&self) -> Option<i64> {
        Some(crate::tick::mid_doubled(self.best_bid()?, self.best_ask()?))
    }

    /// Up to `n_levels` of resting aggregate quantity per side, best
    /// price first.
    pub fn depth(&self, n_levels: usize) -> (Vec<(Tick, u64)>, Vec<(Tick, u64)>) {
        let bid_depth = self
            .bids
            .iter()
            .rev()
            .take(n_levels)
            .map(|(price, level)| (*price, level.aggregate()))
            .collect();
        let ask_depth = self
            .asks
            .iter()
            .take(n_levels)
            .map(|(price, level)| (*price, level.aggregate()))
            .collect();
        (bid_depth, ask_depth)
    }

    /// Place a non-crossing limit order onto the correct side, creating
    /// the price level if absent. Callers are responsible for having
    /// already run this order through the matching engine; this method
    /// never matches.
    pub fn insert_resting(&mut self, order: Order) -> Result<(), OrderBookError> {
        if self.id_index.contains_key(&order.id) {
            return Err(OrderBookError::DuplicateOrderId(order.id));
        }
        let side = order.side;
        let price = order.price.expect("resting order always carries a price");
        let order_id = order.id;
        let level = self
            .side_map_mut(side)
            .entry(price)
            .or_insert_with(|| PriceLevel::new(price));
        let key = level.append(&mut self.arena, order);
        self.id_index.insert(order_id, Location { side, price, key });
        debug!(order_id = order_id.0, price = price.value(), "order rested");
        Ok(())
    }

    /// Remove a resting order; empty levels are reclaimed.
    pub fn cancel(&mut self, order_id: OrderId) -> Result<Order, OrderBookError> {
        let location = self
            .id_index
            .remove(&order_id)
            .ok_or(OrderBookError::UnknownOrderId(order_id))?;
        let removed = self.remove_at(&location);
        debug!(order_id = order_id.0, "order cancelled");
        Ok(removed)
    }

    fn remove_at(&mut self, location: &Location) -> Order {
        let map = self.side_map_mut(location.side);
        let level = map.get_mut(&location.price).expect("location must be live");
        let order = level.remove(&mut self.arena, location.key);
        if level.is_empty() {
            map.remove(&location.price);
            trace!(price = location.price.value(), "level reclaimed");
        }
        order
    }

    /// Price change or quantity increase loses time priority (cancel +
    /// fresh submit at `now_ts`); a pure quantity decrease preserves
    /// priority.
    pub fn modify(
        &mut self,
        order_id: OrderId,
        new_qty: u64,
        new_price: Option<Tick>,
        now_ts: i64,
    ) -> Result<(), OrderBookError> {
        if new_qty == 0 {
            return Err(OrderBookError::NonPositiveQuantity(new_qty));
        }
        let location = self
            .id_index
            .get(&order_id)
            .ok_or(OrderBookError::UnknownOrderId(order_id))?;
        let current_price = location.price;
        let current_qty = self
            .arena
            .get(location.key)
            .expect("indexed order must be live")
            .remaining_quantity;

        let price_changed = new_price.is_some_and(|p| p != current_price);
        let qty_increased = new_qty > current_qty;

        if price_changed || qty_increased {
            let mut order = self.cancel(order_id)?;
            order.price = new_price.or(order.price);
            order.original_quantity = order.cumulative_filled() + new_qty;
            order.remaining_quantity = new_qty;
            order.displayed_quantity = match order.kind {
                OrderKind::Iceberg { display_quantity } => display_quantity.min(new_qty),
                _ => new_qty,
            };
            order.submit_ts = now_ts;
            self.insert_resting(order)
        } else {
            let location = self.id_index.get(&order_id).unwrap();
            let map = self.side_map_mut(location.side);
            let level = map.get_mut(&location.price).expect("location must be live");
            let order = self
                .arena
                .get_mut(location.key)
                .expect("indexed order must be live");
            let delta = order.remaining_quantity - new_qty;
            order.remaining_quantity = new_qty;
            if order.displayed_quantity > new_qty {
                order.displayed_quantity = new_qty;
            }
            level.decrement_aggregate(delta);
            Ok(())
        }
    }

    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        let location = self.id_index.get(&order_id)?;
        self.arena.get(location.key)
    }

    pub fn is_resting(&self, order_id: OrderId) -> bool {
        self.id_index.contains_key(&order_id)
    }

    /// Whether `order_id` has ever been submitted or registered in this
    /// book's run, regardless of whether it is still resting.
    pub(crate) fn has_been_seen(&self, order_id: OrderId) -> bool {
        self.seen_ids.contains(&order_id)
    }

    pub(crate) fn mark_seen(&mut self, order_id: OrderId) {
        self.seen_ids.insert(order_id);
    }

    pub fn next_sequence(&mut self) -> u64 {
        let seq = self.next_sequence;
        self.next_sequence += 1;
        seq
    }

    /// A read-only projection of the book as it stands right now.
    pub fn snapshot(&self, depth_n: usize) -> BookSnapshot {
        let (bid_depth, ask_depth) = self.depth(depth_n);
        BookSnapshot {
            best_bid: self.best_bid(),
            best_ask: self.best_ask(),
            spread: self.spread(),
            mid_doubled: self.mid_doubled(),
            bid_depth: bid_depth
                .into_iter()
                .map(|(price, aggregate_quantity)| DepthLevel { price, aggregate_quantity })
                .collect(),
            ask_depth: ask_depth
                .into_iter()
                .map(|(price, aggregate_quantity)| DepthLevel { price, aggregate_quantity })
                .collect(),
            last_trade: self.last_trade.clone(),
        }
    }
}
