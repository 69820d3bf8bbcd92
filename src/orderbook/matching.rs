//! The core matching engine: applies an incoming aggressive order against
//! the opposite side of the book under price-time priority.

use crate::order::{Order, OrderId, OrderKind, OwnerTag, Side, TimeInForce};
use crate::orderbook::book::OrderBook;
use crate::orderbook::config::SelfTradePolicy;
use crate::orderbook::error::OrderBookError;
use crate::orderbook::stp::is_self_trade;
use crate::orderbook::trade::Trade;
use crate::price_level::PriceLevel;
use crate::tick::Tick;
use tracing::{trace, warn};

/// An order popped off a level because its displayed slice was
/// exhausted while hidden (iceberg) quantity remains; the dispatcher is
/// responsible for re-posting it as a fresh slice at `refresh_ts`.
#[derive(Debug, Clone)]
pub struct PendingIcebergRefresh {
    pub order: Order,
    pub refresh_ts: i64,
}

/// What became of the incoming order's (possibly zero) residual
/// quantity once matching finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Residual {
    /// The order (or its remainder) now rests in the book.
    Rested,
    /// Fully matched; nothing left to rest.
    FullyFilled,
    /// Remainder discarded without error (IOC, market order exhausting
    /// an empty opposite side, or CANCEL_NEWEST self-trade prevention).
    Discarded,
    /// The order was rejected outright; no trades from this call are
    /// kept pending (FOK) or any already-emitted trades stand
    /// (REJECT_TAKER, per the resolved Open Question in `SPEC_FULL.md`).
    Rejected(OrderBookError),
}

/// The result of running one incoming order through the matching engine.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub trades: Vec<Trade>,
    /// Resting maker orders cancelled by `CANCEL_OLDEST` self-trade
    /// prevention.
    pub cancelled_makers: Vec<OrderId>,
    pub pending_iceberg_refreshes: Vec<PendingIcebergRefresh>,
    pub residual: Residual,
}

fn empty_outcome(residual: Residual) -> MatchOutcome {
    MatchOutcome { trades: vec![], cancelled_makers: vec![], pending_iceberg_refreshes: vec![], residual }
}

/// For a BUY, cross when `limit >= best_ask`; for a SELL, cross when
/// `limit <= best_bid`. A `None` limit (MARKET) always crosses while the
/// opposite side is non-empty.
fn crossing_level(book: &OrderBook, side: Side, limit: Option<Tick>) -> Option<Tick> {
    match side {
        Side::Buy => {
            let best_ask = book.best_ask()?;
            match limit {
                Some(l) if l.value() < best_ask.value() => None,
                _ => Some(best_ask),
            }
        }
        Side::Sell => {
            let best_bid = book.best_bid()?;
            match limit {
                Some(l) if l.value() > best_bid.value() => None,
                _ => Some(best_bid),
            }
        }
    }
}

/// Read-only sum of opposite-side quantity reachable by `side` at
/// `limit`, capped at `cap` (we never need more than the taker's full
/// size to decide FOK eligibility), accounting for what self-trade
/// prevention would actually do to `owner_tag`'s own resting liquidity:
/// under `CANCEL_OLDEST` a same-owner maker is skipped (it would never
/// trade against its own owner) but scanning continues past it; under
/// `CANCEL_NEWEST`/`REJECT_TAKER` reaching a same-owner maker would halt
/// matching there, so nothing behind it in the book is reachable either.
fn crossable_quantity(
    book: &OrderBook,
    side: Side,
    limit: Option<Tick>,
    cap: u64,
    owner_tag: OwnerTag,
    policy: SelfTradePolicy,
) -> u64 {
    let mut total = 0u64;
    let opposite_levels = book.side_map(side.opposite());
    let mut iter: Box<dyn Iterator<Item = (&Tick, &PriceLevel)>> = match side {
        Side::Buy => Box::new(opposite_levels.iter()),
        Side::Sell => Box::new(opposite_levels.iter().rev()),
    };
    'scan: while let Some((&price, level)) = iter.next() {
        let crosses = match side {
            Side::Buy => limit.is_none_or(|l| l.value() >= price.value()),
            Side::Sell => limit.is_none_or(|l| l.value() <= price.value()),
        };
        if !crosses {
            break;
        }
        for id in level.order_ids(&book.arena) {
            let maker = book.arena.get(book.id_index[&id].key).expect("indexed order is live");
            if is_self_trade(maker.owner_tag, owner_tag) {
                match policy {
                    SelfTradePolicy::CancelOldest => continue,
                    SelfTradePolicy::CancelNewest | SelfTradePolicy::RejectTaker => break 'scan,
                }
            }
            total += maker.remaining_quantity;
            if total >= cap {
                return total;
            }
        }
    }
    total
}

/// Run `order` through the matching engine against the current book,
/// mutating it, and return the trades produced plus how the residual
/// quantity was disposed of. This is the sole entry point that may
/// mutate the book in response to an incoming aggressive order; callers
/// (the dispatcher) own translating the outcome into execution reports
/// and scheduling any follow-up events (iceberg refresh, nothing else).
pub fn match_incoming(book: &mut OrderBook, mut order: Order) -> Result<MatchOutcome, OrderBookError> {
    if matches!(order.kind, OrderKind::Market) && !book.config.allow_market_orders {
        warn!(order_id = order.id.0, "market orders disabled for this book");
        return Err(OrderBookError::MarketOrdersDisabled);
    }

    if order.time_in_force == TimeInForce::PostOnly {
        if crossing_level(book, order.side, order.price).is_some() {
            warn!(order_id = order.id.0, "POST_ONLY would have crossed");
            return Err(OrderBookError::PostOnlyWouldCross(order.id));
        }
        book.insert_resting(order)?;
        return Ok(empty_outcome(Residual::Rested));
    }

    if order.time_in_force == TimeInForce::Fok {
        let crossable = crossable_quantity(
            book,
            order.side,
            order.price,
            order.remaining_quantity,
            order.owner_tag,
            book.config.self_trade_policy,
        );
        if crossable < order.original_quantity {
            warn!(order_id = order.id.0, "FOK insufficient liquidity");
            return Ok(empty_outcome(Residual::Rejected(OrderBookError::FOKInsufficientLiquidity(
                order.id,
            ))));
        }
    }

    let mut trades = Vec::new();
    let mut cancelled_makers = Vec::new();
    let mut pending_iceberg_refreshes = Vec::new();
    let opposite = order.side.opposite();
    let mut self_trade_terminated = false;

    'outer: while order.remaining_quantity > 0 {
        let Some(level_price) = crossing_level(book, order.side, order.price) else { break };
        loop {
            if order.remaining_quantity == 0 {
                break;
            }
            let head_key = {
                let level = book.side_map(opposite).get(&level_price).expect("crossing level must exist");
                match level.front_key() {
                    Some(k) => k,
                    None => break,
                }
            };
            let (maker_owner, maker_id) = {
                let maker = book.arena.get(head_key).expect("head key must be live");
                (maker.owner_tag, maker.id)
            };

            if is_self_trade(maker_owner, order.owner_tag) {
                match book.config.self_trade_policy {
                    SelfTradePolicy::CancelOldest => {
                        let level = book.side_map_mut(opposite).get_mut(&level_price).unwrap();
                        level.remove(&mut book.arena, head_key);
                        book.id_index.remove(&maker_id);
                        cancelled_makers.push(maker_id);
                        trace!(order_id = maker_id.0, "self-trade: cancelled resting maker");
                        if book.side_map(opposite).get(&level_price).is_none_or(|l| l.is_empty()) {
                            book.side_map_mut(opposite).remove(&level_price);
                            break;
                        }
                        continue;
                    }
                    SelfTradePolicy::CancelNewest => {
                        trace!(order_id = order.id.0, "self-trade: cancelled taker remainder");
                        order.remaining_quantity = 0;
                        self_trade_terminated = true;
                        break 'outer;
                    }
                    SelfTradePolicy::RejectTaker => {
                        warn!(order_id = order.id.0, "self-trade: rejected taker under REJECT_TAKER");
                        self_trade_terminated = true;
                        break 'outer;
                    }
                }
            }

            let (maker_price, maker_displayed) = {
                let maker = book.arena.get(head_key).unwrap();
                (maker.price.expect("resting order has a price"), maker.displayed_quantity)
            };
            let qty = order.remaining_quantity.min(maker_displayed);
            let sequence = book.next_sequence();
            trades.push(Trade {
                sequence,
                ts: order.submit_ts,
                maker_order_id: maker_id,
                taker_order_id: order.id,
                price_ticks: maker_price,
                quantity: qty,
                aggressor_side: order.side,
            });
            order.remaining_quantity -= qty;

            let level = book.side_map_mut(opposite).get_mut(&level_price).unwrap();
            if let Some(popped) = level.fill(&mut book.arena, head_key, qty) {
                book.id_index.remove(&popped.id);
                if popped.remaining_quantity > 0 {
                    debug_assert!(matches!(popped.kind, OrderKind::Iceberg { .. }));
                    let refresh_ts = order.submit_ts + book.config.iceberg_refresh_delay;
                    pending_iceberg_refreshes
                        .push(PendingIcebergRefresh { order: popped, refresh_ts });
                }
                if level.is_empty() {
                    book.side_map_mut(opposite).remove(&level_price);
                }
            }
        }
    }

    if let Some(trade) = trades.last() {
        book.last_trade = Some(trade.clone());
    }

    let residual = if order.remaining_quantity == 0 {
        Residual::FullyFilled
    } else if self_trade_terminated {
        match book.config.self_trade_policy {
            SelfTradePolicy::RejectTaker => {
                Residual::Rejected(OrderBookError::SelfTradePrevented(order.id))
            }
            _ => Residual::Discarded,
        }
    } else if matches!(order.kind, OrderKind::Market) {
        // Exhausted the opposite side without a limit: no conversion to
        // resting limit order per §4.3.
        Residual::Discarded
    } else if order.time_in_force.never_rests() {
        Residual::Discarded
    } else {
        // A taker's `displayed_quantity` is not touched while it is the
        // aggressor (only a resting maker's is decremented, by
        // `PriceLevel::fill`); resync it before the order becomes a
        // resting maker itself.
        order.displayed_quantity = match order.kind {
            OrderKind::Iceberg { display_quantity } => display_quantity.min(order.remaining_quantity),
            _ => order.remaining_quantity,
        };
        book.insert_resting(order)?;
        Residual::Rested
    };

    Ok(MatchOutcome { trades, cancelled_makers, pending_iceberg_refreshes, residual })
}
