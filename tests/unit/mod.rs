//! Integration test suite, exercising the public surface the way an
//! external producer would: through [`Dispatcher`]/[`OrderBook`]
//! directly, never reaching into crate-internal modules.

use lob_sim::prelude::*;

mod dispatcher_flow;
mod impact_wiring;
mod self_trade_policies;
mod snapshot_and_checksum;

pub(crate) fn limit_order(id: u64, side: Side, price: i64, qty: u64, ts: i64, owner: u64) -> Order {
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

pub(crate) fn fresh_book() -> OrderBook {
    OrderBook::new(BookConfig::for_tests(1))
}
