use crate::{fresh_book, limit_order};
use lob_sim::prelude::*;

#[test]
fn trades_flowing_through_the_dispatcher_accumulate_nonzero_cost() {
    let mut dispatcher = Dispatcher::new(fresh_book());

    dispatcher.submit(Event::new(1, EventKind::Submit(limit_order(1, Side::Buy, 99, 10, 1, 1))));
    dispatcher.submit(Event::new(2, EventKind::Submit(limit_order(2, Side::Sell, 101, 10, 2, 2))));
    dispatcher.run_until(2);
    assert_eq!(dispatcher.impact().totals(), CostBreakdown::default(), "no crossing has happened yet");

    dispatcher.submit(Event::new(3, EventKind::Submit(limit_order(3, Side::Buy, 101, 10, 3, 3))));
    dispatcher.run_until(3);

    let totals = dispatcher.impact().totals();
    assert_ne!(totals, CostBreakdown::default(), "the crossing fill at ts 3 should be folded into the running totals");
    assert!(totals.spread_cost > 0.0, "buying at 101 against a mid below that price costs the taker");
}
