use crate::limit_order;
use lob_sim::prelude::*;

fn book_with_policy(policy: SelfTradePolicy) -> OrderBook {
    let mut config = BookConfig::for_tests(1);
    config.self_trade_policy = policy;
    OrderBook::new(config)
}

#[test]
fn cancel_newest_discards_the_taker_remainder() {
    let mut book = book_with_policy(SelfTradePolicy::CancelNewest);
    book.submit_order(limit_order(1, Side::Sell, 100, 10, 1, /* owner */ 7)).unwrap();
    book.submit_order(limit_order(2, Side::Sell, 101, 10, 2, 8)).unwrap();

    let outcome = book.submit_order(limit_order(3, Side::Buy, 101, 15, 3, 7)).unwrap();

    assert!(outcome.trades.is_empty(), "the resting maker shares the taker's owner tag, so no trade is struck");
    assert_eq!(outcome.residual, Residual::Discarded);
    assert!(!book.is_resting(OrderId(3)), "CANCEL_NEWEST discards the whole taker remainder");
    assert!(book.is_resting(OrderId(1)), "the non-conflicting maker is untouched");
}

#[test]
fn reject_taker_preserves_trades_committed_before_the_self_trade() {
    let mut book = book_with_policy(SelfTradePolicy::RejectTaker);
    book.submit_order(limit_order(1, Side::Sell, 100, 5, 1, 9)).unwrap();
    book.submit_order(limit_order(2, Side::Sell, 100, 5, 2, 7)).unwrap();

    let outcome = book.submit_order(limit_order(3, Side::Buy, 100, 20, 3, 7)).unwrap();

    assert_eq!(outcome.trades.len(), 1, "the trade against the non-conflicting maker stands");
    assert_eq!(outcome.trades[0].maker_order_id, OrderId(1));
    assert!(matches!(outcome.residual, Residual::Rejected(OrderBookError::SelfTradePrevented(OrderId(3)))));
    assert!(book.is_resting(OrderId(2)), "the conflicting maker was never touched, only the taker's remainder");
}

#[test]
fn cancel_oldest_removes_conflicting_maker_and_continues() {
    let mut book = book_with_policy(SelfTradePolicy::CancelOldest);
    book.submit_order(limit_order(1, Side::Sell, 100, 5, 1, 7)).unwrap();
    book.submit_order(limit_order(2, Side::Sell, 100, 5, 2, 9)).unwrap();

    let outcome = book.submit_order(limit_order(3, Side::Buy, 100, 5, 3, 7)).unwrap();

    assert_eq!(outcome.cancelled_makers, vec![OrderId(1)]);
    assert_eq!(outcome.trades.len(), 1);
    assert_eq!(outcome.trades[0].maker_order_id, OrderId(2));
    assert_eq!(outcome.residual, Residual::FullyFilled);
}
