use crate::{fresh_book, limit_order};
use lob_sim::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn full_lifecycle_emits_accepted_then_partial_then_filled() {
    let mut dispatcher = Dispatcher::new(fresh_book());
    let reports: Rc<RefCell<Vec<ExecutionReport>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = reports.clone();
    dispatcher.on_execution_report(Box::new(move |r: &ExecutionReport| sink.borrow_mut().push(r.clone())));

    dispatcher.submit(Event::new(1, EventKind::Submit(limit_order(1, Side::Sell, 100, 10, 1, 1))));
    dispatcher.run_until(1);
    dispatcher.submit(Event::new(2, EventKind::Submit(limit_order(2, Side::Buy, 100, 4, 2, 2))));
    dispatcher.run_until(2);
    dispatcher.submit(Event::new(3, EventKind::Submit(limit_order(3, Side::Buy, 100, 6, 3, 3))));
    dispatcher.run_until(3);

    let order_1_states: Vec<_> = reports.borrow().iter().filter(|r| r.order_id == OrderId(1)).map(|r| r.new_state).collect();
    assert_eq!(order_1_states, vec![OrderStatus::PartiallyFilled, OrderStatus::Filled]);
}

#[test]
fn cancel_event_emits_cancelled_report() {
    let mut dispatcher = Dispatcher::new(fresh_book());
    let reports: Rc<RefCell<Vec<ExecutionReport>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = reports.clone();
    dispatcher.on_execution_report(Box::new(move |r: &ExecutionReport| sink.borrow_mut().push(r.clone())));

    dispatcher.submit(Event::new(1, EventKind::Submit(limit_order(1, Side::Buy, 100, 10, 1, 1))));
    dispatcher.submit(Event::new(2, EventKind::Cancel(OrderId(1))));
    dispatcher.run_until(2);

    let last = reports.borrow().last().cloned().unwrap();
    assert_eq!(last.order_id, OrderId(1));
    assert_eq!(last.new_state, OrderStatus::Cancelled);
}

#[test]
fn cancel_of_unknown_id_is_rejected_not_panicking() {
    let mut dispatcher = Dispatcher::new(fresh_book());
    let reports: Rc<RefCell<Vec<ExecutionReport>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = reports.clone();
    dispatcher.on_execution_report(Box::new(move |r: &ExecutionReport| sink.borrow_mut().push(r.clone())));

    dispatcher.submit(Event::new(1, EventKind::Cancel(OrderId(42))));
    dispatcher.run_until(1);

    let last = reports.borrow().last().cloned().unwrap();
    assert_eq!(last.new_state, OrderStatus::Rejected);
}

#[test]
fn events_sharing_a_timestamp_apply_in_enqueue_order() {
    let mut dispatcher = Dispatcher::new(fresh_book());
    dispatcher.submit(Event::new(5, EventKind::Submit(limit_order(1, Side::Sell, 100, 10, 5, 1))));
    dispatcher.submit(Event::new(5, EventKind::Submit(limit_order(2, Side::Buy, 100, 10, 5, 2))));
    dispatcher.run_until(5);
    assert!(!dispatcher.book.is_resting(OrderId(1)));
    assert!(!dispatcher.book.is_resting(OrderId(2)));
}

#[test]
fn modify_through_dispatcher_changes_resting_quantity() {
    let mut dispatcher = Dispatcher::new(fresh_book());
    dispatcher.submit(Event::new(1, EventKind::Submit(limit_order(1, Side::Buy, 100, 10, 1, 1))));
    dispatcher.submit(Event::new(2, EventKind::Modify { order_id: OrderId(1), new_qty: 3, new_price: None }));
    dispatcher.run_until(2);
    assert_eq!(dispatcher.book.order(OrderId(1)).unwrap().remaining_quantity, 3);
}

#[test]
fn reject_taker_rejection_report_carries_trades_committed_before_the_self_trade() {
    let mut config = BookConfig::for_tests(1);
    config.self_trade_policy = SelfTradePolicy::RejectTaker;
    let mut dispatcher = Dispatcher::new(OrderBook::new(config));
    let reports: Rc<RefCell<Vec<ExecutionReport>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = reports.clone();
    dispatcher.on_execution_report(Box::new(move |r: &ExecutionReport| sink.borrow_mut().push(r.clone())));

    dispatcher.submit(Event::new(1, EventKind::Submit(limit_order(1, Side::Sell, 100, 5, 1, 9))));
    dispatcher.submit(Event::new(2, EventKind::Submit(limit_order(2, Side::Sell, 100, 5, 2, 7))));
    dispatcher.submit(Event::new(3, EventKind::Submit(limit_order(3, Side::Buy, 100, 20, 3, 7))));
    dispatcher.run_until(3);

    let report = reports
        .borrow()
        .iter()
        .find(|r| r.order_id == OrderId(3) && r.new_state == OrderStatus::Rejected)
        .cloned()
        .expect("taker is rejected by self-trade prevention");
    assert_eq!(report.cumulative_filled, 5, "the trade against order 1 stands before the self-trade halts matching");
}

#[test]
fn run_until_does_not_process_events_past_the_horizon() {
    let mut dispatcher = Dispatcher::new(fresh_book());
    dispatcher.submit(Event::new(10, EventKind::Submit(limit_order(1, Side::Buy, 100, 10, 10, 1))));
    dispatcher.run_until(5);
    assert!(!dispatcher.book.is_resting(OrderId(1)), "event at ts 10 must not run under a horizon of 5");
    dispatcher.run_until(10);
    assert!(dispatcher.book.is_resting(OrderId(1)));
}
