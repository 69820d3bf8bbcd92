use crate::{fresh_book, limit_order};
use lob_sim::prelude::*;

#[test]
fn snapshot_reports_best_prices_and_depth() {
    let mut book = fresh_book();
    book.submit_order(limit_order(1, Side::Buy, 99, 10, 1, 1)).unwrap();
    book.submit_order(limit_order(2, Side::Buy, 100, 5, 2, 2)).unwrap();
    book.submit_order(limit_order(3, Side::Sell, 102, 8, 3, 3)).unwrap();

    let snapshot = book.snapshot(10);
    assert_eq!(snapshot.best_bid, Some(Tick(100)));
    assert_eq!(snapshot.best_ask, Some(Tick(102)));
    assert_eq!(snapshot.spread, Some(2));
    assert_eq!(snapshot.bid_depth[0].price, Tick(100));
    assert_eq!(snapshot.bid_depth[1].price, Tick(99));
}

#[test]
fn snapshot_package_round_trips_and_detects_tampering() {
    let mut book = fresh_book();
    book.submit_order(limit_order(1, Side::Buy, 100, 10, 1, 1)).unwrap();
    let snapshot = book.snapshot(5);

    let package = SnapshotPackage::new(snapshot);
    assert!(package.verify());

    let mut tampered = package;
    tampered.snapshot.spread = Some(9_999);
    assert!(!tampered.verify(), "mutating the snapshot after checksumming must be detectable");
}
