//! # Deterministic Event-Driven Limit Order Book Simulator
//!
//! A single-threaded, price-time-priority matching engine that replays a
//! timestamp-ordered stream of order events and produces a deterministic
//! sequence of trades, execution reports, and top-of-book snapshots.
//!
//! ## Scope
//!
//! This crate is the matching core: the order book data structure, the
//! event dispatcher that drives it in strict `(ts, sequence)` order, and
//! the slippage/impact accounting that turns raw fills into calibrated
//! execution cost. It does not parse market-data feeds, route orders
//! across venues, or persist state; those are external collaborators.
//!
//! ## Layout
//!
//! - [`tick`] — integer tick/price arithmetic.
//! - [`order`] — order identity, side, kind, time-in-force, lifecycle state.
//! - [`price_level`] — the arena-backed FIFO queue resting at one price.
//! - [`orderbook`] — the two-sided book, matching engine, self-trade
//!   prevention, configuration, errors, trades, and snapshots.
//! - [`dispatcher`] — the min-heap event loop driving the book forward.
//! - [`impact`] — Almgren-Chriss style slippage/impact accounting.
//!
//! ## Status
//! This project is currently in active development and is not yet suitable
//! for production use.

pub mod dispatcher;
pub mod impact;
pub mod order;
pub mod orderbook;
pub mod price_level;
pub mod tick;

pub mod prelude;
