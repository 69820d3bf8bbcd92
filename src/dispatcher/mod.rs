//! The event dispatcher: a min-heap of `(ts, sequence)`-ordered events
//! driving the order book, plus the stop-order side table and iceberg
//! refresh scheduling that live outside the book itself.

mod engine;
pub mod types;

pub use engine::Dispatcher;
pub use types::{Event, EventKind};
