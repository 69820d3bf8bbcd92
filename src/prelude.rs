//! Convenient single-import surface for the common types needed to wire
//! up a book and drive it through the dispatcher.
//!
//! ```rust
//! use lob_sim::prelude::*;
//! ```

pub use crate::dispatcher::{Dispatcher, Event, EventKind};
pub use crate::impact::{CostBreakdown, FillObservation, SlippageAccounting};
pub use crate::order::{Order, OrderId, OrderKind, OrderStatus, OwnerTag, Side, TimeInForce};
pub use crate::orderbook::{
    BookConfig, BookSnapshot, DepthLevel, ExecutionListener, ExecutionReport, ImpactConfig,
    MatchOutcome, OrderBook, OrderBookError, PendingIcebergRefresh, Residual, SelfTradePolicy,
    SnapshotPackage, Trade, TradeListener,
};
pub use crate::tick::{Tick, Timestamp};
