//! Slippage and market-impact accounting. Observes fills after the
//! matching engine has already applied them; never feeds back into a
//! matching decision.

pub mod accounting;

pub use accounting::{CostBreakdown, FillObservation, SlippageAccounting};
