//! FIFO queue of resting orders at a single price, backed by an arena of
//! order slots with stable keys.

pub(crate) mod arena;
mod level;

pub use arena::{ArenaKey, OrderArena};
pub use level::PriceLevel;
