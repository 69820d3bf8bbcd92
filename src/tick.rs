//! Integer tick arithmetic and price <-> tick conversion.
//!
//! Every price observable inside the matching core is an integral number
//! of ticks. Conversion to monetary units only happens at the boundary
//! (a producer or consumer), never inside the book or matching engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// A price expressed as a signed count of ticks.
///
/// `Tick` never carries a `tick_size`; that belongs to the book's
/// [`crate::orderbook::config::BookConfig`]. Two ticks are only
/// comparable when they were produced against the same `tick_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tick(pub i64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    pub fn new(value: i64) -> Self {
        Tick(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }

    /// True if `self` is a non-negative integral multiple of `tick_size`.
    pub fn is_aligned(self, tick_size: i64) -> bool {
        tick_size > 0 && self.0 >= 0 && self.0 % tick_size == 0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<i64> for Tick {
    type Output = Tick;
    fn add(self, rhs: i64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl Sub for Tick {
    type Output = i64;
    fn sub(self, rhs: Tick) -> i64 {
        self.0 - rhs.0
    }
}

/// Logical timestamp, in ticks of logical time. Strictly non-decreasing
/// across the arrival stream observed by a single dispatcher.
pub type Timestamp = i64;

/// Spread in ticks: `best_ask - best_bid`.
pub fn spread(best_bid: Tick, best_ask: Tick) -> i64 {
    best_ask.0 - best_bid.0
}

/// Mid price in ticks, doubled to represent a possible half-tick exactly
/// as an integer (`mid_doubled() / 2.0` recovers the real mid).
pub fn mid_doubled(best_bid: Tick, best_ask: Tick) -> i64 {
    best_bid.0 + best_ask.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment() {
        assert!(Tick(100).is_aligned(1));
        assert!(Tick(100).is_aligned(25));
        assert!(!Tick(101).is_aligned(25));
        assert!(!Tick(-1).is_aligned(1));
        assert!(!Tick(10).is_aligned(0));
    }

    #[test]
    fn spread_and_mid() {
        let bid = Tick(9_900);
        let ask = Tick(10_000);
        assert_eq!(spread(bid, ask), 100);
        assert_eq!(mid_doubled(bid, ask), 19_900);
    }
}
