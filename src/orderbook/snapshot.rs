//! Read-only top-of-book projection and optional checksummed package.

use crate::orderbook::trade::Trade;
use crate::tick::Tick;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One level of depth: a price and its aggregate resting quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: Tick,
    pub aggregate_quantity: u64,
}

/// A read-only projection of the book observable between events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub best_bid: Option<Tick>,
    pub best_ask: Option<Tick>,
    /// `None` unless both sides are non-empty.
    pub spread: Option<i64>,
    /// `None` unless both sides are non-empty. Doubled to represent a
    /// possible half-tick exactly: divide by 2.0 to recover the real mid.
    pub mid_doubled: Option<i64>,
    pub bid_depth: Vec<DepthLevel>,
    pub ask_depth: Vec<DepthLevel>,
    pub last_trade: Option<Trade>,
}

impl BookSnapshot {
    /// Canonical JSON serialization used as the digest input for
    /// [`SnapshotPackage`]. Field order is fixed by this struct's
    /// declaration, so two equal snapshots always hash identically.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("BookSnapshot serialization is infallible")
    }
}

/// A snapshot paired with a digest of its canonical serialization, so a
/// consumer can detect a corrupted or truncated transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPackage {
    pub snapshot: BookSnapshot,
    pub checksum: String,
}

impl SnapshotPackage {
    pub fn new(snapshot: BookSnapshot) -> Self {
        let checksum = Self::digest(&snapshot);
        Self { snapshot, checksum }
    }

    fn digest(snapshot: &BookSnapshot) -> String {
        let mut hasher = Sha256::new();
        hasher.update(snapshot.canonical_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// True if the stored checksum matches the snapshot's current
    /// canonical serialization.
    pub fn verify(&self) -> bool {
        self.checksum == Self::digest(&self.snapshot)
    }
}
