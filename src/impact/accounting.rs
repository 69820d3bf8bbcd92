//! Almgren-Chriss cost decomposition for taker fills.
//!
//! This is the one place in the crate where `f64` appears. The order
//! book and matching engine operate entirely in integer ticks; this
//! module consumes their output (a fill's price, quantity, and the
//! reference mid observed around it) and produces a cost estimate,
//! never the other way around.

use crate::order::Side;
use crate::orderbook::config::ImpactConfig;
use crate::tick::Tick;

/// Basis points are expressed over this denominator, matching the
/// fixed-point convention `orderbook::fees` uses for fee schedules.
const BASIS_POINTS_DENOMINATOR: f64 = 10_000.0;

/// The cost components attributed to a single fill.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CostBreakdown {
    pub spread_cost: f64,
    pub temporary_impact: f64,
    pub permanent_impact: f64,
    pub latency_cost: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.spread_cost + self.temporary_impact + self.permanent_impact + self.latency_cost
    }

    fn accumulate(&mut self, other: &CostBreakdown) {
        self.spread_cost += other.spread_cost;
        self.temporary_impact += other.temporary_impact;
        self.permanent_impact += other.permanent_impact;
        self.latency_cost += other.latency_cost;
    }
}

/// Everything [`SlippageAccounting::record_fill`] needs about one taker
/// fill, captured by the caller from book state around the fill (the
/// book itself carries no cost-accounting fields).
pub struct FillObservation {
    pub side: Side,
    pub quantity: u64,
    pub fill_price_ticks: Tick,
    /// Mid price, doubled per [`crate::tick::mid_doubled`], observed
    /// immediately before this fill was applied.
    pub reference_mid_doubled: i64,
    /// Mid price, doubled, at the order's `submit_ts`. Equal to
    /// `reference_mid_doubled` when the order suffered no latency.
    pub mid_at_submit_doubled: i64,
    pub submit_ts: i64,
    pub ts: i64,
}

/// Accumulates Almgren-Chriss cost components across fills within one
/// simulated session.
///
/// Temporary impact decays geometrically toward zero over
/// `decay_half_life` ticks of logical time; permanent impact persists
/// as a standing per-share shift to the fair-price estimate used as the
/// reference for subsequent fills' spread cost.
pub struct SlippageAccounting {
    config: ImpactConfig,
    permanent_shift: f64,
    last_temporary_impact: f64,
    last_update_ts: i64,
    totals: CostBreakdown,
}

impl SlippageAccounting {
    pub fn new(config: ImpactConfig) -> Self {
        Self {
            config,
            permanent_shift: 0.0,
            last_temporary_impact: 0.0,
            last_update_ts: 0,
            totals: CostBreakdown::default(),
        }
    }

    fn participation(&self, quantity: u64) -> f64 {
        if self.config.adv == 0 {
            return 0.0;
        }
        quantity as f64 / self.config.adv as f64
    }

    /// Temporary impact remaining from prior fills, decayed to `now_ts`.
    fn decayed_temporary_impact(&self, now_ts: i64) -> f64 {
        if self.config.decay_half_life <= 0 {
            return 0.0;
        }
        let elapsed = (now_ts - self.last_update_ts).max(0) as f64;
        let half_lives = elapsed / self.config.decay_half_life as f64;
        self.last_temporary_impact * 0.5_f64.powf(half_lives)
    }

    /// Fold one fill into the running totals; returns the components
    /// attributed to this fill alone.
    pub fn record_fill(&mut self, fill: &FillObservation) -> CostBreakdown {
        let sign = fill.side.sign() as f64;
        let qty = fill.quantity as f64;
        let participation = self.participation(fill.quantity);

        let reference_mid = fill.reference_mid_doubled as f64 / 2.0 + self.permanent_shift;
        let spread_cost = (fill.fill_price_ticks.value() as f64 - reference_mid) * sign * qty;

        let eta = self.config.eta_bps as f64 / BASIS_POINTS_DENOMINATOR;
        let decayed = self.decayed_temporary_impact(fill.ts);
        let temporary_impact = decayed + eta * participation * qty;

        let gamma = self.config.gamma_bps as f64 / BASIS_POINTS_DENOMINATOR;
        let permanent_impact = gamma * participation * qty;
        self.permanent_shift += sign * permanent_impact / qty.max(1.0);

        let latency_cost = if fill.ts != fill.submit_ts {
            let mid_now = fill.reference_mid_doubled as f64 / 2.0;
            let mid_submit = fill.mid_at_submit_doubled as f64 / 2.0;
            (mid_now - mid_submit) * sign * qty
        } else {
            0.0
        };

        self.last_temporary_impact = temporary_impact;
        self.last_update_ts = fill.ts;

        let breakdown = CostBreakdown { spread_cost, temporary_impact, permanent_impact, latency_cost };
        self.totals.accumulate(&breakdown);
        breakdown
    }

    pub fn totals(&self) -> CostBreakdown {
        self.totals
    }
}
