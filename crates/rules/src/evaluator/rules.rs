//! The four fatigue rules: conditions, reason text and recommended actions.

use serde::{Deserialize, Serialize};

use crate::thresholds::ThresholdConfig;

use super::Deltas;

const SATURATION_ACTIONS: [&str; 3] = [
    "Rotate new creative (fresh hook/thumbnail within first 3s).",
    "Broaden/exclude recent engagers to reset Frequency.",
    "Shift spend to best placements (Reels/Stories) for lower CPM.",
];

const EFFICIENCY_ACTIONS: [&str; 3] = [
    "Swap to proven winner creative (highest ROAS past 14d).",
    "Test price/offer/urgency in headline or on landing page.",
    "Reduce spend cap or tighten audience until creative refresh.",
];

const AUCTION_PRESSURE_ACTIONS: [&str; 3] = [
    "Try square/vertical cut for mobile-first placements.",
    "Refine audience (exclude recent purchasers, add broad LAL).",
    "Test value-led hook addressing objections in first 3s.",
];

const COST_PER_RESULT_ACTIONS: [&str; 3] = [
    "Improve thumb/first frame to lift CTR.",
    "Move budget to higher-CTR placement (e.g., Reels).",
    "Add stronger CTA on-video and in primary text.",
];

/// A single fatigue rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatigueRule {
    /// Frequency up while CTR is down.
    Saturation,
    /// ROAS down.
    Efficiency,
    /// CPM up while CTR is down.
    AuctionPressure,
    /// CPC up while results are down.
    CostPerResult,
}

impl FatigueRule {
    /// All rules in evaluation order. Reasons and actions are emitted in this order.
    pub const ALL: [FatigueRule; 4] = [
        FatigueRule::Saturation,
        FatigueRule::Efficiency,
        FatigueRule::AuctionPressure,
        FatigueRule::CostPerResult,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            FatigueRule::Saturation => "saturation",
            FatigueRule::Efficiency => "efficiency",
            FatigueRule::AuctionPressure => "auction_pressure",
            FatigueRule::CostPerResult => "cost_per_result",
        }
    }

    /// Whether the rule's condition holds. Rises compare with `>=`,
    /// drops with `<= -threshold`.
    pub fn fires(&self, d: &Deltas, th: &ThresholdConfig) -> bool {
        match self {
            FatigueRule::Saturation => {
                d.frequency.pct >= th.freq_up_pct && d.ctr.pct <= -th.ctr_down_pct
            }
            FatigueRule::Efficiency => d.roas.pct <= -th.roas_down_pct,
            FatigueRule::AuctionPressure => {
                d.cpm.pct >= th.cpm_up_pct && d.ctr.pct <= -th.ctr_down_pct
            }
            FatigueRule::CostPerResult => {
                d.cpc.pct >= th.cpc_rule_threshold() && d.results.pct <= -th.results_down_pct
            }
        }
    }

    /// Human-readable explanation embedding the before/after values.
    pub fn reason(&self, d: &Deltas) -> String {
        let days = d.window_days;
        match self {
            FatigueRule::Saturation => format!(
                "Frequency ↑ {:.0}% vs {days}d (from {:.2} to {:.2}) while CTR ↓ {:.0}% (from {:.2}% to {:.2}%). → Audience saturation.",
                d.frequency.pct,
                d.frequency.baseline,
                d.frequency.current,
                d.ctr.pct.abs(),
                d.ctr.baseline,
                d.ctr.current,
            ),
            FatigueRule::Efficiency => format!(
                "ROAS ↓ {:.0}% vs {days}d (from {:.2} to {:.2}).",
                d.roas.pct.abs(),
                d.roas.baseline,
                d.roas.current,
            ),
            FatigueRule::AuctionPressure => format!(
                "CPM ↑ {:.0}% vs {days}d (from ${:.2} to ${:.2}) while CTR ↓ {:.0}%. → Auction pressure/creative mismatch.",
                d.cpm.pct,
                d.cpm.baseline,
                d.cpm.current,
                d.ctr.pct.abs(),
            ),
            FatigueRule::CostPerResult => format!(
                "CPC ↑ {:.0}% and Results ↓ {:.0}% vs {days}d.",
                d.cpc.pct,
                d.results.pct.abs(),
            ),
        }
    }

    /// Recommended actions, in the order they should be presented.
    pub fn actions(&self) -> &'static [&'static str] {
        match self {
            FatigueRule::Saturation => &SATURATION_ACTIONS,
            FatigueRule::Efficiency => &EFFICIENCY_ACTIONS,
            FatigueRule::AuctionPressure => &AUCTION_PRESSURE_ACTIONS,
            FatigueRule::CostPerResult => &COST_PER_RESULT_ACTIONS,
        }
    }
}

impl std::fmt::Display for FatigueRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}
