//! Fatigue rule evaluator.
//!
//! Compares the latest observation of an entity against its rolling
//! baseline and a [`ThresholdConfig`], producing a [`Verdict`]:
//!
//! 1. percent change per metric, with missing current values read as `0.0`
//! 2. each [`FatigueRule`] checked independently, in declaration order
//! 3. reasons and actions of every firing rule concatenated
//!
//! Evaluation is a pure function of its inputs.

mod rules;

use serde::{Deserialize, Serialize};

use cenus_core::{Metric, Observation};

use crate::baseline::{rolling_baseline, Baseline};
use crate::thresholds::ThresholdConfig;
use crate::windowing::split_window;

pub use rules::FatigueRule;

// ── Percent change ──────────────────────────────────────────────────

/// Percent change from `base` to `curr`.
///
/// `0.0` when either side is missing or the base is zero. Positive means
/// `curr` is above `base`.
pub fn pct_change(curr: Option<f64>, base: Option<f64>) -> f64 {
    match (curr, base) {
        (Some(curr), Some(base)) if base != 0.0 => (curr - base) / base * 100.0,
        _ => 0.0,
    }
}

// ── Deltas ──────────────────────────────────────────────────────────

/// Current value, baseline value and percent change of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricDelta {
    pub current: f64,
    pub baseline: f64,
    pub pct: f64,
}

impl MetricDelta {
    fn compute(latest: &Observation, base: &Baseline, metric: Metric) -> Self {
        let current = latest.metric(metric).unwrap_or(0.0);
        let baseline = base.get(metric);
        Self {
            current,
            baseline,
            pct: pct_change(Some(current), Some(baseline)),
        }
    }
}

/// Deltas of the metrics the rules look at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Deltas {
    pub ctr: MetricDelta,
    pub roas: MetricDelta,
    pub cpm: MetricDelta,
    pub cpc: MetricDelta,
    pub frequency: MetricDelta,
    pub results: MetricDelta,
    /// Length of the baseline window, for reason text.
    pub window_days: usize,
}

impl Deltas {
    pub fn compute(latest: &Observation, base: &Baseline) -> Self {
        Self {
            ctr: MetricDelta::compute(latest, base, Metric::Ctr),
            roas: MetricDelta::compute(latest, base, Metric::Roas),
            cpm: MetricDelta::compute(latest, base, Metric::Cpm),
            cpc: MetricDelta::compute(latest, base, Metric::Cpc),
            frequency: MetricDelta::compute(latest, base, Metric::Frequency),
            results: MetricDelta::compute(latest, base, Metric::Results),
            window_days: base.days,
        }
    }
}

// ── Verdict ─────────────────────────────────────────────────────────

/// Outcome of evaluating one entity.
///
/// When `is_fatigued` is false, `reasons` and `actions` are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_fatigued: bool,
    pub reasons: Vec<String>,
    pub actions: Vec<String>,
}

/// Evaluate the four rules for `latest` against `base`.
pub fn evaluate_rules(latest: &Observation, base: &Baseline, th: &ThresholdConfig) -> Verdict {
    let deltas = Deltas::compute(latest, base);

    let mut reasons = Vec::new();
    let mut actions = Vec::new();
    let mut fatigued = false;

    for rule in FatigueRule::ALL {
        if rule.fires(&deltas, th) {
            fatigued = true;
            reasons.push(rule.reason(&deltas));
            actions.extend(rule.actions().iter().map(|a| a.to_string()));
        }
    }

    if !fatigued {
        reasons.clear();
        actions.clear();
    }

    Verdict {
        is_fatigued: fatigued,
        reasons,
        actions,
    }
}

// ── Series evaluation ───────────────────────────────────────────────

/// Result of evaluating a series: the day judged, its baseline and the verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment<'a> {
    pub latest: &'a Observation,
    pub baseline: Baseline,
    pub verdict: Verdict,
}

/// Evaluate an ascending series of one entity.
///
/// The last row is judged against the mean of the `baseline_days` rows
/// before it. Returns `None` when the series is too short to hold both.
pub fn evaluate<'a>(
    series: &'a [Observation],
    th: &ThresholdConfig,
    baseline_days: usize,
) -> Option<Assessment<'a>> {
    let window = split_window(series, baseline_days)?;
    let baseline = rolling_baseline(window.baseline);
    let verdict = evaluate_rules(window.latest, &baseline, th);
    Some(Assessment {
        latest: window.latest,
        baseline,
        verdict,
    })
}
