//! Typed fatigue thresholds parsed from a loosely typed settings map.
//!
//! Settings arrive as `key → value` pairs where values may be numbers or
//! numeric strings. [`ThresholdConfig::from_settings`] is the only place
//! that representation is interpreted; everything downstream sees `f64`s.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use cenus_core::coerce;

pub const FREQ_UP_PCT: &str = "FREQ_UP_PCT";
pub const CTR_DOWN_PCT: &str = "CTR_DOWN_PCT";
pub const ROAS_DOWN_PCT: &str = "ROAS_DOWN_PCT";
pub const CPM_UP_PCT: &str = "CPM_UP_PCT";
pub const CPC_UP_PCT: &str = "CPC_UP_PCT";
pub const RESULTS_DOWN_PCT: &str = "RESULTS_DOWN_PCT";

/// Every recognized settings key, in declaration order.
pub const THRESHOLD_KEYS: [&str; 6] = [
    FREQ_UP_PCT,
    CTR_DOWN_PCT,
    ROAS_DOWN_PCT,
    CPM_UP_PCT,
    CPC_UP_PCT,
    RESULTS_DOWN_PCT,
];

/// Percentage thresholds for the fatigue rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Frequency rise that counts as saturation.
    pub freq_up_pct: f64,
    /// CTR drop shared by the saturation and auction-pressure rules.
    pub ctr_down_pct: f64,
    /// ROAS drop that counts as an efficiency loss.
    pub roas_down_pct: f64,
    /// CPM rise for auction pressure; also the CPC rise for the cost/results rule.
    pub cpm_up_pct: f64,
    /// Parsed and carried, but no rule reads it. See [`Self::cpc_rule_threshold`].
    pub cpc_up_pct: f64,
    /// Results drop for the cost/results rule.
    pub results_down_pct: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            freq_up_pct: 35.0,
            ctr_down_pct: 25.0,
            roas_down_pct: 30.0,
            cpm_up_pct: 40.0,
            cpc_up_pct: 30.0,
            results_down_pct: 30.0,
        }
    }
}

impl ThresholdConfig {
    /// Build thresholds from a settings map, key by key.
    ///
    /// Absent keys and values that are not numbers fall back to the
    /// compiled-in default. Unknown keys are ignored.
    pub fn from_settings(settings: &HashMap<String, Value>) -> Self {
        let defaults = Self::default();
        let pick = |key: &str, default: f64| -> f64 {
            let raw = settings.get(key);
            if let Some(bad) = raw.filter(|v| coerce::to_f64(v).is_none()) {
                tracing::warn!(key, value = %bad, default, "invalid threshold value, using default");
            }
            coerce::or_default(raw, default)
        };

        for key in settings.keys() {
            if !THRESHOLD_KEYS.contains(&key.as_str()) {
                tracing::debug!(key = %key, "ignoring unknown settings key");
            }
        }

        Self {
            freq_up_pct: pick(FREQ_UP_PCT, defaults.freq_up_pct),
            ctr_down_pct: pick(CTR_DOWN_PCT, defaults.ctr_down_pct),
            roas_down_pct: pick(ROAS_DOWN_PCT, defaults.roas_down_pct),
            cpm_up_pct: pick(CPM_UP_PCT, defaults.cpm_up_pct),
            cpc_up_pct: pick(CPC_UP_PCT, defaults.cpc_up_pct),
            results_down_pct: pick(RESULTS_DOWN_PCT, defaults.results_down_pct),
        }
    }

    /// Threshold applied to the CPC rise in the cost/results rule.
    ///
    /// Deliberately `cpm_up_pct`, not `cpc_up_pct`: alert wording and
    /// historical flags were produced with this coupling.
    pub fn cpc_rule_threshold(&self) -> f64 {
        self.cpm_up_pct
    }

    /// Key/value pairs as stored in a settings file.
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        vec![
            (FREQ_UP_PCT, self.freq_up_pct),
            (CTR_DOWN_PCT, self.ctr_down_pct),
            (ROAS_DOWN_PCT, self.roas_down_pct),
            (CPM_UP_PCT, self.cpm_up_pct),
            (CPC_UP_PCT, self.cpc_up_pct),
            (RESULTS_DOWN_PCT, self.results_down_pct),
        ]
    }
}
