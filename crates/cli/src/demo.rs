//! Deterministic mock series for trying the engine without real data.
//!
//! Every day is a fixed baseline scaled by a small repeating wobble; from
//! `fatigue_from` on, the fatigue multipliers are applied on top.

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};

use cenus_core::{Kpis, Level, Observation};

const BASE_CTR: f64 = 1.2;
const BASE_ROAS: f64 = 2.2;
const BASE_CPM: f64 = 10.0;
const BASE_CPC: f64 = 0.80;
const BASE_FREQUENCY: f64 = 1.6;
const BASE_IMPRESSIONS: f64 = 4500.0;
const BASE_SPEND: f64 = 35.0;
const BASE_CLICKS: f64 = 55.0;
const BASE_RESULTS: f64 = 2.0;

const WOBBLE: [f64; 3] = [0.97, 1.0, 1.03];

/// Parameters for [`generate`].
#[derive(Debug, Clone)]
pub struct DemoSpec {
    pub days: usize,
    /// Last generated date.
    pub end: NaiveDate,
    pub level: Level,
    pub entity_id: String,
    pub name: String,
    /// First fatigued day, 1-based. Beyond `days` means no fatigue.
    pub fatigue_from: usize,
}

impl DemoSpec {
    pub fn new(end: NaiveDate) -> Self {
        Self {
            days: 14,
            end,
            level: Level::Ad,
            entity_id: "1234567890".to_string(),
            name: "Mock Ad A".to_string(),
            fatigue_from: 10,
        }
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Generate `spec.days` consecutive rows ending at `spec.end`.
///
/// Fails when the first day would fall outside the supported date range.
pub fn generate(spec: &DemoSpec) -> Result<Vec<Observation>> {
    let back = spec.days.saturating_sub(1) as u64;
    let start = spec
        .end
        .checked_sub_days(Days::new(back))
        .with_context(|| format!("{} days before {} is out of range", back, spec.end))?;

    let rows = (0..spec.days)
        .map(|i| {
            let fatigued = i + 1 >= spec.fatigue_from;
            let w = WOBBLE[i % WOBBLE.len()];
            let pick = |fresh: f64, tired: f64| if fatigued { tired } else { fresh };

            let kpis = Kpis {
                kpis_ctr: Some(round_to(BASE_CTR * pick(1.0, 0.6) * w, 3)),
                kpis_roas: Some(round_to(BASE_ROAS * pick(1.0, 0.7) * w, 2)),
                kpis_cpm: Some(round_to(BASE_CPM * pick(1.0, 1.5) * w, 2)),
                kpis_cpc: Some(round_to(BASE_CPC * pick(1.0, 1.3) * w, 2)),
                kpis_frequency: Some(round_to(BASE_FREQUENCY * pick(1.0, 1.5) * w, 2)),
                kpis_impressions: Some((BASE_IMPRESSIONS * pick(1.1, 1.0) * w).round()),
                kpis_spend: Some(round_to(BASE_SPEND * pick(1.05, 1.0) * w, 2)),
                kpis_clicks: Some((BASE_CLICKS * pick(1.1, 0.8) * w).round()),
                kpis_results: Some((BASE_RESULTS * pick(1.2, 0.6) * w).round()),
            };

            let mut row = Observation {
                timestamp: start + Days::new(i as u64),
                level: spec.level,
                campaign_id: Some("cmp_mock".to_string()),
                adset_id: Some("set_mock".to_string()),
                ad_id: Some("ad_mock".to_string()),
                name: spec.name.clone(),
                kpis,
            };
            let id = Some(spec.entity_id.clone());
            match spec.level {
                Level::Campaign => row.campaign_id = id,
                Level::AdSet => row.adset_id = id,
                Level::Ad => row.ad_id = id,
            }
            row
        })
        .collect();
    Ok(rows)
}
