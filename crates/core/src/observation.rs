use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::coerce::lenient_f64;
use crate::entity::Level;

/// The nine KPIs tracked per entity per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Click-through rate, in percent.
    Ctr,
    /// Return on ad spend (ratio).
    Roas,
    /// Cost per mille.
    Cpm,
    /// Cost per click.
    Cpc,
    /// Impressions per unique reach.
    Frequency,
    Impressions,
    Spend,
    Clicks,
    /// Platform-defined conversion count.
    Results,
}

impl Metric {
    pub const ALL: [Metric; 9] = [
        Metric::Ctr,
        Metric::Roas,
        Metric::Cpm,
        Metric::Cpc,
        Metric::Frequency,
        Metric::Impressions,
        Metric::Spend,
        Metric::Clicks,
        Metric::Results,
    ];

    /// Field name on the observation record.
    pub fn key(&self) -> &'static str {
        match self {
            Metric::Ctr => "kpis_ctr",
            Metric::Roas => "kpis_roas",
            Metric::Cpm => "kpis_cpm",
            Metric::Cpc => "kpis_cpc",
            Metric::Frequency => "kpis_frequency",
            Metric::Impressions => "kpis_impressions",
            Metric::Spend => "kpis_spend",
            Metric::Clicks => "kpis_clicks",
            Metric::Results => "kpis_results",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Daily KPI values. Every field is optional: absent means "not reported",
/// which is not the same as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub kpis_ctr: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub kpis_roas: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub kpis_cpm: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub kpis_cpc: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub kpis_frequency: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub kpis_impressions: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub kpis_spend: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub kpis_clicks: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub kpis_results: Option<f64>,
}

impl Kpis {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Ctr => self.kpis_ctr,
            Metric::Roas => self.kpis_roas,
            Metric::Cpm => self.kpis_cpm,
            Metric::Cpc => self.kpis_cpc,
            Metric::Frequency => self.kpis_frequency,
            Metric::Impressions => self.kpis_impressions,
            Metric::Spend => self.kpis_spend,
            Metric::Clicks => self.kpis_clicks,
            Metric::Results => self.kpis_results,
        }
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        let slot = match metric {
            Metric::Ctr => &mut self.kpis_ctr,
            Metric::Roas => &mut self.kpis_roas,
            Metric::Cpm => &mut self.kpis_cpm,
            Metric::Cpc => &mut self.kpis_cpc,
            Metric::Frequency => &mut self.kpis_frequency,
            Metric::Impressions => &mut self.kpis_impressions,
            Metric::Spend => &mut self.kpis_spend,
            Metric::Clicks => &mut self.kpis_clicks,
            Metric::Results => &mut self.kpis_results,
        };
        *slot = value;
    }
}

/// One entity's metrics for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Calendar date, `YYYY-MM-DD`.
    pub timestamp: NaiveDate,
    pub level: Level,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub kpis: Kpis,
}

impl Observation {
    /// Identifier of the entity this row belongs to at `level`.
    ///
    /// Empty identifiers count as absent.
    pub fn entity_id(&self, level: Level) -> Option<&str> {
        let id = match level {
            Level::Campaign => self.campaign_id.as_deref(),
            Level::AdSet => self.adset_id.as_deref(),
            Level::Ad => self.ad_id.as_deref(),
        };
        id.filter(|s| !s.is_empty())
    }

    pub fn metric(&self, metric: Metric) -> Option<f64> {
        self.kpis.get(metric)
    }

    /// Compact KPI view carried on alerts.
    pub fn snapshot(&self) -> KpiSnapshot {
        KpiSnapshot {
            roas: self.kpis.kpis_roas,
            cpm: self.kpis.kpis_cpm,
            ctr: self.kpis.kpis_ctr,
            spend: self.kpis.kpis_spend,
            results: self.kpis.kpis_results,
        }
    }
}

/// The representative KPIs shown alongside an alert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiSnapshot {
    pub roas: Option<f64>,
    pub cpm: Option<f64>,
    pub ctr: Option<f64>,
    pub spend: Option<f64>,
    pub results: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_full_row() {
        let row: Observation = serde_json::from_str(
            r#"{
                "timestamp": "2025-03-14",
                "level": "Ad",
                "campaign_id": "cmp_1",
                "adset_id": "set_1",
                "ad_id": "ad_1",
                "name": "Spring Promo",
                "kpis_ctr": 1.25,
                "kpis_roas": "2.5",
                "kpis_results": 12,
                "status": "Active"
            }"#,
        )
        .unwrap();

        assert_eq!(row.timestamp, NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
        assert_eq!(row.level, Level::Ad);
        assert_eq!(row.entity_id(Level::Ad), Some("ad_1"));
        assert_eq!(row.entity_id(Level::Campaign), Some("cmp_1"));
        assert_eq!(row.metric(Metric::Ctr), Some(1.25));
        assert_eq!(row.metric(Metric::Roas), Some(2.5));
        assert_eq!(row.metric(Metric::Results), Some(12.0));
        assert_eq!(row.metric(Metric::Cpm), None);
    }

    #[test]
    fn empty_id_counts_as_absent() {
        let row: Observation = serde_json::from_str(
            r#"{"timestamp": "2025-03-14", "level": "campaign", "campaign_id": ""}"#,
        )
        .unwrap();
        assert_eq!(row.entity_id(Level::Campaign), None);
        assert_eq!(row.entity_id(Level::Ad), None);
        assert_eq!(row.name, "");
    }

    #[test]
    fn malformed_date_is_rejected() {
        let res = serde_json::from_str::<Observation>(r#"{"timestamp": "14/03/2025", "level": "ad"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn serialization_skips_missing_metrics() {
        let mut kpis = Kpis::default();
        kpis.set(Metric::Spend, Some(35.0));
        let json = serde_json::to_value(&kpis).unwrap();
        assert_eq!(json, serde_json::json!({"kpis_spend": 35.0}));
    }

    #[test]
    fn metric_keys_match_fields() {
        let mut kpis = Kpis::default();
        for (i, m) in Metric::ALL.iter().enumerate() {
            kpis.set(*m, Some(i as f64));
        }
        let json = serde_json::to_value(&kpis).unwrap();
        for (i, m) in Metric::ALL.iter().enumerate() {
            assert_eq!(json[m.key()], serde_json::json!(i as f64));
        }
    }
}
