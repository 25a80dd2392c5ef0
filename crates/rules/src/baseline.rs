//! Rolling baseline: per-metric mean over the days before the latest one.

use std::collections::BTreeMap;

use serde::Serialize;

use cenus_core::{Metric, Observation};

/// Mean value of every tracked metric across a baseline window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Baseline {
    /// Number of rows the baseline was computed from.
    pub days: usize,
    means: BTreeMap<Metric, f64>,
}

impl Baseline {
    /// Baseline value for `metric`; `0.0` when the window never reported it.
    pub fn get(&self, metric: Metric) -> f64 {
        self.means.get(&metric).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.means.iter().map(|(m, v)| (*m, *v))
    }
}

/// Compute the baseline for a window of daily rows of one entity.
///
/// For each metric, the arithmetic mean of the non-missing values; a metric
/// missing from every row gets exactly `0.0`.
pub fn rolling_baseline(rows: &[Observation]) -> Baseline {
    let means = Metric::ALL
        .iter()
        .map(|&metric| {
            let values: Vec<f64> = rows.iter().filter_map(|r| r.metric(metric)).collect();
            (metric, mean(&values))
        })
        .collect();

    Baseline {
        days: rows.len(),
        means,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use cenus_core::{Kpis, Level};
    use chrono::NaiveDate;

    fn row(d: u32, ctr: Option<f64>, roas: Option<f64>) -> Observation {
        let mut kpis = Kpis::default();
        kpis.set(Metric::Ctr, ctr);
        kpis.set(Metric::Roas, roas);
        Observation {
            timestamp: NaiveDate::from_ymd_opt(2025, 6, d).unwrap(),
            level: Level::Ad,
            campaign_id: None,
            adset_id: None,
            ad_id: Some("ad_1".to_string()),
            name: String::new(),
            kpis,
        }
    }

    #[test]
    fn seven_day_ctr_mean() {
        let ctrs = [1.5, 1.6, 1.5, 1.6, 1.5, 1.6, 1.5];
        let rows: Vec<_> = ctrs
            .iter()
            .enumerate()
            .map(|(i, c)| row(i as u32 + 1, Some(*c), None))
            .collect();

        let base = rolling_baseline(&rows);
        assert_eq!(base.days, 7);
        assert!((base.get(Metric::Ctr) - 1.542857142857143).abs() < 1e-9);
    }

    #[test]
    fn missing_values_are_skipped_not_zeroed() {
        let rows = vec![row(1, Some(2.0), None), row(2, None, None), row(3, Some(4.0), None)];
        let base = rolling_baseline(&rows);
        assert_eq!(base.get(Metric::Ctr), 3.0);
    }

    #[test]
    fn metric_absent_everywhere_is_exactly_zero() {
        let rows = vec![row(1, Some(1.0), None), row(2, Some(1.0), None)];
        let base = rolling_baseline(&rows);
        assert_eq!(base.get(Metric::Roas), 0.0);
        assert_eq!(base.get(Metric::Frequency), 0.0);
    }

    #[test]
    fn empty_window_is_all_zero() {
        let base = rolling_baseline(&[]);
        assert_eq!(base.days, 0);
        assert!(base.iter().all(|(_, v)| v == 0.0));
        assert_eq!(base.iter().count(), Metric::ALL.len());
    }
}
