//! Evaluation driver: runs the evaluator over every entity of one client
//! and hands the outcomes to the record and alert sinks.
//!
//! Entities are processed one after another. A record sink error is logged
//! and counted in the [`RunSummary`]; the run always continues with the next
//! entity. Alert delivery failures are tracked separately.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use cenus_core::{
    actions_text, reason_text, CenusError, FatigueAlert, FatigueRecord, Level, Observation,
};

use crate::evaluator::{evaluate, Assessment};
use crate::thresholds::ThresholdConfig;
use crate::windowing::{find_duplicate_date, group_by_entity, slice_days};

// ── Sinks ───────────────────────────────────────────────────────────

/// Error reported by a sink. Never aborts a run.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("record store error: {0}")]
    Store(String),

    #[error("alert delivery error: {0}")]
    Delivery(String),
}

/// Destination for per-entity fatigue records.
#[async_trait::async_trait]
pub trait RecordSink: Send + Sync {
    /// Insert or replace the record keyed by `(timestamp, level, entity_id)`.
    async fn upsert(&self, record: &FatigueRecord) -> Result<(), SinkError>;
}

/// Destination for alerts about fatigued entities.
#[async_trait::async_trait]
pub trait AlertSink: Send + Sync {
    /// Short name used in logs.
    fn sink_name(&self) -> &str;

    async fn send_alert(&self, alert: &FatigueAlert) -> Result<(), SinkError>;
}

// ── Settings and summary ────────────────────────────────────────────

/// Level and window sizes for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSettings {
    pub level: Level,
    /// Trailing days kept per entity.
    pub days: usize,
    /// Days averaged into the baseline.
    pub baseline_days: usize,
}

impl RunSettings {
    /// Validate that `days` can hold the baseline plus the latest day.
    pub fn new(level: Level, days: usize, baseline_days: usize) -> Result<Self, CenusError> {
        if baseline_days == 0 || days < baseline_days + 1 {
            return Err(CenusError::InvalidWindow {
                days,
                baseline_days,
            });
        }
        Ok(Self {
            level,
            days,
            baseline_days,
        })
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            level: Level::Ad,
            days: 14,
            baseline_days: 7,
        }
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Entities with enough history that were evaluated.
    pub checked: usize,
    /// Checked entities judged fatigued.
    pub flagged: usize,
    /// Entities with too little history.
    pub skipped: usize,
    /// Checked entities whose record could not be stored.
    pub failed: usize,
    pub alerts_sent: usize,
    pub alerts_failed: usize,
}

impl RunSummary {
    /// Add another summary's counters into this one.
    pub fn absorb(&mut self, other: &RunSummary) {
        self.checked += other.checked;
        self.flagged += other.flagged;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.alerts_sent += other.alerts_sent;
        self.alerts_failed += other.alerts_failed;
    }
}

// ── Driver ──────────────────────────────────────────────────────────

/// Sequences grouping, windowing, evaluation and sink delivery.
pub struct EvaluationDriver {
    settings: RunSettings,
    records: Option<Arc<dyn RecordSink>>,
    alerts: Vec<Arc<dyn AlertSink>>,
}

impl EvaluationDriver {
    pub fn new(settings: RunSettings) -> Self {
        Self {
            settings,
            records: None,
            alerts: Vec::new(),
        }
    }

    pub fn with_record_sink(mut self, sink: Arc<dyn RecordSink>) -> Self {
        self.records = Some(sink);
        self
    }

    pub fn with_alert_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.alerts.push(sink);
        self
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Evaluate every entity of `client_name` found in `rows`.
    ///
    /// Rows are attributed by the id field of the configured level only.
    /// A client without qualifying entities yields an all-zero summary.
    pub async fn run_for_client(
        &self,
        client_name: &str,
        rows: Vec<Observation>,
        th: &ThresholdConfig,
    ) -> RunSummary {
        let level = self.settings.level;
        let mut summary = RunSummary::default();

        for (entity_id, series) in group_by_entity(rows, level) {
            let series = slice_days(series, self.settings.days);

            if let Some(date) = find_duplicate_date(&series) {
                warn!(
                    client = client_name,
                    entity_id = %entity_id,
                    %date,
                    "series has more than one row for a date"
                );
            }

            let Some(assessment) = evaluate(&series, th, self.settings.baseline_days) else {
                debug!(
                    client = client_name,
                    entity_id = %entity_id,
                    rows = series.len(),
                    needed = self.settings.baseline_days + 1,
                    "not enough history, skipping entity"
                );
                summary.skipped += 1;
                continue;
            };

            summary.checked += 1;
            self.handle(client_name, &entity_id, &assessment, &mut summary)
                .await;
        }

        info!(
            client = client_name,
            level = level.as_str(),
            checked = summary.checked,
            flagged = summary.flagged,
            skipped = summary.skipped,
            failed = summary.failed,
            "fatigue run complete"
        );
        summary
    }

    async fn handle(
        &self,
        client_name: &str,
        entity_id: &str,
        assessment: &Assessment<'_>,
        summary: &mut RunSummary,
    ) {
        let latest = assessment.latest;
        let verdict = &assessment.verdict;
        let reason = reason_text(&verdict.reasons);

        if let Some(sink) = &self.records {
            let record = FatigueRecord {
                timestamp: latest.timestamp,
                level: self.settings.level,
                entity_id: entity_id.to_string(),
                name: latest.name.clone(),
                fatigue_flag: verdict.is_fatigued,
                reason: reason.clone(),
                actions: actions_text(&verdict.actions),
                kpis: latest.kpis.clone(),
            };
            if let Err(e) = sink.upsert(&record).await {
                warn!(client = client_name, entity_id, error = %e, "failed to store fatigue record");
                summary.failed += 1;
            }
        }

        if !verdict.is_fatigued {
            info!(client = client_name, entity_id, "no fatigue");
            return;
        }

        summary.flagged += 1;
        info!(
            client = client_name,
            entity_id,
            name = %latest.name,
            date = %latest.timestamp,
            rules = verdict.reasons.len(),
            "fatigue detected"
        );

        let alert = FatigueAlert {
            client_name: client_name.to_string(),
            level: self.settings.level,
            entity_id: entity_id.to_string(),
            entity_name: latest.name.clone(),
            date: latest.timestamp,
            reason_text: reason,
            actions: verdict.actions.clone(),
            kpis: latest.snapshot(),
        };

        for sink in &self.alerts {
            match sink.send_alert(&alert).await {
                Ok(()) => summary.alerts_sent += 1,
                Err(e) => {
                    warn!(
                        client = client_name,
                        entity_id,
                        sink = sink.sink_name(),
                        error = %e,
                        "alert delivery failed"
                    );
                    summary.alerts_failed += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use chrono::NaiveDate;
    use cenus_core::{Kpis, Metric};

    struct MemoryRecords {
        records: Mutex<Vec<FatigueRecord>>,
    }

    #[async_trait::async_trait]
    impl RecordSink for MemoryRecords {
        async fn upsert(&self, record: &FatigueRecord) -> Result<(), SinkError> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    struct CountingAlerts {
        sent: Mutex<Vec<FatigueAlert>>,
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingAlerts {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait::async_trait]
    impl AlertSink for CountingAlerts {
        fn sink_name(&self) -> &str {
            "counting"
        }

        async fn send_alert(&self, alert: &FatigueAlert) -> Result<(), SinkError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SinkError::Delivery("connection refused".into()));
            }
            self.sent.lock().unwrap().push(alert.clone());
            Ok(())
        }
    }

    struct BrokenRecords;

    #[async_trait::async_trait]
    impl RecordSink for BrokenRecords {
        async fn upsert(&self, _record: &FatigueRecord) -> Result<(), SinkError> {
            Err(SinkError::Store("disk full".into()))
        }
    }

    fn row(ad: &str, day: u32, roas: f64) -> Observation {
        let mut kpis = Kpis::default();
        kpis.set(Metric::Roas, Some(roas));
        kpis.set(Metric::Spend, Some(100.0));
        Observation {
            timestamp: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            level: Level::Ad,
            campaign_id: Some("cmp".into()),
            adset_id: Some("set".into()),
            ad_id: Some(ad.into()),
            name: format!("{ad} creative"),
            kpis,
        }
    }

    /// `ad_ok` steady, `ad_bad` loses half its ROAS on the last day,
    /// `ad_new` has three days of history.
    fn rows() -> Vec<Observation> {
        let mut rows = Vec::new();
        for day in 1..=14 {
            rows.push(row("ad_ok", day, 3.0));
            rows.push(row("ad_bad", day, if day == 14 { 1.5 } else { 3.0 }));
        }
        for day in 12..=14 {
            rows.push(row("ad_new", day, 2.0));
        }
        rows
    }

    #[test]
    fn run_settings_validate_window() {
        assert!(RunSettings::new(Level::Ad, 14, 7).is_ok());
        assert!(RunSettings::new(Level::Ad, 8, 7).is_ok());
        assert!(matches!(
            RunSettings::new(Level::Ad, 7, 7),
            Err(CenusError::InvalidWindow { days: 7, baseline_days: 7 })
        ));
        assert!(RunSettings::new(Level::Ad, 14, 0).is_err());
    }

    #[tokio::test]
    async fn flags_only_fatigued_entities() {
        let records = Arc::new(MemoryRecords {
            records: Mutex::new(Vec::new()),
        });
        let alerts = CountingAlerts::new(false);
        let driver = EvaluationDriver::new(RunSettings::default())
            .with_record_sink(records.clone())
            .with_alert_sink(alerts.clone());

        let summary = driver
            .run_for_client("Acme Co", rows(), &ThresholdConfig::default())
            .await;

        assert_eq!(summary.checked, 2);
        assert_eq!(summary.flagged, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.alerts_sent, 1);

        let stored = records.records.lock().unwrap();
        assert_eq!(stored.len(), 2);
        let bad = stored.iter().find(|r| r.entity_id == "ad_bad").unwrap();
        assert!(bad.fatigue_flag);
        assert_eq!(bad.reason, "ROAS ↓ 50% vs 7d (from 3.00 to 1.50).");
        assert!(bad.actions.starts_with(" • Swap to proven winner creative"));
        let ok = stored.iter().find(|r| r.entity_id == "ad_ok").unwrap();
        assert!(!ok.fatigue_flag);
        assert!(ok.reason.is_empty());
        assert!(ok.actions.is_empty());

        let sent = alerts.sent.lock().unwrap();
        assert_eq!(sent[0].client_name, "Acme Co");
        assert_eq!(sent[0].entity_id, "ad_bad");
        assert_eq!(sent[0].entity_name, "ad_bad creative");
        assert_eq!(sent[0].date, NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
        assert_eq!(sent[0].kpis.roas, Some(1.5));
        assert_eq!(sent[0].actions.len(), 3);
    }

    #[tokio::test]
    async fn each_alert_carries_its_own_entity() {
        let mut rows = Vec::new();
        for day in 1..=8 {
            rows.push(row("first", day, if day == 8 { 1.0 } else { 3.0 }));
            rows.push(row("second", day, if day == 8 { 0.5 } else { 2.0 }));
        }
        let alerts = CountingAlerts::new(false);
        let driver = EvaluationDriver::new(RunSettings::default()).with_alert_sink(alerts.clone());

        let summary = driver
            .run_for_client("Acme Co", rows, &ThresholdConfig::default())
            .await;
        assert_eq!(summary.flagged, 2);

        let sent = alerts.sent.lock().unwrap();
        let names: Vec<_> = sent.iter().map(|a| a.entity_name.as_str()).collect();
        assert_eq!(names, vec!["first creative", "second creative"]);
        assert_eq!(sent[0].kpis.roas, Some(1.0));
        assert_eq!(sent[1].kpis.roas, Some(0.5));
    }

    #[tokio::test]
    async fn empty_client_yields_zero_summary() {
        let alerts = CountingAlerts::new(false);
        let driver = EvaluationDriver::new(RunSettings::default()).with_alert_sink(alerts.clone());
        let summary = driver
            .run_for_client("Nobody", Vec::new(), &ThresholdConfig::default())
            .await;
        assert_eq!(summary, RunSummary::default());
        assert_eq!(alerts.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn alert_failures_do_not_count_as_evaluation_failures() {
        let failing = CountingAlerts::new(true);
        let working = CountingAlerts::new(false);
        let driver = EvaluationDriver::new(RunSettings::default())
            .with_alert_sink(failing.clone())
            .with_alert_sink(working.clone());

        let summary = driver
            .run_for_client("Acme Co", rows(), &ThresholdConfig::default())
            .await;

        assert_eq!(summary.flagged, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.alerts_failed, 1);
        assert_eq!(summary.alerts_sent, 1);
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
        assert_eq!(working.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn repeated_dates_are_evaluated_in_input_order() {
        let mut rows: Vec<Observation> = (1..=14)
            .map(|day| row("ad_bad", day, if day == 14 { 1.5 } else { 3.0 }))
            .collect();
        let mut extra = row("ad_bad", 5, 3.0);
        extra.name = "day five again".into();
        rows.insert(2, extra);

        let alerts = CountingAlerts::new(false);
        let driver = EvaluationDriver::new(RunSettings::default()).with_alert_sink(alerts.clone());
        let summary = driver
            .run_for_client("Acme Co", rows.clone(), &ThresholdConfig::default())
            .await;
        assert_eq!(summary.checked, 1);
        assert_eq!(summary.flagged, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(alerts.sent.lock().unwrap()[0].kpis.roas, Some(1.5));

        // The tie keeps its input order: the inserted row precedes day 5.
        let series = slice_days(rows, 16);
        let fives: Vec<_> = series
            .iter()
            .filter(|o| o.timestamp == NaiveDate::from_ymd_opt(2025, 3, 5).unwrap())
            .map(|o| o.name.as_str())
            .collect();
        assert_eq!(fives, vec!["day five again", "ad_bad creative"]);
    }

    #[tokio::test]
    async fn record_sink_errors_are_counted_and_alerts_still_sent() {
        let alerts = CountingAlerts::new(false);
        let driver = EvaluationDriver::new(RunSettings::default())
            .with_record_sink(Arc::new(BrokenRecords))
            .with_alert_sink(alerts.clone());

        let summary = driver
            .run_for_client("Acme Co", rows(), &ThresholdConfig::default())
            .await;
        assert_eq!(summary.checked, 2);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.alerts_sent, 1);
    }

    #[tokio::test]
    async fn rows_are_attributed_by_id_field_only() {
        let mut rows = rows();
        for r in rows.iter_mut().filter(|r| r.ad_id.as_deref() == Some("ad_bad")) {
            r.level = Level::Campaign;
        }
        let driver = EvaluationDriver::new(RunSettings::default());
        let summary = driver
            .run_for_client("Acme Co", rows, &ThresholdConfig::default())
            .await;
        assert_eq!(summary.checked, 2);
        assert_eq!(summary.flagged, 1);
    }

    #[test]
    fn summaries_absorb() {
        let mut total = RunSummary::default();
        let one = RunSummary {
            checked: 3,
            flagged: 1,
            skipped: 2,
            failed: 0,
            alerts_sent: 1,
            alerts_failed: 0,
        };
        total.absorb(&one);
        total.absorb(&one);
        assert_eq!(total.checked, 6);
        assert_eq!(total.skipped, 4);
        assert_eq!(total.alerts_sent, 2);
    }
}
