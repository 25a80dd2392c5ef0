//! Per-entity grouping and trailing-window slicing of daily observations.

use chrono::NaiveDate;
use indexmap::IndexMap;

use cenus_core::{Level, Observation};

/// Partition rows into per-entity series keyed by the id field of `level`.
///
/// Rows without an identifier at that level are dropped. Entities keep the
/// order in which they first appear; rows keep their input order.
pub fn group_by_entity<I>(rows: I, level: Level) -> IndexMap<String, Vec<Observation>>
where
    I: IntoIterator<Item = Observation>,
{
    let mut groups: IndexMap<String, Vec<Observation>> = IndexMap::new();
    let mut dropped = 0usize;

    for row in rows {
        match row.entity_id(level).map(str::to_string) {
            Some(id) => groups.entry(id).or_default().push(row),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::debug!(
            level = level.as_str(),
            id_field = level.id_field(),
            dropped,
            "rows without an entity id were dropped"
        );
    }

    groups
}

/// Sort a series ascending by date and keep the most recent `last_n` rows.
///
/// The sort is stable, so rows sharing a date keep their relative order.
pub fn slice_days(mut series: Vec<Observation>, last_n: usize) -> Vec<Observation> {
    series.sort_by_key(|o| o.timestamp);
    let start = series.len().saturating_sub(last_n);
    series.split_off(start)
}

/// The latest observation and the baseline rows immediately before it.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationWindow<'a> {
    pub baseline: &'a [Observation],
    pub latest: &'a Observation,
}

/// Split an ascending series into its baseline window and latest day.
///
/// Returns `None` when the series has fewer than `baseline_days + 1` rows.
pub fn split_window(series: &[Observation], baseline_days: usize) -> Option<EvaluationWindow<'_>> {
    if series.len() < baseline_days + 1 {
        return None;
    }
    let (latest, rest) = series.split_last()?;
    let baseline = &rest[rest.len() - baseline_days..];
    Some(EvaluationWindow { baseline, latest })
}

/// First date that occurs more than once in an ascending series.
pub fn find_duplicate_date(series: &[Observation]) -> Option<NaiveDate> {
    series
        .windows(2)
        .find(|pair| pair[0].timestamp == pair[1].timestamp)
        .map(|pair| pair[0].timestamp)
}
