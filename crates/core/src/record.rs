//! Payloads handed from the evaluation driver to its sinks.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entity::Level;
use crate::observation::{KpiSnapshot, Kpis};

/// Upper bound on the stored reason text, in characters.
pub const MAX_REASON_CHARS: usize = 1800;

/// Separator between reasons in the stored reason text.
pub const REASON_SEPARATOR: &str = " | ";

/// Bullet placed before every stored action.
pub const ACTION_BULLET: &str = " • ";

/// Uniquely identifies a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    pub timestamp: NaiveDate,
    pub level: Level,
    pub entity_id: String,
}

/// One entity-day in the record store, with its fatigue outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatigueRecord {
    pub timestamp: NaiveDate,
    pub level: Level,
    pub entity_id: String,
    pub name: String,
    pub fatigue_flag: bool,
    pub reason: String,
    pub actions: String,
    #[serde(flatten)]
    pub kpis: Kpis,
}

impl FatigueRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey {
            timestamp: self.timestamp,
            level: self.level,
            entity_id: self.entity_id.clone(),
        }
    }
}

/// Join reasons for storage and cap the result at [`MAX_REASON_CHARS`].
pub fn reason_text(reasons: &[String]) -> String {
    reasons
        .join(REASON_SEPARATOR)
        .chars()
        .take(MAX_REASON_CHARS)
        .collect()
}

/// Render actions as a single bulleted line; empty input renders empty.
pub fn actions_text(actions: &[String]) -> String {
    if actions.is_empty() {
        return String::new();
    }
    format!("{ACTION_BULLET}{}", actions.join(ACTION_BULLET))
}

/// Everything an alert channel needs to describe one fatigued entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatigueAlert {
    pub client_name: String,
    pub level: Level,
    pub entity_id: String,
    pub entity_name: String,
    pub date: NaiveDate,
    pub reason_text: String,
    pub actions: Vec<String>,
    pub kpis: KpiSnapshot,
}
