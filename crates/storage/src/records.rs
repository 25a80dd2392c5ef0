//! File-backed fatigue record store.
//!
//! Records are kept in memory keyed by `(timestamp, level, entity_id)` and
//! written to a JSONL file on [`JsonlRecordStore::flush`]. The file is
//! replaced atomically through a temporary sibling.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use cenus_core::{FatigueRecord, RecordKey};

use crate::error::StorageError;
use crate::jsonl::{read_jsonl, write_jsonl};

/// Whether an upsert inserted a new entry or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Created,
    Updated,
}

pub struct JsonlRecordStore {
    path: PathBuf,
    records: Mutex<IndexMap<RecordKey, FatigueRecord>>,
}

impl JsonlRecordStore {
    /// Open the store at `path`, loading any records already there.
    /// A missing file is an empty store. A file with unreadable lines is
    /// refused, since the next flush would drop them.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let mut records = IndexMap::new();

        if path.exists() {
            let report = read_jsonl::<FatigueRecord>(&path)?;
            if let Some(bad) = report.bad_lines.first() {
                return Err(StorageError::Format {
                    path: path.display().to_string(),
                    message: format!(
                        "{} unreadable record(s), first at line {}: {}",
                        report.bad_lines.len(),
                        bad.line,
                        bad.error
                    ),
                });
            }
            for record in report.rows {
                records.insert(record.key(), record);
            }
            debug!(path = %path.display(), records = records.len(), "loaded record store");
        }

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert `record`, replacing any record with the same key.
    pub fn upsert(&self, record: FatigueRecord) -> Result<UpsertOutcome, StorageError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| StorageError::Other("record store lock poisoned".into()))?;
        let outcome = match records.insert(record.key(), record) {
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Created,
        };
        Ok(outcome)
    }

    pub fn get(&self, key: &RecordKey) -> Option<FatigueRecord> {
        self.records.lock().ok()?.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records, ordered by key.
    pub fn snapshot(&self) -> Vec<FatigueRecord> {
        let Ok(records) = self.records.lock() else {
            return Vec::new();
        };
        let mut all: Vec<FatigueRecord> = records.values().cloned().collect();
        all.sort_by_key(|r| r.key());
        all
    }

    /// Write every record to disk.
    pub fn flush(&self) -> Result<usize, StorageError> {
        let all = self.snapshot();
        let tmp = self.path.with_extension("jsonl.tmp");
        let written = write_jsonl(&tmp, &all)?;
        std::fs::rename(&tmp, &self.path)?;
        info!(path = %self.path.display(), records = written, "record store saved");
        Ok(written)
    }
}
