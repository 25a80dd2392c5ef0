//! Append-only log of every alert sent.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cenus_core::FatigueAlert;

use crate::error::StorageError;
use crate::jsonl::{append_jsonl, read_jsonl};

/// An alert as stored in the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedAlert {
    pub logged_at: DateTime<Utc>,
    #[serde(flatten)]
    pub alert: FatigueAlert,
}

pub struct AlertLog {
    path: PathBuf,
}

impl AlertLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `alert`, stamped with the current UTC time.
    pub fn append(&self, alert: &FatigueAlert) -> Result<LoggedAlert, StorageError> {
        let entry = LoggedAlert {
            logged_at: Utc::now(),
            alert: alert.clone(),
        };
        append_jsonl(&self.path, &entry)?;
        Ok(entry)
    }

    /// Every logged alert, oldest first. A missing log is empty.
    pub fn entries(&self) -> Result<Vec<LoggedAlert>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        Ok(read_jsonl(&self.path)?.rows)
    }
}
