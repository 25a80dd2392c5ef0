//! Line-delimited JSON import and export.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use cenus_core::Observation;

use crate::error::StorageError;

/// A line that could not be parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct BadLine {
    /// 1-based line number.
    pub line: usize,
    pub error: String,
}

/// Rows read from a JSONL file plus the lines that were skipped.
#[derive(Debug, Clone)]
pub struct ImportReport<T> {
    pub rows: Vec<T>,
    pub bad_lines: Vec<BadLine>,
}

impl<T> ImportReport<T> {
    pub fn is_clean(&self) -> bool {
        self.bad_lines.is_empty()
    }
}

/// Read every line of `path` as a `T`.
///
/// Blank lines are skipped silently. Lines that fail to parse are logged,
/// recorded in the report and skipped.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<ImportReport<T>, StorageError> {
    let reader = BufReader::new(File::open(path)?);
    let mut rows = Vec::new();
    let mut bad_lines = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(trimmed) {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!(path = %path.display(), line = idx + 1, error = %e, "skipping bad line");
                bad_lines.push(BadLine {
                    line: idx + 1,
                    error: e.to_string(),
                });
            }
        }
    }

    debug!(path = %path.display(), rows = rows.len(), bad = bad_lines.len(), "read jsonl");
    Ok(ImportReport { rows, bad_lines })
}

/// Read daily observations from a JSONL file.
pub fn read_observations(path: &Path) -> Result<ImportReport<Observation>, StorageError> {
    read_jsonl(path)
}

/// Read observations from several files, concatenated in the given order.
pub fn read_observations_from(paths: &[impl AsRef<Path>]) -> Result<ImportReport<Observation>, StorageError> {
    let mut all = ImportReport {
        rows: Vec::new(),
        bad_lines: Vec::new(),
    };
    for path in paths {
        let report = read_observations(path.as_ref())?;
        all.rows.extend(report.rows);
        all.bad_lines.extend(report.bad_lines);
    }
    Ok(all)
}

/// Write `rows` to `path` as JSONL, replacing any existing file.
/// Parent directories are created. Returns the number of lines written.
pub fn write_jsonl<T: Serialize>(path: &Path, rows: &[T]) -> Result<usize, StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(File::create(path)?);
    for row in rows {
        serde_json::to_writer(&mut out, row)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(rows.len())
}

/// Append one JSON line to `path`, creating the file and its parents if needed.
pub fn append_jsonl<T: Serialize>(path: &Path, row: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut line = serde_json::to_string(row)?;
    line.push('\n');
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    Ok(())
}
