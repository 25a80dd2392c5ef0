//! Locate a client's daily input files under the data directory.
//!
//! Layout: `<data_dir>/<Client_Name>/<level>_*.jsonl`.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use cenus_core::Level;

/// Directory holding a client's input files.
pub fn client_dir(data_dir: &Path, dir_name: &str) -> PathBuf {
    data_dir.join(dir_name)
}

/// Input files for `level` in `dir`, sorted by file name.
///
/// Only the directory itself is searched. A missing directory yields nothing.
pub fn discover_inputs(dir: &Path, level: Level) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }

    let prefix = format!("{}_", level.as_str());
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.file_name()
                .to_str()
                .map(|n| n.starts_with(&prefix) && n.ends_with(".jsonl"))
                .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect();

    files.sort();
    files
}
