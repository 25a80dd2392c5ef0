//! Per-client threshold settings files.
//!
//! A settings file is a flat YAML (or JSON) mapping of key to value. Values
//! stay loosely typed here; turning them into thresholds happens in the
//! rules crate.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::StorageError;

/// Read a settings file. A missing file is an empty map.
pub fn read_settings(path: &Path) -> Result<IndexMap<String, Value>, StorageError> {
    if !path.exists() {
        return Ok(IndexMap::new());
    }
    let text = fs::read_to_string(path)?;
    if text.trim().is_empty() {
        return Ok(IndexMap::new());
    }
    let map: IndexMap<String, Value> = serde_yaml::from_str(&text)?;
    debug!(path = %path.display(), keys = map.len(), "read settings");
    Ok(map)
}

/// Read a settings file, degrading to an empty map on any error.
pub fn load_settings_or_empty(path: Option<&Path>) -> HashMap<String, Value> {
    let Some(path) = path else {
        return HashMap::new();
    };
    match read_settings(path) {
        Ok(map) => map.into_iter().collect(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable settings file, using defaults");
            HashMap::new()
        }
    }
}

/// Add every key of `defaults` that `path` does not already define.
///
/// Existing values are left untouched. Returns the keys that were added;
/// the file is only written when that list is non-empty.
pub fn ensure_default_settings(
    path: &Path,
    defaults: &[(&str, f64)],
) -> Result<Vec<String>, StorageError> {
    let mut map = read_settings(path)?;
    let mut added = Vec::new();

    for (key, value) in defaults {
        if !map.contains_key(*key) {
            map.insert(key.to_string(), Value::from(*value));
            added.push(key.to_string());
        }
    }

    if !added.is_empty() {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_yaml::to_string(&map)?)?;
        info!(path = %path.display(), added = added.len(), "seeded settings defaults");
    }

    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DEFAULTS: [(&str, f64); 3] = [("FREQ_UP_PCT", 35.0), ("CTR_DOWN_PCT", 25.0), ("ROAS_DOWN_PCT", 30.0)];

    #[test]
    fn reads_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let yml = dir.path().join("a.yml");
        fs::write(&yml, "ROAS_DOWN_PCT: \"20\"\nFREQ_UP_PCT: 50\n").unwrap();
        let map = read_settings(&yml).unwrap();
        assert_eq!(map["ROAS_DOWN_PCT"], json!("20"));
        assert_eq!(map["FREQ_UP_PCT"], json!(50));

        let js = dir.path().join("a.json");
        fs::write(&js, r#"{"CPM_UP_PCT": 45.5}"#).unwrap();
        assert_eq!(read_settings(&js).unwrap()["CPM_UP_PCT"], json!(45.5));
    }

    #[test]
    fn missing_or_broken_files_degrade_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_settings_or_empty(None).is_empty());
        assert!(load_settings_or_empty(Some(&dir.path().join("none.yml"))).is_empty());

        let broken = dir.path().join("broken.yml");
        fs::write(&broken, "- just\n- a list\n").unwrap();
        assert!(read_settings(&broken).is_err());
        assert!(load_settings_or_empty(Some(&broken)).is_empty());
    }

    #[test]
    fn seeding_keeps_existing_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings/acme.yml");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "CTR_DOWN_PCT: \"15\"\n").unwrap();

        let added = ensure_default_settings(&path, &DEFAULTS).unwrap();
        assert_eq!(added, vec!["FREQ_UP_PCT", "ROAS_DOWN_PCT"]);

        let map = read_settings(&path).unwrap();
        assert_eq!(map["CTR_DOWN_PCT"], json!("15"));
        assert_eq!(map["FREQ_UP_PCT"], json!(35.0));

        assert!(ensure_default_settings(&path, &DEFAULTS).unwrap().is_empty());
    }
}
