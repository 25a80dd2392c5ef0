use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::entity::Level;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Mask a secret for logs, keeping the first `keep` characters.
pub fn mask(secret: &str, keep: usize) -> String {
    let total = secret.chars().count();
    if total == 0 {
        return String::new();
    }
    if total <= keep {
        return "*".repeat(total);
    }
    let head: String = secret.chars().take(keep).collect();
    format!("{}…{}", head, "*".repeat(total - keep))
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub storage: StorageConfig,
    pub fatigue: FatigueConfig,
    pub slack: SlackConfig,
}

/// Well-known env keys that identify a profile when prefixed.
const PROFILE_MARKER_KEYS: &[&str] = &["DATA_DIR", "CLIENTS_FILE", "SLACK_WEBHOOK_URL"];

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `CENUS_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("CENUS_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            storage: StorageConfig::from_env_profiled(p),
            fatigue: FatigueConfig::from_env_profiled(p),
            slack: SlackConfig::from_env_profiled(p),
        }
    }

    /// Discover available profiles by scanning env vars for `{PREFIX}_{MARKER_KEY}` patterns.
    /// Always includes "default" (the unprefixed config).
    pub fn available_profiles() -> Vec<String> {
        let mut profiles = std::collections::BTreeSet::new();
        profiles.insert("default".to_string());

        for (key, _) in env::vars() {
            for marker in PROFILE_MARKER_KEYS {
                if let Some(prefix) = key.strip_suffix(&format!("_{}", marker)) {
                    if !prefix.is_empty()
                        && prefix.chars().all(|c| c.is_ascii_uppercase() || c == '_')
                    {
                        profiles.insert(prefix.to_string());
                    }
                }
            }
        }

        profiles.into_iter().collect()
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  storage:  data_dir={}, clients_file={}",
            self.storage.data_dir.display(),
            self.storage.clients_file.display()
        );
        tracing::info!(
            "  fatigue:  level={}, days={}, baseline_days={}",
            self.fatigue.level.as_str(),
            self.fatigue.days,
            self.fatigue.baseline_days
        );
        tracing::info!(
            "  slack:    webhook={}, timeout={}s",
            self.slack
                .webhook_url
                .as_deref()
                .map(|u| mask(u, 24))
                .unwrap_or_else(|| "(none)".to_string()),
            self.slack.timeout_secs
        );
    }

    /// Return a redacted view safe for printing (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "storage": {
                "data_dir": self.storage.data_dir,
                "clients_file": self.storage.clients_file,
            },
            "fatigue": {
                "level": self.fatigue.level.as_str(),
                "days": self.fatigue.days,
                "baseline_days": self.fatigue.baseline_days,
            },
            "slack": {
                "configured": self.slack.is_configured(),
                "timeout_secs": self.slack.timeout_secs,
            },
        })
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root for per-client input, record and alert files.
    pub data_dir: PathBuf,
    /// Client registry file.
    pub clients_file: PathBuf,
}

impl StorageConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            data_dir: PathBuf::from(profiled_env_or(p, "DATA_DIR", "data")),
            clients_file: PathBuf::from(profiled_env_or(p, "CLIENTS_FILE", "clients.json")),
        }
    }
}

// ── Fatigue run defaults ──────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FatigueConfig {
    pub level: Level,
    /// Total days looked at per entity (baseline plus latest).
    pub days: usize,
    /// Days averaged into the rolling baseline.
    pub baseline_days: usize,
}

impl FatigueConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            level: profiled_env_opt(p, "FATIGUE_LEVEL")
                .and_then(|v| v.parse().ok())
                .unwrap_or(Level::Ad),
            days: profiled_env_usize(p, "FATIGUE_DAYS", 14),
            baseline_days: profiled_env_usize(p, "FATIGUE_BASELINE_DAYS", 7),
        }
    }
}

// ── Slack ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    pub webhook_url: Option<String>,
    pub timeout_secs: u64,
}

impl SlackConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            webhook_url: profiled_env_opt(p, "SLACK_WEBHOOK_URL"),
            timeout_secs: profiled_env_u64(p, "NOTIFY_TIMEOUT_SECS", 15),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_keeps_prefix() {
        assert_eq!(mask("", 6), "");
        assert_eq!(mask("abc", 6), "***");
        assert_eq!(mask("abcdefgh", 6), "abcdef…**");
    }

    #[test]
    fn profiled_lookup_prefers_prefix() {
        std::env::set_var("CENUSTEST_FATIGUE_DAYS", "21");
        let cfg = Config::for_profile("cenustest");
        assert_eq!(cfg.profile, "CENUSTEST");
        assert_eq!(cfg.fatigue.days, 21);
        std::env::remove_var("CENUSTEST_FATIGUE_DAYS");
    }

    #[test]
    fn invalid_level_falls_back_to_ad() {
        std::env::set_var("LVLTEST_FATIGUE_LEVEL", "banner");
        let cfg = Config::for_profile("LVLTEST");
        assert_eq!(cfg.fatigue.level, Level::Ad);
        std::env::remove_var("LVLTEST_FATIGUE_LEVEL");
    }
}
