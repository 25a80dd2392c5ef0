//! Notifier trait definition and shared error types.

use chrono::NaiveDate;

use cenus_core::{FatigueAlert, KpiSnapshot, Level};

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{channel} returned {status}: {body}")]
    Status {
        channel: String,
        status: u16,
        body: String,
    },

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Alert used by [`Notifier::test`].
pub fn sample_alert() -> FatigueAlert {
    FatigueAlert {
        client_name: "Test Client".to_string(),
        level: Level::Ad,
        entity_id: "test-ad".to_string(),
        entity_name: "Test Ad".to_string(),
        date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or(NaiveDate::MIN),
        reason_text: "Test: ROAS ↓ 42% vs 7d (from 3.10 to 1.80).".to_string(),
        actions: vec![
            "Rotate creative".to_string(),
            "Test new hook".to_string(),
        ],
        kpis: KpiSnapshot {
            roas: Some(1.8),
            cpm: Some(9.1),
            ctr: Some(0.62),
            spend: Some(120.0),
            results: Some(6.0),
        },
    }
}

/// Trait for notification channel implementations.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a fatigue alert through this channel.
    async fn send(&self, alert: &FatigueAlert) -> Result<(), NotifyError>;

    /// Test connectivity with a sample alert.
    async fn test(&self) -> Result<(), NotifyError> {
        self.send(&sample_alert()).await
    }

    /// Human-readable name for this channel (e.g., "slack", "webhook").
    fn channel_name(&self) -> &str;
}

/// Result of dispatching an alert to a single channel.
#[derive(Debug)]
pub struct DispatchResult {
    pub channel: String,
    pub entity_id: String,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}
