//! Adapters from the driver's sink traits to storage and notification.

use std::sync::Arc;

use cenus_core::{FatigueAlert, FatigueRecord};
use cenus_notify::Dispatcher;
use cenus_rules::{AlertSink, RecordSink, SinkError};
use cenus_storage::{AlertLog, JsonlRecordStore, UpsertOutcome};

/// Upserts records into a client's [`JsonlRecordStore`].
pub struct StoreSink {
    store: Arc<JsonlRecordStore>,
}

impl StoreSink {
    pub fn new(store: Arc<JsonlRecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl RecordSink for StoreSink {
    async fn upsert(&self, record: &FatigueRecord) -> Result<(), SinkError> {
        let outcome = self
            .store
            .upsert(record.clone())
            .map_err(|e| SinkError::Store(e.to_string()))?;
        tracing::debug!(
            entity_id = %record.entity_id,
            date = %record.timestamp,
            created = outcome == UpsertOutcome::Created,
            "record stored"
        );
        Ok(())
    }
}

/// Appends every alert to the durable alert log.
pub struct AlertLogSink {
    log: AlertLog,
}

impl AlertLogSink {
    pub fn new(log: AlertLog) -> Self {
        Self { log }
    }
}

#[async_trait::async_trait]
impl AlertSink for AlertLogSink {
    fn sink_name(&self) -> &str {
        "alert-log"
    }

    async fn send_alert(&self, alert: &FatigueAlert) -> Result<(), SinkError> {
        self.log
            .append(alert)
            .map(|_| ())
            .map_err(|e| SinkError::Store(e.to_string()))
    }
}

/// Sends alerts through the notification dispatcher.
///
/// Fails when any channel failed; the other channels still get the alert.
pub struct DispatchSink {
    dispatcher: Arc<Dispatcher>,
}

impl DispatchSink {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait::async_trait]
impl AlertSink for DispatchSink {
    fn sink_name(&self) -> &str {
        "notify"
    }

    async fn send_alert(&self, alert: &FatigueAlert) -> Result<(), SinkError> {
        let failures: Vec<String> = self
            .dispatcher
            .dispatch(alert)
            .await
            .into_iter()
            .filter(|r| !r.success)
            .map(|r| format!("{}: {}", r.channel, r.error.unwrap_or_default()))
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(SinkError::Delivery(failures.join("; ")))
        }
    }
}
