//! Routes alerts to configured channels.
//!
//! Each client may have its own channels; clients without any use the
//! shared default channels. Individual channel failures don't block
//! other channels.

use std::collections::HashMap;

use cenus_core::FatigueAlert;

use crate::traits::{DispatchResult, Notifier, NotifyError};

fn client_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Dispatches alerts to multiple channels, organized per client.
pub struct Dispatcher {
    /// Normalized client name → channels for that client.
    client_channels: HashMap<String, Vec<Box<dyn Notifier>>>,
    /// Fallback channels used when no client-specific channels exist.
    default_channels: Vec<Box<dyn Notifier>>,
}

impl Dispatcher {
    /// Create an empty dispatcher.
    pub fn empty() -> Self {
        Self {
            client_channels: HashMap::new(),
            default_channels: Vec::new(),
        }
    }

    /// Create a dispatcher with channels shared across all clients.
    pub fn with_defaults(channels: Vec<Box<dyn Notifier>>) -> Self {
        Self {
            client_channels: HashMap::new(),
            default_channels: channels,
        }
    }

    /// Replace all channels for a client.
    pub fn set_client_channels(&mut self, client_name: &str, channels: Vec<Box<dyn Notifier>>) {
        self.client_channels.insert(client_key(client_name), channels);
    }

    /// Channels an alert for `client_name` would go to.
    fn channels_for(&self, client_name: &str) -> &[Box<dyn Notifier>] {
        self.client_channels
            .get(&client_key(client_name))
            .unwrap_or(&self.default_channels)
    }

    pub fn has_channels(&self, client_name: &str) -> bool {
        !self.channels_for(client_name).is_empty()
    }

    /// Deliver `alert` to every channel of its client.
    pub async fn dispatch(&self, alert: &FatigueAlert) -> Vec<DispatchResult> {
        let client = alert.client_name.as_str();
        let channels = self.channels_for(client);

        if channels.is_empty() {
            tracing::debug!(client, "No notification channels configured");
            return Vec::new();
        }

        let mut results = Vec::with_capacity(channels.len());

        for channel in channels {
            let start = std::time::Instant::now();
            let result = channel.send(alert).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            let (success, error) = match result {
                Ok(()) => {
                    tracing::info!(
                        client,
                        entity_id = %alert.entity_id,
                        channel = channel.channel_name(),
                        duration_ms,
                        "Alert delivered"
                    );
                    (true, None)
                }
                Err(e) => {
                    tracing::warn!(
                        client,
                        entity_id = %alert.entity_id,
                        channel = channel.channel_name(),
                        error = %e,
                        duration_ms,
                        "Alert delivery failed"
                    );
                    (false, Some(e.to_string()))
                }
            };

            results.push(DispatchResult {
                channel: channel.channel_name().to_string(),
                entity_id: alert.entity_id.clone(),
                success,
                error,
                duration_ms,
            });
        }

        results
    }

    /// Send a test alert through one of a client's channels, by index.
    pub async fn test_notify(&self, client_name: &str, channel_index: usize) -> Result<(), NotifyError> {
        let channels = self.channels_for(client_name);
        if channels.is_empty() {
            return Err(NotifyError::Config(format!(
                "No channels for client '{}'",
                client_name.trim()
            )));
        }

        let channel = channels.get(channel_index).ok_or_else(|| {
            NotifyError::Config(format!("Channel index {channel_index} out of range"))
        })?;

        channel.test().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::traits::sample_alert;

    struct MockNotifier {
        name: String,
        send_count: Arc<AtomicUsize>,
        should_fail: bool,
    }

    #[async_trait::async_trait]
    impl Notifier for MockNotifier {
        async fn send(&self, _alert: &FatigueAlert) -> Result<(), NotifyError> {
            self.send_count.fetch_add(1, Ordering::SeqCst);
            if self.should_fail {
                Err(NotifyError::Config("mock failure".to_string()))
            } else {
                Ok(())
            }
        }
        fn channel_name(&self) -> &str {
            &self.name
        }
    }

    fn mock(name: &str, count: &Arc<AtomicUsize>, should_fail: bool) -> Box<dyn Notifier> {
        Box::new(MockNotifier {
            name: name.to_string(),
            send_count: count.clone(),
            should_fail,
        })
    }

    #[tokio::test]
    async fn dispatch_to_all_client_channels() {
        let count_a = Arc::new(AtomicUsize::new(0));
        let count_b = Arc::new(AtomicUsize::new(0));

        let mut dispatcher = Dispatcher::empty();
        dispatcher.set_client_channels(
            "Test Client",
            vec![mock("a", &count_a, false), mock("b", &count_b, false)],
        );

        let results = dispatcher.dispatch(&sample_alert()).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.success));
        assert_eq!(results[0].entity_id, "test-ad");
        assert_eq!(count_a.load(Ordering::SeqCst), 1);
        assert_eq!(count_b.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_does_not_block_other_channels() {
        let count_a = Arc::new(AtomicUsize::new(0));
        let count_b = Arc::new(AtomicUsize::new(0));

        let dispatcher = Dispatcher::with_defaults(vec![
            mock("failing", &count_a, true),
            mock("working", &count_b, false),
        ]);

        let results = dispatcher.dispatch(&sample_alert()).await;
        assert_eq!(results.len(), 2);
        assert!(!results[0].success);
        assert_eq!(results[0].error.as_deref(), Some("Configuration error: mock failure"));
        assert!(results[1].success);
        assert_eq!(count_b.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn client_channels_override_defaults() {
        let default_count = Arc::new(AtomicUsize::new(0));
        let client_count = Arc::new(AtomicUsize::new(0));

        let mut dispatcher = Dispatcher::with_defaults(vec![mock("default", &default_count, false)]);
        dispatcher.set_client_channels("  TEST client ", vec![mock("own", &client_count, false)]);

        dispatcher.dispatch(&sample_alert()).await;
        assert_eq!(client_count.load(Ordering::SeqCst), 1);
        assert_eq!(default_count.load(Ordering::SeqCst), 0);

        let mut other = sample_alert();
        other.client_name = "Someone Else".into();
        dispatcher.dispatch(&other).await;
        assert_eq!(default_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_channels_is_a_noop() {
        let dispatcher = Dispatcher::empty();
        assert!(!dispatcher.has_channels("Test Client"));
        assert!(dispatcher.dispatch(&sample_alert()).await.is_empty());
    }

    #[tokio::test]
    async fn test_notify_by_index() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = Dispatcher::empty();
        dispatcher.set_client_channels("Acme", vec![mock("a", &count, false)]);

        dispatcher.test_notify("acme", 0).await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(dispatcher.test_notify("acme", 3).await.is_err());
        assert!(dispatcher.test_notify("nobody", 0).await.is_err());
    }
}
