//! Alert delivery for fatigued entities.
//!
//! This crate provides:
//! - `Notifier` trait for pluggable notification channels
//! - Slack (Block Kit) and generic webhook notifier implementations
//! - Minijinja template rendering for webhook bodies
//! - Dispatcher that routes alerts to each client's channels

pub mod dispatcher;
pub mod slack;
pub mod templating;
pub mod traits;
pub mod webhook;

pub use dispatcher::Dispatcher;
pub use slack::SlackNotifier;
pub use templating::TemplateRenderer;
pub use traits::{DispatchResult, Notifier, NotifyError};
pub use webhook::WebhookNotifier;
