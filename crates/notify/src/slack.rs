//! Slack incoming-webhook notifier using Block Kit sections.

use std::time::Duration;

use serde_json::{json, Value};

use cenus_core::{FatigueAlert, KpiSnapshot};

use crate::traits::{Notifier, NotifyError};

/// Shown under "Quick fixes" when an alert carries no actions.
pub const FALLBACK_FIX: &str = "• Review creative & audience";

/// KPI context line: every reported KPI, joined with `" • "`.
///
/// Rates and money keep a decimal point (`2.0`); results is a count and
/// prints whole.
pub fn kpi_line(kpis: &KpiSnapshot) -> String {
    let mut fields = Vec::new();
    if let Some(v) = kpis.roas {
        fields.push(format!("*ROAS*: {v:?}"));
    }
    if let Some(v) = kpis.cpm {
        fields.push(format!("*CPM*: ${v:?}"));
    }
    if let Some(v) = kpis.ctr {
        fields.push(format!("*CTR*: {v:?}%"));
    }
    if let Some(v) = kpis.spend {
        fields.push(format!("*Spend*: ${v:?}"));
    }
    if let Some(v) = kpis.results {
        fields.push(format!("*Results*: {v}"));
    }
    fields.join(" • ")
}

pub(crate) fn fixes(actions: &[String]) -> String {
    if actions.is_empty() {
        return FALLBACK_FIX.to_string();
    }
    actions
        .iter()
        .map(|a| format!("• {a}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn mrkdwn_section(text: String) -> Value {
    json!({ "type": "section", "text": { "type": "mrkdwn", "text": text } })
}

/// Build the Block Kit payload for an alert.
pub fn format_blocks(alert: &FatigueAlert) -> Value {
    let mut blocks = vec![
        mrkdwn_section(format!(
            ":rotating_light: *Creative Fatigue Detected — {}*\n*Level:* {}\n*Name:* {}\n*Date:* {}",
            alert.client_name,
            alert.level,
            alert.entity_name,
            alert.date.format("%Y-%m-%d"),
        )),
        mrkdwn_section(format!("*Why:*\n{}", alert.reason_text)),
        mrkdwn_section(format!("*Quick fixes:*\n{}", fixes(&alert.actions))),
    ];

    let kpis = kpi_line(&alert.kpis);
    if !kpis.is_empty() {
        blocks.push(json!({
            "type": "context",
            "elements": [{ "type": "mrkdwn", "text": kpis }]
        }));
    }

    json!({ "blocks": blocks })
}

/// Posts alerts to a Slack incoming webhook.
#[derive(Debug)]
pub struct SlackNotifier {
    webhook_url: String,
    client: reqwest::Client,
}

impl SlackNotifier {
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let webhook_url = webhook_url.into();
        if webhook_url.trim().is_empty() {
            return Err(NotifyError::Config("Slack webhook URL is empty".into()));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            webhook_url,
            client,
        })
    }
}

#[async_trait::async_trait]
impl Notifier for SlackNotifier {
    async fn send(&self, alert: &FatigueAlert) -> Result<(), NotifyError> {
        let payload = format_blocks(alert);
        let response = self.client.post(&self.webhook_url).json(&payload).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(NotifyError::Status {
                channel: "slack".to_string(),
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(
            client = %alert.client_name,
            entity_id = %alert.entity_id,
            %status,
            "slack alert delivered"
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "slack"
    }
}
