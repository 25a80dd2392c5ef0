//! Generic HTTP webhook channel for alert delivery.
//!
//! `${VAR}` references in the URL and header values are expanded once, when
//! the channel is built, so per-client secrets stay out of the registry file.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;

use cenus_core::FatigueAlert;

use crate::templating::{TemplateContext, TemplateRenderer};
use crate::traits::{Notifier, NotifyError};

#[derive(Debug)]
pub struct WebhookNotifier {
    url: String,
    method: Method,
    headers: HashMap<String, String>,
    /// Without a template the alert itself is the JSON body.
    body_template: Option<String>,
    renderer: Arc<TemplateRenderer>,
    client: reqwest::Client,
}

impl WebhookNotifier {
    /// Build a channel from a client's webhook target. `method` defaults to
    /// `POST` and is case-insensitive.
    ///
    /// Unset variables, unknown methods and templates that fail to parse are
    /// [`NotifyError::Config`] errors.
    pub fn from_config(
        url: String,
        method: Option<String>,
        headers: Option<HashMap<String, String>>,
        body_template: Option<String>,
        renderer: Arc<TemplateRenderer>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let method = match method {
            Some(m) => m
                .to_uppercase()
                .parse::<Method>()
                .map_err(|_| NotifyError::Config(format!("invalid HTTP method: {m}")))?,
            None => Method::POST,
        };

        let headers = headers
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| Ok((k, resolve_env_vars(&v)?)))
            .collect::<Result<HashMap<_, _>, NotifyError>>()?;

        if let Some(tmpl) = &body_template {
            renderer
                .validate(tmpl)
                .map_err(|e| NotifyError::Config(format!("invalid body template: {e}")))?;
        }

        Ok(Self {
            url: resolve_env_vars(&url)?,
            method,
            headers,
            body_template,
            renderer,
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    fn body(&self, alert: &FatigueAlert) -> Result<String, NotifyError> {
        match &self.body_template {
            Some(tmpl) => self.renderer.render(tmpl, &TemplateContext::from_alert(alert)),
            None => serde_json::to_string(alert)
                .map_err(|e| NotifyError::Config(format!("failed to serialize alert: {e}"))),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, alert: &FatigueAlert) -> Result<(), NotifyError> {
        let request = self
            .headers
            .iter()
            .fold(
                self.client.request(self.method.clone(), &self.url),
                |req, (key, value)| req.header(key.as_str(), value.as_str()),
            )
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(self.body(alert)?);

        let response = request.send().await?;
        let status = response.status();
        // Resolved URLs may embed tokens; only the host is logged.
        let host = response.url().host_str().unwrap_or("").to_string();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%host, %status, entity_id = %alert.entity_id, "webhook rejected alert");
            return Err(NotifyError::Status {
                channel: self.channel_name().to_string(),
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(%host, method = %self.method, entity_id = %alert.entity_id, "webhook alert delivered");
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "webhook"
    }
}

/// Expand `${VAR}` references from the process environment.
pub fn resolve_env_vars(input: &str) -> Result<String, NotifyError> {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_name = String::new();
            let mut closed = false;
            for c in chars.by_ref() {
                if c == '}' {
                    closed = true;
                    break;
                }
                var_name.push(c);
            }
            if !closed {
                return Err(NotifyError::Config(format!(
                    "unclosed env var reference in: {input}"
                )));
            }
            let value = std::env::var(&var_name).map_err(|_| {
                NotifyError::Config(format!("env var not found: {var_name}"))
            })?;
            result.push_str(&value);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::sample_alert;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn notifier(method: Option<&str>, template: Option<&str>) -> Result<WebhookNotifier, NotifyError> {
        WebhookNotifier::from_config(
            "https://example.com/hook".into(),
            method.map(str::to_string),
            None,
            template.map(str::to_string),
            Arc::new(TemplateRenderer::new()),
            TIMEOUT,
        )
    }

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("CENUS_WEBHOOK_TEST_HOST", "example.com");
        let result = resolve_env_vars("https://${CENUS_WEBHOOK_TEST_HOST}/hook").unwrap();
        assert_eq!(result, "https://example.com/hook");
        std::env::remove_var("CENUS_WEBHOOK_TEST_HOST");
    }

    #[test]
    fn resolve_env_vars_missing() {
        match resolve_env_vars("https://${ABSOLUTELY_NOT_SET_12345}/hook").unwrap_err() {
            NotifyError::Config(msg) => assert!(msg.contains("ABSOLUTELY_NOT_SET_12345")),
            other => panic!("expected Config error, got: {other:?}"),
        }
    }

    #[test]
    fn resolve_env_vars_unclosed() {
        match resolve_env_vars("https://${UNCLOSED/hook").unwrap_err() {
            NotifyError::Config(msg) => assert!(msg.contains("unclosed")),
            other => panic!("expected Config error, got: {other:?}"),
        }
    }

    #[test]
    fn resolve_env_vars_no_vars() {
        let result = resolve_env_vars("https://plain.example.com/hook").unwrap();
        assert_eq!(result, "https://plain.example.com/hook");
    }

    #[test]
    fn method_parsing() {
        assert_eq!(notifier(None, None).unwrap().method, Method::POST);
        assert_eq!(notifier(Some("put"), None).unwrap().method, Method::PUT);
        assert!(notifier(Some("NOT_A_METHOD\0"), None).is_err());
    }

    #[test]
    fn headers_resolve_env() {
        std::env::set_var("CENUS_WT_API_KEY", "secret-key-123");
        let headers = HashMap::from([
            ("X-Api-Key".to_string(), "${CENUS_WT_API_KEY}".to_string()),
            ("X-Static".to_string(), "fixed-value".to_string()),
        ]);
        let n = WebhookNotifier::from_config(
            "https://example.com".into(),
            None,
            Some(headers),
            None,
            Arc::new(TemplateRenderer::new()),
            TIMEOUT,
        )
        .unwrap();
        assert_eq!(n.headers["X-Api-Key"], "secret-key-123");
        assert_eq!(n.headers["X-Static"], "fixed-value");
        std::env::remove_var("CENUS_WT_API_KEY");
    }

    #[test]
    fn invalid_body_template_is_rejected() {
        match notifier(None, Some("{{ unclosed")).unwrap_err() {
            NotifyError::Config(msg) => assert!(msg.contains("invalid body template")),
            other => panic!("expected Config error, got: {other:?}"),
        }
    }

    #[test]
    fn body_is_alert_json_without_template() {
        let n = notifier(None, None).unwrap();
        let body: serde_json::Value = serde_json::from_str(&n.body(&sample_alert()).unwrap()).unwrap();
        assert_eq!(body["client_name"], "Test Client");
        assert_eq!(body["level"], "Ad");
        assert_eq!(body["kpis"]["roas"], 1.8);
    }

    #[test]
    fn body_uses_template_when_set() {
        let n = notifier(None, Some(r#"{"text": "{{ alert.name }} on {{ alert.date }}"}"#)).unwrap();
        assert_eq!(
            n.body(&sample_alert()).unwrap(),
            r#"{"text": "Test Ad on 2025-01-01"}"#
        );
        assert_eq!(n.channel_name(), "webhook");
    }
}
