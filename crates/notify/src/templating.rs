//! Minijinja rendering for webhook alert bodies.

use minijinja::Environment;

use cenus_core::{FatigueAlert, KpiSnapshot};

use crate::slack::{fixes, kpi_line};
use crate::traits::NotifyError;

/// Values a body template can reference.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TemplateContext {
    pub alert: AlertContext,
    /// Render time, RFC 3339 in UTC.
    pub now: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct AlertContext {
    pub client: String,
    /// Lowercase level key (`campaign`, `adset`, `ad`).
    pub level: String,
    pub entity_id: String,
    pub name: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    pub reason: String,
    pub actions: Vec<String>,
    pub kpis: KpiSnapshot,
    /// The same KPI line Slack shows under an alert.
    pub kpi_text: String,
}

impl TemplateContext {
    pub fn from_alert(alert: &FatigueAlert) -> Self {
        Self {
            alert: AlertContext {
                client: alert.client_name.clone(),
                level: alert.level.as_str().to_string(),
                entity_id: alert.entity_id.clone(),
                name: alert.entity_name.clone(),
                date: alert.date.format("%Y-%m-%d").to_string(),
                reason: alert.reason_text.clone(),
                actions: alert.actions.clone(),
                kpis: alert.kpis.clone(),
                kpi_text: kpi_line(&alert.kpis),
            },
            now: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        }
    }
}

/// Renders ad-hoc body templates against a [`TemplateContext`].
///
/// Adds two filters on top of the minijinja builtins: `round(n)` and
/// `bullets`, which renders an action list the way Slack alerts do.
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_filter("round", round_filter);
        env.add_filter("bullets", |items: Vec<String>| fixes(&items));
        Self { env }
    }

    pub fn render(&self, template: &str, ctx: &TemplateContext) -> Result<String, NotifyError> {
        self.env
            .render_str(template, ctx)
            .map_err(|e| NotifyError::Template(e.to_string()))
    }

    /// Parse `template` without rendering it.
    pub fn validate(&self, template: &str) -> Result<(), NotifyError> {
        self.env
            .template_from_str(template)
            .map(|_| ())
            .map_err(|e| NotifyError::Template(e.to_string()))
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer").finish_non_exhaustive()
    }
}

fn round_filter(value: f64, decimals: Option<u32>) -> String {
    format!("{:.prec$}", value, prec = decimals.unwrap_or(0) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::sample_alert;

    fn ctx() -> TemplateContext {
        let mut ctx = TemplateContext::from_alert(&sample_alert());
        ctx.now = "2025-01-02T08:00:00Z".to_string();
        ctx
    }

    fn render(template: &str) -> String {
        TemplateRenderer::new().render(template, &ctx()).unwrap()
    }

    #[test]
    fn context_carries_the_alert() {
        let ctx = TemplateContext::from_alert(&sample_alert());
        assert_eq!(ctx.alert.client, "Test Client");
        assert_eq!(ctx.alert.level, "ad");
        assert_eq!(ctx.alert.date, "2025-01-01");
        assert_eq!(
            ctx.alert.kpi_text,
            "*ROAS*: 1.8 • *CPM*: $9.1 • *CTR*: 0.62% • *Spend*: $120.0 • *Results*: 6"
        );
        assert!(ctx.now.ends_with('Z'));
    }

    #[test]
    fn renders_alert_fields() {
        assert_eq!(
            render("Fatigue: {{ alert.name }} ({{ alert.client }}) at {{ now }}"),
            "Fatigue: Test Ad (Test Client) at 2025-01-02T08:00:00Z"
        );
        assert_eq!(render("{{ alert.level | upper }}"), "AD");
    }

    #[test]
    fn round_and_bullets_filters() {
        assert_eq!(render("ROAS {{ alert.kpis.roas | round(2) }}"), "ROAS 1.80");
        assert_eq!(render("{{ alert.actions | bullets }}"), "• Rotate creative\n• Test new hook");

        let mut ctx = ctx();
        ctx.alert.actions.clear();
        let empty = TemplateRenderer::new().render("{{ alert.actions | bullets }}", &ctx).unwrap();
        assert_eq!(empty, "• Review creative & audience");
    }

    #[test]
    fn missing_kpi_renders_none() {
        let mut ctx = ctx();
        ctx.alert.kpis.cpm = None;
        let out = TemplateRenderer::new().render("CPM: {{ alert.kpis.cpm }}", &ctx).unwrap();
        assert_eq!(out, "CPM: none");
    }

    #[test]
    fn invalid_template_is_a_template_error() {
        let renderer = TemplateRenderer::new();
        assert!(renderer.validate("{{ alert.name }}").is_ok());
        assert!(matches!(renderer.validate("{{ unclosed"), Err(NotifyError::Template(_))));
        assert!(matches!(renderer.render("{{ unclosed", &ctx()), Err(NotifyError::Template(_))));
    }
}
