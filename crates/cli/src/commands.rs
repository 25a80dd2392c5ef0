//! Subcommand implementations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use cenus_core::{Config, Observation};
use cenus_notify::{Dispatcher, Notifier, SlackNotifier, TemplateRenderer, WebhookNotifier};
use cenus_rules::{EvaluationDriver, RunSettings, RunSummary, ThresholdConfig};
use cenus_storage::{
    ensure_default_settings, load_settings_or_empty, read_observations_from, write_jsonl,
    ClientEntry, ClientRegistry, StorageLayout, UpsertOutcome,
};

use crate::cli::{AddClientArgs, DemoArgs, RunArgs, TestAlertArgs};
use crate::demo::{generate, DemoSpec};
use crate::sinks::{AlertLogSink, DispatchSink, StoreSink};

/// Client name used for `--demo` runs without `--client`.
pub const DEMO_CLIENT: &str = "Demo Client";

/// Client name used for `--input` runs without `--client`.
pub const LOCAL_CLIENT: &str = "Local Input";

// ── Notification channels ───────────────────────────────────────────

fn client_channels(
    client: &ClientEntry,
    slack_secret: Option<&str>,
    renderer: &Arc<TemplateRenderer>,
    timeout: Duration,
) -> Vec<Box<dyn Notifier>> {
    let mut channels: Vec<Box<dyn Notifier>> = Vec::new();

    if let Some(url) = client.webhook_url(slack_secret) {
        match SlackNotifier::new(url, timeout) {
            Ok(n) => channels.push(Box::new(n)),
            Err(e) => warn!(client = %client.client_name, error = %e, "skipping slack channel"),
        }
    }

    if let Some(hook) = &client.webhook {
        match WebhookNotifier::from_config(
            hook.url.clone(),
            hook.method.clone(),
            hook.headers.clone(),
            hook.body_template.clone(),
            renderer.clone(),
            timeout,
        ) {
            Ok(n) => channels.push(Box::new(n)),
            Err(e) => warn!(client = %client.client_name, error = %e, "skipping webhook channel"),
        }
    }

    channels
}

/// Build the dispatcher for every registered client.
///
/// Registered clients get exactly their own channels (possibly none).
/// Anyone else falls back to the shared Slack webhook, when configured.
pub fn build_dispatcher(config: &Config, registry: &ClientRegistry) -> Result<Dispatcher> {
    let timeout = Duration::from_secs(config.slack.timeout_secs);
    let renderer = Arc::new(TemplateRenderer::new());
    let secret = config.slack.webhook_url.as_deref();

    let mut defaults: Vec<Box<dyn Notifier>> = Vec::new();
    if let Some(url) = secret {
        defaults.push(Box::new(
            SlackNotifier::new(url, timeout).context("invalid SLACK_WEBHOOK_URL")?,
        ));
    }

    let mut dispatcher = Dispatcher::with_defaults(defaults);
    for client in registry.clients() {
        let channels = client_channels(client, secret, &renderer, timeout);
        info!(client = %client.client_name, channels = channels.len(), "notification channels ready");
        dispatcher.set_client_channels(&client.client_name, channels);
    }
    Ok(dispatcher)
}

// ── run ─────────────────────────────────────────────────────────────

struct Target {
    client: ClientEntry,
    rows: Vec<Observation>,
}

fn settings_for(config: &Config, args: &RunArgs) -> Result<RunSettings> {
    let level = args.level.unwrap_or(config.fatigue.level);
    let days = args.days.unwrap_or(config.fatigue.days);
    let baseline_days = args.baseline_days.unwrap_or(config.fatigue.baseline_days);
    Ok(RunSettings::new(level, days, baseline_days)?)
}

fn load_rows(client: &str, paths: &[PathBuf]) -> Result<Vec<Observation>> {
    let report = read_observations_from(paths)?;
    if !report.is_clean() {
        warn!(
            client,
            bad_lines = report.bad_lines.len(),
            "skipped malformed input lines"
        );
    }
    info!(client, files = paths.len(), rows = report.rows.len(), "loaded input");
    Ok(report.rows)
}

fn yesterday() -> NaiveDate {
    let today = Utc::now().date_naive();
    today.pred_opt().unwrap_or(today)
}

fn registered_or_new(registry: &ClientRegistry, name: &str) -> ClientEntry {
    registry
        .find(name)
        .cloned()
        .unwrap_or_else(|| ClientEntry::new(name.trim(), ""))
}

fn resolve_targets(
    args: &RunArgs,
    settings: &RunSettings,
    layout: &StorageLayout,
    registry: &ClientRegistry,
) -> Result<Vec<Target>> {
    if args.demo {
        let client = registered_or_new(registry, args.client.as_deref().unwrap_or(DEMO_CLIENT));
        let spec = DemoSpec {
            days: settings.days,
            level: settings.level,
            fatigue_from: settings.days,
            ..DemoSpec::new(yesterday())
        };
        info!(client = %client.client_name, days = spec.days, "running on generated demo data");
        return Ok(vec![Target {
            client,
            rows: generate(&spec)?,
        }]);
    }

    if !args.inputs.is_empty() {
        let client = registered_or_new(registry, args.client.as_deref().unwrap_or(LOCAL_CLIENT));
        let rows = load_rows(&client.client_name, &args.inputs)?;
        return Ok(vec![Target { client, rows }]);
    }

    let clients: Vec<ClientEntry> = match &args.client {
        Some(name) => vec![registry.get(name)?.clone()],
        None => registry.clients().to_vec(),
    };
    if clients.is_empty() {
        bail!(
            "no clients registered in {} (use add-client, --input or --demo)",
            registry.path().display()
        );
    }

    let mut targets = Vec::with_capacity(clients.len());
    for client in clients {
        let inputs = layout.client_inputs(&client, settings.level);
        if inputs.is_empty() {
            warn!(
                client = %client.client_name,
                dir = %layout.client_dir(&client).display(),
                level = settings.level.as_str(),
                "no input files found, skipping client"
            );
            continue;
        }
        let rows = load_rows(&client.client_name, &inputs)?;
        targets.push(Target { client, rows });
    }
    Ok(targets)
}

/// Evaluate the selected clients and store or deliver the outcomes.
pub async fn run(config: &Config, args: &RunArgs) -> Result<RunSummary> {
    let settings = settings_for(config, args)?;
    let layout = StorageLayout::from_config(config);
    let registry = layout.registry()?;
    let targets = resolve_targets(args, &settings, &layout, &registry)?;

    let dispatcher = if args.dry_run {
        None
    } else {
        layout.ensure_dirs()?;
        Some(Arc::new(build_dispatcher(config, &registry)?))
    };

    let mut total = RunSummary::default();

    for target in targets {
        let name = target.client.client_name.clone();
        let th = ThresholdConfig::from_settings(&load_settings_or_empty(
            registry.settings_path(&target.client).as_deref(),
        ));

        let mut driver = EvaluationDriver::new(settings);
        let mut store = None;

        if let Some(dispatcher) = &dispatcher {
            let records = Arc::new(layout.record_store(&target.client)?);
            driver = driver.with_record_sink(Arc::new(StoreSink::new(records.clone())));
            if dispatcher.has_channels(&name) {
                driver = driver.with_alert_sink(Arc::new(DispatchSink::new(dispatcher.clone())));
            }
            driver = driver.with_alert_sink(Arc::new(AlertLogSink::new(layout.alert_log())));
            store = Some(records);
        }

        let summary = driver.run_for_client(&name, target.rows, &th).await;

        if let Some(records) = store {
            records
                .flush()
                .with_context(|| format!("failed to save records for {name}"))?;
        }
        total.absorb(&summary);
    }

    info!(
        checked = total.checked,
        flagged = total.flagged,
        skipped = total.skipped,
        failed = total.failed,
        alerts_sent = total.alerts_sent,
        alerts_failed = total.alerts_failed,
        baseline_days = settings.baseline_days,
        dry_run = args.dry_run,
        "run summary"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&total)?);
    } else {
        println!(
            "checked {} • flagged {} • skipped {} • failed {} (baseline {}d)",
            total.checked, total.flagged, total.skipped, total.failed, settings.baseline_days
        );
    }
    Ok(total)
}

// ── demo-data ───────────────────────────────────────────────────────

/// Write a mock series to `args.out`. Returns the number of rows written.
pub fn demo_data(args: &DemoArgs) -> Result<usize> {
    if args.days == 0 {
        bail!("--days must be at least 1");
    }
    let spec = DemoSpec {
        days: args.days,
        end: args.end.unwrap_or_else(yesterday),
        level: args.level,
        entity_id: args.entity_id.clone(),
        name: args.name.clone(),
        fatigue_from: args.fatigue_from,
    };
    let rows = generate(&spec)?;
    let written = write_jsonl(&args.out, &rows)
        .with_context(|| format!("failed to write {}", args.out.display()))?;
    println!("wrote {written} rows to {}", args.out.display());
    Ok(written)
}

// ── add-client ──────────────────────────────────────────────────────

/// Register or update a client. Returns the stored entry.
pub fn add_client(config: &Config, args: &AddClientArgs) -> Result<ClientEntry> {
    let name = args.client.trim();
    if name.is_empty() {
        bail!("client name must not be empty");
    }

    let layout = StorageLayout::from_config(config);
    let mut registry = layout.registry()?;

    let mut entry = registered_or_new(&registry, name);
    if !args.ad_account_id.is_empty() {
        entry.ad_account_id = args.ad_account_id.clone();
    }
    if let Some(file) = &args.settings_file {
        entry.settings_file = Some(file.clone());
    }
    if entry.settings_file.is_none() {
        entry.settings_file = Some(PathBuf::from(format!("settings/{}.yml", entry.dir_name())));
    }
    if let Some(hook) = &args.slack_webhook {
        entry.slack_webhook = Some(hook.clone());
    }

    let outcome = registry.upsert(entry.clone());
    registry.save()?;

    if let Some(path) = registry.settings_path(&entry) {
        let added = ensure_default_settings(&path, &ThresholdConfig::default().entries())?;
        if !added.is_empty() {
            info!(client = name, path = %path.display(), keys = ?added, "seeded default thresholds");
        }
    }
    std::fs::create_dir_all(layout.client_dir(&entry))?;

    let verb = match outcome {
        UpsertOutcome::Created => "added",
        UpsertOutcome::Updated => "updated",
    };
    println!("{verb} client {}", entry.client_name);
    Ok(entry)
}

// ── test-alert ──────────────────────────────────────────────────────

/// Send the sample alert through one channel.
pub async fn test_alert(config: &Config, args: &TestAlertArgs) -> Result<()> {
    let registry = StorageLayout::from_config(config).registry()?;
    let dispatcher = build_dispatcher(config, &registry)?;
    let client = args.client.as_deref().unwrap_or("");

    dispatcher
        .test_notify(client, args.channel)
        .await
        .with_context(|| format!("test alert failed for '{}'", client.trim()))?;
    println!("test alert sent");
    Ok(())
}

// ── config ──────────────────────────────────────────────────────────

/// Redacted view of `config` plus every profile found in the environment.
pub fn show_config(config: &Config) -> Result<serde_json::Value> {
    let mut view = config.redacted_summary();
    view["available_profiles"] = serde_json::json!(Config::available_profiles());
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(view)
}
