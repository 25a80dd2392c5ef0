use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use cenus_core::Level;

/// Creative fatigue detection for ad entities.
///
/// Compares each entity's latest day against a rolling baseline and
/// flags the ones whose KPIs have degraded past the configured thresholds.
#[derive(Parser, Debug)]
#[command(name = "cenus", about = "Creative fatigue detection for ad entities", version)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate one client (or every registered client) and record the outcome.
    Run(RunArgs),
    /// Write a deterministic mock series as JSONL.
    DemoData(DemoArgs),
    /// Register or update a client and seed its threshold settings.
    AddClient(AddClientArgs),
    /// Send a sample alert through a client's channels.
    TestAlert(TestAlertArgs),
    /// Print the active configuration with secrets redacted.
    #[command(name = "config")]
    ShowConfig,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Client to evaluate (default: every registered client)
    #[arg(long)]
    pub client: Option<String>,

    /// Entity level: campaign, adset or ad (default: FATIGUE_LEVEL)
    #[arg(long)]
    pub level: Option<Level>,

    /// Trailing days kept per entity (default: FATIGUE_DAYS)
    #[arg(long)]
    pub days: Option<usize>,

    /// Days averaged into the baseline (default: FATIGUE_BASELINE_DAYS)
    #[arg(long)]
    pub baseline_days: Option<usize>,

    /// Explicit JSONL input files instead of the client's data directory
    #[arg(long = "input", value_name = "FILE")]
    pub inputs: Vec<PathBuf>,

    /// Evaluate a generated mock series instead of stored input
    #[arg(long)]
    pub demo: bool,

    /// Evaluate without storing records or sending alerts
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DemoArgs {
    /// Output JSONL file
    #[arg(long, default_value = "data/Demo_Client/ad_MOCK.jsonl")]
    pub out: PathBuf,

    /// Number of days to generate
    #[arg(long, default_value = "14")]
    pub days: usize,

    /// Last generated date (default: yesterday, UTC)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    #[arg(long, default_value = "ad")]
    pub level: Level,

    #[arg(long, default_value = "1234567890")]
    pub entity_id: String,

    #[arg(long, default_value = "Mock Ad A")]
    pub name: String,

    /// First fatigued day, 1-based
    #[arg(long, default_value = "10")]
    pub fatigue_from: usize,
}

#[derive(Args, Debug, Clone)]
pub struct AddClientArgs {
    /// Display name, also used for the client's data directory
    #[arg(long)]
    pub client: String,

    #[arg(long, default_value = "")]
    pub ad_account_id: String,

    /// Settings file, relative to the registry (default: settings/<Client_Name>.yml)
    #[arg(long)]
    pub settings_file: Option<PathBuf>,

    /// Slack webhook URL, or __FROM_SECRET__ to use SLACK_WEBHOOK_URL
    #[arg(long)]
    pub slack_webhook: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct TestAlertArgs {
    /// Client whose channels to test (default: the shared channels)
    #[arg(long)]
    pub client: Option<String>,

    /// Index of the channel to test
    #[arg(long, default_value = "0")]
    pub channel: usize,
}
