mod cli;
mod commands;
mod demo;
mod sinks;

use anyhow::Result;
use clap::Parser;

use cenus_core::config::{load_dotenv, Config};

use crate::cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    load_dotenv();
    let config = Config::from_env();
    config.log_summary();

    match args.command {
        Command::Run(run) => {
            let summary = commands::run(&config, &run).await?;
            if summary.alerts_failed > 0 {
                tracing::warn!(alerts_failed = summary.alerts_failed, "some alerts were not delivered");
            }
        }
        Command::DemoData(demo) => {
            commands::demo_data(&demo)?;
        }
        Command::AddClient(add) => {
            commands::add_client(&config, &add)?;
        }
        Command::TestAlert(test) => commands::test_alert(&config, &test).await?,
        Command::ShowConfig => {
            commands::show_config(&config)?;
        }
    }

    Ok(())
}
