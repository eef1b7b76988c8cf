// Crawler entry point.
//
// Startup sequence:
// 1. Parse arguments and load the config
// 2. Initialize tracing at the configured level
// 3. Build the HTTP client and log in
// 4. Run the pipeline over every configured league
// 5. Log the run summary and exit non-zero on fatal errors

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use fantasypl_crawler::cli::Cli;
use fantasypl_crawler::client::FplClient;
use fantasypl_crawler::config::{self, Config};
use fantasypl_crawler::output::LogAndFileSink;
use fantasypl_crawler::pipeline::{self, RunSummary};
use tracing::{error, info};

const FALLBACK_LOG_LEVEL: &str = "info";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config::load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            if let Err(init) = init_tracing(FALLBACK_LOG_LEVEL) {
                eprintln!("{init:#}");
            }
            error!("Can not load config file {}: {e}", cli.config.display());
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_tracing(&config.app.log_level) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }
    info!("Config loaded from {}: {:?}", cli.config.display(), config.fpl);

    match run(&config).await {
        Ok(summary) => {
            summary.log();
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config) -> anyhow::Result<RunSummary> {
    let client = FplClient::new(&config.http).context("failed to create HTTP client")?;
    client
        .login(&config.fpl.username, &config.fpl.password)
        .await
        .context("failed to log in")?;

    let mut sink = LogAndFileSink::new(config.app.directory_to_export.clone());
    let summary = pipeline::run(Arc::new(client), config, &mut sink).await?;
    Ok(summary)
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let default_directives = format!("fantasypl_crawler={level},fantasypl_core={level},warn");
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directives)),
        )
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
