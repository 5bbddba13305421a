//! coursedesk - Creator dashboard in the terminal

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coursedesk::{cli::Cli, config::Config};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coursedesk=error".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load_with_env(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded, API at {}", config.api.base_url);

    coursedesk::cli::run(cli, config).await
}
