//! `conflictbot` entry point.

use clap::Parser;
use conflictbot_cli::config::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    tracing::info!(
        "conflictbot v{} starting against {}{}",
        env!("CARGO_PKG_VERSION"),
        cli.repo,
        if cli.dry_run { " (dry run)" } else { "" }
    );

    conflictbot_cli::run::run(cli).await
}
