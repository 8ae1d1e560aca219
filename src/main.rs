//! cifar10-serve - Main Entry Point

use cifar10_serve::cli::{self, Cli};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cifar10_serve=info,tower_http=info".into()),
        )
        .init();

    cli::run(Cli::parse()).await
}
