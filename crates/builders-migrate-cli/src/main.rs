//! builders-migrate - check and repair the builders_project table.

mod args;
mod output;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use args::Args;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "builders_migrate=info,builders_migrate_core=info".into()),
        )
        // stdout carries only the report.
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!(error = %format!("{e:#}"), "migration failed");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let format = args.format;
    let config = args.into_config();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        url = %config.redacted_url(),
        schema = %config.schema,
        table = %config.layout.table,
        dry_run = config.dry_run,
        "starting schema check"
    );

    let outcome = builders_migrate_core::run(&config)
        .await
        .context("schema check and migration did not complete")?;

    output::write_report(&mut std::io::stdout().lock(), &outcome, format)
        .context("failed to write report")?;

    tracing::info!("schema check complete");
    Ok(())
}
