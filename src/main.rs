use anyhow::{Context, Result};
use mail_auto_archive::config::{Config, LogFormat};
use mail_auto_archive::{Archiver, HttpMailStoreClient};
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("auto-archive failed: {:#}", e);
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = Config::from_env().context("invalid configuration")?;

    init_tracing(config.log_format);

    tracing::info!(
        endpoint = %config.endpoint,
        dry_run = config.dry_run,
        "Mail auto-archive starting..."
    );
    if !config.account_filter.is_empty() {
        tracing::info!("Restricted to {} selected accounts", config.account_filter.len());
    }

    let client = HttpMailStoreClient::new(
        &config.endpoint,
        Duration::from_secs(config.http_timeout_secs),
    )
    .context("failed to build HTTP client")?;

    let dry_run = config.dry_run;
    let report = Archiver::new(Box::new(client), config)
        .run(chrono::Utc::now())
        .await?;

    tracing::info!("{}", report);
    if dry_run {
        tracing::info!("Dry run completed! No changes were made.");
    }

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mail_auto_archive=info,warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
