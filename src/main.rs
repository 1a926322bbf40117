use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;
use workshop_server::config::{AppConfig, CliConfig};
use workshop_server::search_index::SqliteSearchIndex;
use workshop_server::sync::{SqliteSyncLedger, SyncDrainer, SyncLedger};
use workshop_server::workshop::{SqliteWorkshopStore, WorkshopStore};

#[derive(Parser, Debug)]
#[command(about = "Workshop marketplace sync backend")]
struct CliArgs {
    /// Directory holding the workshops, search index and sync ledger databases
    #[arg(value_parser = parse_dir)]
    db_dir: PathBuf,

    /// Optional TOML config file overriding sync tunables
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_dir(value: &str) -> Result<PathBuf> {
    let path = PathBuf::from(value);
    if !path.is_dir() {
        bail!("{} is not a directory", value);
    }
    Ok(path)
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::builder()
        .with_env_var("LOG_LEVEL")
        .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = CliArgs::parse();
    let config = AppConfig::resolve(CliConfig {
        db_dir: args.db_dir,
        config_file: args.config,
    })?;

    workshop_server::metrics::init_metrics();

    let primary = Arc::new(
        SqliteWorkshopStore::new(config.workshops_db_path())
            .context("Failed to open workshops database")?,
    );
    let index = Arc::new(
        SqliteSearchIndex::new(config.search_index_db_path())
            .context("Failed to open search index database")?,
    );
    let ledger = Arc::new(
        SqliteSyncLedger::new(config.sync_ledger_db_path())
            .context("Failed to open sync ledger database")?,
    );

    info!(
        "Opened stores: {} workshops, {} pending sync entries",
        primary.count()?,
        ledger.pending_count()?
    );

    let drainer = Arc::new(SyncDrainer::new(
        primary,
        index,
        ledger,
        config.drainer_settings(),
    ));

    let cancellation_token = CancellationToken::new();
    let drainer_handle = tokio::spawn({
        let drainer = drainer.clone();
        let token = cancellation_token.clone();
        async move { drainer.run(token).await }
    });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    cancellation_token.cancel();
    drainer_handle.await.context("Drainer task panicked")?;
    info!("Bye");
    Ok(())
}
