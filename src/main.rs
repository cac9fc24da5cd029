//! Reelwatch main entry point
//!
//! This is the command-line interface for the Reelwatch video poller.

use clap::Parser;
use reelwatch::{api, ReelError};
use reelwatch::config::{load_config_with_hash, Config};
use reelwatch::credentials::CredentialPool;
use reelwatch::fetcher::YouTubeClient;
use reelwatch::ingest::{IngestScheduler, SchedulerSettings};
use reelwatch::storage::{open_store, RecordStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Reelwatch: a rotating-credential video search poller
///
/// Reelwatch polls a video search API on a fixed interval, rotating through
/// a pool of API keys, stores the results in SQLite and serves them over a
/// small read-only HTTP API.
#[derive(Parser, Debug)]
#[command(name = "reelwatch")]
#[command(version)]
#[command(about = "A rotating-credential video search poller", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run a single ingestion tick and exit
    #[arg(long, conflicts_with = "stats")]
    once: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "once")]
    stats: bool,

    /// Run ingestion without the read API
    #[arg(long)]
    no_server: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let store: Arc<dyn RecordStore> = Arc::new(open_store(
        Path::new(&config.storage.database_path),
        config.storage.strategy,
    )?);
    tracing::info!(
        "Using {} store at {}",
        config.storage.strategy.as_str(),
        config.storage.database_path
    );

    if cli.stats {
        return Ok(handle_stats(&config, store.as_ref())?);
    }

    let scheduler = build_scheduler(&config, Arc::clone(&store))?;

    if cli.once {
        let report = scheduler.tick().await;
        report.log();
        println!("{}", report);
        return Ok(());
    }

    Ok(handle_serve(&config, scheduler, store, !cli.no_server).await?)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("reelwatch=info,warn"),
            1 => EnvFilter::new("reelwatch=debug,info"),
            2 => EnvFilter::new("reelwatch=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Wires the credential pool, search client and store into a scheduler
fn build_scheduler(
    config: &Config,
    store: Arc<dyn RecordStore>,
) -> Result<IngestScheduler, ReelError> {
    let pool = CredentialPool::new(config.youtube.api_keys.iter().cloned())?;
    let client = YouTubeClient::new(&config.youtube)?;

    tracing::info!(
        "Credential pool ready with {} key(s); querying '{}'",
        pool.len(),
        config.youtube.search_query
    );

    Ok(IngestScheduler::new(
        Arc::new(pool),
        Arc::new(client),
        store,
        SchedulerSettings::from_config(config),
    ))
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(
    config: &Config,
    store: &dyn RecordStore,
) -> Result<(), ReelError> {
    println!("Database: {}\n", config.storage.database_path);

    let count = store.count()?;
    println!("Stored videos: {}", count);

    if let Some(newest) = store.list_recent()?.first() {
        println!("Newest video: {} ({})", newest.title, newest.published_at.to_rfc3339());
    }

    Ok(())
}

/// Runs ingestion (and the read API) until Ctrl-C
async fn handle_serve(
    config: &Config,
    scheduler: IngestScheduler,
    store: Arc<dyn RecordStore>,
    with_server: bool,
) -> Result<(), ReelError> {
    let shutdown = CancellationToken::new();

    let ingest = tokio::spawn(scheduler.run(shutdown.clone()));

    let server = if with_server {
        let listener = tokio::net::TcpListener::bind(&config.server.listen).await?;
        Some(tokio::spawn(api::serve(listener, store, shutdown.clone())))
    } else {
        None
    };

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");
    shutdown.cancel();

    if let Err(e) = ingest.await {
        tracing::error!("Ingestion task failed: {}", e);
    }

    if let Some(server) = server {
        match server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("Read API failed: {}", e),
            Err(e) => tracing::error!("Read API task failed: {}", e),
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
