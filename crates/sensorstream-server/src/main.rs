//! sensorstream: replay a CSV of sensor readings into a bounded in-memory
//! store and serve it over HTTP
//!
//! One row is appended per tick and stamped with the ingestion time. When
//! the file runs out it starts over from the first row. The store keeps the
//! most recent `capacity` samples.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sensorstream_config::{CliConfigMerge, LogFormat, LogLevel, Settings};
use sensorstream_core::{CsvOptions, CycleSource, SystemClock};
use sensorstream_server::{AppState, StreamSettings, build_router};
use sensorstream_streaming::{SampleStore, SchedulerConfig, SubscriptionHub, TickScheduler};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Sensor time-series buffer with range queries and live tail
#[derive(Debug, Parser)]
#[command(name = "sensorstream", version, about)]
struct Args {
    /// Configuration file (defaults to ./sensorstream.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// CSV file to replay
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Bind address
    #[arg(long)]
    host: Option<String>,

    /// Listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Maximum retained samples
    #[arg(long)]
    capacity: Option<usize>,

    /// Milliseconds between appended samples
    #[arg(long)]
    tick_interval_ms: Option<u64>,

    /// Directory of static dashboard files
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<LogLevel>,
}

impl CliConfigMerge for Args {
    fn merge_into_config(&self, config: &mut Settings) {
        if let Some(data) = &self.data {
            config.source.path = data.clone();
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(capacity) = self.capacity {
            config.store.capacity = capacity;
        }
        if let Some(tick_interval_ms) = self.tick_interval_ms {
            config.store.tick_interval_ms = tick_interval_ms;
        }
        if let Some(static_dir) = &self.static_dir {
            config.server.static_dir = static_dir.clone();
        }
        if let Some(level) = self.log_level {
            config.app.log_level = level;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => Settings::load_from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Settings::load().context("failed to load configuration")?,
    }
    .merge_cli_args(&args)
    .context("invalid configuration")?;

    init_logging(settings.app.log_level, settings.app.log_format)?;

    if let Err(e) = run(settings).await {
        tracing::error!(error = %format!("{e:#}"), "sensorstream exited with error");
        return Err(e);
    }
    Ok(())
}

async fn run(settings: Settings) -> Result<()> {
    let csv_options = CsvOptions {
        has_headers: settings.source.has_headers,
    };
    let source = CycleSource::from_csv_path(&settings.source.path, &csv_options)
        .context("failed to load sample source")?;
    let source_rows = source.row_count();

    let shutdown = CancellationToken::new();

    let scheduler = TickScheduler::new(
        source,
        SampleStore::new(settings.store.capacity),
        SystemClock,
        SchedulerConfig {
            tick_interval: settings.store.tick_interval(),
        },
    );
    let reader = scheduler.reader();
    let scheduler = scheduler.spawn(shutdown.child_token());

    // Live tails close as soon as shutdown starts so graceful shutdown
    // does not wait on open event streams
    let hub = Arc::new(SubscriptionHub::with_shutdown(
        reader.clone(),
        shutdown.child_token(),
    ));
    let state = AppState::new(
        reader.clone(),
        Arc::clone(&hub),
        StreamSettings::from(&settings.server),
    );
    let app = build_router(state, &settings.server.static_dir);

    let addr = settings.server.bind_addr();
    let listener = sensorstream_server::bind(&addr).await?;
    tracing::info!(
        addr = %addr,
        source_rows,
        capacity = settings.store.capacity,
        tick_interval_ms = settings.store.tick_interval_ms,
        static_dir = %settings.server.static_dir.display(),
        "sensorstream listening"
    );

    tokio::spawn(shutdown_on_ctrl_c(shutdown.clone()));
    let served = sensorstream_server::serve(listener, app, shutdown.clone()).await;

    // Stop producers and subscribers even if the server failed
    shutdown.cancel();
    hub.shutdown();
    let ticks = scheduler.join().await.context("tick scheduler panicked")?;

    let stats = reader.stats();
    tracing::info!(
        ticks,
        retained = stats.len,
        total_appended = stats.total_appended,
        total_evicted = stats.total_evicted,
        "sensorstream stopped"
    );

    served.map_err(Into::into)
}

async fn shutdown_on_ctrl_c(shutdown: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("shutdown requested");
            shutdown.cancel();
        }
        Err(e) => tracing::error!(error = %e, "failed to listen for ctrl-c"),
    }
}

/// Install the global subscriber; `RUST_LOG` overrides the configured level
fn init_logging(level: LogLevel, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.as_str()))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let json = format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_target(true)))
        .with((!json).then(|| fmt::layer().with_target(true).with_thread_ids(false)))
        .try_init()
        .context("failed to install log subscriber")?;

    Ok(())
}
