// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  logpulse: log ingestion and request analytics
//
//  Store:   one JSONL file, replaced atomically on every upload
//  Queries: full rescan per request, windowed on the latest event
//  API:     axum on a multi-threaded tokio runtime
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use clap::{Parser, ValueEnum};
use logpulse_api::server::{ApiState, start_api};
use logpulse_core::PulseConfig;
use logpulse_observability::MetricsCollector;
use logpulse_store::FileStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "logpulse", version, about = "logpulse: log ingestion and request analytics")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "/etc/logpulse/logpulse.yaml")]
    config: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormat,

    /// JSONL store file; overrides `store.log_file`.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Listen address; overrides `server.addr`.
    #[arg(long)]
    addr: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Tracing ──
    init_tracing(&cli.log_level, cli.log_format);

    info!(version = env!("CARGO_PKG_VERSION"), "logpulse starting");

    // ── Config ──
    // A missing file loads as defaults; env overrides apply either way.
    if cli.config.exists() {
        info!(path = %cli.config.display(), "Loading config file");
    } else {
        info!(path = %cli.config.display(), "No config file found, using defaults + env");
    }
    let mut config = PulseConfig::load(&cli.config)?;
    if let Some(log_file) = cli.log_file {
        config.store.log_file = log_file;
    }
    if let Some(addr) = cli.addr {
        config.server.addr = addr;
    }

    // ── Store + metrics ──
    let store = Arc::new(FileStore::new(config.store.log_file.clone()));
    info!(path = %store.path().display(), "Using JSONL store");

    let metrics = Arc::new(MetricsCollector::new(config.observability.prometheus.enabled)?);
    if metrics.is_enabled() {
        info!(path = %config.observability.prometheus.path, "Prometheus metrics enabled");
    }

    let state = Arc::new(ApiState::new(store, metrics, config)?);

    // ── Runtime ──
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("logpulse-worker")
        .build()?;

    rt.block_on(start_api(state, shutdown_signal()))?;

    info!("logpulse stopped");
    Ok(())
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    match format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init(),
    }
}

/// Resolves on SIGINT (Ctrl+C) or SIGTERM (docker stop).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping...");
}
