//! Postflow server: long-running scheduled post publication worker.
//!
//! Loads configuration, connects to PostgreSQL, applies migrations, then
//! triggers publication sweeps on a cron schedule or a fixed interval
//! until SIGINT/SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use postflow_core::config::AppConfig;
use postflow_core::error::AppError;
use postflow_database::DatabasePool;
use postflow_worker::{CronScheduler, SweepRunner};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from file and environment.
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("POSTFLOW_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
    AppConfig::load(&config_path)
}

/// Initialize tracing. `RUST_LOG` overrides `logging.level`.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Which mechanism fires sweeps.
enum Trigger {
    Cron(CronScheduler),
    Interval(tokio::task::JoinHandle<()>),
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Postflow");

    // ── Step 1: Database connection + migrations ─────────────────
    let db = DatabasePool::connect(&config.database).await?;
    db.ping().await?;
    postflow_database::migration::run_migrations(db.pool()).await?;

    if !config.worker.enabled {
        tracing::warn!("Publication worker disabled by configuration, exiting");
        db.close().await;
        return Ok(());
    }

    // ── Step 2: Pipeline ─────────────────────────────────────────
    let pipeline = Arc::new(postflow_worker::build_pipeline(
        &config,
        postflow_worker::pg_store(&db),
    )?);

    // ── Step 3: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 4: Trigger ──────────────────────────────────────────
    let trigger = match &config.worker.schedule {
        Some(expression) => {
            let scheduler = CronScheduler::new(Arc::clone(&pipeline)).await?;
            scheduler.register_sweep(expression).await?;
            scheduler.start().await?;
            Trigger::Cron(scheduler)
        }
        None => {
            let runner = SweepRunner::new(
                Arc::clone(&pipeline),
                Duration::from_secs(config.worker.poll_interval_seconds),
            );
            Trigger::Interval(tokio::spawn(async move { runner.run(shutdown_rx).await }))
        }
    };

    tracing::info!(
        batch_size = config.worker.batch_size,
        stale_after_seconds = config.worker.stale_after_seconds,
        "Publication worker running"
    );

    // ── Step 5: Graceful shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);

    match trigger {
        Trigger::Cron(mut scheduler) => scheduler.shutdown().await?,
        Trigger::Interval(handle) => {
            if tokio::time::timeout(Duration::from_secs(60), handle)
                .await
                .is_err()
            {
                tracing::warn!("Sweep still running after 60s, exiting anyway");
            }
        }
    }

    db.close().await;
    tracing::info!("Postflow stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
}
