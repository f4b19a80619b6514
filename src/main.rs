//! SurveyDoc Server: versioned document storage for building surveys.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use surveydoc_api::{AppState, build_router};
use surveydoc_core::config::AppConfig;
use surveydoc_core::config::logging::LogFormat;
use surveydoc_core::error::AppError;
use surveydoc_service::{BlobSweeper, DocumentService, VersioningService};
use surveydoc_worker::{BlobSweepJob, CronScheduler};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from `config/` and the environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config = match std::env::var("SURVEYDOC_CONFIG") {
        Ok(path) => AppConfig::load_file(&path)?,
        Err(_) => {
            let env =
                std::env::var("SURVEYDOC_ENV").unwrap_or_else(|_| "development".to_string());
            AppConfig::load(&env)?
        }
    };
    config.validate()?;
    Ok(config)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        LogFormat::Pretty => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting SurveyDoc v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Record store (+ migrations) ──────────────────────
    let store = surveydoc_database::open_store(&config.database).await?;
    tracing::info!(backend = store.backend(), "Record store ready");

    // ── Step 2: Blob store ───────────────────────────────────────
    let blobs = surveydoc_storage::build_blob_store(&config.storage).await?;
    tracing::info!(provider = blobs.provider_type(), "Blob store ready");

    // ── Step 3: Services ─────────────────────────────────────────
    let file_type = config.storage.default_file_type.clone();
    let versioning = Arc::new(VersioningService::new(
        Arc::clone(&store),
        Arc::clone(&blobs),
        config.versioning.clone(),
        file_type.clone(),
    ));
    let documents = Arc::new(DocumentService::new(
        Arc::clone(&store),
        Arc::clone(&blobs),
        versioning,
        file_type,
    ));

    // ── Step 4: Scheduled maintenance ────────────────────────────
    let mut scheduler = if config.worker.enabled {
        let sweeper = BlobSweeper::new(
            Arc::clone(&store),
            Arc::clone(&blobs),
            config.worker.sweep_grace_seconds,
        );
        let job = BlobSweepJob::new(Arc::new(sweeper), config.worker.tenants.clone());
        let scheduler = CronScheduler::new(config.worker.clone()).await?;
        scheduler.register_blob_sweep(job).await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Worker disabled");
        None
    };

    // ── Step 5: HTTP server ──────────────────────────────────────
    let config = Arc::new(config);
    let state = AppState::new(Arc::clone(&config), store, blobs, documents);
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("SurveyDoc server listening on {}", addr);

    // ── Step 6: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    if let Some(scheduler) = scheduler.as_mut() {
        let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
        match tokio::time::timeout(grace, scheduler.shutdown()).await {
            Ok(result) => result?,
            Err(_) => tracing::warn!("Scheduler did not stop within the grace period"),
        }
    }

    tracing::info!("SurveyDoc server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
