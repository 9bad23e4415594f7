//! Snippet assignment server.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use snippet_api::{build_app, build_pipeline, shutdown_signal};
use snippet_cache::CacheManager;
use snippet_client::HttpAssignmentBackend;
use snippet_core::config::AppConfig;
use snippet_core::error::AppError;
use snippet_database::{DatabasePool, PgAssignmentStore};

#[tokio::main]
async fn main() {
    let env = std::env::var("SNIPPET_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!("Configuration loaded (env: {})", env);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
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

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting snippet server v{}", env!("CARGO_PKG_VERSION"));
    let config = Arc::new(config);

    // ── Step 1: Database connection + migrations ─────────────────
    tracing::info!("Connecting to database...");
    let db = DatabasePool::connect(&config.database).await?;

    tracing::info!("Running database migrations...");
    snippet_database::migration::run_migrations(db.pool()).await?;
    tracing::info!("Database migrations complete");

    let store = Arc::new(PgAssignmentStore::new(db.pool().clone()));

    // ── Step 2: Cache / queue provider ───────────────────────────
    tracing::info!(
        "Initializing cache (provider: {})...",
        config.cache.provider
    );
    let cache = Arc::new(CacheManager::new(&config.cache).await?);
    let consumer_cache = Arc::new(cache.dedicated(&config.cache).await?);

    // ── Step 3: Execution service client ─────────────────────────
    let backend = Arc::new(HttpAssignmentBackend::new(&config.backend)?);
    tracing::info!("Execution service at {}", config.backend.base_url);

    // ── Step 4: Pipeline, services, worker ───────────────────────
    let pipeline = build_pipeline(Arc::clone(&config), store, cache, consumer_cache, backend);

    if config.worker.enabled {
        pipeline.worker.start().await;
    } else {
        tracing::warn!("Queue worker disabled; bulk jobs will stay queued");
    }

    // ── Step 5: HTTP server ──────────────────────────────────────
    let app = build_app(pipeline.state.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Snippet server listening on {}", addr);

    // ── Step 6: Graceful shutdown ────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // ── Step 7: Let the in-flight job finish ─────────────────────
    tracing::info!("Waiting for queue worker to finish...");
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    if tokio::time::timeout(grace, pipeline.worker.stop()).await.is_err() {
        tracing::warn!("Queue worker did not stop within {:?}", grace);
    }

    tracing::info!("Snippet server shut down gracefully");
    Ok(())
}
