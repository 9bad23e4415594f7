//! Application builder: wires the assignment pipeline, services and router.

use std::sync::Arc;

use axum::Router;

use snippet_cache::CacheManager;
use snippet_client::AssignmentBackend;
use snippet_core::config::AppConfig;
use snippet_database::AssignmentStore;
use snippet_service::{AssignmentService, BulkAssignmentService};
use snippet_worker::{AssignmentQueue, BatchExecutor, JobProcessor, QueueWorker, StatusStore};

use crate::router::build_router;
use crate::state::AppState;

/// Everything the server needs once collaborators are connected.
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Handler state.
    pub state: AppState,
    /// The queue consumer. Not started.
    pub worker: Arc<QueueWorker>,
}

/// Builds the queue, status store, executor, worker and services on top of
/// already-connected collaborators.
///
/// `cache` serves request handlers (enqueue, status reads and writes, health).
/// `consumer_cache` is only used for the worker's blocking pop and must not
/// share a Redis connection with `cache`; see [`CacheManager::dedicated`].
pub fn build_pipeline(
    config: Arc<AppConfig>,
    store: Arc<dyn AssignmentStore>,
    cache: Arc<CacheManager>,
    consumer_cache: Arc<CacheManager>,
    backend: Arc<dyn AssignmentBackend>,
) -> Pipeline {
    let worker_config = &config.worker;

    let queue = AssignmentQueue::new(Arc::clone(&cache), worker_config.queue_key.clone());
    let consumer_queue = AssignmentQueue::new(consumer_cache, worker_config.queue_key.clone());
    let status = StatusStore::new(Arc::clone(&cache), worker_config.status_ttl());
    let executor = BatchExecutor::new(Arc::clone(&backend), status.clone(), worker_config);

    let processor = Arc::new(JobProcessor::new(
        Arc::clone(&store),
        executor.clone(),
        status.clone(),
        worker_config,
    ));
    let worker = Arc::new(QueueWorker::new(consumer_queue, processor, worker_config));

    let assignment_service = Arc::new(AssignmentService::new(store, executor.clone()));
    let bulk_service = Arc::new(BulkAssignmentService::new(
        queue,
        status,
        executor,
        backend,
        Arc::clone(&worker),
    ));

    Pipeline {
        state: AppState {
            config,
            assignment_service,
            bulk_service,
        },
        worker,
    }
}

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
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
