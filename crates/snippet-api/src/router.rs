//! Route definitions for the snippet assignment HTTP API.
//!
//! Every route lives under `/api/assignment`. The router receives
//! `AppState` and passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, patch, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(assignment_routes())
        .merge(bulk_routes())
        .merge(health_routes());

    let cors = middleware::cors::build_cors_layer(&state.config.server.cors);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Assignment CRUD, synchronous execution and read views.
///
/// Captures in the second segment share the name `{id}`; it holds a row id
/// for PATCH/DELETE and a snippet id for the history view.
fn assignment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/assignment",
            post(handlers::assignment::create_assignment)
                .get(handlers::assignment::list_assignments),
        )
        .route(
            "/assignment/by-snippet/{snippet_id}",
            get(handlers::assignment::by_snippet),
        )
        .route(
            "/assignment/{id}/detailed-history",
            get(handlers::assignment::detailed_history),
        )
        .route(
            "/assignment/{id}",
            patch(handlers::assignment::update_assignment)
                .delete(handlers::assignment::delete_assignment),
        )
}

/// Bulk queue, job status, preview and test-sync.
fn bulk_routes() -> Router<AppState> {
    Router::new()
        .route("/assignment/bulk-assign", post(handlers::bulk::bulk_assign))
        .route("/assignment/{id}/status", get(handlers::bulk::job_status))
        .route("/assignment/preview", post(handlers::bulk::preview))
        .route("/assignment/test-sync", post(handlers::bulk::test_sync))
}

/// Pipeline health and execution service probe.
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/assignment/health", get(handlers::health::health))
        .route(
            "/assignment/health/test-backend",
            get(handlers::health::test_backend),
        )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use http::{Request, StatusCode};
    use tower::ServiceExt;

    use snippet_cache::CacheManager;
    use snippet_client::mock::MockAssignmentBackend;
    use snippet_core::config::AppConfig;
    use snippet_database::MemoryAssignmentStore;

    use crate::app::build_pipeline;

    fn router() -> axum::Router {
        let cache = Arc::new(CacheManager::in_memory());
        let pipeline = build_pipeline(
            Arc::new(AppConfig::default()),
            Arc::new(MemoryAssignmentStore::new()),
            Arc::clone(&cache),
            cache,
            Arc::new(MockAssignmentBackend::new()),
        );
        super::build_router(pipeline.state)
    }

    #[tokio::test]
    async fn static_segments_win_over_captures() {
        let response = router()
            .oneshot(
                Request::get("/api/assignment/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_job_is_not_found() {
        let response = router()
            .oneshot(
                Request::get("/api/assignment/assignment_1_abc/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
