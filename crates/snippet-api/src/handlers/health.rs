//! Pipeline health handlers.

use axum::Json;
use axum::extract::State;

use snippet_service::bulk::{BackendProbe, PipelineHealth};

use crate::state::AppState;

/// GET /api/assignment/health
pub async fn health(State(state): State<AppState>) -> Json<PipelineHealth> {
    Json(state.bulk_service.health().await)
}

/// GET /api/assignment/health/test-backend
pub async fn test_backend(State(state): State<AppState>) -> Json<BackendProbe> {
    Json(state.bulk_service.probe_backend().await)
}
