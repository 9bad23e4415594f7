//! Bulk queue, job status, preview and test-sync handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use snippet_core::error::AppError;
use snippet_entity::job::AssignmentJobStatus;
use snippet_service::bulk::{QueuedAssignment, TestSyncResult};

use crate::dto::request::{AssignmentRequestBody, PreviewRequestBody};
use crate::extractors::{Actor, ValidatedJson};
use crate::state::AppState;

/// POST /api/assignment/bulk-assign
pub async fn bulk_assign(
    State(state): State<AppState>,
    actor: Actor,
    ValidatedJson(body): ValidatedJson<AssignmentRequestBody>,
) -> Result<(StatusCode, Json<QueuedAssignment>), AppError> {
    let queued = state.bulk_service.enqueue(&actor, body.into()).await?;
    Ok((StatusCode::ACCEPTED, Json(queued)))
}

/// GET /api/assignment/{assignment_id}/status
pub async fn job_status(
    State(state): State<AppState>,
    Path(assignment_id): Path<String>,
) -> Result<Json<AssignmentJobStatus>, AppError> {
    let status = state.bulk_service.status(&assignment_id).await?;
    Ok(Json(status))
}

/// POST /api/assignment/preview
pub async fn preview(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<PreviewRequestBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let preview = state.bulk_service.preview(body.into()).await?;
    Ok(Json(preview))
}

/// POST /api/assignment/test-sync
pub async fn test_sync(
    State(state): State<AppState>,
    actor: Actor,
    ValidatedJson(body): ValidatedJson<AssignmentRequestBody>,
) -> Result<Json<TestSyncResult>, AppError> {
    let result = state.bulk_service.test_sync(&actor, body.into()).await?;
    Ok(Json(result))
}
