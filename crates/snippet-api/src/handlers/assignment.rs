//! Assignment CRUD and synchronous execution handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;

use snippet_core::error::AppError;
use snippet_core::types::pagination::PageResponse;
use snippet_entity::assignment::SnippetAssignment;
use snippet_service::assignment::{
    DeleteResult, DetailedHistory, SnippetAssignments, SyncAssignmentResult,
};

use crate::dto::request::{AssignmentRequestBody, ListAssignmentsQuery, UpdateAssignmentBody};
use crate::extractors::{Actor, ValidatedJson};
use crate::state::AppState;

/// POST /api/assignment
pub async fn create_assignment(
    State(state): State<AppState>,
    actor: Actor,
    ValidatedJson(body): ValidatedJson<AssignmentRequestBody>,
) -> Result<Json<SyncAssignmentResult>, AppError> {
    let result = state
        .assignment_service
        .create_and_execute(&actor, body.into())
        .await?;
    Ok(Json(result))
}

/// GET /api/assignment
pub async fn list_assignments(
    State(state): State<AppState>,
    Query(query): Query<ListAssignmentsQuery>,
) -> Result<Json<PageResponse<SnippetAssignment>>, AppError> {
    let (filter, page) = query.into_parts()?;
    let result = state.assignment_service.list(&filter, &page).await?;
    Ok(Json(result))
}

/// GET /api/assignment/by-snippet/{snippet_id}
pub async fn by_snippet(
    State(state): State<AppState>,
    Path(snippet_id): Path<String>,
) -> Result<Json<SnippetAssignments>, AppError> {
    let view = state.assignment_service.by_snippet(&snippet_id).await?;
    Ok(Json(view))
}

/// GET /api/assignment/{snippet_id}/detailed-history
pub async fn detailed_history(
    State(state): State<AppState>,
    Path(snippet_id): Path<String>,
) -> Result<Json<DetailedHistory>, AppError> {
    let history = state.assignment_service.detailed_history(&snippet_id).await?;
    Ok(Json(history))
}

/// PATCH /api/assignment/{id}
pub async fn update_assignment(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<UpdateAssignmentBody>,
) -> Result<Json<SnippetAssignment>, AppError> {
    let updated = state
        .assignment_service
        .update(&actor, id, body.into())
        .await?;
    Ok(Json(updated))
}

/// DELETE /api/assignment/{id}
pub async fn delete_assignment(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResult>, AppError> {
    let result = state.assignment_service.delete(&actor, id).await?;
    Ok(Json(result))
}

