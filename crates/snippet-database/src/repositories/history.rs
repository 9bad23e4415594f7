//! History entry queries shared by the assignment repository.

use sqlx::PgConnection;
use uuid::Uuid;

use snippet_core::error::{AppError, ErrorKind};
use snippet_core::result::AppResult;
use snippet_entity::history::NewHistoryEntry;

/// Append history entries in one statement on the caller's connection,
/// so they commit or roll back with the row changes they describe.
pub(crate) async fn append(conn: &mut PgConnection, entries: &[NewHistoryEntry]) -> AppResult<u64> {
    if entries.is_empty() {
        return Ok(0);
    }

    let mut assignment_ids: Vec<Uuid> = Vec::with_capacity(entries.len());
    let mut actions: Vec<&str> = Vec::with_capacity(entries.len());
    let mut user_ids: Vec<&str> = Vec::with_capacity(entries.len());
    let mut old_values: Vec<Option<serde_json::Value>> = Vec::with_capacity(entries.len());
    let mut new_values: Vec<Option<serde_json::Value>> = Vec::with_capacity(entries.len());
    let mut metadata: Vec<serde_json::Value> = Vec::with_capacity(entries.len());

    for entry in entries {
        assignment_ids.push(entry.assignment_id);
        actions.push(entry.action.as_str());
        user_ids.push(&entry.user_id);
        old_values.push(entry.old_values.clone());
        new_values.push(entry.new_values.clone());
        metadata.push(entry.metadata());
    }

    let result = sqlx::query(
        "INSERT INTO assignment_history (assignment_id, action, user_id, old_values, new_values, metadata) \
         SELECT t.assignment_id, t.action::history_action, t.user_id, t.old_values, t.new_values, t.metadata \
         FROM UNNEST($1::uuid[], $2::text[], $3::text[], $4::jsonb[], $5::jsonb[], $6::jsonb[]) \
         AS t(assignment_id, action, user_id, old_values, new_values, metadata)",
    )
    .bind(&assignment_ids)
    .bind(&actions)
    .bind(&user_ids)
    .bind(&old_values)
    .bind(&new_values)
    .bind(&metadata)
    .execute(conn)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to append assignment history", e))?;

    Ok(result.rows_affected())
}
