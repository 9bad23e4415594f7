//! PostgreSQL assignment store.

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use snippet_core::error::{AppError, ErrorKind};
use snippet_core::result::AppResult;
use snippet_core::types::pagination::{PageRequest, PageResponse};
use snippet_entity::assignment::{
    AssignmentFilter, AssignmentKey, AssignmentStatus, AssignmentUnit, SnippetAssignment,
    UpdateAssignment,
};
use snippet_entity::history::{AssignmentHistory, HistoryAction, HistoryReason, NewHistoryEntry};

use super::history;
use crate::store::{AssignmentStore, ReconcileOutcome};

/// SQLSTATE for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// Assignment rows and history in PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgAssignmentStore {
    pool: PgPool,
}

impl PgAssignmentStore {
    /// Create a new store over a pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        let unique = e
            .as_database_error()
            .and_then(|d| d.code())
            .is_some_and(|code| code == UNIQUE_VIOLATION);
        if unique {
            AppError::with_source(ErrorKind::Conflict, format!("{context}: assignment already exists"), e)
        } else {
            AppError::with_source(ErrorKind::Database, context, e)
        }
    }
}

fn unzip_units(units: &[AssignmentUnit]) -> (Vec<&str>, Vec<&str>) {
    units
        .iter()
        .map(|u| (u.cat_type.as_str(), u.slug.as_str()))
        .unzip()
}

fn not_found(id: Uuid) -> AppError {
    AppError::not_found(format!("Assignment with ID {id} not found"))
}

#[async_trait]
impl AssignmentStore for PgAssignmentStore {
    async fn reconcile(
        &self,
        snippet_id: &str,
        units: &[AssignmentUnit],
        user_id: &str,
    ) -> AppResult<ReconcileOutcome> {
        if units.is_empty() {
            return Ok(ReconcileOutcome::default());
        }
        let (cat_types, slugs) = unzip_units(units);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin reconciliation"))?;

        let existing = sqlx::query_as::<_, SnippetAssignment>(
            "SELECT a.* FROM snippet_assignments a \
             JOIN UNNEST($2::text[], $3::text[]) AS t(cat_type, slug) \
               ON a.cat_type = t.cat_type AND a.slug = t.slug \
             WHERE a.snippet_id = $1 \
             FOR UPDATE OF a",
        )
        .bind(snippet_id)
        .bind(&cat_types)
        .bind(&slugs)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err("Failed to load existing assignments"))?;

        let existing_keys: HashSet<AssignmentKey> =
            existing.iter().map(SnippetAssignment::key).collect();
        let (new_cats, new_slugs): (Vec<&str>, Vec<&str>) = units
            .iter()
            .filter(|u| !existing_keys.contains(&u.key()))
            .map(|u| (u.cat_type.as_str(), u.slug.as_str()))
            .unzip();

        info!(
            snippet_id,
            to_update = existing.len(),
            to_create = new_cats.len(),
            "Reconciling assignments"
        );

        let mut entries = Vec::with_capacity(units.len());

        if !existing.is_empty() {
            let ids: Vec<Uuid> = existing.iter().map(|a| a.id).collect();
            let updated = sqlx::query_as::<_, SnippetAssignment>(
                "UPDATE snippet_assignments \
                 SET status = 'PENDING', updated_at = NOW(), updated_by = $2 \
                 WHERE id = ANY($1) RETURNING *",
            )
            .bind(&ids)
            .bind(user_id)
            .fetch_all(&mut *tx)
            .await
            .map_err(db_err("Failed to reset existing assignments"))?;

            for row in &updated {
                let before = existing.iter().find(|a| a.id == row.id);
                entries.push(NewHistoryEntry {
                    assignment_id: row.id,
                    action: HistoryAction::Updated,
                    user_id: user_id.to_string(),
                    old_values: before.map(SnippetAssignment::snapshot),
                    new_values: Some(row.snapshot()),
                    reason: HistoryReason::AsyncReassignment,
                });
            }
        }

        let created = if new_cats.is_empty() {
            Vec::new()
        } else {
            sqlx::query_as::<_, SnippetAssignment>(
                "INSERT INTO snippet_assignments (snippet_id, cat_type, slug, status, created_by, updated_by) \
                 SELECT $1, t.cat_type, t.slug, 'PENDING'::assignment_status, $4, $4 \
                 FROM UNNEST($2::text[], $3::text[]) AS t(cat_type, slug) \
                 ON CONFLICT (snippet_id, cat_type, slug) DO NOTHING \
                 RETURNING *",
            )
            .bind(snippet_id)
            .bind(&new_cats)
            .bind(&new_slugs)
            .bind(user_id)
            .fetch_all(&mut *tx)
            .await
            .map_err(db_err("Failed to insert assignments"))?
        };

        skipped_inserts(snippet_id, new_cats.len(), created.len());

        for row in &created {
            entries.push(NewHistoryEntry {
                assignment_id: row.id,
                action: HistoryAction::Created,
                user_id: user_id.to_string(),
                old_values: None,
                new_values: Some(row.snapshot()),
                reason: HistoryReason::AsyncAssignment,
            });
        }

        history::append(&mut tx, &entries).await?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit reconciliation"))?;

        let outcome = ReconcileOutcome {
            updated: existing.len() as u64,
            created: created.len() as u64,
        };
        info!(snippet_id, updated = outcome.updated, created = outcome.created, "Reconciliation committed");
        Ok(outcome)
    }

    async fn set_snippet_status(&self, snippet_id: &str, status: AssignmentStatus) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE snippet_assignments SET status = $2, updated_at = NOW() WHERE snippet_id = $1",
        )
        .bind(snippet_id)
        .bind(status)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to update snippet assignment status"))?;

        info!(snippet_id, %status, rows = result.rows_affected(), "Updated snippet assignment status");
        Ok(result.rows_affected())
    }

    async fn find_existing(
        &self,
        snippet_id: &str,
        units: &[AssignmentUnit],
    ) -> AppResult<Vec<SnippetAssignment>> {
        if units.is_empty() {
            return Ok(Vec::new());
        }
        let (cat_types, slugs) = unzip_units(units);

        sqlx::query_as::<_, SnippetAssignment>(
            "SELECT a.* FROM snippet_assignments a \
             JOIN UNNEST($2::text[], $3::text[]) AS t(cat_type, slug) \
               ON a.cat_type = t.cat_type AND a.slug = t.slug \
             WHERE a.snippet_id = $1 \
             ORDER BY a.cat_type, a.slug",
        )
        .bind(snippet_id)
        .bind(&cat_types)
        .bind(&slugs)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to find existing assignments"))
    }

    async fn create_many(
        &self,
        snippet_id: &str,
        units: &[AssignmentUnit],
        user_id: &str,
    ) -> AppResult<Vec<SnippetAssignment>> {
        if units.is_empty() {
            return Ok(Vec::new());
        }
        let (cat_types, slugs) = unzip_units(units);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin assignment creation"))?;

        let created = sqlx::query_as::<_, SnippetAssignment>(
            "INSERT INTO snippet_assignments (snippet_id, cat_type, slug, status, created_by) \
             SELECT $1, t.cat_type, t.slug, 'PENDING'::assignment_status, $4 \
             FROM UNNEST($2::text[], $3::text[]) AS t(cat_type, slug) \
             RETURNING *",
        )
        .bind(snippet_id)
        .bind(&cat_types)
        .bind(&slugs)
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err("Failed to create assignments"))?;

        let entries: Vec<NewHistoryEntry> = created
            .iter()
            .map(|row| NewHistoryEntry {
                assignment_id: row.id,
                action: HistoryAction::Created,
                user_id: user_id.to_string(),
                old_values: None,
                new_values: Some(row.snapshot()),
                reason: HistoryReason::UserAction,
            })
            .collect();
        history::append(&mut tx, &entries).await?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit assignment creation"))?;
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<SnippetAssignment>> {
        sqlx::query_as::<_, SnippetAssignment>("SELECT * FROM snippet_assignments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find assignment"))
    }

    async fn find_by_key(
        &self,
        snippet_id: &str,
        cat_type: &str,
        slug: &str,
    ) -> AppResult<Option<SnippetAssignment>> {
        sqlx::query_as::<_, SnippetAssignment>(
            "SELECT * FROM snippet_assignments WHERE snippet_id = $1 AND cat_type = $2 AND slug = $3",
        )
        .bind(snippet_id)
        .bind(cat_type)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to find assignment"))
    }

    async fn list(
        &self,
        filter: &AssignmentFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<SnippetAssignment>> {
        const WHERE: &str = "WHERE ($1::text IS NULL OR snippet_id = $1) \
             AND ($2::text IS NULL OR cat_type = $2) \
             AND ($3::assignment_status IS NULL OR status = $3)";

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM snippet_assignments {WHERE}"
        ))
        .bind(&filter.snippet_id)
        .bind(&filter.cat_type)
        .bind(filter.status)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to count assignments"))?;

        let rows = sqlx::query_as::<_, SnippetAssignment>(&format!(
            "SELECT * FROM snippet_assignments {WHERE} \
             ORDER BY assigned_at DESC LIMIT $4 OFFSET $5"
        ))
        .bind(&filter.snippet_id)
        .bind(&filter.cat_type)
        .bind(filter.status)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list assignments"))?;

        Ok(PageResponse::new(rows, page, total as u64))
    }

    async fn find_by_snippet(&self, snippet_id: &str) -> AppResult<Vec<SnippetAssignment>> {
        sqlx::query_as::<_, SnippetAssignment>(
            "SELECT * FROM snippet_assignments WHERE snippet_id = $1 ORDER BY cat_type ASC, slug ASC",
        )
        .bind(snippet_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list snippet assignments"))
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &UpdateAssignment,
        user_id: &str,
    ) -> AppResult<SnippetAssignment> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin assignment update"))?;

        let before = sqlx::query_as::<_, SnippetAssignment>(
            "SELECT * FROM snippet_assignments WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err("Failed to load assignment"))?
        .ok_or_else(|| not_found(id))?;

        let after = sqlx::query_as::<_, SnippetAssignment>(
            "UPDATE snippet_assignments SET \
                slug = COALESCE($2, slug), \
                status = COALESCE($3, status), \
                sync_metadata = COALESCE($4::jsonb, sync_metadata), \
                last_sync_at = CASE WHEN $4::jsonb IS NULL THEN last_sync_at ELSE NOW() END, \
                updated_by = $5, \
                updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&changes.slug)
        .bind(changes.status)
        .bind(&changes.sync_metadata)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err("Failed to update assignment"))?;

        let entry = NewHistoryEntry {
            assignment_id: id,
            action: HistoryAction::Updated,
            user_id: user_id.to_string(),
            old_values: Some(before.edit_snapshot()),
            new_values: Some(after.edit_snapshot()),
            reason: HistoryReason::UserAction,
        };
        history::append(&mut tx, std::slice::from_ref(&entry)).await?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit assignment update"))?;
        Ok(after)
    }

    async fn delete(&self, id: Uuid, user_id: &str) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin assignment delete"))?;

        let row = sqlx::query_as::<_, SnippetAssignment>(
            "SELECT * FROM snippet_assignments WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err("Failed to load assignment"))?
        .ok_or_else(|| not_found(id))?;

        let entry = NewHistoryEntry {
            assignment_id: id,
            action: HistoryAction::Deleted,
            user_id: user_id.to_string(),
            old_values: Some(row.snapshot()),
            new_values: None,
            reason: HistoryReason::UserAction,
        };
        history::append(&mut tx, std::slice::from_ref(&entry)).await?;

        sqlx::query("DELETE FROM snippet_assignments WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err("Failed to delete assignment"))?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit assignment delete"))?;
        Ok(())
    }

    async fn history_for_snippet(&self, snippet_id: &str) -> AppResult<Vec<AssignmentHistory>> {
        sqlx::query_as::<_, AssignmentHistory>(
            "SELECT h.* FROM assignment_history h \
             JOIN snippet_assignments a ON a.id = h.assignment_id \
             WHERE a.snippet_id = $1 \
             ORDER BY h.created_at DESC",
        )
        .bind(snippet_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to load assignment history"))
    }
}

/// Rows the insert skipped because a concurrent writer created them after
/// the locking read. Those rows get neither the `PENDING` reset nor a
/// history entry from this reconciliation.
fn skipped_inserts(snippet_id: &str, attempted: usize, inserted: usize) -> usize {
    let skipped = attempted.saturating_sub(inserted);
    if skipped > 0 {
        warn!(
            snippet_id,
            attempted,
            inserted,
            skipped,
            "Reconciliation skipped rows inserted concurrently"
        );
    }
    skipped
}
