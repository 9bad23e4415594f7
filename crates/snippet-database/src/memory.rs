//! In-memory assignment store for tests and database-less runs.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use snippet_core::error::AppError;
use snippet_core::result::AppResult;
use snippet_core::types::pagination::{PageRequest, PageResponse};
use snippet_entity::assignment::{
    AssignmentFilter, AssignmentKey, AssignmentStatus, AssignmentUnit, SnippetAssignment,
    UpdateAssignment,
};
use snippet_entity::history::{AssignmentHistory, HistoryAction, HistoryReason, NewHistoryEntry};

use crate::store::{AssignmentStore, ReconcileOutcome};

#[derive(Debug, Default)]
struct Tables {
    rows: Vec<SnippetAssignment>,
    history: Vec<AssignmentHistory>,
}

impl Tables {
    fn append(&mut self, entry: NewHistoryEntry) {
        let metadata = entry.metadata();
        self.history.push(AssignmentHistory {
            id: Uuid::new_v4(),
            assignment_id: entry.assignment_id,
            action: entry.action,
            user_id: entry.user_id,
            old_values: entry.old_values,
            new_values: entry.new_values,
            metadata: Some(metadata),
            created_at: Utc::now(),
        });
    }

    fn position(&self, snippet_id: &str, key: &AssignmentKey) -> Option<usize> {
        self.rows
            .iter()
            .position(|r| r.snippet_id == snippet_id && r.cat_type == key.cat_type && r.slug == key.slug)
    }

    fn insert(&mut self, snippet_id: &str, unit: &AssignmentUnit, user_id: &str, updated_by: Option<&str>) -> SnippetAssignment {
        let now = Utc::now();
        let row = SnippetAssignment {
            id: Uuid::new_v4(),
            snippet_id: snippet_id.to_string(),
            cat_type: unit.cat_type.clone(),
            slug: unit.slug.clone(),
            status: AssignmentStatus::Pending,
            created_by: user_id.to_string(),
            updated_by: updated_by.map(str::to_string),
            assigned_at: now,
            updated_at: now,
            sync_metadata: None,
            last_sync_at: None,
        };
        self.rows.push(row.clone());
        row
    }
}

/// Assignment rows and history held in process memory.
///
/// Each operation runs under one write lock, which gives it the same
/// all-or-nothing visibility as a database transaction.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssignmentStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryAssignmentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of history entries across all snippets.
    pub async fn history_len(&self) -> usize {
        self.tables.read().await.history.len()
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::not_found(format!("Assignment with ID {id} not found"))
}

#[async_trait]
impl AssignmentStore for MemoryAssignmentStore {
    async fn reconcile(
        &self,
        snippet_id: &str,
        units: &[AssignmentUnit],
        user_id: &str,
    ) -> AppResult<ReconcileOutcome> {
        let mut tables = self.tables.write().await;
        let mut outcome = ReconcileOutcome::default();

        for unit in units {
            match tables.position(snippet_id, &unit.key()) {
                Some(idx) => {
                    let before = tables.rows[idx].snapshot();
                    let row = &mut tables.rows[idx];
                    row.status = AssignmentStatus::Pending;
                    row.updated_at = Utc::now();
                    row.updated_by = Some(user_id.to_string());
                    let entry = NewHistoryEntry {
                        assignment_id: row.id,
                        action: HistoryAction::Updated,
                        user_id: user_id.to_string(),
                        old_values: Some(before),
                        new_values: Some(row.snapshot()),
                        reason: HistoryReason::AsyncReassignment,
                    };
                    tables.append(entry);
                    outcome.updated += 1;
                }
                None => {
                    let row = tables.insert(snippet_id, unit, user_id, Some(user_id));
                    tables.append(NewHistoryEntry {
                        assignment_id: row.id,
                        action: HistoryAction::Created,
                        user_id: user_id.to_string(),
                        old_values: None,
                        new_values: Some(row.snapshot()),
                        reason: HistoryReason::AsyncAssignment,
                    });
                    outcome.created += 1;
                }
            }
        }

        info!(snippet_id, updated = outcome.updated, created = outcome.created, "Reconciliation committed");
        Ok(outcome)
    }

    async fn set_snippet_status(&self, snippet_id: &str, status: AssignmentStatus) -> AppResult<u64> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let mut changed = 0;
        for row in tables.rows.iter_mut().filter(|r| r.snippet_id == snippet_id) {
            row.status = status;
            row.updated_at = now;
            changed += 1;
        }
        Ok(changed)
    }

    async fn find_existing(
        &self,
        snippet_id: &str,
        units: &[AssignmentUnit],
    ) -> AppResult<Vec<SnippetAssignment>> {
        let wanted: HashSet<AssignmentKey> = units.iter().map(AssignmentUnit::key).collect();
        let tables = self.tables.read().await;
        let mut rows: Vec<SnippetAssignment> = tables
            .rows
            .iter()
            .filter(|r| r.snippet_id == snippet_id && wanted.contains(&r.key()))
            .cloned()
            .collect();
        rows.sort_by_key(SnippetAssignment::key);
        Ok(rows)
    }

    async fn create_many(
        &self,
        snippet_id: &str,
        units: &[AssignmentUnit],
        user_id: &str,
    ) -> AppResult<Vec<SnippetAssignment>> {
        let mut tables = self.tables.write().await;

        let mut seen = HashSet::new();
        for unit in units {
            let key = unit.key();
            if tables.position(snippet_id, &key).is_some() || !seen.insert(key) {
                return Err(AppError::conflict(format!(
                    "Assignment {}/{} already exists for snippet {snippet_id}",
                    unit.cat_type, unit.slug
                )));
            }
        }

        let mut created = Vec::with_capacity(units.len());
        for unit in units {
            let row = tables.insert(snippet_id, unit, user_id, None);
            tables.append(NewHistoryEntry {
                assignment_id: row.id,
                action: HistoryAction::Created,
                user_id: user_id.to_string(),
                old_values: None,
                new_values: Some(row.snapshot()),
                reason: HistoryReason::UserAction,
            });
            created.push(row);
        }
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<SnippetAssignment>> {
        let tables = self.tables.read().await;
        Ok(tables.rows.iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_key(
        &self,
        snippet_id: &str,
        cat_type: &str,
        slug: &str,
    ) -> AppResult<Option<SnippetAssignment>> {
        let tables = self.tables.read().await;
        let key = AssignmentKey::new(cat_type, slug);
        Ok(tables.position(snippet_id, &key).map(|idx| tables.rows[idx].clone()))
    }

    async fn list(
        &self,
        filter: &AssignmentFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<SnippetAssignment>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<&SnippetAssignment> = tables.rows.iter().filter(|r| filter.matches(r)).collect();
        rows.sort_by(|a, b| b.assigned_at.cmp(&a.assigned_at));

        let total = rows.len() as u64;
        let data = rows
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect();
        Ok(PageResponse::new(data, page, total))
    }

    async fn find_by_snippet(&self, snippet_id: &str) -> AppResult<Vec<SnippetAssignment>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<SnippetAssignment> = tables
            .rows
            .iter()
            .filter(|r| r.snippet_id == snippet_id)
            .cloned()
            .collect();
        rows.sort_by_key(SnippetAssignment::key);
        Ok(rows)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &UpdateAssignment,
        user_id: &str,
    ) -> AppResult<SnippetAssignment> {
        let mut tables = self.tables.write().await;
        let idx = tables
            .rows
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| not_found(id))?;

        let before = tables.rows[idx].edit_snapshot();
        let now = Utc::now();
        let row = &mut tables.rows[idx];
        if let Some(slug) = &changes.slug {
            row.slug = slug.clone();
        }
        if let Some(status) = changes.status {
            row.status = status;
        }
        if let Some(metadata) = &changes.sync_metadata {
            row.sync_metadata = Some(metadata.clone());
            row.last_sync_at = Some(now);
        }
        row.updated_by = Some(user_id.to_string());
        row.updated_at = now;
        let after = row.clone();

        tables.append(NewHistoryEntry {
            assignment_id: id,
            action: HistoryAction::Updated,
            user_id: user_id.to_string(),
            old_values: Some(before),
            new_values: Some(after.edit_snapshot()),
            reason: HistoryReason::UserAction,
        });
        Ok(after)
    }

    async fn delete(&self, id: Uuid, user_id: &str) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let idx = tables
            .rows
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| not_found(id))?;

        let row = tables.rows.remove(idx);
        tables.append(NewHistoryEntry {
            assignment_id: id,
            action: HistoryAction::Deleted,
            user_id: user_id.to_string(),
            old_values: Some(row.snapshot()),
            new_values: None,
            reason: HistoryReason::UserAction,
        });
        // Mirrors ON DELETE CASCADE.
        tables.history.retain(|h| h.assignment_id != id);
        Ok(())
    }

    async fn history_for_snippet(&self, snippet_id: &str) -> AppResult<Vec<AssignmentHistory>> {
        let tables = self.tables.read().await;
        let ids: HashSet<Uuid> = tables
            .rows
            .iter()
            .filter(|r| r.snippet_id == snippet_id)
            .map(|r| r.id)
            .collect();
        Ok(tables
            .history
            .iter()
            .rev()
            .filter(|h| ids.contains(&h.assignment_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snippet_core::error::ErrorKind;

    fn units(pairs: &[(&str, &str)]) -> Vec<AssignmentUnit> {
        pairs.iter().map(|(c, s)| AssignmentUnit::new(*c, *s)).collect()
    }

    #[tokio::test]
    async fn reconcile_creates_then_resets_without_duplicates() {
        let store = MemoryAssignmentStore::new();
        let batch = units(&[("league", "nba"), ("league", "nfl")]);

        let first = store.reconcile("s1", &batch, "u1").await.unwrap();
        assert_eq!(first, ReconcileOutcome { updated: 0, created: 2 });

        store.set_snippet_status("s1", AssignmentStatus::Active).await.unwrap();

        let second = store
            .reconcile("s1", &units(&[("league", "nba")]), "u2")
            .await
            .unwrap();
        assert_eq!(second, ReconcileOutcome { updated: 1, created: 0 });

        let rows = store.find_by_snippet("s1").await.unwrap();
        assert_eq!(rows.len(), 2);
        let nba = rows.iter().find(|r| r.slug == "nba").unwrap();
        assert_eq!(nba.status, AssignmentStatus::Pending);
        assert_eq!(nba.updated_by.as_deref(), Some("u2"));

        let history = store.history_for_snippet("s1").await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].action, HistoryAction::Updated);
        assert_eq!(
            history[0].metadata.as_ref().unwrap()["reason"],
            "async_snippet_reassignment"
        );
        assert_eq!(history[0].old_values.as_ref().unwrap()["status"], "ACTIVE");
        assert_eq!(history[0].new_values.as_ref().unwrap()["status"], "PENDING");
    }

    #[tokio::test]
    async fn reconcile_scopes_rows_by_snippet() {
        let store = MemoryAssignmentStore::new();
        let batch = units(&[("city", "paris")]);
        store.reconcile("s1", &batch, "u").await.unwrap();
        let outcome = store.reconcile("s2", &batch, "u").await.unwrap();
        assert_eq!(outcome.created, 1);
        assert_eq!(store.find_existing("s1", &batch).await.unwrap().len(), 1);
        assert_eq!(store.find_existing("s2", &batch).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_many_rejects_existing_pairs() {
        let store = MemoryAssignmentStore::new();
        let batch = units(&[("league", "nba")]);
        let created = store.create_many("s1", &batch, "u").await.unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].status, AssignmentStatus::Pending);

        let err = store.create_many("s1", &batch, "u").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(store.history_len().await, 1);
    }

    #[tokio::test]
    async fn update_records_edit_snapshots() {
        let store = MemoryAssignmentStore::new();
        let row = store
            .create_many("s1", &units(&[("league", "nba")]), "u")
            .await
            .unwrap()
            .remove(0);

        let changes = UpdateAssignment {
            slug: None,
            status: Some(AssignmentStatus::Archived),
            sync_metadata: Some(serde_json::json!({"pages": 3})),
        };
        let updated = store.update(row.id, &changes, "editor").await.unwrap();
        assert_eq!(updated.status, AssignmentStatus::Archived);
        assert!(updated.last_sync_at.is_some());

        let history = store.history_for_snippet("s1").await.unwrap();
        assert_eq!(history[0].action, HistoryAction::Updated);
        assert_eq!(history[0].user_id, "editor");
        assert_eq!(history[0].old_values.as_ref().unwrap()["status"], "PENDING");
        assert_eq!(history[0].new_values.as_ref().unwrap()["syncMetadata"]["pages"], 3);
    }

    #[tokio::test]
    async fn update_and_delete_missing_row_are_not_found() {
        let store = MemoryAssignmentStore::new();
        let id = Uuid::new_v4();
        let err = store
            .update(id, &UpdateAssignment::status(AssignmentStatus::Active), "u")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(store.delete(id, "u").await.unwrap_err().kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn delete_cascades_history() {
        let store = MemoryAssignmentStore::new();
        let row = store
            .create_many("s1", &units(&[("league", "nba")]), "u")
            .await
            .unwrap()
            .remove(0);
        store.delete(row.id, "u").await.unwrap();
        assert!(store.find_by_id(row.id).await.unwrap().is_none());
        assert_eq!(store.history_len().await, 0);
    }

    #[tokio::test]
    async fn list_filters_and_paginates() {
        let store = MemoryAssignmentStore::new();
        store
            .create_many("s1", &units(&[("league", "a"), ("league", "b"), ("city", "c")]), "u")
            .await
            .unwrap();
        store
            .create_many("s2", &units(&[("league", "a")]), "u")
            .await
            .unwrap();

        let filter = AssignmentFilter {
            snippet_id: Some("s1".into()),
            cat_type: Some("league".into()),
            status: None,
        };
        let page = store.list(&filter, &PageRequest::new(1, 1)).await.unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.pagination.total, 2);
        assert_eq!(page.pagination.pages, 2);

        let empty = AssignmentFilter {
            status: Some(AssignmentStatus::Failed),
            ..AssignmentFilter::default()
        };
        let page = store.list(&empty, &PageRequest::default()).await.unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.pagination.pages, 0);
    }
}
