//! Status records of bulk assignment jobs.

use std::sync::Arc;
use std::time::Duration;

use snippet_cache::{CacheManager, keys};
use snippet_core::result::AppResult;
use snippet_core::traits::cache::CacheProvider;
use snippet_entity::job::AssignmentJobStatus;

/// Job status records with a fixed TTL, keyed by job id.
///
/// Each job has exactly one writer: the request handler writes `PENDING`,
/// the worker writes everything after.
#[derive(Debug, Clone)]
pub struct StatusStore {
    cache: Arc<CacheManager>,
    ttl: Duration,
}

impl StatusStore {
    /// Create a store whose records expire `ttl` after their last write.
    pub fn new(cache: Arc<CacheManager>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Overwrite the record of a job and restart its TTL.
    pub async fn set_status(&self, assignment_id: &str, status: &AssignmentJobStatus) -> AppResult<()> {
        let key = keys::assignment_status(assignment_id);
        self.cache.set_json(&key, status, self.ttl).await?;
        tracing::debug!("Status of '{}' set to {}", assignment_id, status.status);
        Ok(())
    }

    /// Current record of a job. `None` when absent, expired or unreadable.
    pub async fn get_status(&self, assignment_id: &str) -> AppResult<Option<AssignmentJobStatus>> {
        let key = keys::assignment_status(assignment_id);
        let Some(raw) = self.cache.get(&key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(status) => Ok(Some(status)),
            Err(e) => {
                tracing::error!("Unreadable status record for '{}': {}", assignment_id, e);
                Ok(None)
            }
        }
    }

    /// Whether the backing store answers.
    pub async fn ping(&self) -> AppResult<bool> {
        self.cache.health_check().await
    }

    /// Remove the record of a job.
    pub async fn clear(&self, assignment_id: &str) -> AppResult<()> {
        self.cache.delete(&keys::assignment_status(assignment_id)).await
    }
}
