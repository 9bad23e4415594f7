//! Job queue for bulk assignment jobs.

use std::sync::Arc;
use std::time::Duration;

use snippet_cache::CacheManager;
use snippet_core::result::AppResult;
use snippet_core::traits::cache::CacheProvider;
use snippet_entity::job::BulkAssignmentJob;

/// FIFO queue of serialized jobs stored in one cache list.
///
/// Delivery is at-least-once at best: a job popped by a worker that dies
/// before finishing it is gone.
#[derive(Debug, Clone)]
pub struct AssignmentQueue {
    /// Backing list store.
    cache: Arc<CacheManager>,
    /// Name of the list.
    key: String,
}

impl AssignmentQueue {
    /// Create a queue over the list named `key`.
    pub fn new(cache: Arc<CacheManager>, key: impl Into<String>) -> Self {
        Self {
            cache,
            key: key.into(),
        }
    }

    /// Append a job to the tail. Returns the new queue length.
    pub async fn enqueue(&self, job: &BulkAssignmentJob) -> AppResult<u64> {
        let payload = serde_json::to_string(job)?;
        let len = self.cache.push_list(&self.key, &payload).await?;
        tracing::debug!(
            "Enqueued job '{}' on '{}' (length {})",
            job.assignment_id,
            self.key,
            len
        );
        Ok(len)
    }

    /// Take the raw payload at the head, waiting up to `timeout`.
    ///
    /// The payload is returned unparsed so a malformed entry can be logged
    /// and dropped by the consumer without failing the pop.
    pub async fn dequeue_blocking(&self, timeout: Duration) -> AppResult<Option<String>> {
        self.cache.pop_list_blocking(&self.key, timeout).await
    }

    /// Number of queued jobs.
    pub async fn len(&self) -> AppResult<u64> {
        self.cache.list_len(&self.key).await
    }

    /// Whether no job is queued.
    pub async fn is_empty(&self) -> AppResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Name of the backing list.
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snippet_entity::assignment::WorkItem;

    fn job(id: &str) -> BulkAssignmentJob {
        BulkAssignmentJob {
            assignment_id: id.into(),
            snippet_id: "s1".into(),
            assignments: vec![WorkItem::new("league", ["nba"])],
            category_types: vec!["league".into()],
            snippet_variation_types: None,
            snippet_variations: None,
            locale: "en-GB".into(),
            user_id: "u1".into(),
            total_categories_count: None,
        }
    }

    #[tokio::test]
    async fn jobs_come_out_in_submission_order() {
        let queue = AssignmentQueue::new(Arc::new(CacheManager::in_memory()), "assignment-queue");
        assert!(queue.is_empty().await.unwrap());

        queue.enqueue(&job("a")).await.unwrap();
        assert_eq!(queue.enqueue(&job("b")).await.unwrap(), 2);

        let timeout = Duration::from_millis(10);
        let first: BulkAssignmentJob =
            serde_json::from_str(&queue.dequeue_blocking(timeout).await.unwrap().unwrap()).unwrap();
        let second: BulkAssignmentJob =
            serde_json::from_str(&queue.dequeue_blocking(timeout).await.unwrap().unwrap()).unwrap();
        assert_eq!(first.assignment_id, "a");
        assert_eq!(second.assignment_id, "b");
        assert_eq!(queue.len().await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dequeue_returns_none_on_timeout() {
        let queue = AssignmentQueue::new(Arc::new(CacheManager::in_memory()), "q");
        let popped = queue.dequeue_blocking(Duration::from_secs(5)).await.unwrap();
        assert!(popped.is_none());
    }
}
