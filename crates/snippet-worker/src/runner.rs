//! Queue worker: the single in-process consumer of the assignment queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use snippet_core::config::worker::WorkerConfig;
use snippet_core::result::AppResult;
use snippet_entity::job::BulkAssignmentJob;

use crate::processor::JobProcessor;
use crate::queue::AssignmentQueue;

/// Snapshot reported by [`QueueWorker::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerStats {
    /// Jobs waiting in the queue.
    pub queue_length: u64,
    /// Whether the consumer loop is running.
    pub is_worker_running: bool,
}

/// Pops jobs one at a time and hands them to the [`JobProcessor`].
///
/// `stop` lets the job in flight finish; there is no mid-job cancellation.
#[derive(Debug)]
pub struct QueueWorker {
    queue: AssignmentQueue,
    processor: Arc<JobProcessor>,
    poll_timeout: Duration,
    error_backoff: Duration,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl QueueWorker {
    /// Create a stopped worker.
    pub fn new(queue: AssignmentQueue, processor: Arc<JobProcessor>, config: &WorkerConfig) -> Self {
        Self {
            queue,
            processor,
            poll_timeout: config.poll_timeout(),
            error_backoff: config.error_backoff(),
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    /// Spawn the consumer loop. Calling it while running does nothing.
    pub async fn start(&self) {
        let mut handle = self.handle.lock().await;
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Queue worker already running");
            return;
        }

        let queue = self.queue.clone();
        let processor = Arc::clone(&self.processor);
        let running = Arc::clone(&self.running);
        let poll_timeout = self.poll_timeout;
        let error_backoff = self.error_backoff;

        tracing::info!(
            "Queue worker started on '{}' (poll timeout {:?})",
            queue.key(),
            poll_timeout
        );

        *handle = Some(tokio::spawn(async move {
            consume(queue, processor, running, poll_timeout, error_backoff).await;
        }));
    }

    /// Stop the loop and wait for it, including any job in flight.
    pub async fn stop(&self) {
        let mut handle = self.handle.lock().await;
        self.running.store(false, Ordering::SeqCst);

        if let Some(task) = handle.take() {
            tracing::info!("Queue worker stopping, waiting for in-flight job...");
            if let Err(e) = task.await {
                tracing::error!("Queue worker task ended abnormally: {}", e);
            }
            tracing::info!("Queue worker stopped");
        }
    }

    /// Whether the loop is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Queue length and running flag.
    ///
    /// The length is read through `queue`, a producer-side handle, since the
    /// consumer's own connection may be parked in a blocking pop.
    pub async fn stats(&self, queue: &AssignmentQueue) -> AppResult<WorkerStats> {
        Ok(WorkerStats {
            queue_length: queue.len().await?,
            is_worker_running: self.is_running(),
        })
    }
}

async fn consume(
    queue: AssignmentQueue,
    processor: Arc<JobProcessor>,
    running: Arc<AtomicBool>,
    poll_timeout: Duration,
    error_backoff: Duration,
) {
    while running.load(Ordering::SeqCst) {
        let payload = match queue.dequeue_blocking(poll_timeout).await {
            Ok(Some(payload)) => payload,
            Ok(None) => continue,
            Err(e) => {
                tracing::error!("Failed to pop from '{}': {}", queue.key(), e);
                tokio::time::sleep(error_backoff).await;
                continue;
            }
        };

        let job: BulkAssignmentJob = match serde_json::from_str(&payload) {
            Ok(job) => job,
            Err(e) => {
                tracing::error!("Dropping malformed job payload: {}", e);
                continue;
            }
        };

        processor.process(&job).await;
    }
}
