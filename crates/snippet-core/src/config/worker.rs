//! Bulk assignment worker configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Queue worker and batch pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the queue worker is started with the server.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Name of the list holding queued jobs.
    #[serde(default = "default_queue_key")]
    pub queue_key: String,
    /// Blocking pop timeout in seconds.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_seconds: u64,
    /// Back-off after a queue error, in milliseconds.
    #[serde(default = "default_error_backoff")]
    pub error_backoff_ms: u64,
    /// Maximum number of units sent to the external service per call.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Timeout for a single batch call in seconds.
    #[serde(default = "default_batch_timeout")]
    pub batch_timeout_seconds: u64,
    /// Lifetime of a job status record in seconds.
    #[serde(default = "default_status_ttl")]
    pub status_ttl_seconds: u64,
    /// Upper bound for the reconciliation transaction in seconds.
    #[serde(default = "default_reconcile_timeout")]
    pub reconcile_timeout_seconds: u64,
}

impl WorkerConfig {
    /// Blocking pop timeout.
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_seconds)
    }

    /// Back-off after a queue error.
    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }

    /// Timeout for a single batch call.
    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_seconds)
    }

    /// Lifetime of a job status record.
    pub fn status_ttl(&self) -> Duration {
        Duration::from_secs(self.status_ttl_seconds)
    }

    /// Upper bound for the reconciliation transaction.
    pub fn reconcile_timeout(&self) -> Duration {
        Duration::from_secs(self.reconcile_timeout_seconds)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            queue_key: default_queue_key(),
            poll_timeout_seconds: default_poll_timeout(),
            error_backoff_ms: default_error_backoff(),
            batch_size: default_batch_size(),
            batch_timeout_seconds: default_batch_timeout(),
            status_ttl_seconds: default_status_ttl(),
            reconcile_timeout_seconds: default_reconcile_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_queue_key() -> String {
    "assignment-queue".to_string()
}

fn default_poll_timeout() -> u64 {
    5
}

fn default_error_backoff() -> u64 {
    1000
}

fn default_batch_size() -> usize {
    500
}

fn default_batch_timeout() -> u64 {
    300
}

fn default_status_ttl() -> u64 {
    3600
}

fn default_reconcile_timeout() -> u64 {
    15
}
