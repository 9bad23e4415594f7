//! Job status records kept in the status store.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline state of a bulk job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    /// Queued, not yet picked up.
    Pending,
    /// Picked up by the worker.
    Processing,
    /// Every batch succeeded.
    Completed,
    /// A batch or the persistence step failed.
    Failed,
}

impl JobState {
    /// Whether the pipeline will never write this job again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Return the state as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Batch progress of a running job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProgress {
    /// Category pages processed so far.
    pub processed: u64,
    /// Expected category pages.
    pub total: u64,
    /// Failed category pages (always 0 while processing).
    pub failed: u64,
    /// `round(processed / total * 100)`; may exceed 100 when `total` is a stale estimate.
    pub percent: u64,
}

impl JobProgress {
    /// Progress after `processed` of `total` units.
    pub fn new(processed: u64, total: u64) -> Self {
        let percent = if total == 0 {
            100
        } else {
            (processed as f64 / total as f64 * 100.0).round() as u64
        };
        Self {
            processed,
            total,
            failed: 0,
            percent,
        }
    }
}

/// Status record of one job, stored under `assignment:<id>:status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentJobStatus {
    /// Current state.
    pub status: JobState,
    /// Milliseconds since the epoch when this record was written.
    pub timestamp: i64,
    /// Batch progress while processing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<JobProgress>,
    /// Failure cause.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Aggregated batch results on completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<serde_json::Value>,
}

impl AssignmentJobStatus {
    fn at(status: JobState) -> Self {
        Self {
            status,
            timestamp: Utc::now().timestamp_millis(),
            progress: None,
            error: None,
            results: None,
        }
    }

    /// Queued, not yet picked up.
    pub fn pending() -> Self {
        Self::at(JobState::Pending)
    }

    /// Picked up, no batch finished yet.
    pub fn processing() -> Self {
        Self::at(JobState::Processing)
    }

    /// Processing with batch progress.
    pub fn progress(progress: JobProgress) -> Self {
        Self {
            progress: Some(progress),
            ..Self::at(JobState::Processing)
        }
    }

    /// Finished successfully.
    pub fn completed(results: serde_json::Value) -> Self {
        Self {
            results: Some(results),
            ..Self::at(JobState::Completed)
        }
    }

    /// Finished with an error.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::at(JobState::Failed)
        }
    }
}
