//! Batch executor: sends a job's units to the execution service in
//! fixed-size, strictly sequential batches.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use snippet_client::AssignmentBackend;
use snippet_client::locale::normalize_to_backend;
use snippet_client::types::{ExecuteRequest, ExecuteResponse};
use snippet_core::config::worker::WorkerConfig;
use snippet_core::error::AppError;
use snippet_entity::assignment::{AssignmentUnit, expand_work_items};
use snippet_entity::job::{AssignmentJobStatus, BulkAssignmentJob, JobProgress};

use crate::status::StatusStore;

/// Why a job's execution stopped.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// The service answered `success: false`.
    #[error("Assignment failed at batch {batch}/{total}: execution reported failure for batch {batch}")]
    Rejected {
        /// 1-based batch number.
        batch: usize,
        /// Number of batches in the job.
        total: usize,
    },

    /// The call itself failed.
    #[error("Assignment failed at batch {batch}/{total}: {}", .source.message)]
    Backend {
        /// 1-based batch number.
        batch: usize,
        /// Number of batches in the job.
        total: usize,
        /// Transport or service error.
        #[source]
        source: AppError,
    },
}

impl BatchError {
    /// 1-based number of the failed batch.
    pub fn batch(&self) -> usize {
        match self {
            Self::Rejected { batch, .. } | Self::Backend { batch, .. } => *batch,
        }
    }
}

/// Aggregate of a fully executed job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    /// Always `true`; failures are reported as [`BatchError`].
    pub success: bool,
    /// Batch results, arrays flattened.
    pub results: Vec<Value>,
    /// Sum of the processed counts reported per batch.
    pub total_processed: u64,
    /// Denominator used for progress.
    pub total_categories: u64,
    /// Number of batches sent.
    pub batches_processed: usize,
}

/// Sends units in batches and records progress after each one.
#[derive(Debug, Clone)]
pub struct BatchExecutor {
    backend: Arc<dyn AssignmentBackend>,
    status: StatusStore,
    batch_size: usize,
    batch_timeout: Duration,
}

impl BatchExecutor {
    /// Create an executor with the batch size and per-batch timeout from `config`.
    pub fn new(backend: Arc<dyn AssignmentBackend>, status: StatusStore, config: &WorkerConfig) -> Self {
        Self {
            backend,
            status,
            batch_size: config.batch_size.max(1),
            batch_timeout: config.batch_timeout(),
        }
    }

    /// Execute every unit of `job`, stopping at the first failed batch.
    ///
    /// Batches already applied when a later one fails are not rolled back.
    pub async fn execute(&self, job: &BulkAssignmentJob) -> Result<BatchOutcome, BatchError> {
        let units = expand_work_items(&job.assignments);
        let total_categories = job
            .total_categories_count
            .filter(|count| *count > 0)
            .unwrap_or(units.len() as u64);
        let batches: Vec<&[AssignmentUnit]> = units.chunks(self.batch_size).collect();
        let total = batches.len();
        let locale = normalize_to_backend(&job.locale);

        tracing::info!(
            "Executing '{}': {} units in {} batches of up to {}",
            job.assignment_id,
            units.len(),
            total,
            self.batch_size
        );

        let mut processed: u64 = 0;
        let mut results = Vec::new();

        for (index, batch) in batches.into_iter().enumerate() {
            let number = index + 1;
            let request = ExecuteRequest {
                snippet_id: job.snippet_id.clone(),
                assignments: batch.to_vec(),
                category_types: job.category_types.clone(),
                snippet_variation_types: job.snippet_variation_types.clone(),
                locale: locale.clone(),
                snippet_variations: job.snippet_variations.clone(),
                use_native_logic: true,
            };

            let response = match self.backend.execute(&request, self.batch_timeout).await {
                Ok(response) if response.success => response,
                Ok(_) => {
                    tracing::error!("Batch {}/{} of '{}' was rejected", number, total, job.assignment_id);
                    return Err(BatchError::Rejected { batch: number, total });
                }
                Err(source) => {
                    tracing::error!(
                        "Batch {}/{} of '{}' failed: {}",
                        number,
                        total,
                        job.assignment_id,
                        source
                    );
                    return Err(BatchError::Backend {
                        batch: number,
                        total,
                        source,
                    });
                }
            };

            processed += response.processed().unwrap_or(batch.len() as u64);
            collect_results(&mut results, response);

            let progress = JobProgress::new(processed, total_categories);
            tracing::info!(
                "Batch {}/{} of '{}' done: {}% ({}/{})",
                number,
                total,
                job.assignment_id,
                progress.percent,
                processed,
                total_categories
            );

            if let Err(e) = self
                .status
                .set_status(&job.assignment_id, &AssignmentJobStatus::progress(progress))
                .await
            {
                tracing::warn!("Failed to record progress for '{}': {}", job.assignment_id, e);
            }
        }

        Ok(BatchOutcome {
            success: true,
            results,
            total_processed: processed,
            total_categories,
            batches_processed: total,
        })
    }
}

fn collect_results(results: &mut Vec<Value>, response: ExecuteResponse) {
    match response.results {
        Some(Value::Array(items)) => results.extend(items),
        Some(Value::Null) | None => {}
        Some(other) => results.push(other),
    }
}
