//! Bulk assignment pipeline.
//!
//! This crate provides:
//! - A FIFO job queue on top of a cache list
//! - A TTL-bound status store keyed by job id
//! - A batch executor that feeds units to the execution service in
//!   fixed-size, sequential batches and reports progress
//! - A job processor that drives one job from `PROCESSING` to a terminal state
//! - A single-consumer queue worker with start/stop/stats

pub mod executor;
pub mod processor;
pub mod queue;
pub mod runner;
pub mod status;

pub use executor::{BatchError, BatchExecutor, BatchOutcome};
pub use processor::JobProcessor;
pub use queue::AssignmentQueue;
pub use runner::{QueueWorker, WorkerStats};
pub use status::StatusStore;
