//! # snippet-api
//!
//! HTTP API layer for the snippet assignment backend built on Axum.
//!
//! Provides the `/api/assignment` endpoints, request validation, actor
//! extraction, CORS and request logging, and the mapping from [`AppError`]
//! to HTTP responses.
//!
//! [`AppError`]: snippet_core::error::AppError

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{Pipeline, build_app, build_pipeline, shutdown_signal};
pub use state::AppState;
