//! Maps domain `AppError` to HTTP responses.
//!
//! The `IntoResponse` impl for `AppError` lives in `snippet_core::error`
//! (orphan rule); the response body type is re-exported here.

pub use snippet_core::error::ApiErrorResponse;
