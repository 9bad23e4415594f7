//! # snippet-client
//!
//! Client for the external service that applies assignments to category
//! pages. [`AssignmentBackend`] is the seam used by the worker and the
//! services; [`HttpAssignmentBackend`] talks to the real service over HTTP.
//! With the `mock` feature, [`mock::MockAssignmentBackend`] records calls
//! for tests.

pub mod backend;
pub mod http;
pub mod locale;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod types;

pub use backend::AssignmentBackend;
pub use http::HttpAssignmentBackend;
pub use types::{ExecuteRequest, ExecuteResponse, PreviewRequest};
