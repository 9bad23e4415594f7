//! Custom Axum extractors.

pub mod actor;
pub mod validated;

pub use actor::{ACTOR_HEADER, Actor};
pub use validated::ValidatedJson;
