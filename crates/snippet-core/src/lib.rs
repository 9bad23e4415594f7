//! # snippet-core
//!
//! Core crate for the snippet admin backend. Contains the configuration
//! schemas, the cache/queue provider trait, pagination types, and the
//! unified error system.
//!
//! This crate has **no** internal dependencies on other workspace crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
