//! HTTP request handlers organized by domain.

pub mod assignment;
pub mod bulk;
pub mod health;
