//! Tower middleware applied to every route.

pub mod cors;
pub mod logging;
