//! Key builders for every entry the application stores.

/// Status record of a bulk assignment job.
pub fn assignment_status(assignment_id: &str) -> String {
    format!("assignment:{assignment_id}:status")
}

/// Job id used by the health probe's write/read check.
pub const HEALTH_PROBE_ID: &str = "health-test";
