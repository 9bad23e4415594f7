//! Bulk assignment job payload.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assignment::WorkItem;

/// Length of the random suffix in generated job ids.
const ID_SUFFIX_LEN: usize = 9;

/// A queued request to assign one snippet to many category pages.
///
/// Serialized as JSON onto the queue; never persisted beyond that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAssignmentJob {
    /// Unique job id, also the status record key.
    pub assignment_id: String,
    /// Snippet being assigned.
    pub snippet_id: String,
    /// Requested category pages, in request order.
    pub assignments: Vec<WorkItem>,
    /// Category types the external service should consider.
    #[serde(default)]
    pub category_types: Vec<String>,
    /// Variation types to render (e.g. `SLIM`, `EVERGREEN`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet_variation_types: Option<Vec<String>>,
    /// Pre-built variations forwarded verbatim to the external service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet_variations: Option<Vec<serde_json::Value>>,
    /// Locale as sent by the client (`en-GB`).
    #[serde(default)]
    pub locale: String,
    /// Actor who requested the job.
    pub user_id: String,
    /// Expected number of category pages, from a prior preview.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_categories_count: Option<u64>,
}

/// Generate a job id of the form `<prefix>_<epochMillis>_<9 alphanumerics>`.
pub fn new_job_id(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{prefix}_{}_{}",
        Utc::now().timestamp_millis(),
        &suffix[..ID_SUFFIX_LEN]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_id_has_prefix_millis_and_suffix() {
        let id = new_job_id("assignment");
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "assignment");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2].chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(id, new_job_id("assignment"));
    }

    #[test]
    fn job_uses_camel_case_wire_names() {
        let json = serde_json::json!({
            "assignmentId": "assignment_1_abc",
            "snippetId": "snip-1",
            "assignments": [{"catType": "league", "slugs": ["a"]}],
            "categoryTypes": ["league"],
            "locale": "en-GB",
            "userId": "user-1",
            "totalCategoriesCount": 12
        });
        let job: BulkAssignmentJob = serde_json::from_value(json).unwrap();
        assert_eq!(job.assignment_id, "assignment_1_abc");
        assert_eq!(job.total_categories_count, Some(12));
        assert!(job.snippet_variation_types.is_none());
    }
}
