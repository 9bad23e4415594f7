//! Inputs shared by the synchronous and queued assignment paths.

use serde::{Deserialize, Serialize};

use snippet_entity::assignment::WorkItem;
use snippet_entity::job::BulkAssignmentJob;

/// An assignment request as accepted by both the synchronous and the
/// queued endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRequest {
    /// Snippet to assign.
    pub snippet_id: String,
    /// Category pages, grouped by category.
    pub assignments: Vec<WorkItem>,
    /// Category types the execution service should consider.
    pub category_types: Vec<String>,
    /// Variation types to render.
    pub snippet_variation_types: Option<Vec<String>>,
    /// Locale in frontend format (`en-GB`).
    pub locale: String,
    /// Pre-built variations, forwarded verbatim.
    pub snippet_variations: Option<Vec<serde_json::Value>>,
    /// Expected number of category pages, from a prior preview.
    pub total_categories_count: Option<u64>,
}

impl AssignmentRequest {
    /// Turn the request into a job with the given id, acted on by `user_id`.
    pub fn into_job(self, assignment_id: String, user_id: &str) -> BulkAssignmentJob {
        BulkAssignmentJob {
            assignment_id,
            snippet_id: self.snippet_id,
            assignments: self.assignments,
            category_types: self.category_types,
            snippet_variation_types: self.snippet_variation_types,
            snippet_variations: self.snippet_variations,
            locale: self.locale,
            user_id: user_id.to_string(),
            total_categories_count: self.total_categories_count,
        }
    }
}

/// Preview input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewAssignmentRequest {
    /// Snippet the preview is for.
    pub snippet_id: String,
    /// Category pages, grouped by category.
    pub assignments: Vec<WorkItem>,
    /// Category types to consider.
    pub category_types: Vec<String>,
    /// Locale in frontend format (`en-GB`).
    pub locale: String,
}
