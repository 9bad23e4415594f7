//! Request and response bodies of the execution service.

use serde::{Deserialize, Serialize};

use snippet_entity::assignment::{AssignmentUnit, WorkItem};

/// One batch sent to the execute endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    /// Snippet being assigned.
    pub snippet_id: String,
    /// Flat units of this batch.
    pub assignments: Vec<AssignmentUnit>,
    /// Category types of the job.
    pub category_types: Vec<String>,
    /// Variation types the service should resolve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet_variation_types: Option<Vec<String>>,
    /// Locale in backend format (`en_GB`).
    pub locale: String,
    /// Pre-built variations, forwarded verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet_variations: Option<Vec<serde_json::Value>>,
    /// Always `true`.
    pub use_native_logic: bool,
}

/// Reply of the execute endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    /// Whether the batch was applied.
    #[serde(default)]
    pub success: bool,
    /// Service-specific results, usually `{processed, failed, errors}`.
    #[serde(default)]
    pub results: Option<serde_json::Value>,
}

impl ExecuteResponse {
    /// A successful response carrying `results`.
    pub fn ok(results: serde_json::Value) -> Self {
        Self {
            success: true,
            results: Some(results),
        }
    }

    /// `results.processed` when it is a positive number.
    pub fn processed(&self) -> Option<u64> {
        let processed = self.results.as_ref()?.get("processed")?;
        processed
            .as_u64()
            .or_else(|| processed.as_f64().filter(|n| n.is_finite()).map(|n| n.round() as u64))
            .filter(|n| *n > 0)
    }
}

/// Body of the preview endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    /// Work items as submitted.
    pub assignments: Vec<WorkItem>,
    /// Category types to consider.
    pub category_types: Vec<String>,
    /// Locale in backend format.
    pub locale: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn processed_count_only_when_positive() {
        assert_eq!(ExecuteResponse::ok(json!({"processed": 7})).processed(), Some(7));
        assert_eq!(ExecuteResponse::ok(json!({"processed": 0})).processed(), None);
        assert_eq!(ExecuteResponse::ok(json!({"processed": "7"})).processed(), None);
        assert_eq!(ExecuteResponse::ok(json!([1, 2])).processed(), None);
        assert_eq!(ExecuteResponse::default().processed(), None);
    }

    #[test]
    fn execute_request_wire_shape() {
        let request = ExecuteRequest {
            snippet_id: "s1".into(),
            assignments: vec![AssignmentUnit::new("league", "nba")],
            category_types: vec!["league".into()],
            snippet_variation_types: None,
            locale: "en_GB".into(),
            snippet_variations: None,
            use_native_logic: true,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "snippetId": "s1",
                "assignments": [{"catType": "league", "slug": "nba"}],
                "categoryTypes": ["league"],
                "locale": "en_GB",
                "useNativeLogic": true,
            })
        );
    }
}
