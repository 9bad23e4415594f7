//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use snippet_core::error::AppError;
use snippet_core::result::AppResult;
use snippet_core::types::pagination::PageRequest;
use snippet_entity::assignment::{AssignmentFilter, AssignmentStatus, UpdateAssignment, WorkItem};
use snippet_service::{AssignmentRequest, PreviewAssignmentRequest};

/// Accepts `en-GB` style locales: two lowercase letters, a dash, two
/// uppercase letters.
fn validate_locale(locale: &str) -> Result<(), ValidationError> {
    let bytes = locale.as_bytes();
    let well_formed = bytes.len() == 5
        && bytes[..2].iter().all(u8::is_ascii_lowercase)
        && bytes[2] == b'-'
        && bytes[3..].iter().all(u8::is_ascii_uppercase);

    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::new("locale")
            .with_message("Locale must be in format: en-GB (with dash)".into()))
    }
}

/// Body of the synchronous, bulk and test-sync endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRequestBody {
    /// Snippet to assign.
    #[validate(length(min = 1, message = "snippetId is required"))]
    pub snippet_id: String,
    /// Category pages grouped by category type.
    #[validate(length(min = 1, message = "At least one assignment is required"))]
    pub assignments: Vec<WorkItem>,
    /// Category types to consider.
    #[validate(length(min = 1, message = "At least one category type is required"))]
    pub category_types: Vec<String>,
    /// Variation types to render.
    #[serde(default)]
    #[validate(length(min = 1))]
    pub snippet_variation_types: Option<Vec<String>>,
    /// Locale in `en-GB` form.
    #[validate(custom(function = "validate_locale"))]
    pub locale: String,
    /// Pre-built variations.
    #[serde(default)]
    pub snippet_variations: Option<Vec<serde_json::Value>>,
    /// Accepted for compatibility; execution always uses native logic.
    #[serde(default)]
    pub use_native_logic: Option<bool>,
    /// Expected number of category pages, from a prior preview.
    #[serde(default)]
    pub total_categories_count: Option<u64>,
}

impl From<AssignmentRequestBody> for AssignmentRequest {
    fn from(body: AssignmentRequestBody) -> Self {
        Self {
            snippet_id: body.snippet_id,
            assignments: body.assignments,
            category_types: body.category_types,
            snippet_variation_types: body.snippet_variation_types,
            locale: body.locale,
            snippet_variations: body.snippet_variations,
            total_categories_count: body.total_categories_count,
        }
    }
}

/// Body of the preview endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequestBody {
    /// Snippet the preview is for.
    #[validate(length(min = 1, message = "snippetId is required"))]
    pub snippet_id: String,
    /// Category pages grouped by category type.
    #[validate(length(min = 1, message = "At least one assignment is required"))]
    pub assignments: Vec<WorkItem>,
    /// Category types to consider.
    #[validate(length(min = 1, message = "At least one category type is required"))]
    pub category_types: Vec<String>,
    /// Locale in `en-GB` form.
    #[validate(custom(function = "validate_locale"))]
    pub locale: String,
}

impl From<PreviewRequestBody> for PreviewAssignmentRequest {
    fn from(body: PreviewRequestBody) -> Self {
        Self {
            snippet_id: body.snippet_id,
            assignments: body.assignments,
            category_types: body.category_types,
            locale: body.locale,
        }
    }
}

/// Body of `PATCH /assignment/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssignmentBody {
    /// New slug.
    #[validate(length(min = 1, message = "slug must not be empty"))]
    pub slug: Option<String>,
    /// New status.
    pub status: Option<AssignmentStatus>,
    /// New sync metadata.
    pub sync_metadata: Option<serde_json::Value>,
}

impl From<UpdateAssignmentBody> for UpdateAssignment {
    fn from(body: UpdateAssignmentBody) -> Self {
        Self {
            slug: body.slug,
            status: body.status,
            sync_metadata: body.sync_metadata,
        }
    }
}

/// Query string of `GET /assignment`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAssignmentsQuery {
    /// Restrict to one snippet.
    pub snippet_id: Option<String>,
    /// Restrict to one category type.
    pub cat_type: Option<String>,
    /// Restrict to one status (`PENDING`, `ACTIVE`, ...).
    pub status: Option<String>,
    /// Page number (1-based, default 1).
    pub page: Option<u64>,
    /// Items per page (default 20, max 100).
    pub limit: Option<u64>,
}

impl ListAssignmentsQuery {
    /// Splits the query into a filter and a clamped page request.
    pub fn into_parts(self) -> AppResult<(AssignmentFilter, PageRequest)> {
        let status = self
            .status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::parse::<AssignmentStatus>)
            .transpose()
            .map_err(AppError::validation)?;

        let defaults = PageRequest::default();
        let page = PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.limit.unwrap_or(defaults.limit),
        );

        let filter = AssignmentFilter {
            snippet_id: self.snippet_id.filter(|s| !s.is_empty()),
            cat_type: self.cat_type.filter(|s| !s.is_empty()),
            status,
        };
        Ok((filter, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(locale: &str) -> AssignmentRequestBody {
        serde_json::from_value(serde_json::json!({
            "snippetId": "s1",
            "assignments": [{ "catType": "league", "slugs": ["nba"] }],
            "categoryTypes": ["league"],
            "locale": locale,
        }))
        .unwrap()
    }

    #[test]
    fn locale_must_use_dash_form() {
        assert!(body("en-GB").validate().is_ok());
        assert!(body("en_GB").validate().is_err());
        assert!(body("EN-gb").validate().is_err());
        assert!(body("").validate().is_err());
    }

    #[test]
    fn empty_lists_are_rejected() {
        let mut request = body("en-GB");
        request.assignments.clear();
        assert!(request.validate().is_err());

        let mut request = body("en-GB");
        request.category_types.clear();
        assert!(request.validate().is_err());
    }

    #[test]
    fn list_query_defaults_and_status() {
        let (filter, page) = ListAssignmentsQuery::default().into_parts().unwrap();
        assert!(filter.status.is_none());
        assert_eq!((page.page, page.limit), (1, 20));

        let query = ListAssignmentsQuery {
            status: Some("ACTIVE".into()),
            limit: Some(500),
            ..ListAssignmentsQuery::default()
        };
        let (filter, page) = query.into_parts().unwrap();
        assert_eq!(filter.status, Some(AssignmentStatus::Active));
        assert_eq!(page.limit, 100);

        let bad = ListAssignmentsQuery {
            status: Some("DONE".into()),
            ..ListAssignmentsQuery::default()
        };
        assert!(bad.into_parts().is_err());
    }
}
