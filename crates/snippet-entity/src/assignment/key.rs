//! Work items as submitted by clients, and their flattened form.
//!
//! Clients group slugs under a category (`{catType, slugs[]}`). The pipeline
//! works on flat `(catType, slug)` units; [`AssignmentKey`] is the composite
//! identity used to match units against persisted rows.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Category used when neither the item nor the request names one.
const UNKNOWN_CATEGORY: &str = "unknown";

/// One requested group of assignments.
///
/// Older clients send a single `slug` instead of a `slugs` array; both are
/// accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    /// Category type code. May be blank.
    #[serde(default)]
    pub cat_type: String,
    /// Slugs assigned under the category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slugs: Option<Vec<String>>,
    /// Single slug (legacy shape).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl WorkItem {
    /// Build a grouped work item.
    pub fn new<S: Into<String>>(cat_type: impl Into<String>, slugs: impl IntoIterator<Item = S>) -> Self {
        Self {
            cat_type: cat_type.into(),
            slugs: Some(slugs.into_iter().map(Into::into).collect()),
            slug: None,
        }
    }

    /// The slugs carried by this item, whichever shape it uses.
    /// `None` when the item carries neither.
    fn slug_list(&self) -> Option<Vec<&str>> {
        match (&self.slugs, &self.slug) {
            (Some(slugs), _) => Some(slugs.iter().map(String::as_str).collect()),
            (None, Some(slug)) => Some(vec![slug.as_str()]),
            (None, None) => None,
        }
    }
}

/// A single `(catType, slug)` pair as sent to the external service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentUnit {
    /// Category type code.
    pub cat_type: String,
    /// Category page slug.
    pub slug: String,
}

impl AssignmentUnit {
    /// Build a unit.
    pub fn new(cat_type: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            cat_type: cat_type.into(),
            slug: slug.into(),
        }
    }

    /// Composite identity of this unit.
    pub fn key(&self) -> AssignmentKey {
        AssignmentKey::new(&self.cat_type, &self.slug)
    }
}

/// Composite `(catType, slug)` identity of an assignment within a snippet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssignmentKey {
    /// Category type code.
    pub cat_type: String,
    /// Category page slug.
    pub slug: String,
}

impl AssignmentKey {
    /// Build a key.
    pub fn new(cat_type: &str, slug: &str) -> Self {
        Self {
            cat_type: cat_type.to_string(),
            slug: slug.to_string(),
        }
    }
}

/// Expand work items into flat units, in request order, without cleaning.
///
/// Items carrying no slugs at all are skipped.
pub fn expand_work_items(items: &[WorkItem]) -> Vec<AssignmentUnit> {
    items
        .iter()
        .filter_map(|item| item.slug_list().map(|slugs| (item, slugs)))
        .flat_map(|(item, slugs)| {
            slugs
                .into_iter()
                .map(move |slug| AssignmentUnit::new(item.cat_type.clone(), slug))
        })
        .collect()
}

/// Normalize work items into the unique units to persist.
///
/// Slugs are trimmed and blank ones dropped. A blank category falls back to
/// the first entry of `category_types`, then to `"unknown"`. Malformed items
/// are logged and skipped. The first occurrence of each pair wins.
pub fn normalize_work_items(items: &[WorkItem], category_types: &[String]) -> Vec<AssignmentUnit> {
    let fallback = category_types
        .first()
        .map(String::as_str)
        .filter(|c| !c.trim().is_empty())
        .unwrap_or(UNKNOWN_CATEGORY);

    let mut seen = HashSet::new();
    let mut units = Vec::new();

    for item in items {
        let Some(slugs) = item.slug_list() else {
            warn!(item = ?item, "Skipping malformed work item without slugs");
            continue;
        };

        let cat_type = match item.cat_type.trim() {
            "" => fallback,
            c => c,
        };

        for slug in slugs {
            let slug = slug.trim();
            if slug.is_empty() {
                continue;
            }
            let unit = AssignmentUnit::new(cat_type, slug);
            if seen.insert(unit.key()) {
                units.push(unit);
            }
        }
    }

    units
}
