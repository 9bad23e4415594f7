//! Read-side views over a snippet's assignments and history.

use std::collections::BTreeMap;

use serde::Serialize;

use snippet_entity::assignment::SnippetAssignment;
use snippet_entity::history::AssignmentHistory;

/// Counts over a snippet's assignments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentSummary {
    /// Number of rows.
    pub total: usize,
    /// Rows per status.
    pub by_status: BTreeMap<String, usize>,
    /// Rows per category type.
    pub by_cat_type: BTreeMap<String, usize>,
}

/// All assignments of a snippet, flat and grouped by category type.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetAssignments {
    /// Rows ordered by `(catType, slug)`.
    pub assignments: Vec<SnippetAssignment>,
    /// Same rows keyed by category type.
    pub grouped: BTreeMap<String, Vec<SnippetAssignment>>,
    /// Counts.
    pub summary: AssignmentSummary,
}

impl SnippetAssignments {
    /// Build the view from rows already ordered by `(catType, slug)`.
    pub fn from_rows(assignments: Vec<SnippetAssignment>) -> Self {
        let mut grouped: BTreeMap<String, Vec<SnippetAssignment>> = BTreeMap::new();
        let mut summary = AssignmentSummary {
            total: assignments.len(),
            ..AssignmentSummary::default()
        };

        for row in &assignments {
            *summary.by_status.entry(row.status.to_string()).or_default() += 1;
            grouped.entry(row.cat_type.clone()).or_default().push(row.clone());
        }
        summary.by_cat_type = grouped
            .iter()
            .map(|(cat_type, rows)| (cat_type.clone(), rows.len()))
            .collect();

        Self {
            assignments,
            grouped,
            summary,
        }
    }
}

/// Audit trail of a snippet.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedHistory {
    /// The snippet.
    pub snippet_id: String,
    /// Entries, newest first.
    pub history: Vec<AssignmentHistory>,
    /// Counts.
    pub summary: HistorySummary,
}

/// Counts over a snippet's history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    /// Number of entries.
    pub total: usize,
    /// Entries per action.
    pub by_action: BTreeMap<String, usize>,
}

impl DetailedHistory {
    /// Build the view from entries ordered newest first.
    pub fn new(snippet_id: impl Into<String>, history: Vec<AssignmentHistory>) -> Self {
        let mut by_action = BTreeMap::new();
        for entry in &history {
            *by_action.entry(entry.action.as_str().to_string()).or_default() += 1;
        }
        Self {
            snippet_id: snippet_id.into(),
            summary: HistorySummary {
                total: history.len(),
                by_action,
            },
            history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use snippet_entity::assignment::AssignmentStatus;
    use uuid::Uuid;

    fn row(cat_type: &str, slug: &str, status: AssignmentStatus) -> SnippetAssignment {
        SnippetAssignment {
            id: Uuid::new_v4(),
            snippet_id: "s1".into(),
            cat_type: cat_type.into(),
            slug: slug.into(),
            status,
            created_by: "u".into(),
            updated_by: None,
            assigned_at: Utc::now(),
            updated_at: Utc::now(),
            sync_metadata: None,
            last_sync_at: None,
        }
    }

    #[test]
    fn groups_and_counts() {
        let view = SnippetAssignments::from_rows(vec![
            row("city", "paris", AssignmentStatus::Active),
            row("league", "nba", AssignmentStatus::Active),
            row("league", "nfl", AssignmentStatus::Failed),
        ]);

        assert_eq!(view.summary.total, 3);
        assert_eq!(view.summary.by_status["ACTIVE"], 2);
        assert_eq!(view.summary.by_status["FAILED"], 1);
        assert_eq!(view.summary.by_cat_type["league"], 2);
        assert_eq!(view.grouped["city"][0].slug, "paris");
    }

    #[test]
    fn empty_snippet() {
        let view = SnippetAssignments::from_rows(Vec::new());
        assert_eq!(view.summary, AssignmentSummary::default());
        assert!(view.grouped.is_empty());
    }
}
