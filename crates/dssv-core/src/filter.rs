//! Recommendation filtering.
//!
//! Product rule: every surfaced recommendation must be a directly
//! substitutable corrected sentence, never an instruction to delete
//! content. Records recommending deletion are dropped before they reach
//! any outcome; survivors get defaults for missing optional fields.

use crate::decode::RawIssue;
use crate::types::{SectionKind, METRIC_GENERAL};

/// Phrases denoting deletion/removal. A recommendation containing any of
/// these, case-insensitively, is rejected.
pub const BANNED_RECOMMENDATION_PHRASES: [&str; 5] = ["삭제", "제거", "없애", "지우", "빼"];

/// Whether a recommendation is a deletion instruction.
pub fn is_deletion_recommendation(recommendation: &str) -> bool {
    let lowered = recommendation.to_lowercase();
    BANNED_RECOMMENDATION_PHRASES
        .iter()
        .any(|phrase| lowered.contains(phrase))
}

/// Drop deletion recommendations and backfill defaults on the rest.
///
/// Rejections are not errors; they are logged for audit and silently
/// dropped.
pub fn filter_issues(issues: Vec<RawIssue>, section: SectionKind) -> Vec<RawIssue> {
    issues
        .into_iter()
        .filter_map(|mut issue| {
            if is_deletion_recommendation(&issue.recommendation) {
                tracing::debug!(
                    metric = %issue.metric,
                    recommendation = %issue.recommendation,
                    "deletion recommendation rejected"
                );
                return None;
            }
            if issue.section_label.is_empty() {
                issue.section_label = section.label().to_string();
            }
            if issue.metric.is_empty() {
                issue.metric = METRIC_GENERAL.to_string();
            }
            Some(issue)
        })
        .collect()
}
