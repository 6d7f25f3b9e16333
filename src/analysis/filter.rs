//! Response filtering.
//!
//! Narrows the fetched response set to the managers, relationships and
//! score range selected by the user before anything is aggregated.

use crate::models::{FilterState, SurveyResponse};

/// Returns the responses that pass `filters`, in input order.
pub fn apply(responses: &[SurveyResponse], filters: &FilterState) -> Vec<SurveyResponse> {
    responses
        .iter()
        .filter(|r| matches(r, filters))
        .cloned()
        .collect()
}

/// Evaluates the filter predicate for a single response.
pub fn matches(response: &SurveyResponse, filters: &FilterState) -> bool {
    if !filters.managers.is_empty() && !filters.managers.contains(&response.manager_name) {
        return false;
    }

    // Absent relationships match a selected "Unknown".
    if !filters.relationships.is_empty()
        && !filters.relationships.contains(response.relationship_label())
    {
        return false;
    }

    if filters.score_range.is_unrestricted() {
        return true;
    }

    match response.mean_score() {
        Some(mean) => filters.score_range.contains(mean),
        None => false,
    }
}
