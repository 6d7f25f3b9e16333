//! Whole-result dashboard snapshot.
//!
//! A `Dashboard` is recomputed from scratch for every (responses,
//! filters) pair. The presentation layer, the exporters and the
//! assistant context all read from it, so every view agrees.

use crate::analysis::aggregator::{
    category_comments, competency_scores, feedback_themes, manager_summaries,
    organization_average, relationship_distribution, score_distribution,
};
use crate::analysis::filter;
use crate::analysis::ranking::{bottom_performers, strengths, tier_distribution, top_performers, weaknesses};
use crate::models::{
    CategoryComments, CompetencyScore, FeedbackThemes, FilterState, ManagerSummary, ScoreTier,
    SurveyResponse,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;
use tracing::debug;

/// Headline numbers shown at the top of every view.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HeadlineStats {
    pub total_responses: usize,
    pub total_managers: usize,
    /// Mean of the scored managers' overall scores.
    pub average_score: f64,
    pub top_manager: Option<String>,
    pub top_score: f64,
    /// Responses that carry at least one competency rating.
    pub rated_responses: usize,
}

/// Everything the dashboard, exports and assistant need.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub generated_at: DateTime<Utc>,
    pub filters: FilterState,
    pub headline: HeadlineStats,
    pub manager_summaries: Vec<ManagerSummary>,
    pub competency_scores: Vec<CompetencyScore>,
    pub relationship_distribution: Vec<(String, usize)>,
    pub score_distribution: Vec<(i32, usize)>,
    pub tier_distribution: Vec<(ScoreTier, usize)>,
    pub feedback_themes: FeedbackThemes,
    pub category_comments: Vec<CategoryComments>,
    /// The filtered responses behind every figure above.
    #[serde(skip)]
    pub responses: Vec<SurveyResponse>,
}

impl Dashboard {
    /// Filter `responses` and aggregate the result.
    pub fn compute(responses: &[SurveyResponse], filters: &FilterState) -> Self {
        let filtered = filter::apply(responses, filters);
        debug!(
            "Filtered {} responses down to {}",
            responses.len(),
            filtered.len()
        );

        let summaries = manager_summaries(&filtered);
        let headline = HeadlineStats {
            total_responses: filtered.len(),
            total_managers: summaries.len(),
            average_score: organization_average(&summaries),
            top_manager: summaries.first().map(|s| s.manager_name.clone()),
            top_score: summaries.first().map(|s| s.overall_score).unwrap_or(0.0),
            rated_responses: filtered.iter().filter(|r| r.mean_score().is_some()).count(),
        };

        Self {
            generated_at: Utc::now(),
            filters: filters.clone(),
            headline,
            competency_scores: competency_scores(&filtered),
            relationship_distribution: relationship_distribution(&filtered),
            score_distribution: score_distribution(&filtered),
            tier_distribution: tier_distribution(&summaries),
            feedback_themes: feedback_themes(&filtered),
            category_comments: category_comments(&filtered),
            manager_summaries: summaries,
            responses: filtered,
        }
    }

    /// An empty dashboard, shown when the data could not be loaded.
    pub fn empty() -> Self {
        Self::compute(&[], &FilterState::default())
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    pub fn top_performers(&self, n: usize) -> Vec<&ManagerSummary> {
        top_performers(&self.manager_summaries, n)
    }

    pub fn bottom_performers(&self, n: usize) -> Vec<&ManagerSummary> {
        bottom_performers(&self.manager_summaries, n)
    }

    pub fn strengths(&self, n: usize) -> Vec<&CompetencyScore> {
        strengths(&self.competency_scores, n)
    }

    pub fn weaknesses(&self, n: usize) -> Vec<&CompetencyScore> {
        weaknesses(&self.competency_scores, n)
    }

    /// Plain-text snapshot handed to the assistant as context.
    pub fn data_context(&self) -> String {
        let mut out = String::new();
        let h = &self.headline;

        let _ = writeln!(out, "360 FEEDBACK DATA SUMMARY");
        let _ = writeln!(out, "Filters: {}", self.filters.describe());
        let _ = writeln!(out, "Total responses: {}", h.total_responses);
        let _ = writeln!(out, "Managers evaluated: {}", h.total_managers);
        let _ = writeln!(out, "Average overall score: {:.2} / 5", h.average_score);
        let _ = writeln!(out);

        let _ = writeln!(out, "MANAGER RANKINGS (overall score, tier, responses):");
        for (i, s) in self.manager_summaries.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. {}: {:.2} ({}), {} responses; Team Leadership {:.2}, Results Orientation {:.2}, Cultural Fit {:.2}",
                i + 1,
                s.manager_name,
                s.overall_score,
                s.tier,
                s.total_responses,
                s.avg_team_leadership,
                s.avg_results_orientation,
                s.avg_cultural_fit
            );
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "COMPETENCY SCORES (organization-wide):");
        for c in &self.competency_scores {
            let _ = writeln!(out, "- {}: {:.2} ({:.0}%)", c.name, c.score, c.percentage);
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "RESPONDENT RELATIONSHIPS:");
        for (relationship, count) in &self.relationship_distribution {
            let _ = writeln!(out, "- {}: {}", relationship, count);
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "SCORE DISTRIBUTION (individual ratings):");
        for (score, count) in &self.score_distribution {
            let _ = writeln!(out, "- {}: {}", score, count);
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "PERFORMANCE TIERS:");
        for (tier, count) in &self.tier_distribution {
            let _ = writeln!(out, "- {} ({}): {}", tier, tier.range_label(), count);
        }

        let themes = &self.feedback_themes;
        if !themes.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "QUALITATIVE FEEDBACK:");
            for (label, entries) in [
                ("Stop doing", &themes.stop_doing),
                ("Start doing", &themes.start_doing),
                ("Continue doing", &themes.continue_doing),
            ] {
                for entry in entries {
                    let _ = writeln!(out, "- {}: {}", label, entry);
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Competency;

    fn response(id: &str, manager: &str, relationship: &str, score: i32) -> SurveyResponse {
        let mut r = SurveyResponse::new(id, manager);
        r.relationship = Some(relationship.to_string());
        for c in Competency::ALL {
            r.set_score(c, Some(score));
        }
        r
    }

    fn sample() -> Vec<SurveyResponse> {
        vec![
            response("1", "Alice", "Peer", 4),
            response("2", "Bob", "Direct Report", 2),
            response("3", "Alice", "Direct Report", 3),
        ]
    }

    #[test]
    fn test_compute_headline() {
        let dashboard = Dashboard::compute(&sample(), &FilterState::default());

        assert_eq!(dashboard.headline.total_responses, 3);
        assert_eq!(dashboard.headline.total_managers, 2);
        assert_eq!(dashboard.headline.top_manager.as_deref(), Some("Alice"));
        assert_eq!(dashboard.headline.top_score, 3.5);
        assert_eq!(dashboard.headline.average_score, 2.75);
        assert_eq!(dashboard.headline.rated_responses, 3);
    }

    #[test]
    fn test_manager_filter_yields_single_summary() {
        let mut filters = FilterState::default();
        filters.managers.insert("Alice".to_string());

        let dashboard = Dashboard::compute(&sample(), &filters);
        assert_eq!(dashboard.responses.len(), 2);
        assert_eq!(dashboard.manager_summaries.len(), 1);
        assert_eq!(dashboard.manager_summaries[0].manager_name, "Alice");
    }

    #[test]
    fn test_empty_dashboard() {
        let dashboard = Dashboard::empty();
        assert!(dashboard.is_empty());
        assert!(dashboard.manager_summaries.is_empty());
        assert_eq!(dashboard.competency_scores.len(), 13);
        assert_eq!(dashboard.headline.top_score, 0.0);
        assert!(dashboard.top_performers(3).is_empty());
    }

    #[test]
    fn test_data_context_mentions_aggregates() {
        let dashboard = Dashboard::compute(&sample(), &FilterState::default());
        let context = dashboard.data_context();

        assert!(context.contains("Total responses: 3"));
        assert!(context.contains("1. Alice: 3.50 (Exceptional)"));
        assert!(context.contains("Empowers Team"));
        assert!(context.contains("Direct Report: 2"));
    }

    #[test]
    fn test_dashboard_serializes_without_raw_responses() {
        let dashboard = Dashboard::compute(&sample(), &FilterState::default());
        let json = serde_json::to_string(&dashboard).unwrap();
        assert!(json.contains("\"manager_summaries\""));
        assert!(!json.contains("\"responses\":"));
    }
}
