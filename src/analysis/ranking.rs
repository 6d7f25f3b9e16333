//! Rankings and tiering shared by the dashboard and both exporters.

use crate::models::{CompetencyScore, ManagerSummary, ScoreTier};

/// Number of managers per tier, best tier first. Every tier is present.
pub fn tier_distribution(summaries: &[ManagerSummary]) -> Vec<(ScoreTier, usize)> {
    ScoreTier::ALL
        .iter()
        .map(|tier| {
            let count = summaries
                .iter()
                .filter(|s| ScoreTier::classify(s.overall_score) == *tier)
                .count();
            (*tier, count)
        })
        .collect()
}

/// The `n` highest scoring managers, best first.
pub fn top_performers(summaries: &[ManagerSummary], n: usize) -> Vec<&ManagerSummary> {
    let mut ranked: Vec<&ManagerSummary> = summaries.iter().collect();
    ranked.sort_by(|a, b| b.overall_score.total_cmp(&a.overall_score));
    ranked.truncate(n);
    ranked
}

/// The `n` lowest scoring managers, weakest first.
pub fn bottom_performers(summaries: &[ManagerSummary], n: usize) -> Vec<&ManagerSummary> {
    let mut ranked: Vec<&ManagerSummary> = summaries.iter().collect();
    ranked.sort_by(|a, b| a.overall_score.total_cmp(&b.overall_score));
    ranked.truncate(n);
    ranked
}

/// Competencies ordered strongest first. Ties keep catalog order.
pub fn rank_competencies(scores: &[CompetencyScore]) -> Vec<&CompetencyScore> {
    let mut ranked: Vec<&CompetencyScore> = scores.iter().collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

/// The `n` strongest rated competencies. Unrated ones are skipped.
pub fn strengths(scores: &[CompetencyScore], n: usize) -> Vec<&CompetencyScore> {
    rank_competencies(scores)
        .into_iter()
        .filter(|s| s.sample_size > 0)
        .take(n)
        .collect()
}

/// The `n` weakest rated competencies, weakest first.
pub fn weaknesses(scores: &[CompetencyScore], n: usize) -> Vec<&CompetencyScore> {
    let mut ranked: Vec<&CompetencyScore> = scores.iter().filter(|s| s.sample_size > 0).collect();
    ranked.sort_by(|a, b| a.score.total_cmp(&b.score));
    ranked.truncate(n);
    ranked
}
