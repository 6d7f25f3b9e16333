//! Response aggregation and statistics.
//!
//! This module turns a flat list of survey responses into manager
//! summaries, competency scores, distributions and feedback themes.
//! Every function here is total: empty input yields zero or empty
//! results, never an error or NaN.

use crate::models::{
    Category, CategoryComments, Competency, CompetencyScore, FeedbackThemes, ManagerSummary,
    ScoreTier, SurveyResponse, SCORE_SCALE_MAX,
};
use std::collections::{HashMap, HashSet};

/// Round to two decimal places, the precision of every displayed figure.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mean of the values, or 0 when there are none.
pub fn mean(values: &[i32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| *v as f64).sum::<f64>() / values.len() as f64
}

/// Group responses by manager, preserving first-occurrence order.
pub fn group_by_manager(responses: &[SurveyResponse]) -> Vec<(String, Vec<SurveyResponse>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<SurveyResponse>)> = Vec::new();

    for response in responses {
        match index.get(response.manager_name.as_str()) {
            Some(&i) => groups[i].1.push(response.clone()),
            None => {
                index.insert(response.manager_name.as_str(), groups.len());
                groups.push((response.manager_name.clone(), vec![response.clone()]));
            }
        }
    }

    groups
}

/// Build one summary per manager, best overall score first.
///
/// Category averages pool every non-null rating of the bucket's
/// competencies across the manager's responses. The overall score is
/// the mean of the categories that were actually evaluated: a bucket
/// with no ratings averages to 0 and is left out, so a manager rated
/// on a single category is scored on that category alone.
pub fn manager_summaries(responses: &[SurveyResponse]) -> Vec<ManagerSummary> {
    let mut summaries: Vec<ManagerSummary> = group_by_manager(responses)
        .into_iter()
        .map(|(manager_name, group)| summarize_manager(manager_name, group))
        .collect();

    // Stable: equal scores keep encounter order.
    summaries.sort_by(|a, b| b.overall_score.total_cmp(&a.overall_score));
    summaries
}

fn summarize_manager(manager_name: String, responses: Vec<SurveyResponse>) -> ManagerSummary {
    let mut buckets: HashMap<Category, Vec<i32>> = HashMap::new();

    for response in &responses {
        for (competency, value) in response.scores() {
            buckets.entry(competency.category()).or_default().push(value);
        }
    }

    let average = |category: Category| {
        round2(mean(buckets.get(&category).map(Vec::as_slice).unwrap_or(&[])))
    };

    let avg_team_leadership = average(Category::TeamLeadership);
    let avg_results_orientation = average(Category::ResultsOrientation);
    let avg_cultural_fit = average(Category::CulturalFit);

    let evaluated: Vec<f64> = [avg_team_leadership, avg_results_orientation, avg_cultural_fit]
        .into_iter()
        .filter(|avg| *avg != 0.0)
        .collect();

    let overall_score = if evaluated.is_empty() {
        0.0
    } else {
        round2(evaluated.iter().sum::<f64>() / evaluated.len() as f64)
    };

    ManagerSummary {
        manager_name,
        total_responses: responses.len(),
        avg_team_leadership,
        avg_results_orientation,
        avg_cultural_fit,
        overall_score,
        tier: ScoreTier::classify(overall_score),
        responses,
    }
}

/// Mean score per competency, in catalog order.
pub fn competency_scores(responses: &[SurveyResponse]) -> Vec<CompetencyScore> {
    Competency::ALL
        .iter()
        .map(|competency| {
            let values: Vec<i32> = responses
                .iter()
                .filter_map(|r| r.score(*competency))
                .collect();
            let score = round2(mean(&values));

            CompetencyScore {
                competency: *competency,
                name: competency.display_name().to_string(),
                score,
                max_score: SCORE_SCALE_MAX,
                percentage: round2(score / SCORE_SCALE_MAX * 100.0),
                sample_size: values.len(),
            }
        })
        .collect()
}

/// Competency scores restricted to one manager's responses.
pub fn manager_competency_breakdown(summary: &ManagerSummary) -> Vec<CompetencyScore> {
    competency_scores(&summary.responses)
}

/// Count of responses per relationship, most common first.
///
/// Absent relationships are counted under "Unknown". Ties keep
/// first-seen order.
pub fn relationship_distribution(responses: &[SurveyResponse]) -> Vec<(String, usize)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for response in responses {
        let label = response.relationship_label();
        match index.get(label) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(label, counts.len());
                counts.push((label.to_string(), 1));
            }
        }
    }

    counts.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    counts
}

/// Histogram of individual ratings over the 1..=5 buckets.
///
/// Every non-null competency score counts once. Values outside the
/// scale are ignored.
pub fn score_distribution(responses: &[SurveyResponse]) -> Vec<(i32, usize)> {
    let mut buckets = [0usize; 5];

    for response in responses {
        for (_, value) in response.scores() {
            if (1..=5).contains(&value) {
                buckets[(value - 1) as usize] += 1;
            }
        }
    }

    buckets
        .iter()
        .enumerate()
        .map(|(i, count)| (i as i32 + 1, *count))
        .collect()
}

/// Deduplicated stop/start/continue feedback.
///
/// A single seen-set spans all three prompts, so text that appears as
/// both "stop" and "start" feedback is kept once, under whichever field
/// was reached first. Comparison is trimmed and case-insensitive; the
/// kept entry is the trimmed original text.
pub fn feedback_themes(responses: &[SurveyResponse]) -> FeedbackThemes {
    let mut seen: HashSet<String> = HashSet::new();
    let mut themes = FeedbackThemes::default();

    for response in responses {
        let fields = [
            (&response.stop_doing, &mut themes.stop_doing),
            (&response.start_doing, &mut themes.start_doing),
            (&response.continue_doing, &mut themes.continue_doing),
        ];

        for (value, target) in fields {
            let Some(text) = value.as_deref().map(str::trim) else {
                continue;
            };
            if text.is_empty() {
                continue;
            }
            if seen.insert(text.to_lowercase()) {
                target.push(text.to_string());
            }
        }
    }

    themes
}

/// Category comments per manager, in first-occurrence order.
pub fn category_comments(responses: &[SurveyResponse]) -> Vec<CategoryComments> {
    group_by_manager(responses)
        .into_iter()
        .map(|(manager_name, group)| {
            let collect = |category: Category| -> Vec<String> {
                group
                    .iter()
                    .filter_map(|r| r.category_comment(category))
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(String::from)
                    .collect()
            };

            CategoryComments {
                team_leadership: collect(Category::TeamLeadership),
                results_orientation: collect(Category::ResultsOrientation),
                cultural_fit: collect(Category::CulturalFit),
                manager_name,
            }
        })
        .filter(|c| Category::ALL.iter().any(|cat| !c.for_category(*cat).is_empty()))
        .collect()
}

/// Mean of the per-manager overall scores that are non-zero.
pub fn organization_average(summaries: &[ManagerSummary]) -> f64 {
    let scored: Vec<f64> = summaries
        .iter()
        .map(|s| s.overall_score)
        .filter(|s| *s > 0.0)
        .collect();

    if scored.is_empty() {
        0.0
    } else {
        round2(scored.iter().sum::<f64>() / scored.len() as f64)
    }
}

/// `count` as a percentage of `total`, rounded; 0 when `total` is 0.
pub fn share(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        round2(count as f64 / total as f64 * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEAM: [Competency; 5] = [
        Competency::EmpowersTeam,
        Competency::MentorsCoaches,
        Competency::EffectiveDirection,
        Competency::EstablishesRapport,
        Competency::SetsClearGoals,
    ];

    fn rated(id: &str, manager: &str, competencies: &[Competency], value: i32) -> SurveyResponse {
        let mut r = SurveyResponse::new(id, manager);
        for c in competencies {
            r.set_score(*c, Some(value));
        }
        r
    }

    fn with_feedback(id: &str, stop: Option<&str>, start: Option<&str>, cont: Option<&str>) -> SurveyResponse {
        let mut r = SurveyResponse::new(id, "Jane");
        r.stop_doing = stop.map(String::from);
        r.start_doing = start.map(String::from);
        r.continue_doing = cont.map(String::from);
        r
    }

    #[test]
    fn test_single_category_overall() {
        let responses = vec![rated("1", "Jane", &TEAM, 4), rated("2", "Jane", &TEAM, 2)];

        let summaries = manager_summaries(&responses);
        assert_eq!(summaries.len(), 1);
        let jane = &summaries[0];
        assert_eq!(jane.total_responses, 2);
        assert_eq!(jane.avg_team_leadership, 3.0);
        assert_eq!(jane.avg_results_orientation, 0.0);
        assert_eq!(jane.avg_cultural_fit, 0.0);
        assert_eq!(jane.overall_score, 3.0);
        assert_eq!(jane.tier, ScoreTier::Strong);
        assert_eq!(jane.responses.len(), 2);
    }

    #[test]
    fn test_overall_averages_evaluated_categories_only() {
        let mut r = rated("1", "Jane", &TEAM, 4);
        r.set_score(Competency::Approachable, Some(2));

        let summaries = manager_summaries(&[r]);
        assert_eq!(summaries[0].avg_team_leadership, 4.0);
        assert_eq!(summaries[0].avg_cultural_fit, 2.0);
        assert_eq!(summaries[0].overall_score, 3.0);
    }

    #[test]
    fn test_unscored_manager_has_zero_overall() {
        let summaries = manager_summaries(&[SurveyResponse::new("1", "Ghost")]);
        assert_eq!(summaries[0].overall_score, 0.0);
        assert_eq!(summaries[0].total_responses, 1);
        assert_eq!(summaries[0].tier, ScoreTier::Critical);
    }

    #[test]
    fn test_summaries_sorted_desc_with_stable_ties() {
        let responses = vec![
            rated("1", "Carol", &TEAM, 3),
            rated("2", "Alice", &TEAM, 5),
            rated("3", "Bob", &TEAM, 3),
            rated("4", "Dave", &TEAM, 1),
        ];

        let names: Vec<String> = manager_summaries(&responses)
            .into_iter()
            .map(|s| s.manager_name)
            .collect();
        assert_eq!(names, vec!["Alice", "Carol", "Bob", "Dave"]);
    }

    #[test]
    fn test_summary_counts_match_filtered_total() {
        let responses = vec![
            rated("1", "Alice", &TEAM, 3),
            rated("2", "Bob", &TEAM, 4),
            rated("3", "Alice", &[], 0),
            rated("4", "Cara", &[Competency::FinalSay], 2),
        ];

        let summaries = manager_summaries(&responses);
        let total: usize = summaries.iter().map(|s| s.total_responses).sum();
        assert_eq!(total, responses.len());
        for s in &summaries {
            for cat in Category::ALL {
                let avg = s.category_average(cat);
                assert!(avg == 0.0 || (1.0..=5.0).contains(&avg));
            }
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(manager_summaries(&[]).is_empty());

        let scores = competency_scores(&[]);
        assert_eq!(scores.len(), 13);
        assert!(scores.iter().all(|s| s.score == 0.0 && s.percentage == 0.0));

        assert!(relationship_distribution(&[]).is_empty());
        assert!(score_distribution(&[]).iter().all(|(_, c)| *c == 0));
        assert!(feedback_themes(&[]).is_empty());
        assert!(category_comments(&[]).is_empty());
        assert_eq!(organization_average(&[]), 0.0);
    }

    #[test]
    fn test_competency_scores_in_catalog_order() {
        let mut a = SurveyResponse::new("1", "Alice");
        a.set_score(Competency::Approachable, Some(5));
        a.set_score(Competency::EmpowersTeam, Some(2));
        let mut b = SurveyResponse::new("2", "Bob");
        b.set_score(Competency::Approachable, Some(4));

        let scores = competency_scores(&[a, b]);
        assert_eq!(scores[0].name, "Empowers Team");
        assert_eq!(scores[0].score, 2.0);
        assert_eq!(scores[0].percentage, 40.0);
        assert_eq!(scores[12].name, "Approachable");
        assert_eq!(scores[12].score, 4.5);
        assert_eq!(scores[12].percentage, 90.0);
        assert_eq!(scores[12].sample_size, 2);
        assert_eq!(scores[5].sample_size, 0);
    }

    #[test]
    fn test_relationship_distribution_counts_unknown() {
        let mut a = SurveyResponse::new("1", "Alice");
        a.relationship = Some("Peer".to_string());
        let b = SurveyResponse::new("2", "Alice");
        let mut c = SurveyResponse::new("3", "Bob");
        c.relationship = Some("Peer".to_string());

        let dist = relationship_distribution(&[a, b, c]);
        assert_eq!(
            dist,
            vec![("Peer".to_string(), 2), ("Unknown".to_string(), 1)]
        );
    }

    #[test]
    fn test_score_distribution_counts_each_rating() {
        let mut a = rated("1", "Alice", &TEAM, 4);
        a.set_score(Competency::FinalSay, Some(9));
        a.set_score(Competency::Approachable, Some(1));

        let dist = score_distribution(&[a]);
        assert_eq!(dist, vec![(1, 1), (2, 0), (3, 0), (4, 5), (5, 0)]);
        let total: usize = dist.iter().map(|(_, c)| c).sum();
        assert_eq!(total, 6);
    }

    #[test]
    fn test_feedback_dedup_is_global_and_case_insensitive() {
        let responses = vec![
            with_feedback("1", Some("Micromanaging"), Some("Weekly 1:1s"), None),
            with_feedback("2", Some("  micromanaging "), Some("More delegation"), Some("Weekly 1:1s")),
            with_feedback("3", Some(""), Some("MICROMANAGING"), Some("Clear goals")),
        ];

        let themes = feedback_themes(&responses);
        assert_eq!(themes.stop_doing, vec!["Micromanaging"]);
        assert_eq!(themes.start_doing, vec!["Weekly 1:1s", "More delegation"]);
        assert_eq!(themes.continue_doing, vec!["Clear goals"]);
    }

    #[test]
    fn test_feedback_dedup_is_idempotent() {
        let responses = vec![
            with_feedback("1", Some("Late replies"), Some("Share context"), Some("Humor")),
            with_feedback("2", Some("late replies"), Some("Humor"), Some("Open door")),
        ];
        let once = feedback_themes(&responses);

        let mut replay = Vec::new();
        for s in &once.stop_doing {
            replay.push(with_feedback("s", Some(s), None, None));
        }
        for s in &once.start_doing {
            replay.push(with_feedback("t", None, Some(s), None));
        }
        for s in &once.continue_doing {
            replay.push(with_feedback("c", None, None, Some(s)));
        }

        assert_eq!(feedback_themes(&replay), once);
    }

    #[test]
    fn test_category_comments_grouped_by_manager() {
        let mut a = SurveyResponse::new("1", "Alice");
        a.team_leadership_comments = Some("Great mentor".to_string());
        let mut b = SurveyResponse::new("2", "Bob");
        b.cultural_fit_comments = Some(" ".to_string());
        let mut c = SurveyResponse::new("3", "Alice");
        c.cultural_fit_comments = Some("Very approachable".to_string());

        let comments = category_comments(&[a, b, c]);
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].manager_name, "Alice");
        assert_eq!(comments[0].team_leadership, vec!["Great mentor"]);
        assert_eq!(comments[0].cultural_fit, vec!["Very approachable"]);
    }

    #[test]
    fn test_organization_average_skips_unscored() {
        let responses = vec![
            rated("1", "Alice", &TEAM, 4),
            rated("2", "Bob", &TEAM, 3),
            SurveyResponse::new("3", "Ghost"),
        ];
        let summaries = manager_summaries(&responses);
        assert_eq!(organization_average(&summaries), 3.5);
    }

    #[test]
    fn test_share_handles_zero_total() {
        assert_eq!(share(1, 3), 33.33);
        assert_eq!(share(3, 0), 0.0);
    }
}
