//! Dashboard report generation.
//!
//! This module renders a computed dashboard as a Markdown document for
//! the terminal or a file, or as JSON for other tools.

use crate::analysis::aggregator::share;
use crate::analysis::Dashboard;
use crate::models::{Category, CategoryComments, CompetencyScore, FeedbackThemes, ManagerSummary};
use anyhow::Result;

/// Generate the complete Markdown dashboard.
pub fn generate_markdown_report(dashboard: &Dashboard, top_n: usize) -> String {
    let mut output = String::new();

    output.push_str("# 360 Feedback Dashboard\n\n");
    output.push_str(&generate_metadata_section(dashboard));

    if dashboard.is_empty() {
        output.push_str("No responses match the current filters.\n\n");
        output.push_str(&generate_footer());
        return output;
    }

    output.push_str(&generate_headline_section(dashboard));
    output.push_str(&generate_rankings_section(&dashboard.manager_summaries));
    output.push_str(&generate_performers_section(dashboard, top_n));
    output.push_str(&generate_competency_section(dashboard));
    output.push_str(&generate_distribution_section(dashboard));
    output.push_str(&generate_themes_section(&dashboard.feedback_themes));
    output.push_str(&generate_comments_section(&dashboard.category_comments));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(dashboard: &Dashboard) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "- **Generated:** {}\n",
        dashboard.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Scope:** {}\n", dashboard.filters.describe()));
    section.push_str("\n");

    section
}

fn generate_headline_section(dashboard: &Dashboard) -> String {
    let h = &dashboard.headline;
    let mut section = String::new();

    section.push_str("## Overview\n\n");
    section.push_str("| Responses | Managers | Average Score | Top Performer |\n");
    section.push_str("|:---:|:---:|:---:|:---|\n");
    section.push_str(&format!(
        "| {} | {} | {:.2} | {} |\n\n",
        h.total_responses,
        h.total_managers,
        h.average_score,
        match &h.top_manager {
            Some(name) => format!("{} ({:.2})", name, h.top_score),
            None => "-".to_string(),
        }
    ));

    let unrated = h.total_responses - h.rated_responses.min(h.total_responses);
    if unrated > 0 {
        section.push_str(&format!(
            "*{} responses carry no competency ratings and are excluded from averages.*\n\n",
            unrated
        ));
    }

    section
}

fn generate_rankings_section(summaries: &[ManagerSummary]) -> String {
    let mut section = String::new();

    section.push_str("## Manager Rankings\n\n");
    section.push_str(
        "| # | Manager | Overall | Tier | Team Leadership | Results Orientation | Cultural Fit | Responses |\n",
    );
    section.push_str("|:---:|:---|:---:|:---|:---:|:---:|:---:|:---:|\n");

    for (i, s) in summaries.iter().enumerate() {
        section.push_str(&format!(
            "| {} | {} | {:.2} | {} | {:.2} | {:.2} | {:.2} | {} |\n",
            i + 1,
            s.manager_name,
            s.overall_score,
            s.tier,
            s.avg_team_leadership,
            s.avg_results_orientation,
            s.avg_cultural_fit,
            s.total_responses
        ));
    }
    section.push_str("\n");

    section
}

fn generate_performers_section(dashboard: &Dashboard, top_n: usize) -> String {
    let mut section = String::new();

    section.push_str(&format!("### Top {} Performers\n\n", top_n));
    for (i, s) in dashboard.top_performers(top_n).iter().enumerate() {
        section.push_str(&format!(
            "{}. **{}** {:.2} ({})\n",
            i + 1,
            s.manager_name,
            s.overall_score,
            s.tier
        ));
    }
    section.push_str("\n");

    section.push_str("### Development Focus\n\n");
    for (i, s) in dashboard.bottom_performers(top_n).iter().enumerate() {
        section.push_str(&format!(
            "{}. **{}** {:.2} ({})\n",
            i + 1,
            s.manager_name,
            s.overall_score,
            s.tier
        ));
    }
    section.push_str("\n");

    section
}

fn competency_row(c: &CompetencyScore) -> String {
    if c.sample_size == 0 {
        return format!("| {} | - | - | 0 |\n", c.name);
    }
    format!(
        "| {} | {:.2} | {:.0}% | {} |\n",
        c.name, c.score, c.percentage, c.sample_size
    )
}

fn generate_competency_section(dashboard: &Dashboard) -> String {
    let mut section = String::new();

    section.push_str("## Competency Scores\n\n");
    for category in Category::ALL {
        section.push_str(&format!("### {}\n\n", category));
        section.push_str("| Competency | Score | % of Max | Ratings |\n");
        section.push_str("|:---|:---:|:---:|:---:|\n");
        for c in dashboard
            .competency_scores
            .iter()
            .filter(|c| c.competency.category() == category)
        {
            section.push_str(&competency_row(c));
        }
        section.push_str("\n");
    }

    let strengths = dashboard.strengths(3);
    if !strengths.is_empty() {
        section.push_str("**Strengths:** ");
        let names: Vec<String> = strengths
            .iter()
            .map(|c| format!("{} ({:.2})", c.name, c.score))
            .collect();
        section.push_str(&names.join(", "));
        section.push_str("\n\n");

        section.push_str("**Development areas:** ");
        let names: Vec<String> = dashboard
            .weaknesses(3)
            .iter()
            .map(|c| format!("{} ({:.2})", c.name, c.score))
            .collect();
        section.push_str(&names.join(", "));
        section.push_str("\n\n");
    }

    section
}

fn generate_distribution_section(dashboard: &Dashboard) -> String {
    let mut section = String::new();

    section.push_str("## Distributions\n\n");

    section.push_str("### Performance Tiers\n\n");
    section.push_str("| Tier | Range | Managers | Share |\n");
    section.push_str("|:---|:---:|:---:|:---:|\n");
    for (tier, count) in &dashboard.tier_distribution {
        section.push_str(&format!(
            "| {} | {} | {} | {:.0}% |\n",
            tier,
            tier.range_label(),
            count,
            share(*count, dashboard.headline.total_managers)
        ));
    }
    section.push_str("\n");

    let ratings: usize = dashboard.score_distribution.iter().map(|(_, n)| n).sum();
    section.push_str("### Ratings\n\n");
    section.push_str("| Rating | Count | Share |\n");
    section.push_str("|:---:|:---:|:---:|\n");
    for (rating, count) in &dashboard.score_distribution {
        section.push_str(&format!(
            "| {} | {} | {:.0}% |\n",
            rating,
            count,
            share(*count, ratings)
        ));
    }
    section.push_str("\n");

    section.push_str("### Reviewer Relationships\n\n");
    section.push_str("| Relationship | Responses | Share |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for (relationship, count) in &dashboard.relationship_distribution {
        section.push_str(&format!(
            "| {} | {} | {:.0}% |\n",
            relationship,
            count,
            share(*count, dashboard.headline.total_responses)
        ));
    }
    section.push_str("\n");

    section
}

fn generate_themes_section(themes: &FeedbackThemes) -> String {
    if themes.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Feedback Themes\n\n");

    for (label, items) in [
        ("Stop Doing", &themes.stop_doing),
        ("Start Doing", &themes.start_doing),
        ("Continue Doing", &themes.continue_doing),
    ] {
        if items.is_empty() {
            continue;
        }
        section.push_str(&format!("### {}\n\n", label));
        for item in items {
            section.push_str(&format!("- {}\n", item));
        }
        section.push_str("\n");
    }

    section
}

fn generate_comments_section(comments: &[CategoryComments]) -> String {
    if comments.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Category Comments\n\n");

    for group in comments {
        section.push_str(&format!("### {}\n\n", group.manager_name));
        for category in Category::ALL {
            let items = group.for_category(category);
            if items.is_empty() {
                continue;
            }
            section.push_str(&format!("**{}**\n\n", category));
            for item in items {
                section.push_str(&format!("> {}\n\n", item));
            }
        }
    }

    section
}

fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Generated by feedback360*\n");

    footer
}

/// Generate the JSON dashboard.
pub fn generate_json_report(dashboard: &Dashboard) -> Result<String> {
    serde_json::to_string_pretty(dashboard).map_err(Into::into)
}
