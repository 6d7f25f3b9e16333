//! Multi-sheet spreadsheet export.
//!
//! Sheets are first built as plain tables so their content can be
//! inspected without decoding a workbook, then written out with
//! `rust_xlsxwriter`.

use super::{ExportError, ExportOptions};
use crate::analysis::aggregator::{manager_competency_breakdown, share};
use crate::analysis::ranking::rank_competencies;
use crate::analysis::Dashboard;
use crate::models::{Category, Competency, ScoreTier};
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook};

/// Sheet names in workbook order.
pub const SHEET_NAMES: [&str; 9] = [
    "Executive Summary",
    "Manager Rankings",
    "Competency Analysis",
    "Relationship Breakdown",
    "Score Distribution",
    "Manager Detail",
    "Raw Data",
    "Feedback Compilation",
    "Category Comments",
];

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Title(String),
    Header(String),
    Text(String),
    /// A score or percentage, written with two decimals.
    Number(f64),
    Count(usize),
    /// A raw rating exactly as stored.
    Rating(i32),
}

impl Cell {
    fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    fn opt(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() => Cell::Text(v.to_string()),
            _ => Cell::Empty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
    pub column_widths: Vec<f64>,
}

impl Sheet {
    fn new(name: &str, column_widths: &[f64]) -> Self {
        Self {
            name: name.to_string(),
            rows: Vec::new(),
            column_widths: column_widths.to_vec(),
        }
    }

    fn title(&mut self, title: impl Into<String>) {
        self.rows.push(vec![Cell::Title(title.into())]);
    }

    fn headers(&mut self, headers: &[&str]) {
        self.rows
            .push(headers.iter().map(|h| Cell::Header(h.to_string())).collect());
    }

    fn row(&mut self, cells: Vec<Cell>) {
        self.rows.push(cells);
    }

    fn blank(&mut self) {
        self.rows.push(Vec::new());
    }
}

/// Build every sheet from the dashboard.
pub fn build_sheets(dashboard: &Dashboard, options: &ExportOptions) -> Vec<Sheet> {
    vec![
        executive_summary(dashboard, options),
        manager_rankings(dashboard),
        competency_analysis(dashboard),
        relationship_breakdown(dashboard),
        score_distribution(dashboard),
        manager_detail(dashboard),
        raw_data(dashboard),
        feedback_compilation(dashboard),
        category_comments(dashboard),
    ]
}

fn executive_summary(dashboard: &Dashboard, options: &ExportOptions) -> Sheet {
    let h = &dashboard.headline;
    let mut sheet = Sheet::new(SHEET_NAMES[0], &[32.0, 40.0, 14.0]);

    sheet.title(format!("{} - 360 Feedback Report", options.organization));
    sheet.row(vec![
        Cell::text("Generated"),
        Cell::text(options.date.format("%Y-%m-%d").to_string()),
    ]);
    sheet.row(vec![Cell::text("Scope"), Cell::text(dashboard.filters.describe())]);
    sheet.blank();

    sheet.headers(&["Metric", "Value"]);
    sheet.row(vec![Cell::text("Total Responses"), Cell::Count(h.total_responses)]);
    sheet.row(vec![Cell::text("Managers Evaluated"), Cell::Count(h.total_managers)]);
    sheet.row(vec![Cell::text("Average Overall Score"), Cell::Number(h.average_score)]);
    sheet.row(vec![
        Cell::text("Top Performer"),
        Cell::opt(h.top_manager.as_deref()),
    ]);
    sheet.row(vec![Cell::text("Top Score"), Cell::Number(h.top_score)]);
    sheet.blank();

    sheet.headers(&["Top Performers", "Overall Score", "Tier"]);
    for s in dashboard.top_performers(options.top_n) {
        sheet.row(vec![
            Cell::text(&s.manager_name),
            Cell::Number(s.overall_score),
            Cell::text(s.tier.to_string()),
        ]);
    }
    sheet.blank();

    sheet.headers(&["Development Focus", "Overall Score", "Tier"]);
    for s in dashboard.bottom_performers(options.top_n) {
        sheet.row(vec![
            Cell::text(&s.manager_name),
            Cell::Number(s.overall_score),
            Cell::text(s.tier.to_string()),
        ]);
    }
    sheet.blank();

    sheet.headers(&["Top Strengths", "Score"]);
    for c in dashboard.strengths(3) {
        sheet.row(vec![Cell::text(&c.name), Cell::Number(c.score)]);
    }
    sheet.blank();

    sheet.headers(&["Development Areas", "Score"]);
    for c in dashboard.weaknesses(3) {
        sheet.row(vec![Cell::text(&c.name), Cell::Number(c.score)]);
    }

    sheet
}

fn manager_rankings(dashboard: &Dashboard) -> Sheet {
    let mut sheet = Sheet::new(SHEET_NAMES[1], &[8.0, 28.0, 14.0, 18.0, 16.0, 20.0, 14.0, 12.0]);

    sheet.headers(&[
        "Rank",
        "Manager",
        "Overall Score",
        "Tier",
        "Team Leadership",
        "Results Orientation",
        "Cultural Fit",
        "Responses",
    ]);
    for (i, s) in dashboard.manager_summaries.iter().enumerate() {
        let mut row = vec![
            Cell::Count(i + 1),
            Cell::text(&s.manager_name),
            Cell::Number(s.overall_score),
            Cell::text(s.tier.to_string()),
        ];
        row.extend(Category::ALL.iter().map(|c| Cell::Number(s.category_average(*c))));
        row.push(Cell::Count(s.total_responses));
        sheet.row(row);
    }

    sheet
}

fn competency_analysis(dashboard: &Dashboard) -> Sheet {
    let mut sheet = Sheet::new(SHEET_NAMES[2], &[8.0, 34.0, 20.0, 14.0, 14.0, 10.0, 18.0]);

    sheet.headers(&[
        "Rank",
        "Competency",
        "Category",
        "Average Score",
        "% of Maximum",
        "Ratings",
        "Tier",
    ]);
    for (i, c) in rank_competencies(&dashboard.competency_scores).into_iter().enumerate() {
        let tier = if c.sample_size == 0 {
            Cell::text("No ratings")
        } else {
            Cell::text(ScoreTier::classify(c.score).to_string())
        };
        sheet.row(vec![
            Cell::Count(i + 1),
            Cell::text(&c.name),
            Cell::text(c.competency.category().to_string()),
            Cell::Number(c.score),
            Cell::Number(c.percentage),
            Cell::Count(c.sample_size),
            tier,
        ]);
    }

    sheet
}

fn relationship_breakdown(dashboard: &Dashboard) -> Sheet {
    let mut sheet = Sheet::new(SHEET_NAMES[3], &[24.0, 12.0, 14.0]);
    let total = dashboard.headline.total_responses;

    sheet.headers(&["Relationship", "Responses", "% of Total"]);
    for (relationship, count) in &dashboard.relationship_distribution {
        sheet.row(vec![
            Cell::text(relationship),
            Cell::Count(*count),
            Cell::Number(share(*count, total)),
        ]);
    }

    sheet
}

fn score_distribution(dashboard: &Dashboard) -> Sheet {
    let mut sheet = Sheet::new(SHEET_NAMES[4], &[22.0, 14.0, 12.0, 14.0]);
    let managers = dashboard.headline.total_managers;
    let ratings: usize = dashboard.score_distribution.iter().map(|(_, n)| n).sum();

    sheet.title("Performance Tiers");
    sheet.headers(&["Tier", "Score Range", "Managers", "% of Managers"]);
    for (tier, count) in &dashboard.tier_distribution {
        sheet.row(vec![
            Cell::text(tier.to_string()),
            Cell::text(tier.range_label()),
            Cell::Count(*count),
            Cell::Number(share(*count, managers)),
        ]);
    }
    sheet.blank();

    sheet.title("Rating Distribution");
    sheet.headers(&["Rating", "Count", "% of Ratings"]);
    for (rating, count) in &dashboard.score_distribution {
        sheet.row(vec![
            Cell::Count(*rating as usize),
            Cell::Count(*count),
            Cell::Number(share(*count, ratings)),
        ]);
    }

    sheet
}

fn manager_detail(dashboard: &Dashboard) -> Sheet {
    let mut sheet = Sheet::new(SHEET_NAMES[5], &[28.0, 34.0, 20.0, 12.0, 10.0]);

    sheet.headers(&["Manager", "Competency", "Category", "Score", "Ratings"]);
    for summary in &dashboard.manager_summaries {
        for c in manager_competency_breakdown(summary) {
            sheet.row(vec![
                Cell::text(&summary.manager_name),
                Cell::text(&c.name),
                Cell::text(c.competency.category().to_string()),
                Cell::Number(c.score),
                Cell::Count(c.sample_size),
            ]);
        }
    }

    sheet
}

fn raw_data(dashboard: &Dashboard) -> Sheet {
    // Raw data keeps the backend column names.
    let mut headers: Vec<&str> = vec!["id", "manager_name", "relationship"];
    headers.extend(Competency::ALL.iter().map(|c| c.key()));
    headers.extend([
        "stop_doing",
        "start_doing",
        "continue_doing",
        "team_leadership_comments",
        "results_orientation_comments",
        "cultural_fit_comments",
        "submitted_at",
        "created_at",
    ]);

    let mut widths = vec![12.0, 24.0, 18.0];
    widths.extend(std::iter::repeat(12.0).take(Competency::ALL.len()));
    widths.extend(std::iter::repeat(36.0).take(6));
    widths.extend([22.0, 22.0]);

    let mut sheet = Sheet::new(SHEET_NAMES[6], &widths);
    sheet.headers(&headers);

    for r in &dashboard.responses {
        let mut row = vec![
            Cell::text(&r.id),
            Cell::text(&r.manager_name),
            Cell::text(r.relationship_label()),
        ];
        row.extend(Competency::ALL.iter().map(|c| match r.score(*c) {
            Some(v) => Cell::Rating(v),
            None => Cell::Empty,
        }));
        row.extend([
            Cell::opt(r.stop_doing.as_deref()),
            Cell::opt(r.start_doing.as_deref()),
            Cell::opt(r.continue_doing.as_deref()),
            Cell::opt(r.team_leadership_comments.as_deref()),
            Cell::opt(r.results_orientation_comments.as_deref()),
            Cell::opt(r.cultural_fit_comments.as_deref()),
        ]);
        row.push(match r.submitted_at {
            Some(t) => Cell::text(t.format("%Y-%m-%d %H:%M").to_string()),
            None => Cell::Empty,
        });
        row.push(Cell::text(r.created_at.format("%Y-%m-%d %H:%M").to_string()));
        sheet.row(row);
    }

    sheet
}

fn feedback_compilation(dashboard: &Dashboard) -> Sheet {
    let mut sheet = Sheet::new(SHEET_NAMES[7], &[16.0, 80.0]);
    let themes = &dashboard.feedback_themes;

    sheet.headers(&["Type", "Feedback"]);
    for (label, items) in [
        ("Stop Doing", &themes.stop_doing),
        ("Start Doing", &themes.start_doing),
        ("Continue Doing", &themes.continue_doing),
    ] {
        for item in items {
            sheet.row(vec![Cell::text(label), Cell::text(item)]);
        }
    }

    sheet
}

fn category_comments(dashboard: &Dashboard) -> Sheet {
    let mut sheet = Sheet::new(SHEET_NAMES[8], &[28.0, 22.0, 80.0]);

    sheet.headers(&["Manager", "Category", "Comment"]);
    for group in &dashboard.category_comments {
        for category in Category::ALL {
            for comment in group.for_category(category) {
                sheet.row(vec![
                    Cell::text(&group.manager_name),
                    Cell::text(category.to_string()),
                    Cell::text(comment),
                ]);
            }
        }
    }

    sheet
}

/// Write the sheets into an in-memory `.xlsx` file.
pub fn render(sheets: &[Sheet]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();

    let title = Format::new().set_bold().set_font_size(14);
    let header = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xDCE6F1))
        .set_border(FormatBorder::Thin);
    let number = Format::new().set_num_format("0.00");

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;

        for (r, row) in sheet.rows.iter().enumerate() {
            let r = r as u32;
            for (c, cell) in row.iter().enumerate() {
                let c = c as u16;
                match cell {
                    Cell::Empty => {}
                    Cell::Title(s) => {
                        worksheet.write_string_with_format(r, c, s, &title)?;
                    }
                    Cell::Header(s) => {
                        worksheet.write_string_with_format(r, c, s, &header)?;
                    }
                    Cell::Text(s) => {
                        worksheet.write_string(r, c, s)?;
                    }
                    Cell::Number(n) => {
                        worksheet.write_number_with_format(r, c, *n, &number)?;
                    }
                    Cell::Count(n) => {
                        worksheet.write_number(r, c, *n as f64)?;
                    }
                    Cell::Rating(n) => {
                        worksheet.write_number(r, c, f64::from(*n))?;
                    }
                }
            }
        }

        for (c, width) in sheet.column_widths.iter().enumerate() {
            worksheet.set_column_width(c as u16, *width)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}
