//! Paginated PDF report export.
//!
//! The report is described as sections of blocks, laid out into
//! positioned text lines, and only then drawn with `printpdf`. Layout
//! is pure, so pagination can be tested without parsing a PDF.

use super::{ExportError, ExportOptions};
use crate::analysis::aggregator::share;
use crate::analysis::ranking::rank_competencies;
use crate::analysis::Dashboard;
use crate::models::{ManagerSummary, ScoreTier};
use printpdf::{BuiltinFont, Mm, PdfDocument};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 18.0;
const FOOTER_SPACE: f32 = 12.0;
const BODY_SIZE: f32 = 10.0;
const TABLE_SIZE: f32 = 9.0;
const HEADING_SIZE: f32 = 14.0;
const TITLE_SIZE: f32 = 24.0;
const BAR_WIDTH: usize = 30;

const PT_TO_MM: f32 = 0.3528;

/// A table column: header and width in millimetres.
#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub width: f32,
}

fn col(header: &str, width: f32) -> Column {
    Column {
        header: header.to_string(),
        width,
    }
}

/// A unit of report content.
#[derive(Debug, Clone)]
pub enum Block {
    Title(String),
    Subtitle(String),
    Heading(String),
    Paragraph(String),
    Bullets(Vec<String>),
    Table {
        columns: Vec<Column>,
        rows: Vec<Vec<String>>,
    },
    Spacer,
}

/// A run of blocks that starts on a fresh page.
#[derive(Debug, Clone, Default)]
pub struct Section {
    pub blocks: Vec<Block>,
}

impl Section {
    fn push(&mut self, block: Block) -> &mut Self {
        self.blocks.push(block);
        self
    }
}

/// One positioned line of text. `y` is the baseline, measured from the
/// top of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub bold: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PageLayout {
    pub lines: Vec<Line>,
}

#[cfg(test)]
impl PageLayout {
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.text.contains(needle))
    }
}

/// Build the report sections from the dashboard.
pub fn build_document(dashboard: &Dashboard, options: &ExportOptions) -> Vec<Section> {
    vec![
        cover(dashboard, options),
        executive_summary(dashboard, options),
        manager_rankings(dashboard),
        competency_analysis(dashboard),
        distributions(dashboard),
        feedback_themes(dashboard),
        findings_and_recommendations(dashboard, options),
    ]
}

fn cover(dashboard: &Dashboard, options: &ExportOptions) -> Section {
    let h = &dashboard.headline;
    let mut s = Section::default();

    s.push(Block::Spacer)
        .push(Block::Spacer)
        .push(Block::Title("360 Degree Feedback Report".to_string()))
        .push(Block::Subtitle(options.organization.clone()))
        .push(Block::Spacer)
        .push(Block::Paragraph(format!(
            "Generated {}",
            options.date.format("%B %-d, %Y")
        )))
        .push(Block::Paragraph(format!("Scope: {}", dashboard.filters.describe())))
        .push(Block::Spacer)
        .push(Block::Paragraph(format!(
            "{} responses covering {} managers. Average overall score {:.2} out of 5.",
            h.total_responses, h.total_managers, h.average_score
        )))
        .push(Block::Spacer)
        .push(Block::Paragraph(
            "Confidential. For leadership development use only.".to_string(),
        ));
    s
}

fn executive_summary(dashboard: &Dashboard, options: &ExportOptions) -> Section {
    let h = &dashboard.headline;
    let mut s = Section::default();

    s.push(Block::Heading("Executive Summary".to_string()));
    s.push(Block::Table {
        columns: vec![col("Metric", 80.0), col("Value", 94.0)],
        rows: vec![
            vec!["Total Responses".to_string(), h.total_responses.to_string()],
            vec!["Managers Evaluated".to_string(), h.total_managers.to_string()],
            vec!["Average Overall Score".to_string(), format!("{:.2}", h.average_score)],
            vec![
                "Top Performer".to_string(),
                match &h.top_manager {
                    Some(name) => format!("{} ({:.2})", name, h.top_score),
                    None => "-".to_string(),
                },
            ],
        ],
    });
    s.push(Block::Spacer);

    s.push(Block::Heading(format!("Top {} Performers", options.top_n)));
    s.push(performer_table(&dashboard.top_performers(options.top_n)));
    s.push(Block::Spacer);

    s.push(Block::Heading("Development Focus".to_string()));
    s.push(performer_table(&dashboard.bottom_performers(options.top_n)));
    s
}

fn performer_table(managers: &[&ManagerSummary]) -> Block {
    Block::Table {
        columns: vec![
            col("Manager", 80.0),
            col("Overall", 24.0),
            col("Tier", 40.0),
            col("Responses", 30.0),
        ],
        rows: managers
            .iter()
            .map(|m| {
                vec![
                    m.manager_name.clone(),
                    format!("{:.2}", m.overall_score),
                    m.tier.to_string(),
                    m.total_responses.to_string(),
                ]
            })
            .collect(),
    }
}

fn manager_rankings(dashboard: &Dashboard) -> Section {
    let mut s = Section::default();

    s.push(Block::Heading("Manager Rankings".to_string()));
    s.push(Block::Table {
        columns: vec![
            col("#", 10.0),
            col("Manager", 50.0),
            col("Overall", 18.0),
            col("Team Ldr", 20.0),
            col("Results", 20.0),
            col("Culture", 20.0),
            col("Resp.", 14.0),
            col("Tier", 22.0),
        ],
        rows: dashboard
            .manager_summaries
            .iter()
            .enumerate()
            .map(|(i, m)| {
                vec![
                    (i + 1).to_string(),
                    m.manager_name.clone(),
                    format!("{:.2}", m.overall_score),
                    format!("{:.2}", m.avg_team_leadership),
                    format!("{:.2}", m.avg_results_orientation),
                    format!("{:.2}", m.avg_cultural_fit),
                    m.total_responses.to_string(),
                    m.tier.to_string(),
                ]
            })
            .collect(),
    });
    s
}

fn competency_analysis(dashboard: &Dashboard) -> Section {
    let mut s = Section::default();

    s.push(Block::Heading("Competency Analysis".to_string()));
    s.push(Block::Table {
        columns: vec![
            col("#", 10.0),
            col("Competency", 62.0),
            col("Category", 40.0),
            col("Score", 18.0),
            col("% Max", 18.0),
            col("Ratings", 26.0),
        ],
        rows: rank_competencies(&dashboard.competency_scores)
            .into_iter()
            .enumerate()
            .map(|(i, c)| {
                vec![
                    (i + 1).to_string(),
                    c.name.clone(),
                    c.competency.category().to_string(),
                    format!("{:.2}", c.score),
                    format!("{:.0}%", c.percentage),
                    c.sample_size.to_string(),
                ]
            })
            .collect(),
    });
    s.push(Block::Spacer);

    s.push(Block::Heading("Key Strengths".to_string()));
    s.push(Block::Bullets(
        dashboard
            .strengths(3)
            .iter()
            .map(|c| format!("{}: {:.2}", c.name, c.score))
            .collect(),
    ));
    s.push(Block::Heading("Development Areas".to_string()));
    s.push(Block::Bullets(
        dashboard
            .weaknesses(3)
            .iter()
            .map(|c| format!("{}: {:.2}", c.name, c.score))
            .collect(),
    ));
    s
}

/// A text bar proportional to `count / max`.
pub fn bar(count: usize, max: usize) -> String {
    if max == 0 || count == 0 {
        return String::new();
    }
    let len = ((count as f64 / max as f64) * BAR_WIDTH as f64).round().max(1.0) as usize;
    "#".repeat(len)
}

fn distributions(dashboard: &Dashboard) -> Section {
    let mut s = Section::default();
    let managers = dashboard.headline.total_managers;

    let tier_max = dashboard.tier_distribution.iter().map(|(_, n)| *n).max().unwrap_or(0);
    s.push(Block::Heading("Performance Tier Distribution".to_string()));
    s.push(Block::Table {
        columns: vec![
            col("Tier", 36.0),
            col("Range", 24.0),
            col("Managers", 20.0),
            col("Share", 18.0),
            col("", 76.0),
        ],
        rows: dashboard
            .tier_distribution
            .iter()
            .map(|(tier, n)| {
                vec![
                    tier.to_string(),
                    tier.range_label().to_string(),
                    n.to_string(),
                    format!("{:.0}%", share(*n, managers)),
                    bar(*n, tier_max),
                ]
            })
            .collect(),
    });
    s.push(Block::Spacer);

    let ratings: usize = dashboard.score_distribution.iter().map(|(_, n)| n).sum();
    let rating_max = dashboard.score_distribution.iter().map(|(_, n)| *n).max().unwrap_or(0);
    s.push(Block::Heading("Rating Distribution".to_string()));
    s.push(Block::Table {
        columns: vec![
            col("Rating", 20.0),
            col("Count", 20.0),
            col("Share", 18.0),
            col("", 116.0),
        ],
        rows: dashboard
            .score_distribution
            .iter()
            .map(|(rating, n)| {
                vec![
                    rating.to_string(),
                    n.to_string(),
                    format!("{:.0}%", share(*n, ratings)),
                    bar(*n, rating_max),
                ]
            })
            .collect(),
    });
    s.push(Block::Spacer);

    let total = dashboard.headline.total_responses;
    let rel_max = dashboard
        .relationship_distribution
        .iter()
        .map(|(_, n)| *n)
        .max()
        .unwrap_or(0);
    s.push(Block::Heading("Responses by Relationship".to_string()));
    s.push(Block::Table {
        columns: vec![
            col("Relationship", 40.0),
            col("Responses", 20.0),
            col("Share", 18.0),
            col("", 96.0),
        ],
        rows: dashboard
            .relationship_distribution
            .iter()
            .map(|(rel, n)| {
                vec![
                    rel.clone(),
                    n.to_string(),
                    format!("{:.0}%", share(*n, total)),
                    bar(*n, rel_max),
                ]
            })
            .collect(),
    });
    s
}

fn feedback_themes(dashboard: &Dashboard) -> Section {
    let themes = &dashboard.feedback_themes;
    let mut s = Section::default();

    s.push(Block::Heading("Feedback Themes".to_string()));
    if themes.is_empty() {
        s.push(Block::Paragraph(
            "No open-ended feedback was submitted for this selection.".to_string(),
        ));
        return s;
    }

    for (label, items) in [
        ("Stop Doing", &themes.stop_doing),
        ("Start Doing", &themes.start_doing),
        ("Continue Doing", &themes.continue_doing),
    ] {
        if items.is_empty() {
            continue;
        }
        s.push(Block::Subtitle(format!("{} ({})", label, items.len())));
        s.push(Block::Bullets(items.clone()));
    }
    s
}

/// Templated observations drawn from the dashboard figures.
pub fn findings(dashboard: &Dashboard) -> Vec<String> {
    let h = &dashboard.headline;
    let mut out = vec![format!(
        "{} managers were evaluated across {} responses, with an average overall score of {:.2} out of 5.",
        h.total_managers, h.total_responses, h.average_score
    )];

    if let Some(top) = dashboard.manager_summaries.first() {
        out.push(format!(
            "{} leads with an overall score of {:.2} ({}).",
            top.manager_name, top.overall_score, top.tier
        ));
    }
    if let Some(c) = dashboard.strengths(1).first() {
        out.push(format!(
            "The strongest competency is {} at {:.2} ({:.0}% of the maximum).",
            c.name, c.score, c.percentage
        ));
    }
    if let Some(c) = dashboard.weaknesses(1).first() {
        out.push(format!(
            "The lowest rated competency is {} at {:.2}.",
            c.name, c.score
        ));
    }

    let count = |tiers: &[ScoreTier]| -> usize {
        dashboard
            .tier_distribution
            .iter()
            .filter(|(t, _)| tiers.contains(t))
            .map(|(_, n)| n)
            .sum()
    };
    if h.total_managers > 0 {
        let high = count(&[ScoreTier::Exceptional, ScoreTier::Strong]);
        out.push(format!(
            "{} of {} managers ({:.0}%) are rated Exceptional or Strong.",
            high,
            h.total_managers,
            share(high, h.total_managers)
        ));
        let low = count(&[ScoreTier::NeedsImprovement, ScoreTier::Critical]);
        if low > 0 {
            out.push(format!(
                "{} managers score below 2.5 and fall into Needs Improvement or Critical.",
                low
            ));
        }
    }
    if let Some((rel, n)) = dashboard.relationship_distribution.first() {
        out.push(format!("Most feedback came from {} reviewers ({} responses).", rel, n));
    }

    out
}

/// Templated recommendations drawn from the dashboard figures.
pub fn recommendations(dashboard: &Dashboard, top_n: usize) -> Vec<String> {
    let mut out: Vec<String> = dashboard
        .weaknesses(3)
        .iter()
        .map(|c| {
            format!(
                "Run targeted development on {}: the current average is {:.2} out of 5.",
                c.name, c.score
            )
        })
        .collect();

    let at_risk: Vec<&str> = dashboard
        .bottom_performers(top_n)
        .into_iter()
        .filter(|m| matches!(m.tier, ScoreTier::NeedsImprovement | ScoreTier::Critical))
        .map(|m| m.manager_name.as_str())
        .collect();
    if !at_risk.is_empty() {
        out.push(format!(
            "Agree individual coaching plans with {}.",
            at_risk.join(", ")
        ));
    }

    if let (Some(top), Some(strength)) = (
        dashboard.manager_summaries.first(),
        dashboard.strengths(1).first(),
    ) {
        out.push(format!(
            "Pair {} with developing managers as a mentor, with a focus on {}.",
            top.manager_name, strength.name
        ));
    }

    out.push("Repeat the survey next cycle to measure progress against these baselines.".to_string());
    out
}

fn findings_and_recommendations(dashboard: &Dashboard, options: &ExportOptions) -> Section {
    let mut s = Section::default();
    s.push(Block::Heading("Key Findings".to_string()))
        .push(Block::Bullets(findings(dashboard)))
        .push(Block::Spacer)
        .push(Block::Heading("Recommendations".to_string()))
        .push(Block::Bullets(recommendations(dashboard, options.top_n)));
    s
}

/// Characters of the Windows-1252 range 0x80-0x9F, which the built-in
/// fonts encode alongside printable ASCII and Latin-1.
const WIN_ANSI_EXTRA: &[char] = &[
    '\u{20AC}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{017D}', '\u{2018}',
    '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}', '\u{02DC}',
    '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{017E}', '\u{0178}',
];

fn win_ansi(c: char) -> bool {
    matches!(c, ' '..='~' | '\u{A0}'..='\u{FF}') || WIN_ANSI_EXTRA.contains(&c)
}

/// Replace characters the built-in PDF fonts cannot show.
fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            c if c.is_whitespace() => ' ',
            c if win_ansi(c) => c,
            _ => '?',
        })
        .collect()
}

fn line_height(size: f32) -> f32 {
    size * PT_TO_MM * 1.45
}

/// Approximate characters of Helvetica that fit in `width` mm.
fn chars_for(width: f32, size: f32) -> usize {
    ((width / (size * PT_TO_MM * 0.5)).floor() as usize).max(1)
}

/// Greedy word wrap to at most `max` characters per line.
fn wrap(text: &str, max: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while word.chars().count() > max {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let head: String = word.chars().take(max).collect();
            word = word.chars().skip(max).collect();
            lines.push(head);
        }
        if word.is_empty() {
            continue;
        }
        if current.is_empty() {
            current = word;
        } else if current.chars().count() + 1 + word.chars().count() <= max {
            current.push(' ');
            current.push_str(&word);
        } else {
            lines.push(std::mem::replace(&mut current, word));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Cut `text` to fit a table cell.
fn fit(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    format!("{}...", text.chars().take(keep).collect::<String>())
}

struct Layout {
    pages: Vec<PageLayout>,
    y: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            y: 0.0,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(PageLayout::default());
        self.y = MARGIN;
    }

    /// Start a new page when `height` more millimetres would not fit.
    /// Returns whether a break happened.
    fn ensure(&mut self, height: f32) -> bool {
        if self.y + height > PAGE_HEIGHT - MARGIN - FOOTER_SPACE {
            self.new_page();
            true
        } else {
            false
        }
    }

    fn text(&mut self, text: &str, x: f32, size: f32, bold: bool) {
        let height = line_height(size);
        self.ensure(height);
        self.y += height;
        self.place(text, x, size, bold);
    }

    fn place(&mut self, text: &str, x: f32, size: f32, bold: bool) {
        let y = self.y;
        if let Some(page) = self.pages.last_mut() {
            page.lines.push(Line {
                text: sanitize(text),
                x,
                y,
                size,
                bold,
            });
        }
    }

    fn wrapped(&mut self, text: &str, x: f32, size: f32, bold: bool) {
        let max = chars_for(PAGE_WIDTH - MARGIN - x, size);
        for line in wrap(&sanitize(text), max) {
            self.text(&line, x, size, bold);
        }
    }

    fn table_row(&mut self, columns: &[Column], cells: &[String], bold: bool) {
        self.y += line_height(TABLE_SIZE);
        let mut x = MARGIN;
        for (column, cell) in columns.iter().zip(cells) {
            let text = fit(&sanitize(cell), chars_for(column.width - 2.0, TABLE_SIZE));
            if !text.is_empty() {
                self.place(&text, x, TABLE_SIZE, bold);
            }
            x += column.width;
        }
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::Title(text) => {
                self.y += 4.0;
                self.wrapped(text, MARGIN, TITLE_SIZE, true);
            }
            Block::Subtitle(text) => {
                self.y += 2.0;
                self.wrapped(text, MARGIN, HEADING_SIZE - 2.0, true);
            }
            Block::Heading(text) => {
                // Keep a heading with at least two lines of what follows.
                self.ensure(line_height(HEADING_SIZE) + 2.0 * line_height(BODY_SIZE) + 4.0);
                self.y += 4.0;
                self.wrapped(text, MARGIN, HEADING_SIZE, true);
                self.y += 1.0;
            }
            Block::Paragraph(text) => self.wrapped(text, MARGIN, BODY_SIZE, false),
            Block::Bullets(items) => {
                let max = chars_for(PAGE_WIDTH - 2.0 * MARGIN - 5.0, BODY_SIZE);
                for item in items {
                    for (i, line) in wrap(&sanitize(item), max).iter().enumerate() {
                        self.text(line, MARGIN + 5.0, BODY_SIZE, false);
                        if i == 0 {
                            self.place("-", MARGIN + 1.0, BODY_SIZE, false);
                        }
                    }
                }
            }
            Block::Table { columns, rows } => {
                let headers: Vec<String> = columns.iter().map(|c| c.header.clone()).collect();
                let row_height = line_height(TABLE_SIZE);

                self.ensure(2.0 * row_height);
                self.table_row(columns, &headers, true);
                for row in rows {
                    if self.ensure(row_height) {
                        self.table_row(columns, &headers, true);
                    }
                    self.table_row(columns, row, false);
                }
            }
            Block::Spacer => self.y += line_height(BODY_SIZE),
        }
    }
}

/// Lay the sections out on A4 pages and add page footers.
pub fn layout(sections: &[Section]) -> Vec<PageLayout> {
    let mut layout = Layout::new();

    for section in sections {
        layout.new_page();
        for block in &section.blocks {
            layout.block(block);
        }
    }

    let total = layout.pages.len();
    for (i, page) in layout.pages.iter_mut().enumerate() {
        page.lines.push(Line {
            text: format!("Page {} of {}", i + 1, total),
            x: PAGE_WIDTH - MARGIN - 22.0,
            y: PAGE_HEIGHT - MARGIN / 2.0,
            size: 8.0,
            bold: false,
        });
    }

    layout.pages
}

/// Draw laid-out pages into PDF bytes.
pub fn render(pages: &[PageLayout], title: &str) -> Result<Vec<u8>, ExportError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(sanitize(title), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1".to_string());

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Document(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ExportError::Document(e.to_string()))?;

    for (i, page) in pages.iter().enumerate() {
        let (page_index, layer_index) = if i == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1")
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);

        for line in &page.lines {
            let font = if line.bold { &bold } else { &regular };
            layer.use_text(
                line.text.clone(),
                line.size,
                Mm(line.x),
                Mm(PAGE_HEIGHT - line.y),
                font,
            );
        }
    }

    doc.save_to_bytes()
        .map_err(|e| ExportError::Document(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::fixtures;
    use crate::models::{Competency, FilterState, SurveyResponse};

    #[test]
    fn test_each_section_starts_a_page() {
        let sections = build_document(&fixtures::dashboard(), &fixtures::options());
        let pages = layout(&sections);

        assert_eq!(sections.len(), 7);
        assert!(pages.len() >= sections.len());
        assert!(pages[0].contains("360 Degree Feedback Report"));
        assert!(pages[0].contains("Acme"));
        assert!(pages[1].contains("Executive Summary"));
        assert!(pages.last().unwrap().contains("Recommendations"));
    }

    #[test]
    fn test_page_footers_are_numbered() {
        let pages = layout(&build_document(&fixtures::dashboard(), &fixtures::options()));
        let total = pages.len();
        for (i, page) in pages.iter().enumerate() {
            assert!(page.contains(&format!("Page {} of {}", i + 1, total)));
        }
    }

    #[test]
    fn test_long_table_overflows_with_repeated_header() {
        let rows: Vec<Vec<String>> = (0..200).map(|i| vec![format!("row {i}")]).collect();
        let section = Section {
            blocks: vec![Block::Table {
                columns: vec![col("Name", 100.0)],
                rows,
            }],
        };

        let pages = layout(&[section]);
        assert!(pages.len() > 1);
        for page in &pages {
            assert!(page.lines.iter().any(|l| l.bold && l.text == "Name"));
            assert!(page
                .lines
                .iter()
                .all(|l| l.y <= PAGE_HEIGHT - MARGIN / 2.0 + f32::EPSILON));
        }
        assert!(pages.last().unwrap().contains("row 199"));
    }

    #[test]
    fn test_wrap_and_fit() {
        assert_eq!(wrap("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert!(wrap("   ", 10).is_empty());
        assert_eq!(fit("Performance", 8), "Perfo...");
        assert_eq!(fit("Short", 8), "Short");
    }

    #[test]
    fn test_sanitize_keeps_win_ansi_characters() {
        assert_eq!(
            sanitize("It\u{2019}s \u{2013} fine\u{2026}"),
            "It\u{2019}s \u{2013} fine\u{2026}"
        );
        assert_eq!(sanitize("caf\u{e9}\n"), "caf\u{e9} ");
        assert_eq!(sanitize("\u{20AC}5 \u{0152}uvre"), "\u{20AC}5 \u{0152}uvre");
        assert_eq!(sanitize("\u{6F22}\u{5B57} \u{2713}\u{7}"), "?? ??");
    }

    #[test]
    fn test_accented_manager_names_survive_layout() {
        let mut response = SurveyResponse::new("1", "Jos\u{e9} N\u{fa}\u{f1}ez");
        for c in Competency::ALL {
            response.set_score(c, Some(4));
        }
        let dashboard = Dashboard::compute(&[response], &FilterState::default());
        let pages = layout(&build_document(&dashboard, &fixtures::options()));

        let lines: Vec<&str> = pages
            .iter()
            .flat_map(|p| p.lines.iter().map(|l| l.text.as_str()))
            .collect();
        assert!(lines.iter().any(|l| l.contains("Jos\u{e9} N\u{fa}\u{f1}ez")));
        assert!(lines.iter().all(|l| !l.contains("Jos?")));
    }

    #[test]
    fn test_bar_scales_to_max() {
        assert_eq!(bar(0, 10), "");
        assert_eq!(bar(10, 10).len(), BAR_WIDTH);
        assert_eq!(bar(1, 1000), "#");
    }

    #[test]
    fn test_findings_name_leader_and_weakest_competency() {
        let dashboard = fixtures::dashboard();
        let findings = findings(&dashboard);
        let leader = &dashboard.manager_summaries[0].manager_name;
        let weakest = &dashboard.weaknesses(1)[0].name;

        assert!(findings.iter().any(|f| f.contains(leader.as_str())));
        assert!(findings.iter().any(|f| f.contains(weakest.as_str())));
    }

    #[test]
    fn test_recommendations_flag_at_risk_managers() {
        let dashboard = fixtures::dashboard();
        let recs = recommendations(&dashboard, 5);

        assert!(recs.iter().any(|r| r.contains("coaching") && r.contains("Carla Ruiz")));
        assert!(recs.last().unwrap().contains("next cycle"));
    }

    #[test]
    fn test_render_produces_pdf() {
        let pages = layout(&build_document(&fixtures::dashboard(), &fixtures::options()));
        let bytes = render(&pages, "Report").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
