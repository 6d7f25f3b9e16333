//! Data models for the feedback analytics.
//!
//! This module contains the survey response read model, the fixed
//! competency catalog, and the derived summary types produced by
//! the aggregation engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Upper bound of the survey's rating scale. Every percentage uses it.
pub const SCORE_SCALE_MAX: f64 = 5.0;

/// Lower bound of the survey's rating scale.
pub const SCORE_SCALE_MIN: f64 = 1.0;

/// Sentinel used wherever a response carries no relationship.
pub const UNKNOWN_RELATIONSHIP: &str = "Unknown";

/// The three competency buckets a manager is rated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    TeamLeadership,
    ResultsOrientation,
    CulturalFit,
}

impl Category {
    /// All categories, in reporting order.
    pub const ALL: [Category; 3] = [
        Category::TeamLeadership,
        Category::ResultsOrientation,
        Category::CulturalFit,
    ];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::TeamLeadership => write!(f, "Team Leadership"),
            Category::ResultsOrientation => write!(f, "Results Orientation"),
            Category::CulturalFit => write!(f, "Cultural Fit"),
        }
    }
}

/// One of the 13 rated competencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Competency {
    EmpowersTeam,
    MentorsCoaches,
    EffectiveDirection,
    EstablishesRapport,
    SetsClearGoals,
    OpenToIdeas,
    SenseOfUrgency,
    AnalyzesChange,
    FinalSay,
    ConfidenceIntegrity,
    PatientHumble,
    FlatCollaborative,
    Approachable,
}

impl Competency {
    /// The fixed catalog, in display order.
    pub const ALL: [Competency; 13] = [
        Competency::EmpowersTeam,
        Competency::MentorsCoaches,
        Competency::EffectiveDirection,
        Competency::EstablishesRapport,
        Competency::SetsClearGoals,
        Competency::OpenToIdeas,
        Competency::SenseOfUrgency,
        Competency::AnalyzesChange,
        Competency::FinalSay,
        Competency::ConfidenceIntegrity,
        Competency::PatientHumble,
        Competency::FlatCollaborative,
        Competency::Approachable,
    ];

    /// Column name in the response table.
    pub fn key(&self) -> &'static str {
        match self {
            Competency::EmpowersTeam => "empowers_team",
            Competency::MentorsCoaches => "mentors_coaches",
            Competency::EffectiveDirection => "effective_direction",
            Competency::EstablishesRapport => "establishes_rapport",
            Competency::SetsClearGoals => "sets_clear_goals",
            Competency::OpenToIdeas => "open_to_ideas",
            Competency::SenseOfUrgency => "sense_of_urgency",
            Competency::AnalyzesChange => "analyzes_change",
            Competency::FinalSay => "final_say",
            Competency::ConfidenceIntegrity => "confidence_integrity",
            Competency::PatientHumble => "patient_humble",
            Competency::FlatCollaborative => "flat_collaborative",
            Competency::Approachable => "approachable",
        }
    }

    /// Human readable name used in every view and export.
    pub fn display_name(&self) -> &'static str {
        match self {
            Competency::EmpowersTeam => "Empowers Team",
            Competency::MentorsCoaches => "Mentors & Coaches",
            Competency::EffectiveDirection => "Effective Direction",
            Competency::EstablishesRapport => "Establishes Rapport",
            Competency::SetsClearGoals => "Sets Clear Goals",
            Competency::OpenToIdeas => "Open to Ideas",
            Competency::SenseOfUrgency => "Sense of Urgency",
            Competency::AnalyzesChange => "Analyzes Change",
            Competency::FinalSay => "Final Say",
            Competency::ConfidenceIntegrity => "Confidence & Integrity",
            Competency::PatientHumble => "Patient & Humble",
            Competency::FlatCollaborative => "Flat & Collaborative",
            Competency::Approachable => "Approachable",
        }
    }

    /// Bucket this competency contributes to.
    pub fn category(&self) -> Category {
        match self {
            Competency::EmpowersTeam
            | Competency::MentorsCoaches
            | Competency::EffectiveDirection
            | Competency::EstablishesRapport
            | Competency::SetsClearGoals => Category::TeamLeadership,
            Competency::OpenToIdeas
            | Competency::SenseOfUrgency
            | Competency::AnalyzesChange
            | Competency::FinalSay => Category::ResultsOrientation,
            Competency::ConfidenceIntegrity
            | Competency::PatientHumble
            | Competency::FlatCollaborative
            | Competency::Approachable => Category::CulturalFit,
        }
    }
}

impl fmt::Display for Competency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One submitted feedback form, as stored in the response table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyResponse {
    pub id: String,
    /// Manager the feedback is about. Grouping key.
    pub manager_name: String,
    /// Reviewer's relationship to the manager ("Peer", "Direct Report", ...).
    #[serde(default)]
    pub relationship: Option<String>,

    #[serde(default)]
    pub empowers_team: Option<i32>,
    #[serde(default)]
    pub mentors_coaches: Option<i32>,
    #[serde(default)]
    pub effective_direction: Option<i32>,
    #[serde(default)]
    pub establishes_rapport: Option<i32>,
    #[serde(default)]
    pub sets_clear_goals: Option<i32>,
    #[serde(default)]
    pub open_to_ideas: Option<i32>,
    #[serde(default)]
    pub sense_of_urgency: Option<i32>,
    #[serde(default)]
    pub analyzes_change: Option<i32>,
    #[serde(default)]
    pub final_say: Option<i32>,
    #[serde(default)]
    pub confidence_integrity: Option<i32>,
    #[serde(default)]
    pub patient_humble: Option<i32>,
    #[serde(default)]
    pub flat_collaborative: Option<i32>,
    #[serde(default)]
    pub approachable: Option<i32>,

    #[serde(default)]
    pub stop_doing: Option<String>,
    #[serde(default)]
    pub start_doing: Option<String>,
    #[serde(default)]
    pub continue_doing: Option<String>,
    #[serde(default)]
    pub team_leadership_comments: Option<String>,
    #[serde(default)]
    pub results_orientation_comments: Option<String>,
    #[serde(default)]
    pub cultural_fit_comments: Option<String>,

    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SurveyResponse {
    /// Creates a response with no scores and no comments.
    pub fn new(id: impl Into<String>, manager_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            manager_name: manager_name.into(),
            relationship: None,
            empowers_team: None,
            mentors_coaches: None,
            effective_direction: None,
            establishes_rapport: None,
            sets_clear_goals: None,
            open_to_ideas: None,
            sense_of_urgency: None,
            analyzes_change: None,
            final_say: None,
            confidence_integrity: None,
            patient_humble: None,
            flat_collaborative: None,
            approachable: None,
            stop_doing: None,
            start_doing: None,
            continue_doing: None,
            team_leadership_comments: None,
            results_orientation_comments: None,
            cultural_fit_comments: None,
            submitted_at: None,
            created_at: Utc::now(),
        }
    }

    /// Score recorded for a competency, if any.
    pub fn score(&self, competency: Competency) -> Option<i32> {
        match competency {
            Competency::EmpowersTeam => self.empowers_team,
            Competency::MentorsCoaches => self.mentors_coaches,
            Competency::EffectiveDirection => self.effective_direction,
            Competency::EstablishesRapport => self.establishes_rapport,
            Competency::SetsClearGoals => self.sets_clear_goals,
            Competency::OpenToIdeas => self.open_to_ideas,
            Competency::SenseOfUrgency => self.sense_of_urgency,
            Competency::AnalyzesChange => self.analyzes_change,
            Competency::FinalSay => self.final_say,
            Competency::ConfidenceIntegrity => self.confidence_integrity,
            Competency::PatientHumble => self.patient_humble,
            Competency::FlatCollaborative => self.flat_collaborative,
            Competency::Approachable => self.approachable,
        }
    }

    /// Sets the score for a competency. Used when building fixtures.
    pub fn set_score(&mut self, competency: Competency, value: Option<i32>) {
        let slot = match competency {
            Competency::EmpowersTeam => &mut self.empowers_team,
            Competency::MentorsCoaches => &mut self.mentors_coaches,
            Competency::EffectiveDirection => &mut self.effective_direction,
            Competency::EstablishesRapport => &mut self.establishes_rapport,
            Competency::SetsClearGoals => &mut self.sets_clear_goals,
            Competency::OpenToIdeas => &mut self.open_to_ideas,
            Competency::SenseOfUrgency => &mut self.sense_of_urgency,
            Competency::AnalyzesChange => &mut self.analyzes_change,
            Competency::FinalSay => &mut self.final_say,
            Competency::ConfidenceIntegrity => &mut self.confidence_integrity,
            Competency::PatientHumble => &mut self.patient_humble,
            Competency::FlatCollaborative => &mut self.flat_collaborative,
            Competency::Approachable => &mut self.approachable,
        };
        *slot = value;
    }

    /// Iterates the non-null scores in catalog order.
    pub fn scores(&self) -> impl Iterator<Item = (Competency, i32)> + '_ {
        Competency::ALL
            .iter()
            .filter_map(move |c| self.score(*c).map(|v| (*c, v)))
    }

    /// Relationship label with the "Unknown" sentinel applied.
    pub fn relationship_label(&self) -> &str {
        match self.relationship.as_deref() {
            Some(r) if !r.trim().is_empty() => r,
            _ => UNKNOWN_RELATIONSHIP,
        }
    }

    /// Mean of all non-null scores, or `None` when nothing was rated.
    pub fn mean_score(&self) -> Option<f64> {
        let (sum, count) = self
            .scores()
            .fold((0i64, 0usize), |(s, n), (_, v)| (s + v as i64, n + 1));
        if count == 0 {
            None
        } else {
            Some(sum as f64 / count as f64)
        }
    }

    /// Comment recorded for a category, if any.
    pub fn category_comment(&self, category: Category) -> Option<&str> {
        match category {
            Category::TeamLeadership => self.team_leadership_comments.as_deref(),
            Category::ResultsOrientation => self.results_orientation_comments.as_deref(),
            Category::CulturalFit => self.cultural_fit_comments.as_deref(),
        }
    }
}

/// Performance tier derived from an overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
    Exceptional,
    Strong,
    Developing,
    NeedsImprovement,
    Critical,
}

impl ScoreTier {
    /// All tiers, best first.
    pub const ALL: [ScoreTier; 5] = [
        ScoreTier::Exceptional,
        ScoreTier::Strong,
        ScoreTier::Developing,
        ScoreTier::NeedsImprovement,
        ScoreTier::Critical,
    ];

    /// Classify a score. The single source of the tier breakpoints.
    pub fn classify(score: f64) -> Self {
        if score >= 3.5 {
            ScoreTier::Exceptional
        } else if score >= 3.0 {
            ScoreTier::Strong
        } else if score >= 2.5 {
            ScoreTier::Developing
        } else if score >= 2.0 {
            ScoreTier::NeedsImprovement
        } else {
            ScoreTier::Critical
        }
    }

    /// Score range label used in distribution tables.
    pub fn range_label(&self) -> &'static str {
        match self {
            ScoreTier::Exceptional => ">= 3.5",
            ScoreTier::Strong => "3.0 - 3.49",
            ScoreTier::Developing => "2.5 - 2.99",
            ScoreTier::NeedsImprovement => "2.0 - 2.49",
            ScoreTier::Critical => "< 2.0",
        }
    }
}

impl fmt::Display for ScoreTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreTier::Exceptional => write!(f, "Exceptional"),
            ScoreTier::Strong => write!(f, "Strong"),
            ScoreTier::Developing => write!(f, "Developing"),
            ScoreTier::NeedsImprovement => write!(f, "Needs Improvement"),
            ScoreTier::Critical => write!(f, "Critical"),
        }
    }
}

/// Per-manager aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerSummary {
    pub manager_name: String,
    pub total_responses: usize,
    pub avg_team_leadership: f64,
    pub avg_results_orientation: f64,
    pub avg_cultural_fit: f64,
    /// Mean of the non-zero category averages; 0 when all are 0.
    pub overall_score: f64,
    pub tier: ScoreTier,
    /// Owned copy of this manager's responses.
    #[serde(skip)]
    pub responses: Vec<SurveyResponse>,
}

impl ManagerSummary {
    /// Category average by bucket.
    pub fn category_average(&self, category: Category) -> f64 {
        match category {
            Category::TeamLeadership => self.avg_team_leadership,
            Category::ResultsOrientation => self.avg_results_orientation,
            Category::CulturalFit => self.avg_cultural_fit,
        }
    }
}

/// Mean score for one competency across a response set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetencyScore {
    pub competency: Competency,
    pub name: String,
    pub score: f64,
    pub max_score: f64,
    /// `score / max_score` as a percentage, rounded to 2 decimals.
    pub percentage: f64,
    /// Number of non-null ratings behind the mean.
    pub sample_size: usize,
}

/// Deduplicated stop/start/continue feedback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackThemes {
    pub stop_doing: Vec<String>,
    pub start_doing: Vec<String>,
    pub continue_doing: Vec<String>,
}

impl FeedbackThemes {
    /// Total number of kept entries across all three prompts.
    pub fn len(&self) -> usize {
        self.stop_doing.len() + self.start_doing.len() + self.continue_doing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Category comments compiled for one manager.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryComments {
    pub manager_name: String,
    pub team_leadership: Vec<String>,
    pub results_orientation: Vec<String>,
    pub cultural_fit: Vec<String>,
}

impl CategoryComments {
    /// Comments for a category.
    pub fn for_category(&self, category: Category) -> &[String] {
        match category {
            Category::TeamLeadership => &self.team_leadership,
            Category::ResultsOrientation => &self.results_orientation,
            Category::CulturalFit => &self.cultural_fit,
        }
    }
}

/// Inclusive bound on a response's mean score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ScoreRange {
    fn default() -> Self {
        Self {
            min: SCORE_SCALE_MIN,
            max: SCORE_SCALE_MAX,
        }
    }
}

impl ScoreRange {
    /// True when the range covers the whole scale.
    pub fn is_unrestricted(&self) -> bool {
        self.min <= SCORE_SCALE_MIN && self.max >= SCORE_SCALE_MAX
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// User-controlled narrowing of the response set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    /// Selected managers; empty means no restriction.
    pub managers: BTreeSet<String>,
    /// Selected relationships; empty means no restriction.
    pub relationships: BTreeSet<String>,
    pub score_range: ScoreRange,
}

impl FilterState {
    /// True when the filter keeps every response.
    pub fn is_empty(&self) -> bool {
        self.managers.is_empty() && self.relationships.is_empty() && self.score_range.is_unrestricted()
    }

    /// Short description used in report headers.
    pub fn describe(&self) -> String {
        if self.is_empty() {
            return "All responses".to_string();
        }

        let mut parts = Vec::new();
        if !self.managers.is_empty() {
            let names: Vec<&str> = self.managers.iter().map(String::as_str).collect();
            parts.push(format!("Managers: {}", names.join(", ")));
        }
        if !self.relationships.is_empty() {
            let rels: Vec<&str> = self.relationships.iter().map(String::as_str).collect();
            parts.push(format!("Relationships: {}", rels.join(", ")));
        }
        if !self.score_range.is_unrestricted() {
            parts.push(format!(
                "Score range: {:.1} - {:.1}",
                self.score_range.min, self.score_range.max
            ));
        }
        parts.join("; ")
    }
}
