//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::{FilterState, ScoreRange, SCORE_SCALE_MAX, SCORE_SCALE_MIN};
use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Feedback360 - 360-degree manager feedback analytics
///
/// Loads survey responses from the hosted backend (or a JSON snapshot),
/// aggregates them into manager rankings and competency scores, exports
/// workbook and PDF reports, and answers questions about the data.
///
/// Examples:
///   feedback360 summary
///   feedback360 --manager "Jane Doe" --relationship Peer summary --format json
///   feedback360 --snapshot responses.json export --kind xlsx
///   feedback360 ask "Who needs coaching on urgency?"
///   feedback360 init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    ///
    /// If not specified, looks for .feedback360.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Read responses from a JSON snapshot instead of the backend
    #[arg(long, value_name = "FILE", global = true)]
    pub snapshot: Option<PathBuf>,

    /// Backend base URL (e.g. https://xyz.supabase.co)
    #[arg(long, value_name = "URL", env = "FEEDBACK360_BACKEND_URL", global = true)]
    pub backend_url: Option<String>,

    /// Backend anonymous API key
    #[arg(
        long,
        value_name = "KEY",
        env = "FEEDBACK360_BACKEND_KEY",
        hide_env_values = true,
        global = true
    )]
    pub backend_key: Option<String>,

    /// Streaming assistant endpoint URL
    #[arg(long, value_name = "URL", env = "FEEDBACK360_ASSISTANT_URL", global = true)]
    pub assistant_url: Option<String>,

    /// Only include these managers (repeatable or comma-separated)
    #[arg(long = "manager", value_name = "NAME", value_delimiter = ',', global = true)]
    pub managers: Vec<String>,

    /// Only include these reviewer relationships (use "Unknown" for none)
    #[arg(long = "relationship", value_name = "REL", value_delimiter = ',', global = true)]
    pub relationships: Vec<String>,

    /// Lowest mean response score to include (1-5)
    #[arg(long, value_name = "SCORE", global = true)]
    pub min_score: Option<f64>,

    /// Highest mean response score to include (1-5)
    #[arg(long, value_name = "SCORE", global = true)]
    pub max_score: Option<f64>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the dashboard: rankings, competencies, distributions, feedback
    Summary {
        /// Output format (markdown, json)
        #[arg(long, default_value = "markdown", value_name = "FORMAT")]
        format: OutputFormat,

        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Export the workbook and/or PDF report
    Export {
        /// Which report to produce (xlsx, pdf, all)
        #[arg(long, default_value = "all", value_name = "KIND")]
        kind: ExportKind,

        /// Directory to write the reports into
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,

        /// Report name used in the file name
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
    },

    /// Ask the assistant a question about the current data
    Ask {
        /// The question
        #[arg(required = true, num_args = 1.., value_name = "QUESTION")]
        question: Vec<String>,
    },

    /// Generate a default .feedback360.toml configuration file
    InitConfig,
}

/// Output format for the dashboard summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Which exporter(s) to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportKind {
    Xlsx,
    Pdf,
    #[default]
    All,
}

impl ExportKind {
    pub fn includes_workbook(&self) -> bool {
        matches!(self, ExportKind::Xlsx | ExportKind::All)
    }

    pub fn includes_document(&self) -> bool {
        matches!(self, ExportKind::Pdf | ExportKind::All)
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if matches!(self.command, Command::InitConfig) {
            return Ok(());
        }

        for (flag, value) in [("--min-score", self.min_score), ("--max-score", self.max_score)] {
            if let Some(v) = value {
                if !(SCORE_SCALE_MIN..=SCORE_SCALE_MAX).contains(&v) {
                    return Err(format!(
                        "{} must be between {} and {}",
                        flag, SCORE_SCALE_MIN, SCORE_SCALE_MAX
                    ));
                }
            }
        }

        if let (Some(min), Some(max)) = (self.min_score, self.max_score) {
            if min > max {
                return Err("--min-score cannot be greater than --max-score".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref snapshot) = self.snapshot {
            if !snapshot.is_file() {
                return Err(format!("Snapshot file does not exist: {}", snapshot.display()));
            }
        }

        if let Some(ref url) = self.backend_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Backend URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Command::Ask { ref question } = self.command {
            if question.iter().all(|q| q.trim().is_empty()) {
                return Err("Question cannot be empty".to_string());
            }
        }

        Ok(())
    }

    /// Filter state selected on the command line.
    pub fn filters(&self) -> FilterState {
        let clean = |values: &[String]| -> BTreeSet<String> {
            values
                .iter()
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(String::from)
                .collect()
        };

        FilterState {
            managers: clean(&self.managers),
            relationships: clean(&self.relationships),
            score_range: ScoreRange {
                min: self.min_score.unwrap_or(SCORE_SCALE_MIN),
                max: self.max_score.unwrap_or(SCORE_SCALE_MAX),
            },
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            command: Command::Summary {
                format: OutputFormat::Markdown,
                output: None,
            },
            config: None,
            snapshot: None,
            backend_url: None,
            backend_key: None,
            assistant_url: None,
            managers: Vec::new(),
            relationships: Vec::new(),
            min_score: None,
            max_score: None,
            verbose: false,
            quiet: false,
        }
    }

    #[test]
    fn test_parse_global_filters() {
        let args = Args::try_parse_from([
            "feedback360",
            "--manager",
            "Alice, Bob",
            "--relationship",
            "Peer",
            "export",
            "--kind",
            "pdf",
            "--min-score",
            "3",
        ])
        .unwrap();

        let filters = args.filters();
        assert!(filters.managers.contains("Alice"));
        assert!(filters.managers.contains("Bob"));
        assert!(filters.relationships.contains("Peer"));
        assert_eq!(filters.score_range.min, 3.0);
        assert_eq!(filters.score_range.max, 5.0);
        assert!(matches!(
            args.command,
            Command::Export {
                kind: ExportKind::Pdf,
                ..
            }
        ));
    }

    #[test]
    fn test_default_filters_are_empty() {
        assert!(make_args().filters().is_empty());
    }

    #[test]
    fn test_validation_score_bounds() {
        let mut args = make_args();
        args.min_score = Some(0.5);
        assert!(args.validate().is_err());

        args.min_score = Some(4.0);
        args.max_score = Some(3.0);
        assert!(args.validate().is_err());

        args.max_score = Some(4.5);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_backend_url() {
        let mut args = make_args();
        args.backend_url = Some("ftp://example.com".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_export_kind() {
        assert!(ExportKind::All.includes_workbook());
        assert!(ExportKind::All.includes_document());
        assert!(!ExportKind::Pdf.includes_workbook());
        assert!(!ExportKind::Xlsx.includes_document());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
