//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.feedback360.toml` files. Backend and assistant endpoints are
//! passed explicitly to the store and chat clients from here.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".feedback360.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Response backend settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Assistant endpoint settings.
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Default JSON snapshot to read instead of the backend.
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
}

/// Hosted backend (PostgREST) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    #[serde(default)]
    pub url: String,

    /// Anonymous API key sent as `apikey` and bearer token.
    #[serde(default)]
    pub anon_key: String,

    /// Table holding the survey responses.
    #[serde(default = "default_table")]
    pub table: String,

    /// Connect timeout in seconds.
    #[serde(default = "default_backend_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// Whole-request deadline in seconds. Unset lets a large table take as
    /// long as the transfer needs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            table: default_table(),
            connect_timeout_seconds: default_backend_connect_timeout(),
            timeout_seconds: None,
        }
    }
}

fn default_table() -> String {
    "survey_responses".to_string()
}

fn default_backend_connect_timeout() -> u64 {
    15
}

impl BackendConfig {
    /// True when enough is set to query the backend.
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty() && !self.anon_key.trim().is_empty()
    }
}

/// Streaming assistant settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Full URL of the chat function. Empty derives it from the backend URL.
    #[serde(default)]
    pub url: String,

    /// Connect timeout in seconds. The stream itself has no deadline.
    #[serde(default = "default_assistant_timeout")]
    pub connect_timeout_seconds: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            connect_timeout_seconds: default_assistant_timeout(),
        }
    }
}

fn default_assistant_timeout() -> u64 {
    15
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Report name used in export file names.
    #[serde(default = "default_report_name")]
    pub name: String,

    /// Directory exports are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// How many managers the top/bottom performer lists show.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Organization name shown on the PDF cover.
    #[serde(default = "default_organization")]
    pub organization: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            name: default_report_name(),
            output_dir: default_output_dir(),
            top_n: default_top_n(),
            organization: default_organization(),
        }
    }
}

fn default_report_name() -> String {
    "Manager_360_Feedback_Report".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_top_n() -> usize {
    5
}

fn default_organization() -> String {
    "Leadership Development".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments (and their environment variables) take precedence
    /// over config file settings.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.backend_url {
            self.backend.url = url.clone();
        }
        if let Some(ref key) = args.backend_key {
            self.backend.anon_key = key.clone();
        }
        if let Some(ref url) = args.assistant_url {
            self.assistant.url = url.clone();
        }
        if let Some(ref snapshot) = args.snapshot {
            self.general.snapshot = Some(snapshot.clone());
        }

        if let crate::cli::Command::Export {
            ref out_dir,
            ref name,
            ..
        } = args.command
        {
            if let Some(dir) = out_dir {
                self.report.output_dir = dir.clone();
            }
            if let Some(name) = name {
                self.report.name = name.clone();
            }
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Effective assistant endpoint.
    ///
    /// Falls back to the backend's edge function path when no explicit
    /// URL is configured.
    pub fn assistant_url(&self) -> Option<String> {
        if !self.assistant.url.trim().is_empty() {
            return Some(self.assistant.url.clone());
        }
        if self.backend.url.trim().is_empty() {
            return None;
        }
        Some(format!(
            "{}/functions/v1/feedback-chat",
            self.backend.url.trim_end_matches('/')
        ))
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Args, Command, ExportKind};
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend.table, "survey_responses");
        assert_eq!(config.report.top_n, 5);
        assert!(!config.backend.is_configured());
        assert_eq!(config.assistant_url(), None);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
verbose = true

[backend]
url = "https://demo.supabase.co"
anon_key = "anon"

[assistant]
url = "https://chat.example.com/stream"

[report]
name = "Q3_Review"
top_n = 3
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.general.verbose);
        assert!(config.backend.is_configured());
        assert_eq!(config.backend.table, "survey_responses");
        assert_eq!(config.backend.connect_timeout_seconds, 15);
        assert_eq!(config.backend.timeout_seconds, None);
        assert_eq!(config.report.name, "Q3_Review");
        assert_eq!(config.report.top_n, 3);
        assert_eq!(
            config.assistant_url().as_deref(),
            Some("https://chat.example.com/stream")
        );
    }

    #[test]
    fn test_assistant_url_derived_from_backend() {
        let mut config = Config::default();
        config.backend.url = "https://demo.supabase.co/".to_string();
        assert_eq!(
            config.assistant_url().as_deref(),
            Some("https://demo.supabase.co/functions/v1/feedback-chat")
        );
    }

    #[test]
    fn test_merge_with_args() {
        let args = Args::try_parse_from([
            "feedback360",
            "--backend-url",
            "https://cli.supabase.co",
            "export",
            "--name",
            "Board_Pack",
            "--out-dir",
            "out",
        ])
        .unwrap();
        assert!(matches!(args.command, Command::Export { kind: ExportKind::All, .. }));

        let mut config = Config::default();
        config.merge_with_args(&args);
        assert_eq!(config.backend.url, "https://cli.supabase.co");
        assert_eq!(config.report.name, "Board_Pack");
        assert_eq!(config.report.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[backend]"));
        assert!(toml_str.contains("[report]"));
    }
}
