//! Feedback360 - 360-degree manager feedback analytics
//!
//! A CLI tool that loads survey responses from a hosted backend,
//! aggregates them into manager rankings and competency scores, exports
//! workbook and PDF reports, and relays questions to a streaming
//! assistant.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, data unavailable, export or assistant failure)

mod analysis;
mod assistant;
mod cli;
mod config;
mod export;
mod models;
mod report;
mod store;

use analysis::Dashboard;
use anyhow::{bail, Context, Result};
use assistant::{AssistantClient, ChatSession};
use chrono::Local;
use cli::{Args, Command, ExportKind, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use export::ExportOptions;
use indicatif::{ProgressBar, ProgressStyle};
use models::{FilterState, SurveyResponse};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use store::{ResponseStore, SnapshotStore, StoreError, SupabaseStore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        return handle_init_config();
    }

    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, &config);

    info!("Feedback360 v{}", env!("CARGO_PKG_VERSION"));
    debug!("Command: {:?}", args.command);

    match run(args, config).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle init-config: generate a default .feedback360.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Set the backend URL and key, or export FEEDBACK360_BACKEND_URL/KEY.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is installed, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Ignoring {}: {:#}", CONFIG_FILE_NAME, e);
            Ok(Config::default())
        }
    }
}

/// Load the data and run the selected command. Returns the exit code.
async fn run(args: Args, config: Config) -> Result<i32> {
    let filters = args.filters();

    // A failed load leaves the dataset empty; the command still runs
    // against it, but the process exits non-zero.
    let (dashboard, data_ok) = match load_responses(&config, args.quiet).await {
        Ok(responses) => (build_dashboard(&responses, &filters), true),
        Err(e) => {
            error!("Failed to load responses: {}", e);
            eprintln!("\n❌ Unable to load survey responses: {}", e);
            eprintln!("   Check the backend URL and key, or pass --snapshot FILE.\n");
            (Dashboard::empty(), false)
        }
    };

    let exit_code = match args.command {
        Command::Summary { format, ref output } => {
            handle_summary(&dashboard, &config, format, output.as_deref())?
        }
        Command::Export { kind, .. } => handle_export(&dashboard, &config, kind, args.quiet),
        Command::Ask { ref question } => {
            handle_ask(&dashboard, &config, &question.join(" ")).await?
        }
        Command::InitConfig => 0,
    };

    Ok(if data_ok { exit_code } else { 1 })
}

/// Fetch every response from the configured store.
async fn load_responses(config: &Config, quiet: bool) -> Result<Vec<SurveyResponse>, StoreError> {
    let store: Box<dyn ResponseStore> = match config.general.snapshot {
        Some(ref path) => Box::new(SnapshotStore::new(path.clone())),
        None => {
            if !config.backend.is_configured() {
                return Err(StoreError::Config(format!(
                    "no backend configured; set [backend] in {} or FEEDBACK360_BACKEND_URL/KEY",
                    CONFIG_FILE_NAME
                )));
            }
            Box::new(SupabaseStore::new(&config.backend)?)
        }
    };

    info!("Loading responses from {}", store.describe());

    let spinner = if quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Loading responses from {}", store.describe()));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    };

    let result = store.fetch_responses().await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let responses = result?;
    info!("Loaded {} responses", responses.len());
    Ok(responses)
}

fn build_dashboard(responses: &[SurveyResponse], filters: &FilterState) -> Dashboard {
    let dashboard = Dashboard::compute(responses, filters);

    if !filters.is_empty() {
        info!(
            "Filters ({}) kept {} of {} responses",
            filters.describe(),
            dashboard.headline.total_responses,
            responses.len()
        );
    }
    dashboard
}

/// Render the dashboard to stdout or a file.
fn handle_summary(
    dashboard: &Dashboard,
    config: &Config,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<i32> {
    let content = match format {
        OutputFormat::Json => report::generate_json_report(dashboard)?,
        OutputFormat::Markdown => report::generate_markdown_report(dashboard, config.report.top_n),
    };

    match output {
        Some(path) => {
            std::fs::write(path, &content)
                .with_context(|| format!("Failed to write summary to {}", path.display()))?;
            println!("✅ Summary saved to: {}", path.display());
        }
        None => println!("{}", content),
    }

    Ok(0)
}

/// Run the selected exporters, reporting each failure.
fn handle_export(dashboard: &Dashboard, config: &Config, kind: ExportKind, quiet: bool) -> i32 {
    let options = ExportOptions::from_config(&config.report, Local::now().date_naive());
    let dir = &config.report.output_dir;
    let mut failed = false;

    if !quiet {
        println!("📝 Exporting reports to {}", dir.display());
    }

    if kind.includes_workbook() {
        match export::export_workbook(dashboard, &options, dir) {
            Ok(path) => println!("✅ Workbook saved to: {}", path.display()),
            Err(e) => {
                error!("Workbook export failed: {}", e);
                eprintln!("❌ Workbook export failed: {}", e);
                failed = true;
            }
        }
    }

    if kind.includes_document() {
        match export::export_document(dashboard, &options, dir) {
            Ok(path) => println!("✅ PDF saved to: {}", path.display()),
            Err(e) => {
                error!("PDF export failed: {}", e);
                eprintln!("❌ PDF export failed: {}", e);
                failed = true;
            }
        }
    }

    if failed {
        1
    } else {
        0
    }
}

/// Ask one question and stream the reply to stdout. Ctrl-C stops the
/// stream and keeps what has arrived.
async fn handle_ask(dashboard: &Dashboard, config: &Config, question: &str) -> Result<i32> {
    let Some(url) = config.assistant_url() else {
        bail!(
            "No assistant endpoint configured; set [assistant] url in {} or FEEDBACK360_ASSISTANT_URL",
            CONFIG_FILE_NAME
        );
    };

    let api_key = Some(config.backend.anon_key.as_str()).filter(|k| !k.is_empty());
    let client = AssistantClient::new(
        url,
        api_key,
        Duration::from_secs(config.assistant.connect_timeout_seconds),
    )?;
    let mut session = ChatSession::new(client);

    if dashboard.is_empty() {
        warn!("Asking without data; the assistant has no responses to draw on");
    }

    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            watcher.cancel();
        }
    });

    let mut stdout = std::io::stdout();
    let turn = session
        .ask(question, &dashboard.data_context(), &cancel, |delta| {
            let _ = write!(stdout, "{}", delta);
            let _ = stdout.flush();
        })
        .await;

    debug!("Conversation holds {} messages", session.history().len());

    if let Some(ref e) = turn.error {
        debug!("Assistant error: {}", e);
        println!("{}", turn.reply.content);
        return Ok(1);
    }

    println!();
    if turn.cancelled {
        println!("\n⏹️  Reply cancelled.");
    }

    Ok(0)
}
