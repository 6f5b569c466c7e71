//! CLI command definitions for paperforge.
//!
//! Two commands cover the workflow: `analyze` runs the concurrent
//! paper-processing pipeline, `report` assembles the Markdown report from its
//! output.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use crate::llm::{DeepSeekClient, RetryPolicy};
use crate::pipeline::{PipelineConfig, PipelineOrchestrator, SourceKind};
use crate::prompts::PromptCatalog;
use crate::report::{MendeleyClient, ReportAssembler};
use crate::source::LibraryClient;
use crate::store::ResultStore;

/// Default output directory for demand results.
const DEFAULT_OUTPUT_DIR: &str = "./analysis-output";

/// Default file name for the assembled report.
const DEFAULT_REPORT_FILE: &str = "analysis-report.md";

/// Batch LLM analysis of research papers.
#[derive(Parser)]
#[command(name = "paperforge")]
#[command(about = "Run fixed analysis demands over a corpus of papers and assemble a report")]
#[command(version)]
#[command(
    long_about = "paperforge extracts text from research papers, runs a fixed set of analysis \
demands against each one through a chat-completion API, and assembles the per-paper results \
into a single report with bibliographic citations.\n\nExample usage:\n  \
paperforge analyze --source folder --path ./papers --output ./analysis-output\n  \
paperforge report --output ./analysis-output"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run every demand against every discovered paper.
    #[command(alias = "run")]
    Analyze(AnalyzeArgs),

    /// Assemble the Markdown report from stored demand results.
    Report(ReportArgs),
}

/// Paper source selector.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SourceArg {
    /// Scan a local directory for PDF files.
    Folder,
    /// List papers from the remote library API.
    Library,
}

impl From<SourceArg> for SourceKind {
    fn from(value: SourceArg) -> Self {
        match value {
            SourceArg::Folder => SourceKind::Folder,
            SourceArg::Library => SourceKind::Library,
        }
    }
}

/// Arguments for `paperforge analyze`.
#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Where to discover papers.
    #[arg(long, value_enum, default_value = "folder")]
    pub source: SourceArg,

    /// Folder to scan for PDFs (folder source).
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    /// Restrict the library listing to one named collection (library source).
    #[arg(long)]
    pub collection: Option<String>,

    /// Output directory for per-paper demand results.
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Maximum papers processed concurrently.
    #[arg(long, default_value = "10")]
    pub max_concurrent_papers: usize,

    /// Maximum completion calls in flight across the run.
    #[arg(long, default_value = "10")]
    pub max_concurrent_requests: usize,

    /// Seconds to pace each completion call after acquiring a slot.
    #[arg(long, default_value = "2")]
    pub inter_call_delay_secs: u64,

    /// Total attempts per completion call (initial call included).
    #[arg(long, default_value = "3")]
    pub max_attempts: u32,

    /// Character budget for paper text in each demand prompt
    /// (overrides PAPERFORGE_DEMAND_CHAR_BUDGET).
    #[arg(long)]
    pub demand_char_budget: Option<usize>,

    /// DeepSeek API key.
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Library access token (required for the library source).
    #[arg(long, env = "MENDELEY_TOKEN", hide_env_values = true)]
    pub library_token: Option<String>,
}

/// Arguments for `paperforge report`.
#[derive(Parser, Debug)]
pub struct ReportArgs {
    /// Directory holding per-paper demand results.
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Path of the Markdown report to write.
    #[arg(long, default_value = DEFAULT_REPORT_FILE)]
    pub report_file: PathBuf,

    /// Character budget for the aggregated corpus in synthesis prompts
    /// (overrides PAPERFORGE_SYNTHESIS_CHAR_BUDGET).
    #[arg(long)]
    pub synthesis_char_budget: Option<usize>,

    /// DeepSeek API key.
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Library access token, used for bibliographic metadata lookups.
    #[arg(long, env = "MENDELEY_TOKEN", hide_env_values = true)]
    pub library_token: String,
}

/// Parse CLI arguments without running a command.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Analyze(args) => {
            run_analyze_command(args).await?;
        }
        Commands::Report(args) => {
            run_report_command(args).await?;
        }
    }
    Ok(())
}

async fn run_analyze_command(args: AnalyzeArgs) -> anyhow::Result<()> {
    let mut config = PipelineConfig::from_env()?;
    config.source_kind = args.source.into();
    config.source_path = args.path;
    config.collection = args.collection;
    config.output_dir = args.output;
    config.max_concurrent_papers = args.max_concurrent_papers;
    config.max_concurrent_requests = args.max_concurrent_requests;
    config.inter_call_delay = Duration::from_secs(args.inter_call_delay_secs);
    config.max_attempts = args.max_attempts;
    if let Some(budget) = args.demand_char_budget {
        config.demand_char_budget = budget;
    }
    config.validate()?;

    let retry = RetryPolicy {
        max_attempts: config.max_attempts,
        base_delay: config.base_retry_delay,
    };
    let client = Arc::new(DeepSeekClient::new(args.api_key, retry));
    info!(api_key = %client.api_key_masked(), model = client.model(), "DeepSeek client ready");

    let library = match (config.source_kind, args.library_token) {
        (SourceKind::Library, Some(token)) => Some(LibraryClient::new(token)),
        (SourceKind::Library, None) => {
            anyhow::bail!("--library-token (or MENDELEY_TOKEN) is required for the library source")
        }
        _ => None,
    };

    let orchestrator = PipelineOrchestrator::new(config, client, library)?;
    let summary = orchestrator.execute().await?;

    for (title, reason) in &summary.notes {
        warn!(paper = %title, reason = %reason, "Paper did not complete");
    }
    info!(
        total = summary.total,
        completed = summary.completed,
        skipped = summary.skipped,
        failed = summary.failed,
        "Analysis finished"
    );

    if summary.failed > 0 {
        anyhow::bail!("{} of {} papers failed to persist results", summary.failed, summary.total);
    }
    Ok(())
}

async fn run_report_command(args: ReportArgs) -> anyhow::Result<()> {
    let mut config = PipelineConfig::from_env()?;
    if let Some(budget) = args.synthesis_char_budget {
        config.synthesis_char_budget = budget;
    }
    config.validate()?;

    let retry = RetryPolicy {
        max_attempts: config.max_attempts,
        base_delay: config.base_retry_delay,
    };
    let client = Arc::new(DeepSeekClient::new(args.api_key, retry));
    let lookup = Arc::new(MendeleyClient::new(args.library_token));

    let assembler = ReportAssembler::new(
        ResultStore::new(&args.output),
        client,
        lookup,
        Arc::new(PromptCatalog::standard()),
        config.synthesis_char_budget,
        config.synthesis_temperature,
        config.max_tokens,
    );

    assembler.write_to(&args.report_file).await?;
    info!(report = %args.report_file.display(), "Report assembled");
    Ok(())
}
