//! diffbreak - what breaks if I upgrade?
//!
//! ## Commands
//!
//! - `detect`: List a repository's tags with suggested comparison endpoints
//! - `analyze`: Ask the model for an upgrade-risk report between two tags

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use diffbreak_core::github::DEFAULT_API_BASE;
use diffbreak_core::model::{DEFAULT_MODEL, DEFAULT_MODEL_URL};
use diffbreak_core::{
    init_tracing, AnalysisResponse, AnalyzeLimits, AnalyzeRequest, Analyzer, DetectResponse,
    DiffbreakError, ErrorKind, GitHubClient, LogFormat, ModelConfig, NoopObserver, OllamaClient,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, Level};

#[derive(Parser)]
#[command(name = "diffbreak")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Upgrade-risk analysis between two GitHub release tags", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Ollama base URL
    #[arg(long = "llm", global = true, env = "DIFFBREAK_LLM_URL", default_value = DEFAULT_MODEL_URL)]
    llm_url: String,

    /// Model identifier sent to Ollama
    #[arg(long, global = true, env = "DIFFBREAK_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// GitHub token, raises the API rate limit
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, global = true, env = "DIFFBREAK_GITHUB_API", default_value = DEFAULT_API_BASE)]
    github_api: String,

    /// Write the JSON result here instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tags of a GitHub repository
    Detect {
        /// Repository URL, e.g. https://github.com/tokio-rs/tokio
        repo_url: String,
    },

    /// Analyze the upgrade risk between two tags
    Analyze {
        /// Repository URL, e.g. https://github.com/tokio-rs/tokio
        repo_url: String,

        /// Tag currently in use
        #[arg(long)]
        from: String,

        /// Tag to upgrade to
        #[arg(long)]
        to: String,

        /// Analysis depth: fast or deep
        #[arg(long, default_value = "fast")]
        mode: String,

        /// Maximum number of release notes to include (1-60)
        #[arg(long)]
        max_releases: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    init_tracing(LogFormat::from_json_flag(cli.json), level);

    let analyzer = build_analyzer(&cli)?;
    let output = cli.output.as_deref();

    match cli.command {
        Commands::Detect { ref repo_url } => {
            let resp = cmd_detect(&analyzer, repo_url).await?;
            write_output(&resp, output)
        }
        Commands::Analyze {
            ref repo_url,
            ref from,
            ref to,
            ref mode,
            max_releases,
        } => {
            let request = AnalyzeRequest {
                repo_url: repo_url.clone(),
                from_tag: from.clone(),
                to_tag: to.clone(),
                mode: mode.clone(),
                limits: AnalyzeLimits { max_releases },
            };
            let resp = cmd_analyze(&analyzer, &request).await?;
            write_output(&resp, output)
        }
    }
}

fn build_analyzer(cli: &Cli) -> Result<Analyzer> {
    let github = GitHubClient::new(cli.github_api.clone(), cli.github_token.clone())
        .context("Failed to build GitHub client")?;
    let model = OllamaClient::new(ModelConfig::new(&cli.llm_url, &cli.model))
        .context("Failed to build model client")?;
    Ok(Analyzer::new(
        Arc::new(github),
        Arc::new(model),
        Arc::new(NoopObserver),
    ))
}

/// Terminal wording for a failure kind. Detail goes to the debug log.
fn cli_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Internal => "upstream request failed",
        other => other.public_message(),
    }
}

fn public_error(err: DiffbreakError) -> anyhow::Error {
    debug!(kind = %err.kind(), error = %err, "command failed");
    anyhow!(cli_message(err.kind()))
}

async fn cmd_detect(analyzer: &Analyzer, repo_url: &str) -> Result<DetectResponse> {
    analyzer.detect(repo_url).await.map_err(public_error)
}

async fn cmd_analyze(analyzer: &Analyzer, request: &AnalyzeRequest) -> Result<AnalysisResponse> {
    let validated = request.validate()?;
    analyzer.analyze(&validated).await.map_err(public_error)
}

fn write_output<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => std::fs::write(path, format!("{json}\n"))
            .with_context(|| format!("Failed to write to {:?}", path)),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}
