//! Command-line and environment configuration for the service.

use std::time::Duration;

use anyhow::{ensure, Result};
use clap::Parser;
use diffbreak_core::github::DEFAULT_API_BASE;
use diffbreak_core::model::{DEFAULT_MODEL, DEFAULT_MODEL_URL};
use diffbreak_core::{Deadlines, LogFormat, ModelConfig};
use tracing::Level;

pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://diffbreak.fyi";

#[derive(Debug, Clone, Parser)]
#[command(name = "diffbreakd")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Upgrade-risk analysis service for GitHub releases", long_about = None)]
pub struct Config {
    /// Ollama base URL
    #[arg(long = "llm", env = "DIFFBREAK_LLM_URL", default_value = DEFAULT_MODEL_URL)]
    pub llm_url: String,

    /// Model identifier sent to Ollama
    #[arg(long, env = "DIFFBREAK_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Interface to listen on
    #[arg(long, env = "DIFFBREAK_INTERFACE", default_value = "0.0.0.0")]
    pub interface: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// GitHub token, raises the API rate limit
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, env = "DIFFBREAK_GITHUB_API", default_value = DEFAULT_API_BASE)]
    pub github_api: String,

    /// The single browser origin allowed by CORS
    #[arg(long, env = "DIFFBREAK_ALLOWED_ORIGIN", default_value = DEFAULT_ALLOWED_ORIGIN)]
    pub allowed_origin: String,

    /// Deadline for tag detection, in seconds
    #[arg(long, default_value_t = 10)]
    pub detect_timeout_secs: u64,

    /// Deadline for a whole analysis, in seconds
    #[arg(long, default_value_t = 60)]
    pub analyze_timeout_secs: u64,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.detect_timeout_secs > 0, "--detect-timeout-secs must be positive");
        ensure!(self.analyze_timeout_secs > 0, "--analyze-timeout-secs must be positive");
        ensure!(!self.allowed_origin.trim().is_empty(), "--allowed-origin must not be empty");
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.interface, self.port)
    }

    pub fn deadlines(&self) -> Deadlines {
        Deadlines {
            detect: Duration::from_secs(self.detect_timeout_secs),
            analyze: Duration::from_secs(self.analyze_timeout_secs),
        }
    }

    pub fn model_config(&self) -> ModelConfig {
        ModelConfig::new(&self.llm_url, &self.model)
    }

    pub fn log_format(&self) -> LogFormat {
        LogFormat::from_json_flag(self.json)
    }

    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }
}
