//! Client for the local Ollama generation endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::error::{DiffbreakError, Result};
use crate::metrics::CallOutcome;

pub const DEFAULT_MODEL_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "qwen2.5:7b";

/// Decoding parameters and location of the model service.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub num_predict: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MODEL_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.2,
            num_predict: 1200,
        }
    }
}

impl ModelConfig {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            ..Self::default()
        }
    }
}

/// A failed generation call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    #[error("model request timed out")]
    Timeout,

    #[error("model service returned HTTP {0}")]
    Status(u16),

    #[error("failed to decode model envelope: {0}")]
    Decode(String),

    #[error("model service reported an error: {0}")]
    Service(String),

    #[error("model transport error: {0}")]
    Transport(String),
}

impl ModelError {
    /// Metric outcome for this failure.
    pub fn outcome(&self) -> CallOutcome {
        match self {
            ModelError::Timeout => CallOutcome::Timeout,
            ModelError::Status(code) => CallOutcome::Status(*code),
            ModelError::Decode(_) => CallOutcome::DecodeError,
            ModelError::Service(_) | ModelError::Transport(_) => CallOutcome::Error,
        }
    }
}

impl From<reqwest::Error> for ModelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ModelError::Timeout
        } else if err.is_decode() {
            ModelError::Decode(err.to_string())
        } else {
            ModelError::Transport(err.to_string())
        }
    }
}

impl From<ModelError> for DiffbreakError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Timeout => DiffbreakError::TimedOut,
            other => DiffbreakError::internal(other),
        }
    }
}

/// Text generation seam.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// One non-streaming generation. Returns the trimmed reply text.
    async fn generate(&self, prompt: &str) -> std::result::Result<String, ModelError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f64,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    error: Option<String>,
}

/// [`ModelClient`] backed by Ollama's `/api/generate`.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    endpoint: String,
    config: ModelConfig,
}

impl OllamaClient {
    pub fn new(config: ModelConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(DiffbreakError::internal)?;
        let endpoint = format!("{}/api/generate", config.base_url.trim_end_matches('/'));
        Ok(Self {
            http,
            endpoint,
            config,
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> std::result::Result<String, ModelError> {
        let body = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.config.temperature,
                num_predict: self.config.num_predict,
            },
        };

        let response = self.http.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ModelError::Status(status.as_u16()));
        }

        let envelope: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Decode(e.to_string()))?;
        if let Some(err) = envelope.error.filter(|e| !e.is_empty()) {
            return Err(ModelError::Service(err));
        }
        Ok(envelope.response.trim().to_string())
    }
}
