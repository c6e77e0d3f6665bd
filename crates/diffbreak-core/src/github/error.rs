//! Raw provider failures and their mapping onto the domain taxonomy.

use crate::domain::error::DiffbreakError;

/// A provider call failure before it is classified.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("github returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("github request timed out")]
    Timeout,

    #[error("github transport error: {0}")]
    Transport(String),

    #[error("failed to decode github response: {0}")]
    Decode(String),
}

impl ProviderError {
    pub fn status(status: u16) -> Self {
        ProviderError::Status {
            status,
            body: String::new(),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ProviderError::Status {
                status: status.as_u16(),
                body: String::new(),
            }
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

/// Classify a provider failure.
///
/// 404 is a missing repository or ref. 403 is the provider's rate-limit
/// signal, and 429 its secondary one. Anything else is internal.
pub fn map_provider_error(err: ProviderError) -> DiffbreakError {
    match err {
        ProviderError::Status { status: 404, .. } => DiffbreakError::RepoNotFound,
        ProviderError::Status {
            status: 403 | 429, ..
        } => DiffbreakError::RateLimited,
        ProviderError::Timeout => DiffbreakError::TimedOut,
        other => DiffbreakError::internal(other),
    }
}

impl From<ProviderError> for DiffbreakError {
    fn from(err: ProviderError) -> Self {
        map_provider_error(err)
    }
}
