//! Domain-level error taxonomy for diffbreak.
//!
//! Every component returns [`DiffbreakError`]. Callers branch on
//! [`DiffbreakError::kind`], never on transport details.

/// Closed set of failure identities surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidRepoUrl,
    RepoNotFound,
    RateLimited,
    TimedOut,
    ModelResponseInvalid,
    Internal,
}

impl ErrorKind {
    /// HTTP status code that signals this kind to clients.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::InvalidRepoUrl => 400,
            ErrorKind::RepoNotFound => 404,
            ErrorKind::RateLimited => 429,
            ErrorKind::TimedOut => 504,
            ErrorKind::ModelResponseInvalid => 502,
            ErrorKind::Internal => 500,
        }
    }

    /// Short message safe to show a caller. Never includes upstream text.
    pub fn public_message(self) -> &'static str {
        match self {
            ErrorKind::InvalidRepoUrl => "invalid repoUrl",
            ErrorKind::RepoNotFound => "repository not found",
            ErrorKind::RateLimited => "github rate limit exceeded",
            ErrorKind::TimedOut => "request timed out",
            ErrorKind::ModelResponseInvalid => "model returned invalid JSON",
            ErrorKind::Internal => "internal server error",
        }
    }

    /// Snake-case label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidRepoUrl => "invalid_repo_url",
            ErrorKind::RepoNotFound => "not_found",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::TimedOut => "timeout",
            ErrorKind::ModelResponseInvalid => "model_response_invalid",
            ErrorKind::Internal => "error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// diffbreak domain errors.
#[derive(Debug, thiserror::Error)]
pub enum DiffbreakError {
    #[error("invalid github repo url")]
    InvalidRepoUrl,

    #[error("repo not found")]
    RepoNotFound,

    #[error("github rate limited")]
    RateLimited,

    #[error("deadline exceeded")]
    TimedOut,

    #[error("model response invalid: {0}")]
    ModelResponseInvalid(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DiffbreakError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiffbreakError::InvalidRepoUrl => ErrorKind::InvalidRepoUrl,
            DiffbreakError::RepoNotFound => ErrorKind::RepoNotFound,
            DiffbreakError::RateLimited => ErrorKind::RateLimited,
            DiffbreakError::TimedOut => ErrorKind::TimedOut,
            DiffbreakError::ModelResponseInvalid(_) => ErrorKind::ModelResponseInvalid,
            DiffbreakError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn internal(detail: impl std::fmt::Display) -> Self {
        DiffbreakError::Internal(detail.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for DiffbreakError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        DiffbreakError::TimedOut
    }
}

/// Result type for diffbreak domain operations.
pub type Result<T> = std::result::Result<T, DiffbreakError>;
