//! Inbound analysis requests and the detect response.

use serde::{Deserialize, Serialize};

use crate::domain::analysis::null_as_default;
use crate::domain::evidence::AnalysisMode;
use crate::domain::repo::{RepoIdentity, PROVIDER_NAME};

/// Release cap used when the caller does not supply one.
pub const DEFAULT_MAX_RELEASES: usize = 30;

/// Upper bound on the release cap.
pub const MAX_RELEASES_LIMIT: usize = 60;

/// Clamp a caller-supplied release cap into `1..=60`; absent or zero means 30.
pub fn clamp_max_releases(requested: Option<i64>) -> usize {
    match requested {
        None | Some(0) => DEFAULT_MAX_RELEASES,
        Some(n) if n < 1 => 1,
        Some(n) => (n as u64).min(MAX_RELEASES_LIMIT as u64) as usize,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyzeLimits {
    pub max_releases: Option<i64>,
}

/// Body of an analysis request, as sent by clients. Absent and `null`
/// fields read as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub repo_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub from_tag: String,
    #[serde(deserialize_with = "null_as_default")]
    pub to_tag: String,
    #[serde(deserialize_with = "null_as_default")]
    pub mode: String,
    #[serde(deserialize_with = "null_as_default")]
    pub limits: AnalyzeLimits,
}

/// Why an [`AnalyzeRequest`] was refused before any upstream call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("repoUrl is required")]
    MissingRepoUrl,

    #[error("fromTag is required")]
    MissingFromTag,

    #[error("toTag is required")]
    MissingToTag,

    #[error("mode must be 'fast' or 'deep'")]
    InvalidMode,
}

/// A request that passed field validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub repo_url: String,
    pub from_tag: String,
    pub to_tag: String,
    pub mode: AnalysisMode,
    pub max_releases: usize,
}

impl AnalyzeRequest {
    /// Check required fields in a fixed order and apply the release cap.
    /// URL shape is checked later by [`RepoIdentity::parse`].
    pub fn validate(&self) -> Result<ValidatedRequest, RequestError> {
        let repo_url = self.repo_url.trim();
        if repo_url.is_empty() {
            return Err(RequestError::MissingRepoUrl);
        }
        let from_tag = self.from_tag.trim();
        if from_tag.is_empty() {
            return Err(RequestError::MissingFromTag);
        }
        let to_tag = self.to_tag.trim();
        if to_tag.is_empty() {
            return Err(RequestError::MissingToTag);
        }
        let mode = self
            .mode
            .parse::<AnalysisMode>()
            .map_err(|_| RequestError::InvalidMode)?;

        Ok(ValidatedRequest {
            repo_url: repo_url.to_string(),
            from_tag: from_tag.to_string(),
            to_tag: to_tag.to_string(),
            mode,
            max_releases: clamp_max_releases(self.limits.max_releases),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoInfo {
    pub url: String,
    pub owner: String,
    pub name: String,
    pub provider: String,
}

/// Tags available for a repository, with suggested comparison endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectResponse {
    pub repo: RepoInfo,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_to: Option<String>,
}

impl DetectResponse {
    /// The provider lists newest tags first, so the first two tags suggest
    /// "upgrade from the previous tag to the latest one".
    pub fn new(url: &str, repo: &RepoIdentity, tags: Vec<String>) -> Self {
        let (default_from, default_to) = match tags.as_slice() {
            [latest, previous, ..] => (Some(previous.clone()), Some(latest.clone())),
            _ => (None, None),
        };
        Self {
            repo: RepoInfo {
                url: url.to_string(),
                owner: repo.owner.clone(),
                name: repo.name.clone(),
                provider: PROVIDER_NAME.to_string(),
            },
            tags,
            default_from,
            default_to,
        }
    }
}
