//! Read-only access to the hosting provider.
//!
//! [`HostingProvider`] is the seam the tag lister and comparison aggregator
//! consume. [`client::GitHubClient`] is the production implementation;
//! `crate::fakes::FakeProvider` serves tests. Implementations return raw
//! [`ProviderError`]s, and every call site maps them through
//! [`map_provider_error`] so nothing above this module branches on transport
//! details.

pub mod client;
pub mod error;
pub mod pagination;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::repo::RepoIdentity;

pub use client::{GitHubClient, DEFAULT_API_BASE, PAGE_SIZE};
pub use error::{map_provider_error, ProviderError};
pub use pagination::{next_page_from_link, pages, Page};

/// One entry of the tag listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEntry {
    #[serde(default)]
    pub name: Option<String>,
}

impl TagEntry {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

/// One entry of the release listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseEntry {
    #[serde(default)]
    pub tag_name: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl ReleaseEntry {
    pub fn new(tag: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            tag_name: Some(tag.into()),
            body: Some(body.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDetail {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareCommit {
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub commit: Option<CommitDetail>,
}

impl CompareCommit {
    pub fn new(sha: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sha: Some(sha.into()),
            commit: Some(CommitDetail {
                message: Some(message.into()),
            }),
        }
    }

    pub fn message(&self) -> &str {
        self.commit
            .as_ref()
            .and_then(|c| c.message.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareFile {
    #[serde(default)]
    pub filename: Option<String>,
}

impl CompareFile {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: Some(filename.into()),
        }
    }
}

/// Commit and file delta between two refs, in provider order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareResult {
    #[serde(default)]
    pub commits: Vec<CompareCommit>,
    #[serde(default)]
    pub files: Vec<CompareFile>,
}

/// Hosting-provider operations diffbreak consumes.
#[async_trait]
pub trait HostingProvider: Send + Sync {
    /// Fetch one page (1-based) of the tag listing.
    async fn list_tags(
        &self,
        repo: &RepoIdentity,
        page: u32,
    ) -> Result<Page<TagEntry>, ProviderError>;

    /// Fetch one page (1-based) of the release listing.
    async fn list_releases(
        &self,
        repo: &RepoIdentity,
        page: u32,
    ) -> Result<Page<ReleaseEntry>, ProviderError>;

    /// Compare `base...head`.
    async fn compare(
        &self,
        repo: &RepoIdentity,
        base: &str,
        head: &str,
    ) -> Result<CompareResult, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_types_tolerate_nulls() {
        let tags: Vec<TagEntry> = serde_json::from_str(r#"[{"name":"v1"},{"name":null},{}]"#).unwrap();
        assert_eq!(tags[0], TagEntry::named("v1"));
        assert_eq!(tags[1].name, None);

        let cmp: CompareResult = serde_json::from_str(
            r#"{"commits":[{"sha":"abc","commit":{"message":null}},{"sha":"def"}]}"#,
        )
        .unwrap();
        assert_eq!(cmp.commits.len(), 2);
        assert_eq!(cmp.commits[0].message(), "");
        assert!(cmp.files.is_empty());
    }

    #[test]
    fn test_compare_commit_message_defaults_to_empty() {
        let bare = CompareCommit::default();
        assert_eq!(bare.message(), "");
        assert_eq!(CompareCommit::new("abc", "fix: x").message(), "fix: x");
    }
}
