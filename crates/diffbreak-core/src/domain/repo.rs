//! Repository identity resolved from a user-supplied URL.

use percent_encoding::percent_decode_str;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::domain::error::{DiffbreakError, Result};

/// The only hosting provider diffbreak talks to.
pub const PROVIDER_HOST: &str = "github.com";

/// Provider name reported back to clients.
pub const PROVIDER_NAME: &str = "github";

/// An `(owner, name)` pair identifying one repository on the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoIdentity {
    pub owner: String,
    pub name: String,
}

impl RepoIdentity {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Resolve `https://github.com/<owner>/<name>` into an identity.
    ///
    /// The path is percent-decoded before its segments are counted. Accepts
    /// surrounding whitespace, one trailing slash and a trailing `.git`. Anything else (other schemes, hosts, subdomains, ports,
    /// credentials, segment counts) is [`DiffbreakError::InvalidRepoUrl`].
    ///
    /// ```
    /// use diffbreak_core::RepoIdentity;
    ///
    /// let repo = RepoIdentity::parse("https://github.com/tokio-rs/tokio.git").unwrap();
    /// assert_eq!(repo.owner, "tokio-rs");
    /// assert_eq!(repo.name, "tokio");
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(DiffbreakError::InvalidRepoUrl);
        }

        let url = Url::parse(input).map_err(|_| DiffbreakError::InvalidRepoUrl)?;
        if url.scheme() != "https" {
            return Err(DiffbreakError::InvalidRepoUrl);
        }
        let host_ok = url
            .host_str()
            .is_some_and(|h| h.eq_ignore_ascii_case(PROVIDER_HOST));
        if !host_ok || url.port().is_some() || !url.username().is_empty() {
            return Err(DiffbreakError::InvalidRepoUrl);
        }

        let decoded = percent_decode_str(url.path())
            .decode_utf8()
            .map_err(|_| DiffbreakError::InvalidRepoUrl)?;
        let path = decoded.trim_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);

        let mut segments = path.split('/');
        match (segments.next(), segments.next(), segments.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
                Ok(Self::new(owner, name))
            }
            _ => Err(DiffbreakError::InvalidRepoUrl),
        }
    }
}

impl std::fmt::Display for RepoIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
