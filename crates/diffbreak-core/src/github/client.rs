//! reqwest-backed GitHub REST client.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, LINK};
use reqwest::Url;
use serde::de::DeserializeOwned;

use super::error::ProviderError;
use super::pagination::{next_page_from_link, Page};
use super::{CompareResult, HostingProvider, ReleaseEntry, TagEntry};
use crate::domain::error::{DiffbreakError, Result};
use crate::domain::repo::RepoIdentity;

/// Public GitHub REST endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Entries requested per listing page.
pub const PAGE_SIZE: u32 = 100;

const USER_AGENT: &str = concat!("diffbreak/", env!("CARGO_PKG_VERSION"));

/// Read-only client for the GitHub REST API.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl GitHubClient {
    /// Build a client against `base_url`. A blank token is treated as absent.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(DiffbreakError::internal)?;
        let token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `base_url` plus `segments`, each percent-encoded as one path segment.
    fn endpoint(&self, segments: &[&str]) -> std::result::Result<Url, ProviderError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ProviderError::Transport(format!("invalid base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::Transport("base url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, u32)],
    ) -> std::result::Result<(T, Option<u32>), ProviderError> {
        let mut request = self
            .http
            .get(url)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let next_page = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_page_from_link);
        let body = response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        Ok((body, next_page))
    }

    async fn list<T: DeserializeOwned>(
        &self,
        repo: &RepoIdentity,
        listing: &str,
        page: u32,
    ) -> std::result::Result<Page<T>, ProviderError> {
        let url = self.endpoint(&["repos", &repo.owner, &repo.name, listing])?;
        let (items, next_page) = self
            .get::<Vec<T>>(url, &[("per_page", PAGE_SIZE), ("page", page)])
            .await?;
        Ok(Page { items, next_page })
    }
}

#[async_trait]
impl HostingProvider for GitHubClient {
    async fn list_tags(
        &self,
        repo: &RepoIdentity,
        page: u32,
    ) -> std::result::Result<Page<TagEntry>, ProviderError> {
        self.list(repo, "tags", page).await
    }

    async fn list_releases(
        &self,
        repo: &RepoIdentity,
        page: u32,
    ) -> std::result::Result<Page<ReleaseEntry>, ProviderError> {
        self.list(repo, "releases", page).await
    }

    async fn compare(
        &self,
        repo: &RepoIdentity,
        base: &str,
        head: &str,
    ) -> std::result::Result<CompareResult, ProviderError> {
        let range = format!("{base}...{head}");
        let url = self.endpoint(&["repos", &repo.owner, &repo.name, "compare", &range])?;
        let (result, _) = self.get::<CompareResult>(url, &[]).await?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn repo() -> RepoIdentity {
        RepoIdentity::new("octo", "hello")
    }

    #[tokio::test]
    async fn test_list_tags_reads_page_and_link() {
        let server = MockServer::start().await;
        let next = format!(
            "<{}/repos/octo/hello/tags?per_page=100&page=2>; rel=\"next\"",
            server.uri()
        );
        Mock::given(method("GET"))
            .and(path("/repos/octo/hello/tags"))
            .and(query_param("per_page", "100"))
            .and(query_param("page", "1"))
            .and(header("accept", "application/vnd.github+json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("link", next.as_str())
                    .set_body_string(r#"[{"name":"v1.1.0"},{"name":"v1.0.0"}]"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = GitHubClient::new(server.uri(), None).unwrap();
        let page = client.list_tags(&repo(), 1).await.unwrap();
        assert_eq!(
            page.items,
            vec![TagEntry::named("v1.1.0"), TagEntry::named("v1.0.0")]
        );
        assert_eq!(page.next_page, Some(2));
    }

    #[tokio::test]
    async fn test_token_is_sent_as_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/hello/releases"))
            .and(header("authorization", "Bearer s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[{"tag_name":"v2.0.0","body":"notes"}]"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = GitHubClient::new(server.uri(), Some(" s3cret ".into())).unwrap();
        let page = client.list_releases(&repo(), 1).await.unwrap();
        assert_eq!(page.items, vec![ReleaseEntry::new("v2.0.0", "notes")]);
        assert_eq!(page.next_page, None);
    }

    #[tokio::test]
    async fn test_blank_token_is_ignored() {
        let client = GitHubClient::new("https://api.github.com/", Some("   ".into())).unwrap();
        assert!(format!("{client:?}").contains("authenticated: false"));
        assert_eq!(client.base_url(), "https://api.github.com");
    }

    #[tokio::test]
    async fn test_compare_decodes_commits_and_files() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/hello/compare/v1.0.0...v1.1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"commits":[{"sha":"0123456789","commit":{"message":"feat: a\n\nbody"}}],
                    "files":[{"filename":"src/lib.rs"}]}"#,
            ))
            .mount(&server)
            .await;

        let client = GitHubClient::new(server.uri(), None).unwrap();
        let cmp = client.compare(&repo(), "v1.0.0", "v1.1.0").await.unwrap();
        assert_eq!(cmp.commits[0].message(), "feat: a\n\nbody");
        assert_eq!(cmp.files[0].filename.as_deref(), Some("src/lib.rs"));
    }

    #[tokio::test]
    async fn test_compare_refs_are_path_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/hello/compare/v1.0%23rc...v1.1%3Fbeta"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"commits":[],"files":[]}"#))
            .expect(1)
            .mount(&server)
            .await;

        let client = GitHubClient::new(server.uri(), None).unwrap();
        let cmp = client.compare(&repo(), "v1.0#rc", "v1.1?beta").await.unwrap();
        assert!(cmp.commits.is_empty());

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests[0].url.query(), None);
        assert_eq!(requests[0].url.fragment(), None);
    }

    #[tokio::test]
    async fn test_base_url_path_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/repos/octo/hello/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .expect(1)
            .mount(&server)
            .await;

        let client = GitHubClient::new(format!("{}/api/v3/", server.uri()), None).unwrap();
        let page = client.list_tags(&repo(), 1).await.unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_error_status_keeps_code_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/hello/tags"))
            .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"message":"Not Found"}"#))
            .mount(&server)
            .await;

        let client = GitHubClient::new(server.uri(), None).unwrap();
        let err = client.list_tags(&repo(), 1).await.unwrap_err();
        match err {
            ProviderError::Status { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("Not Found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/hello/releases"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = GitHubClient::new(server.uri(), None).unwrap();
        let err = client.list_releases(&repo(), 1).await.unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
    }
}
