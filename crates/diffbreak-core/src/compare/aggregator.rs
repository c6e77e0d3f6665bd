//! Gathers commit titles, changed files and release notes between two tags.

use futures::TryStreamExt;

use super::window::{ReleaseWindow, Scan};
use crate::domain::error::Result;
use crate::domain::evidence::{AnalysisMode, ComparisonData, ReleaseNote};
use crate::domain::repo::RepoIdentity;
use crate::github::{
    map_provider_error, pages, CompareCommit, CompareFile, CompareResult, HostingProvider,
};
use crate::metrics::{CallOutcome, CallTimer, RequestObserver, UpstreamCall};

/// Length of the hash prefix on deep-mode commit titles.
const SHORT_SHA_LEN: usize = 7;

/// Collect everything the model needs to judge an upgrade from `from` to `to`.
///
/// Runs the compare call, then the release-window scan. Any provider failure
/// aborts with the mapped error and nothing partial is returned.
pub async fn fetch_comparison_data(
    provider: &dyn HostingProvider,
    repo: &RepoIdentity,
    from: &str,
    to: &str,
    max_releases: usize,
    mode: AnalysisMode,
    observer: &dyn RequestObserver,
) -> Result<ComparisonData> {
    let timer = CallTimer::start(observer, UpstreamCall::CompareCommits);
    let compare = provider
        .compare(repo, from, to)
        .await
        .map_err(map_provider_error);
    timer.finish(CallOutcome::from_result(&compare));
    let compare: CompareResult = compare?;

    let commit_titles = commit_titles(&compare.commits, mode);
    let changed_files = match mode {
        AnalysisMode::Deep => Some(changed_files(&compare.files)),
        AnalysisMode::Fast => None,
    };

    let release_notes = scan_releases(provider, repo, from, to, max_releases, observer).await?;

    Ok(ComparisonData {
        release_notes,
        commit_titles,
        changed_files,
    })
}

/// First line of each non-empty commit message, hash-prefixed in deep mode.
pub fn commit_titles(commits: &[CompareCommit], mode: AnalysisMode) -> Vec<String> {
    commits
        .iter()
        .filter_map(|c| {
            let title = c.message().trim().lines().next()?.trim();
            if title.is_empty() {
                return None;
            }
            let sha: String = c
                .sha
                .as_deref()
                .unwrap_or_default()
                .chars()
                .take(SHORT_SHA_LEN)
                .collect();
            Some(match mode {
                AnalysisMode::Deep if !sha.is_empty() => format!("{sha}: {title}"),
                _ => title.to_string(),
            })
        })
        .collect()
}

/// Changed paths, deduplicated, in first-seen order.
pub fn changed_files(files: &[CompareFile]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    files
        .iter()
        .filter_map(|f| f.filename.as_deref())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// Page through releases until the window closes or the listing ends.
pub async fn scan_releases(
    provider: &dyn HostingProvider,
    repo: &RepoIdentity,
    from: &str,
    to: &str,
    max_releases: usize,
    observer: &dyn RequestObserver,
) -> Result<Vec<ReleaseNote>> {
    let mut window = ReleaseWindow::new(from, to, max_releases);
    if window.is_done() {
        return Ok(window.into_notes());
    }

    let release_pages = pages(move |page| async move {
        let timer = CallTimer::start(observer, UpstreamCall::ListReleases);
        let result = provider
            .list_releases(repo, page)
            .await
            .map_err(map_provider_error);
        timer.finish(CallOutcome::from_result(&result));
        result
    });
    futures::pin_mut!(release_pages);

    'pages: while let Some(entries) = release_pages.try_next().await? {
        for entry in &entries {
            if window.push(entry) == Scan::Stop {
                break 'pages;
            }
        }
    }

    Ok(window.into_notes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorKind;
    use crate::fakes::{FakeProvider, RecordingObserver};
    use crate::github::{Page, ProviderError, ReleaseEntry};

    fn repo() -> RepoIdentity {
        RepoIdentity::new("octo", "hello")
    }

    fn compare() -> CompareResult {
        CompareResult {
            commits: vec![
                CompareCommit::new("abcdef0123456", "feat: add api\n\nlong body"),
                CompareCommit::new("1111111aaaa", "   "),
                CompareCommit::new("2222222bbbb", "\n  fix: crash on start  \n"),
            ],
            files: vec![
                CompareFile::new("src/lib.rs"),
                CompareFile::new("README.md"),
                CompareFile::new("src/lib.rs"),
                CompareFile::default(),
            ],
        }
    }

    #[test]
    fn test_fast_titles() {
        let titles = commit_titles(&compare().commits, AnalysisMode::Fast);
        assert_eq!(titles, vec!["feat: add api", "fix: crash on start"]);
    }

    #[test]
    fn test_deep_titles_are_hash_prefixed() {
        let titles = commit_titles(&compare().commits, AnalysisMode::Deep);
        assert_eq!(titles, vec!["abcdef0: feat: add api", "2222222: fix: crash on start"]);
    }

    #[test]
    fn test_changed_files_dedup_in_order() {
        assert_eq!(changed_files(&compare().files), vec!["src/lib.rs", "README.md"]);
    }

    #[tokio::test]
    async fn test_fast_mode_omits_changed_files() {
        let provider = FakeProvider::new().with_compare(compare());
        let data = fetch_comparison_data(
            &provider,
            &repo(),
            "v1.0.0",
            "v1.1.0",
            30,
            AnalysisMode::Fast,
            &RecordingObserver::default(),
        )
        .await
        .unwrap();
        assert!(data.changed_files.is_none());
        assert_eq!(data.commit_titles.len(), 2);
    }

    #[tokio::test]
    async fn test_deep_mode_always_has_changed_files() {
        let provider = FakeProvider::new();
        let data = fetch_comparison_data(
            &provider,
            &repo(),
            "v1.0.0",
            "v1.1.0",
            30,
            AnalysisMode::Deep,
            &RecordingObserver::default(),
        )
        .await
        .unwrap();
        assert_eq!(data.changed_files, Some(vec![]));
    }

    #[tokio::test]
    async fn test_boundary_on_later_page_is_found() {
        let provider = FakeProvider::new().with_release_pages(vec![
            Page::with_next(vec![ReleaseEntry::new("v3.0.0", "c")], 2),
            Page::with_next(vec![ReleaseEntry::new("v2.0.0", "b")], 3),
            Page::last(vec![ReleaseEntry::new("v1.0.0", "a"), ReleaseEntry::new("v0.1.0", "z")]),
        ]);
        let observer = RecordingObserver::default();
        let notes = scan_releases(&provider, &repo(), "v1.0.0", "v2.0.0", 30, &observer)
            .await
            .unwrap();
        let tags: Vec<_> = notes.iter().map(|n| n.tag.as_str()).collect();
        assert_eq!(tags, vec!["v2.0.0", "v1.0.0"]);
        assert_eq!(observer.outcomes(UpstreamCall::ListReleases).len(), 3);
    }

    #[tokio::test]
    async fn test_scan_stops_without_fetching_more_pages() {
        let provider = FakeProvider::new().with_release_pages(vec![
            Page::with_next(vec![ReleaseEntry::new("v2", ""), ReleaseEntry::new("v1", "")], 2),
            Page::last(vec![ReleaseEntry::new("v0", "")]),
        ]);
        let observer = RecordingObserver::default();
        scan_releases(&provider, &repo(), "v1", "v2", 30, &observer)
            .await
            .unwrap();
        assert_eq!(provider.release_pages_fetched(), vec![1]);
    }

    #[tokio::test]
    async fn test_cap_at_page_boundary_admits_no_extra_note() {
        let provider = FakeProvider::new().with_release_pages(vec![
            Page::with_next(vec![ReleaseEntry::new("v9", ""), ReleaseEntry::new("v8", "")], 2),
            Page::last(vec![ReleaseEntry::new("v7", ""), ReleaseEntry::new("v1", "")]),
        ]);
        let notes = scan_releases(&provider, &repo(), "v1", "v9", 2, &RecordingObserver::default())
            .await
            .unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(provider.release_pages_fetched(), vec![1]);
    }

    #[tokio::test]
    async fn test_compare_failure_aborts_before_releases() {
        let provider = FakeProvider::new()
            .with_compare_error(ProviderError::status(404))
            .with_release_pages(vec![Page::last(vec![ReleaseEntry::new("v1", "")])]);
        let observer = RecordingObserver::default();
        let err = fetch_comparison_data(
            &provider,
            &repo(),
            "v1",
            "v2",
            30,
            AnalysisMode::Fast,
            &observer,
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RepoNotFound);
        assert_eq!(observer.outcomes(UpstreamCall::CompareCommits), vec!["not_found"]);
        assert!(provider.release_pages_fetched().is_empty());
    }

    #[tokio::test]
    async fn test_release_failure_aborts() {
        let provider = FakeProvider::new().with_release_error(1, ProviderError::status(403));
        let err = fetch_comparison_data(
            &provider,
            &repo(),
            "v1",
            "v2",
            30,
            AnalysisMode::Deep,
            &RecordingObserver::default(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimited);
    }
}
