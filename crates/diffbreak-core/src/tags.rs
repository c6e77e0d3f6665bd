//! Full tag listing for a repository.

use futures::TryStreamExt;

use crate::domain::error::Result;
use crate::domain::repo::RepoIdentity;
use crate::github::{map_provider_error, pages, HostingProvider};
use crate::metrics::{CallOutcome, CallTimer, RequestObserver, UpstreamCall};

/// Walk every tag page and return tag names in provider order.
///
/// Entries without a name are skipped. A failure on any page fails the
/// whole listing.
pub async fn list_tags(
    provider: &dyn HostingProvider,
    repo: &RepoIdentity,
    observer: &dyn RequestObserver,
) -> Result<Vec<String>> {
    let tag_pages = pages(move |page| async move {
        let timer = CallTimer::start(observer, UpstreamCall::ListTags);
        let result = provider
            .list_tags(repo, page)
            .await
            .map_err(map_provider_error);
        timer.finish(CallOutcome::from_result(&result));
        result
    });
    futures::pin_mut!(tag_pages);

    let mut tags = Vec::new();
    while let Some(entries) = tag_pages.try_next().await? {
        tags.extend(entries.into_iter().filter_map(|t| t.name));
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorKind;
    use crate::fakes::{FakeProvider, RecordingObserver};
    use crate::github::{Page, ProviderError, TagEntry};

    fn repo() -> RepoIdentity {
        RepoIdentity::new("octo", "hello")
    }

    #[tokio::test]
    async fn test_concatenates_pages_in_order() {
        let provider = FakeProvider::new().with_tag_pages(vec![
            Page::with_next(vec![TagEntry::named("v1.0.0"), TagEntry::named("v1.1.0")], 2),
            Page::last(vec![TagEntry::named("v2.0.0")]),
        ]);
        let observer = RecordingObserver::default();

        let tags = list_tags(&provider, &repo(), &observer).await.unwrap();
        assert_eq!(tags, vec!["v1.0.0", "v1.1.0", "v2.0.0"]);
        assert_eq!(observer.outcomes(UpstreamCall::ListTags), vec!["ok", "ok"]);
    }

    #[tokio::test]
    async fn test_skips_unnamed_entries() {
        let provider = FakeProvider::new().with_tag_pages(vec![Page::last(vec![
            TagEntry::default(),
            TagEntry::named("v1.0.0"),
        ])]);
        let tags = list_tags(&provider, &repo(), &RecordingObserver::default())
            .await
            .unwrap();
        assert_eq!(tags, vec!["v1.0.0"]);
    }

    #[tokio::test]
    async fn test_empty_repository_yields_empty_list() {
        let provider = FakeProvider::new();
        let tags = list_tags(&provider, &repo(), &RecordingObserver::default())
            .await
            .unwrap();
        assert!(tags.is_empty());
    }

    #[tokio::test]
    async fn test_failure_on_later_page_aborts() {
        let provider = FakeProvider::new()
            .with_tag_pages(vec![Page::with_next(vec![TagEntry::named("v1.0.0")], 2)])
            .with_tag_error(2, ProviderError::status(403));
        let observer = RecordingObserver::default();

        let err = list_tags(&provider, &repo(), &observer).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert_eq!(
            observer.outcomes(UpstreamCall::ListTags),
            vec!["ok", "rate_limited"]
        );
    }

    #[tokio::test]
    async fn test_not_found_maps() {
        let provider = FakeProvider::new().with_tag_error(1, ProviderError::status(404));
        let err = list_tags(&provider, &repo(), &RecordingObserver::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RepoNotFound);
    }
}
