//! Page cursors and the lazy page stream.

use std::future::Future;

use futures::stream::{self, Stream};
use reqwest::Url;

use crate::domain::error::Result;

/// One page of a listing plus the provider's cursor for the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page: Option<u32>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page: None,
        }
    }

    pub fn with_next(items: Vec<T>, next_page: u32) -> Self {
        Self {
            items,
            next_page: Some(next_page),
        }
    }
}

/// Extract the `page` parameter of the `rel="next"` target of a `Link` header.
///
/// ```
/// use diffbreak_core::github::next_page_from_link;
///
/// let link = r#"<https://api.github.com/repositories/1/tags?per_page=100&page=3>; rel="next", <https://api.github.com/repositories/1/tags?per_page=100&page=9>; rel="last""#;
/// assert_eq!(next_page_from_link(link), Some(3));
/// ```
pub fn next_page_from_link(header: &str) -> Option<u32> {
    header.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|p| {
            let p = p.trim();
            p == r#"rel="next""# || p == "rel=next"
        });
        if !is_next {
            return None;
        }
        let target = target.strip_prefix('<')?.strip_suffix('>')?;
        let url = Url::parse(target).ok()?;
        url.query_pairs()
            .find(|(k, _)| k == "page")
            .and_then(|(_, v)| v.parse().ok())
    })
}

/// Lazily walk a paginated listing starting at page 1.
///
/// Pages are fetched one at a time, only when the consumer pulls the next
/// item, and the walk ends when a page carries no forward cursor. A cursor
/// that does not advance also ends the walk. The first error ends the stream.
pub fn pages<'a, T, F, Fut>(fetch: F) -> impl Stream<Item = Result<Vec<T>>> + 'a
where
    T: 'a,
    F: FnMut(u32) -> Fut + 'a,
    Fut: Future<Output = Result<Page<T>>> + 'a,
{
    stream::try_unfold((fetch, Some(1u32)), |(mut fetch, cursor)| async move {
        let Some(page) = cursor else {
            return Ok(None);
        };
        let Page { items, next_page } = fetch(page).await?;
        let next_page = next_page.filter(|next| *next > page);
        Ok(Some((items, (fetch, next_page))))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DiffbreakError;
    use futures::TryStreamExt;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_link_without_next() {
        let link = r#"<https://api.github.com/repos/o/r/tags?page=1>; rel="prev", <https://api.github.com/repos/o/r/tags?page=1>; rel="first""#;
        assert_eq!(next_page_from_link(link), None);
        assert_eq!(next_page_from_link(""), None);
        assert_eq!(next_page_from_link("garbage"), None);
    }

    #[test]
    fn test_link_next_in_any_position() {
        let link = r#"<https://api.github.com/repos/o/r/releases?page=1>; rel="prev", <https://api.github.com/repos/o/r/releases?per_page=100&page=3>; rel="next""#;
        assert_eq!(next_page_from_link(link), Some(3));
    }

    #[tokio::test]
    async fn test_pages_walks_until_no_cursor() {
        let stream = pages(|page| async move {
            Ok(match page {
                1 => Page::with_next(vec!["a", "b"], 2),
                2 => Page::with_next(vec!["c"], 3),
                _ => Page::last(vec![]),
            })
        });
        let all: Vec<Vec<&str>> = stream.try_collect().await.unwrap();
        assert_eq!(all, vec![vec!["a", "b"], vec!["c"], vec![]]);
    }

    #[tokio::test]
    async fn test_pages_are_lazy() {
        let fetched = AtomicU32::new(0);
        let stream = pages(|page| {
            fetched.fetch_add(1, Ordering::SeqCst);
            async move { Ok(Page::with_next(vec![page], page + 1)) }
        });
        futures::pin_mut!(stream);
        assert_eq!(stream.try_next().await.unwrap(), Some(vec![1]));
        assert_eq!(stream.try_next().await.unwrap(), Some(vec![2]));
        assert_eq!(fetched.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_pages_stop_on_non_advancing_cursor() {
        let stream = pages(|page| async move { Ok(Page::with_next(vec![page], 1)) });
        let all: Vec<Vec<u32>> = stream.try_collect().await.unwrap();
        assert_eq!(all, vec![vec![1]]);
    }

    #[tokio::test]
    async fn test_pages_end_on_error() {
        let stream = pages(|page| async move {
            if page == 2 {
                Err(DiffbreakError::RateLimited)
            } else {
                Ok(Page::with_next(vec![page], page + 1))
            }
        });
        futures::pin_mut!(stream);
        assert_eq!(stream.try_next().await.unwrap(), Some(vec![1]));
        assert!(matches!(stream.try_next().await, Err(DiffbreakError::RateLimited)));
    }
}
