//! In-memory fakes for the provider, model and observer seams (testing only)
//!
//! Provides `FakeProvider`, `StaticModel` and `RecordingObserver`, which
//! satisfy the trait contracts without any network access.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::repo::RepoIdentity;
use crate::github::{
    CompareResult, HostingProvider, Page, ProviderError, ReleaseEntry, TagEntry,
};
use crate::metrics::{CallOutcome, RequestObserver, UpstreamCall};
use crate::model::{ModelClient, ModelError};

// ---------------------------------------------------------------------------
// FakeProvider
// ---------------------------------------------------------------------------

/// Scripted hosting provider.
///
/// Page `n` of a listing is the `n`-th configured page; pages past the end
/// are empty with no cursor. Errors registered for a page replace it.
#[derive(Debug, Default)]
pub struct FakeProvider {
    tag_pages: Vec<Page<TagEntry>>,
    release_pages: Vec<Page<ReleaseEntry>>,
    compare: CompareResult,
    tag_errors: HashMap<u32, ProviderError>,
    release_errors: HashMap<u32, ProviderError>,
    compare_error: Option<ProviderError>,
    delay: Option<Duration>,
    release_fetches: Mutex<Vec<u32>>,
    compare_calls: Mutex<Vec<(String, String)>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag_pages(mut self, pages: Vec<Page<TagEntry>>) -> Self {
        self.tag_pages = pages;
        self
    }

    pub fn with_release_pages(mut self, pages: Vec<Page<ReleaseEntry>>) -> Self {
        self.release_pages = pages;
        self
    }

    pub fn with_compare(mut self, compare: CompareResult) -> Self {
        self.compare = compare;
        self
    }

    pub fn with_tag_error(mut self, page: u32, err: ProviderError) -> Self {
        self.tag_errors.insert(page, err);
        self
    }

    pub fn with_release_error(mut self, page: u32, err: ProviderError) -> Self {
        self.release_errors.insert(page, err);
        self
    }

    pub fn with_compare_error(mut self, err: ProviderError) -> Self {
        self.compare_error = Some(err);
        self
    }

    /// Sleep this long before answering any call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Release pages requested so far, in order.
    pub fn release_pages_fetched(&self) -> Vec<u32> {
        self.release_fetches.lock().unwrap().clone()
    }

    /// `(base, head)` of every compare call so far.
    pub fn compare_calls(&self) -> Vec<(String, String)> {
        self.compare_calls.lock().unwrap().clone()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn page<T: Clone>(
        pages: &[Page<T>],
        errors: &HashMap<u32, ProviderError>,
        page: u32,
    ) -> Result<Page<T>, ProviderError> {
        if let Some(err) = errors.get(&page) {
            return Err(err.clone());
        }
        let index = page.saturating_sub(1) as usize;
        Ok(pages
            .get(index)
            .cloned()
            .unwrap_or_else(|| Page::last(Vec::new())))
    }
}

#[async_trait]
impl HostingProvider for FakeProvider {
    async fn list_tags(
        &self,
        _repo: &RepoIdentity,
        page: u32,
    ) -> Result<Page<TagEntry>, ProviderError> {
        self.pause().await;
        Self::page(&self.tag_pages, &self.tag_errors, page)
    }

    async fn list_releases(
        &self,
        _repo: &RepoIdentity,
        page: u32,
    ) -> Result<Page<ReleaseEntry>, ProviderError> {
        self.release_fetches.lock().unwrap().push(page);
        self.pause().await;
        Self::page(&self.release_pages, &self.release_errors, page)
    }

    async fn compare(
        &self,
        _repo: &RepoIdentity,
        base: &str,
        head: &str,
    ) -> Result<CompareResult, ProviderError> {
        self.compare_calls
            .lock()
            .unwrap()
            .push((base.to_string(), head.to_string()));
        self.pause().await;
        match &self.compare_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.compare.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// StaticModel
// ---------------------------------------------------------------------------

/// Model client that returns one canned reply and records prompts.
#[derive(Debug)]
pub struct StaticModel {
    reply: Result<String, ModelError>,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl StaticModel {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: ModelError) -> Self {
        Self {
            reply: Err(err),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for StaticModel {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone()
    }
}

// ---------------------------------------------------------------------------
// RecordingObserver
// ---------------------------------------------------------------------------

/// Observer that keeps every observation in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    upstream: Mutex<Vec<(UpstreamCall, String)>>,
    http: Mutex<Vec<(String, String, u16)>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcome labels recorded for `call`, in order.
    pub fn outcomes(&self, call: UpstreamCall) -> Vec<String> {
        self.upstream
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| *c == call)
            .map(|(_, status)| status.clone())
            .collect()
    }

    /// `(handler, method, status)` of every HTTP request observed.
    pub fn http_requests(&self) -> Vec<(String, String, u16)> {
        self.http.lock().unwrap().clone()
    }
}

impl RequestObserver for RecordingObserver {
    fn observe_upstream(&self, call: UpstreamCall, outcome: &CallOutcome, _elapsed: Duration) {
        self.upstream
            .lock()
            .unwrap()
            .push((call, outcome.label().into_owned()));
    }

    fn observe_http(&self, handler: &str, method: &str, status: u16, _elapsed: Duration) {
        self.http
            .lock()
            .unwrap()
            .push((handler.to_string(), method.to_string(), status));
    }
}
