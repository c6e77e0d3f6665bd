//! Structured observability hooks for diffbreak request lifecycle events.
//!
//! This module provides:
//! - Request-scoped tracing spans via [`RequestSpan`]
//! - Emission functions for key lifecycle events: detect, analysis start,
//!   completion and failure, and individual upstream calls
//!
//! Events are emitted at `info!` level (upstream calls at `debug!`), so the
//! usual `RUST_LOG` filter applies.

use std::future::Future;
use std::time::Duration;

use tracing::instrument::Instrumented;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use crate::domain::error::ErrorKind;
use crate::domain::evidence::AnalysisMode;
use crate::domain::repo::RepoIdentity;
use crate::metrics::{CallOutcome, UpstreamCall};

/// Span that tags every event of one request with a fresh `request_id`.
///
/// Use [`RequestSpan::instrument`] for async work; the span is never held
/// entered across an `.await`.
///
/// # Example
///
/// ```ignore
/// let span = RequestSpan::new("analyze");
/// let result = span.instrument(analyzer.analyze(&request)).await;
/// ```
#[derive(Debug, Clone)]
pub struct RequestSpan {
    request_id: Uuid,
    span: tracing::Span,
}

impl RequestSpan {
    pub fn new(handler: &str) -> Self {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("diffbreak.request", request_id = %request_id, handler = %handler);
        Self { request_id, span }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    pub fn instrument<F: Future>(self, future: F) -> Instrumented<F> {
        future.instrument(self.span)
    }
}

/// Emit event: analysis accepted and about to hit upstream.
pub fn emit_analysis_started(
    repo: &RepoIdentity,
    from: &str,
    to: &str,
    mode: AnalysisMode,
    max_releases: usize,
) {
    info!(
        event = "analysis.started",
        repo = %repo,
        from_tag = %from,
        to_tag = %to,
        mode = %mode,
        max_releases = max_releases,
    );
}

/// Counts describing one finished analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisStats {
    pub risk_score: i64,
    pub release_notes: usize,
    pub commit_titles: usize,
    pub changed_files: Option<usize>,
}

/// Emit event: analysis finished with risk and evidence sizes.
pub fn emit_analysis_completed(
    repo: &RepoIdentity,
    risk_level: &str,
    stats: AnalysisStats,
    elapsed: Duration,
) {
    info!(
        event = "analysis.completed",
        repo = %repo,
        risk_score = stats.risk_score,
        risk_level = %risk_level,
        release_notes = stats.release_notes,
        commit_titles = stats.commit_titles,
        changed_files = stats.changed_files,
        duration_ms = elapsed.as_millis() as u64,
    );
}

/// Emit event: analysis failed (warning level).
pub fn emit_analysis_failed(repo_url: &str, kind: ErrorKind, error: &dyn std::fmt::Display) {
    warn!(
        event = "analysis.failed",
        repo_url = %repo_url,
        kind = %kind,
        error = %error,
    );
}

/// Emit event: tag listing finished.
pub fn emit_detect_completed(repo: &RepoIdentity, tag_count: usize, elapsed: Duration) {
    info!(
        event = "detect.completed",
        repo = %repo,
        tag_count = tag_count,
        duration_ms = elapsed.as_millis() as u64,
    );
}

/// Emit event: tag listing failed (warning level).
pub fn emit_detect_failed(repo_url: &str, kind: ErrorKind, error: &dyn std::fmt::Display) {
    warn!(
        event = "detect.failed",
        repo_url = %repo_url,
        kind = %kind,
        error = %error,
    );
}

/// Emit event: one provider or model call finished.
pub fn emit_upstream_call(call: UpstreamCall, outcome: &CallOutcome, elapsed: Duration) {
    debug!(
        event = "upstream.call",
        operation = call.operation(),
        status = %outcome.label(),
        duration_ms = elapsed.as_millis() as u64,
    );
}
