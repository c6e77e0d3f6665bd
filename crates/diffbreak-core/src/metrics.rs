//! Request counters and latency totals for diffbreak observability.
//!
//! Components never touch a global: they receive an `&dyn RequestObserver`
//! and report each upstream call through a [`CallTimer`]. The daemon owns one
//! [`Metrics`] value, renders it on `/metrics` and can [`Metrics::flush`] a
//! snapshot to the log.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::domain::error::{DiffbreakError, ErrorKind};

/// An outbound call made on behalf of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UpstreamCall {
    ListTags,
    ListReleases,
    CompareCommits,
    Generate,
}

impl UpstreamCall {
    pub fn operation(self) -> &'static str {
        match self {
            UpstreamCall::ListTags => "list_tags",
            UpstreamCall::ListReleases => "list_releases",
            UpstreamCall::CompareCommits => "compare_commits",
            UpstreamCall::Generate => "generate",
        }
    }

    /// `true` for calls to the model service rather than the hosting provider.
    pub fn is_model(self) -> bool {
        matches!(self, UpstreamCall::Generate)
    }
}

/// How an upstream call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    Ok,
    NotFound,
    RateLimited,
    Timeout,
    DecodeError,
    /// Non-success HTTP status from the model service.
    Status(u16),
    Error,
}

impl CallOutcome {
    pub fn label(&self) -> Cow<'static, str> {
        match self {
            CallOutcome::Ok => Cow::Borrowed("ok"),
            CallOutcome::NotFound => Cow::Borrowed("not_found"),
            CallOutcome::RateLimited => Cow::Borrowed("rate_limited"),
            CallOutcome::Timeout => Cow::Borrowed("timeout"),
            CallOutcome::DecodeError => Cow::Borrowed("decode_error"),
            CallOutcome::Status(code) => Cow::Owned(code.to_string()),
            CallOutcome::Error => Cow::Borrowed("error"),
        }
    }

    pub fn from_result<T>(result: &Result<T, DiffbreakError>) -> Self {
        match result {
            Ok(_) => CallOutcome::Ok,
            Err(err) => match err.kind() {
                ErrorKind::RepoNotFound => CallOutcome::NotFound,
                ErrorKind::RateLimited => CallOutcome::RateLimited,
                ErrorKind::TimedOut => CallOutcome::Timeout,
                _ => CallOutcome::Error,
            },
        }
    }
}

/// Collaborator that receives every outcome worth counting.
pub trait RequestObserver: Send + Sync {
    fn observe_upstream(&self, call: UpstreamCall, outcome: &CallOutcome, elapsed: Duration);

    fn observe_http(&self, handler: &str, method: &str, status: u16, elapsed: Duration);
}

/// Observer that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RequestObserver for NoopObserver {
    fn observe_upstream(&self, _: UpstreamCall, _: &CallOutcome, _: Duration) {}

    fn observe_http(&self, _: &str, _: &str, _: u16, _: Duration) {}
}

/// Times one upstream call.
///
/// Call [`CallTimer::finish`] with the outcome. A timer dropped without
/// finishing means the call's future was cancelled by a deadline, and it is
/// recorded as [`CallOutcome::Timeout`].
pub struct CallTimer<'a> {
    observer: &'a dyn RequestObserver,
    call: UpstreamCall,
    started: Instant,
    finished: bool,
}

impl<'a> CallTimer<'a> {
    pub fn start(observer: &'a dyn RequestObserver, call: UpstreamCall) -> Self {
        Self {
            observer,
            call,
            started: Instant::now(),
            finished: false,
        }
    }

    pub fn finish(mut self, outcome: CallOutcome) {
        self.record(&outcome);
    }

    fn record(&mut self, outcome: &CallOutcome) {
        self.finished = true;
        let elapsed = self.started.elapsed();
        crate::obs::emit_upstream_call(self.call, outcome, elapsed);
        self.observer.observe_upstream(self.call, outcome, elapsed);
    }
}

impl Drop for CallTimer<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.record(&CallOutcome::Timeout);
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Sample {
    count: u64,
    micros: u64,
}

impl Sample {
    fn add(&mut self, elapsed: Duration) {
        self.count += 1;
        self.micros = self
            .micros
            .saturating_add(u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX));
    }

    fn seconds(&self) -> f64 {
        self.micros as f64 / 1_000_000.0
    }
}

type HttpKey = (String, String, u16);
type GitHubKey = (&'static str, String);

/// Process-wide counters, safe under concurrent increment.
#[derive(Default)]
pub struct Metrics {
    http: Mutex<BTreeMap<HttpKey, Sample>>,
    github: Mutex<BTreeMap<GitHubKey, Sample>>,
    ollama: Mutex<BTreeMap<String, Sample>>,
}

fn locked<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn total<K>(m: &Mutex<BTreeMap<K, Sample>>) -> u64 {
    locked(m).values().map(|s| s.count).sum()
}

impl RequestObserver for Metrics {
    fn observe_upstream(&self, call: UpstreamCall, outcome: &CallOutcome, elapsed: Duration) {
        let status = outcome.label().into_owned();
        if call.is_model() {
            locked(&self.ollama).entry(status).or_default().add(elapsed);
        } else {
            locked(&self.github)
                .entry((call.operation(), status))
                .or_default()
                .add(elapsed);
        }
        tracing::trace!(metric = call.operation(), "counter incremented");
    }

    fn observe_http(&self, handler: &str, method: &str, status: u16, elapsed: Duration) {
        locked(&self.http)
            .entry((handler.to_string(), method.to_string(), status))
            .or_default()
            .add(elapsed);
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            http: Mutex::new(BTreeMap::new()),
            github: Mutex::new(BTreeMap::new()),
            ollama: Mutex::new(BTreeMap::new()),
        }
    }

    /// Number of provider or model calls recorded with `status`.
    pub fn upstream_count(&self, call: UpstreamCall, status: &str) -> u64 {
        if call.is_model() {
            locked(&self.ollama).get(status).map_or(0, |s| s.count)
        } else {
            locked(&self.github)
                .get(&(call.operation(), status.to_string()))
                .map_or(0, |s| s.count)
        }
    }

    /// Number of HTTP requests recorded for `handler`/`method`/`status`.
    pub fn http_count(&self, handler: &str, method: &str, status: u16) -> u64 {
        locked(&self.http)
            .get(&(handler.to_string(), method.to_string(), status))
            .map_or(0, |s| s.count)
    }

    /// Emit totals as a single `info!` event.
    ///
    /// Call this at natural boundaries (shutdown, end of a CLI run) rather
    /// than on every increment.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            http_requests = total(&self.http),
            github_requests = total(&self.github),
            ollama_requests = total(&self.ollama),
        );
    }

    /// Render every series in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut out = String::new();

        let http = locked(&self.http);
        let rows: Vec<_> = http
            .iter()
            .map(|((handler, method, status), sample)| {
                let labels = format!(
                    "handler=\"{}\",method=\"{}\",status=\"{}\"",
                    escape(handler),
                    escape(method),
                    status
                );
                (labels, *sample)
            })
            .collect();
        drop(http);
        write_family(
            &mut out,
            "http_requests",
            "Total number of HTTP requests received",
            "HTTP request latency in seconds",
            &rows,
        );

        let github = locked(&self.github);
        let rows: Vec<_> = github
            .iter()
            .map(|((operation, status), sample)| {
                let labels = format!("operation=\"{}\",status=\"{}\"", operation, escape(status));
                (labels, *sample)
            })
            .collect();
        drop(github);
        write_family(
            &mut out,
            "github_requests",
            "Total number of GitHub API requests",
            "GitHub API request latency in seconds",
            &rows,
        );

        let ollama = locked(&self.ollama);
        let rows: Vec<_> = ollama
            .iter()
            .map(|(status, sample)| (format!("status=\"{}\"", escape(status)), *sample))
            .collect();
        drop(ollama);
        write_family(
            &mut out,
            "ollama_requests",
            "Total number of Ollama API requests",
            "Ollama API request latency in seconds",
            &rows,
        );

        out
    }

    /// Reset all series (useful in tests).
    pub fn reset(&self) {
        locked(&self.http).clear();
        locked(&self.github).clear();
        locked(&self.ollama).clear();
    }
}

fn escape(value: &str) -> Cow<'_, str> {
    if value.contains(['\\', '"', '\n']) {
        Cow::Owned(
            value
                .replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\n', "\\n"),
        )
    } else {
        Cow::Borrowed(value)
    }
}

fn write_family(
    out: &mut String,
    prefix: &str,
    count_help: &str,
    duration_help: &str,
    rows: &[(String, Sample)],
) {
    let duration = prefix.replace("requests", "request_duration_seconds");

    let _ = writeln!(out, "# HELP {prefix}_total {count_help}");
    let _ = writeln!(out, "# TYPE {prefix}_total counter");
    for (labels, sample) in rows {
        let _ = writeln!(out, "{prefix}_total{{{labels}}} {}", sample.count);
    }

    let _ = writeln!(out, "# HELP {duration} {duration_help}");
    let _ = writeln!(out, "# TYPE {duration} summary");
    for (labels, sample) in rows {
        let _ = writeln!(out, "{duration}_sum{{{labels}}} {}", sample.seconds());
        let _ = writeln!(out, "{duration}_count{{{labels}}} {}", sample.count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment_per_label() {
        let m = Metrics::new();
        m.observe_upstream(UpstreamCall::ListTags, &CallOutcome::Ok, Duration::from_millis(5));
        m.observe_upstream(UpstreamCall::ListTags, &CallOutcome::Ok, Duration::from_millis(5));
        m.observe_upstream(
            UpstreamCall::ListTags,
            &CallOutcome::RateLimited,
            Duration::from_millis(1),
        );
        m.observe_upstream(UpstreamCall::Generate, &CallOutcome::Status(500), Duration::ZERO);

        assert_eq!(m.upstream_count(UpstreamCall::ListTags, "ok"), 2);
        assert_eq!(m.upstream_count(UpstreamCall::ListTags, "rate_limited"), 1);
        assert_eq!(m.upstream_count(UpstreamCall::ListReleases, "ok"), 0);
        assert_eq!(m.upstream_count(UpstreamCall::Generate, "500"), 1);
    }

    #[test]
    fn dropped_timer_records_timeout() {
        let m = Metrics::new();
        {
            let _timer = CallTimer::start(&m, UpstreamCall::CompareCommits);
        }
        CallTimer::start(&m, UpstreamCall::CompareCommits).finish(CallOutcome::Ok);

        assert_eq!(m.upstream_count(UpstreamCall::CompareCommits, "timeout"), 1);
        assert_eq!(m.upstream_count(UpstreamCall::CompareCommits, "ok"), 1);
    }

    #[test]
    fn outcome_from_result_follows_error_kind() {
        let not_found: Result<(), _> = Err(DiffbreakError::RepoNotFound);
        let limited: Result<(), _> = Err(DiffbreakError::RateLimited);
        let other: Result<(), _> = Err(DiffbreakError::internal("boom"));
        assert_eq!(CallOutcome::from_result(&Ok::<_, DiffbreakError>(())), CallOutcome::Ok);
        assert_eq!(CallOutcome::from_result(&not_found), CallOutcome::NotFound);
        assert_eq!(CallOutcome::from_result(&limited), CallOutcome::RateLimited);
        assert_eq!(CallOutcome::from_result(&other), CallOutcome::Error);
    }

    #[test]
    fn render_emits_prometheus_text() {
        let m = Metrics::new();
        m.observe_http("detect", "GET", 200, Duration::from_millis(250));
        m.observe_upstream(UpstreamCall::ListTags, &CallOutcome::Ok, Duration::from_millis(100));
        m.observe_upstream(UpstreamCall::Generate, &CallOutcome::Ok, Duration::from_secs(2));

        let text = m.render();
        assert!(text.contains("# TYPE http_requests_total counter"));
        assert!(text.contains("http_requests_total{handler=\"detect\",method=\"GET\",status=\"200\"} 1"));
        assert!(text.contains("http_request_duration_seconds_sum{handler=\"detect\",method=\"GET\",status=\"200\"} 0.25"));
        assert!(text.contains("github_requests_total{operation=\"list_tags\",status=\"ok\"} 1"));
        assert!(text.contains("ollama_requests_total{status=\"ok\"} 1"));
        assert!(text.contains("ollama_request_duration_seconds_count{status=\"ok\"} 1"));
    }

    #[tracing_test::traced_test]
    #[test]
    fn flush_logs_totals_per_family() {
        let m = Metrics::new();
        m.observe_http("detect", "GET", 200, Duration::ZERO);
        m.observe_http("analyze", "POST", 502, Duration::ZERO);
        m.observe_upstream(UpstreamCall::ListReleases, &CallOutcome::Ok, Duration::ZERO);
        m.observe_upstream(UpstreamCall::Generate, &CallOutcome::DecodeError, Duration::ZERO);

        m.flush();

        assert!(logs_contain("http_requests=2"));
        assert!(logs_contain("github_requests=1"));
        assert!(logs_contain("ollama_requests=1"));
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.observe_http("analyze", "POST", 504, Duration::ZERO);
        m.reset();
        assert_eq!(m.http_count("analyze", "POST", 504), 0);
        assert!(!m.render().contains("analyze"));
    }
}
