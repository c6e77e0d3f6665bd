//! The two produced operations: detect and analyze.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use tokio::time::timeout;

use crate::compare::fetch_comparison_data;
use crate::domain::analysis::{AnalysisResponse, MetaInfo, RepoMeta};
use crate::domain::error::Result;
use crate::domain::evidence::EvidenceBundle;
use crate::domain::repo::RepoIdentity;
use crate::domain::request::{DetectResponse, ValidatedRequest};
use crate::github::HostingProvider;
use crate::metrics::{CallOutcome, CallTimer, RequestObserver, UpstreamCall};
use crate::model::ModelClient;
use crate::normalize::parse_model_reply;
use crate::obs::{self, AnalysisStats};
use crate::prompt::build_prompt;
use crate::tags::list_tags;

/// Upper bounds on each top-level operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadlines {
    pub detect: Duration,
    pub analyze: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            detect: Duration::from_secs(10),
            analyze: Duration::from_secs(60),
        }
    }
}

/// Runs detect and analyze against injected collaborators.
///
/// Cheap to clone; share one per process.
#[derive(Clone)]
pub struct Analyzer {
    provider: Arc<dyn HostingProvider>,
    model: Arc<dyn ModelClient>,
    observer: Arc<dyn RequestObserver>,
    deadlines: Deadlines,
}

impl Analyzer {
    pub fn new(
        provider: Arc<dyn HostingProvider>,
        model: Arc<dyn ModelClient>,
        observer: Arc<dyn RequestObserver>,
    ) -> Self {
        Self {
            provider,
            model,
            observer,
            deadlines: Deadlines::default(),
        }
    }

    pub fn with_deadlines(mut self, deadlines: Deadlines) -> Self {
        self.deadlines = deadlines;
        self
    }

    pub fn deadlines(&self) -> Deadlines {
        self.deadlines
    }

    /// Resolve `repo_url` and list its tags within the detect deadline.
    pub async fn detect(&self, repo_url: &str) -> Result<DetectResponse> {
        let started = Instant::now();
        let url = repo_url.trim();
        let result = self.run_detect(url).await;
        match &result {
            Ok(resp) => {
                let repo = RepoIdentity::new(&resp.repo.owner, &resp.repo.name);
                obs::emit_detect_completed(&repo, resp.tags.len(), started.elapsed());
            }
            Err(err) => obs::emit_detect_failed(url, err.kind(), err),
        }
        result
    }

    async fn run_detect(&self, url: &str) -> Result<DetectResponse> {
        let repo = RepoIdentity::parse(url)?;
        let tags = timeout(
            self.deadlines.detect,
            list_tags(self.provider.as_ref(), &repo, self.observer.as_ref()),
        )
        .await??;
        Ok(DetectResponse::new(url, &repo, tags))
    }

    /// Aggregate, prompt, generate and normalize within the analyze deadline.
    ///
    /// The returned `meta` always describes this request; whatever the model
    /// put there is replaced.
    pub async fn analyze(&self, request: &ValidatedRequest) -> Result<AnalysisResponse> {
        let started = Instant::now();
        let result = self.run_analyze(request, started).await;
        if let Err(err) = &result {
            obs::emit_analysis_failed(&request.repo_url, err.kind(), err);
        }
        result
    }

    async fn run_analyze(
        &self,
        request: &ValidatedRequest,
        started: Instant,
    ) -> Result<AnalysisResponse> {
        let repo = RepoIdentity::parse(&request.repo_url)?;
        obs::emit_analysis_started(
            &repo,
            &request.from_tag,
            &request.to_tag,
            request.mode,
            request.max_releases,
        );

        let (mut response, stats) =
            timeout(self.deadlines.analyze, self.generate_analysis(&repo, request)).await??;

        response.meta = MetaInfo {
            repo: RepoMeta {
                url: request.repo_url.clone(),
            },
            from_tag: request.from_tag.clone(),
            to_tag: request.to_tag.clone(),
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        };

        obs::emit_analysis_completed(&repo, &response.risk.level, stats, started.elapsed());
        Ok(response)
    }

    async fn generate_analysis(
        &self,
        repo: &RepoIdentity,
        request: &ValidatedRequest,
    ) -> Result<(AnalysisResponse, AnalysisStats)> {
        let data = fetch_comparison_data(
            self.provider.as_ref(),
            repo,
            &request.from_tag,
            &request.to_tag,
            request.max_releases,
            request.mode,
            self.observer.as_ref(),
        )
        .await?;

        let bundle = EvidenceBundle::new(&request.repo_url, &request.from_tag, &request.to_tag, data);
        let prompt = build_prompt(&bundle)?;

        let timer = CallTimer::start(self.observer.as_ref(), UpstreamCall::Generate);
        let reply = self.model.generate(&prompt).await;
        timer.finish(match &reply {
            Ok(_) => CallOutcome::Ok,
            Err(err) => err.outcome(),
        });

        let response = parse_model_reply(reply?.as_bytes())?;
        let stats = AnalysisStats {
            risk_score: response.risk.score,
            release_notes: bundle.release_notes.len(),
            commit_titles: bundle.commit_titles.len(),
            changed_files: bundle.changed_files.as_ref().map(Vec::len),
        };
        Ok((response, stats))
    }
}
