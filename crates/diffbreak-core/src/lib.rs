//! diffbreak Core Library
//!
//! Upgrade-risk analysis between two tags of a GitHub repository: resolve
//! the repository, gather release notes and the commit delta, ask a local
//! model for a structured verdict and normalize what it returns.

pub mod compare;
pub mod domain;
pub mod fakes;
pub mod github;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod obs;
pub mod pipeline;
pub mod prompt;
pub mod tags;
pub mod telemetry;

pub use domain::{
    clamp_max_releases, AnalysisMode, AnalysisResponse, AnalyzeLimits, AnalyzeRequest,
    BehaviorChange, Breaker, ComparisonData, DetectResponse, DiffbreakError, ErrorKind,
    EvidenceBundle, EvidenceItem, EvidenceLink, GroupedSummary, MetaInfo, ReleaseNote, RepoInfo,
    RepoIdentity, RepoMeta, RequestError, Result, RiskInfo, RiskLevel, SummaryInfo, UpgradeStep,
    ValidatedRequest,
};

pub use github::{GitHubClient, HostingProvider, ProviderError};

pub use metrics::{CallOutcome, CallTimer, Metrics, NoopObserver, RequestObserver, UpstreamCall};

pub use model::{ModelClient, ModelConfig, ModelError, OllamaClient};

pub use normalize::{normalize, parse_model_reply};

pub use obs::{
    emit_analysis_completed, emit_analysis_failed, emit_analysis_started, emit_detect_completed,
    emit_detect_failed, emit_upstream_call, AnalysisStats, RequestSpan,
};

pub use pipeline::{Analyzer, Deadlines};

pub use prompt::build_prompt;

pub use telemetry::{init_tracing, LogFormat};

/// Crate version, reported by the binaries.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
