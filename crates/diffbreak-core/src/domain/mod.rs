//! Domain models for diffbreak.
//!
//! Canonical definitions for the request-scoped entities:
//! - `RepoIdentity`: owner/name resolved from a repository URL
//! - `EvidenceBundle`: release notes, commit titles and changed files for a tag window
//! - `AnalysisResponse`: the normalized output contract
//! - `DiffbreakError`: the closed error taxonomy

pub mod analysis;
pub mod error;
pub mod evidence;
pub mod repo;
pub mod request;

pub use analysis::{
    AnalysisResponse, BehaviorChange, Breaker, EvidenceItem, EvidenceLink, GroupedSummary,
    MetaInfo, RepoMeta, RiskInfo, RiskLevel, SummaryInfo, UpgradeStep,
};
pub use error::{DiffbreakError, ErrorKind, Result};
pub use evidence::{AnalysisMode, ComparisonData, EvidenceBundle, ReleaseNote};
pub use repo::{RepoIdentity, PROVIDER_HOST, PROVIDER_NAME};
pub use request::{
    clamp_max_releases, AnalyzeLimits, AnalyzeRequest, DetectResponse, RepoInfo, RequestError,
    ValidatedRequest,
};
