//! Evidence gathered from the provider and handed to the model.

use serde::{Deserialize, Serialize};

/// Maximum number of characters kept from a single release body.
pub const MAX_RELEASE_BODY_CHARS: usize = 5000;

/// How much evidence to collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Release notes and plain commit titles.
    Fast,
    /// Adds hash-prefixed commit titles and the changed file list.
    Deep,
}

impl AnalysisMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisMode::Fast => "fast",
            AnalysisMode::Deep => "deep",
        }
    }
}

impl std::str::FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fast" => Ok(AnalysisMode::Fast),
            "deep" => Ok(AnalysisMode::Deep),
            other => Err(format!("unknown mode '{other}', expected 'fast' or 'deep'")),
        }
    }
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Release notes for one tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseNote {
    pub tag: String,
    pub body: String,
}

impl ReleaseNote {
    /// Build a note, cutting the body to [`MAX_RELEASE_BODY_CHARS`] characters.
    pub fn new(tag: impl Into<String>, body: &str) -> Self {
        let body = match body.char_indices().nth(MAX_RELEASE_BODY_CHARS) {
            Some((cut, _)) => &body[..cut],
            None => body,
        };
        Self {
            tag: tag.into(),
            body: body.to_string(),
        }
    }
}

/// Output of the comparison aggregator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonData {
    pub release_notes: Vec<ReleaseNote>,
    pub commit_titles: Vec<String>,
    /// `Some` in deep mode (possibly empty), `None` in fast mode.
    pub changed_files: Option<Vec<String>>,
}

/// The bounded, serializable summary of upstream data handed to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceBundle {
    pub repo: String,
    pub from: String,
    pub to: String,
    pub release_notes: Vec<ReleaseNote>,
    pub commit_titles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_files: Option<Vec<String>>,
}

impl EvidenceBundle {
    pub fn new(repo: &str, from: &str, to: &str, data: ComparisonData) -> Self {
        Self {
            repo: repo.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            release_notes: data.release_notes,
            commit_titles: data.commit_titles,
            changed_files: data.changed_files,
        }
    }
}
