//! The analysis output contract.
//!
//! These types deserialize leniently: absent or `null` fields become their
//! empty value, unknown keys are ignored and a fractional score is rounded.
//! Everything else about the shape is strict: every object position,
//! including the root when read through `from_object`, must be a JSON object.

use serde::de::{DeserializeOwned, Error as _, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Risk bucket derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Fixed buckets: `<= 24` low, `25..=59` medium, `>= 60` high.
    pub fn for_score(score: i64) -> Self {
        match score {
            s if s <= 24 => RiskLevel::Low,
            s if s <= 59 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize `value` as `T`, refusing anything but a JSON object.
///
/// Derived struct impls also accept a JSON array positionally; model replies
/// must not.
pub(crate) fn from_object<T: DeserializeOwned>(value: Value) -> Result<T, serde_json::Error> {
    match value {
        Value::Object(_) => serde_json::from_value(value),
        other => Err(serde_json::Error::invalid_type(
            unexpected(&other),
            &"a JSON object",
        )),
    }
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(_) => Unexpected::Other("number"),
        Value::String(s) => Unexpected::Str(s),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
    }
}

fn object_or_null<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(T::default()),
        value => from_object(value).map_err(D::Error::custom),
    }
}

fn objects_or_null<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(from_object)
            .collect::<Result<_, _>>()
            .map_err(D::Error::custom),
        other => Err(D::Error::invalid_type(unexpected(&other), &"an array of objects")),
    }
}

fn lenient_score<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let score = match Option::<serde_json::Number>::deserialize(deserializer)? {
        None => 0,
        Some(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .unwrap_or(0),
    };
    Ok(score)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub level: String,
    #[serde(deserialize_with = "lenient_score")]
    pub score: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub confidence: String,
    #[serde(deserialize_with = "null_as_default")]
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub highlights: Vec<String>,
    #[serde(deserialize_with = "objects_or_null")]
    pub grouped: Vec<GroupedSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupedSummary {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub items: Vec<String>,
}

/// A reference nested under a breaker, behavior change or upgrade step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceLink {
    #[serde(deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Breaker {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    /// Passed through as produced by the model.
    #[serde(deserialize_with = "null_as_default")]
    pub severity: String,
    #[serde(deserialize_with = "null_as_default")]
    pub reason: String,
    #[serde(deserialize_with = "objects_or_null")]
    pub evidence: Vec<EvidenceLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorChange {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub reason: String,
    #[serde(deserialize_with = "objects_or_null")]
    pub evidence: Vec<EvidenceLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeStep {
    #[serde(deserialize_with = "null_as_default")]
    pub step: String,
    #[serde(deserialize_with = "null_as_default")]
    pub why: String,
    #[serde(deserialize_with = "objects_or_null")]
    pub evidence: Vec<EvidenceLink>,
}

/// Top-level evidence entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceItem {
    #[serde(deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoMeta {
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetaInfo {
    #[serde(deserialize_with = "object_or_null")]
    pub repo: RepoMeta,
    #[serde(deserialize_with = "null_as_default")]
    pub from_tag: String,
    #[serde(deserialize_with = "null_as_default")]
    pub to_tag: String,
    #[serde(deserialize_with = "null_as_default")]
    pub generated_at: String,
}

/// Structured analysis result returned to callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisResponse {
    #[serde(deserialize_with = "object_or_null")]
    pub risk: RiskInfo,
    #[serde(deserialize_with = "object_or_null")]
    pub summary: SummaryInfo,
    #[serde(deserialize_with = "objects_or_null")]
    pub breakers: Vec<Breaker>,
    #[serde(deserialize_with = "objects_or_null")]
    pub behavior_changes: Vec<BehaviorChange>,
    #[serde(deserialize_with = "objects_or_null")]
    pub upgrade_steps: Vec<UpgradeStep>,
    #[serde(deserialize_with = "objects_or_null")]
    pub evidence: Vec<EvidenceItem>,
    #[serde(deserialize_with = "object_or_null")]
    pub meta: MetaInfo,
}
