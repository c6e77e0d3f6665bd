//! Prompt construction for the analysis model.

use crate::domain::error::{DiffbreakError, Result};
use crate::domain::evidence::EvidenceBundle;

/// Literal description of the reply shape the model must produce.
pub const RESPONSE_SCHEMA: &str = r#"{
  "risk": {
    "level": "low|medium|high",
    "score": 0,
    "confidence": "low|medium|high",
    "reasons": ["string"]
  },
  "summary": {
    "highlights": ["string"],
    "grouped": [{"title": "string", "items": ["string"]}]
  },
  "breakers": [
    {"title": "string", "severity": "low|medium|high", "reason": "string", "evidence": [{"label": "string", "url": "string"}]}
  ],
  "behaviorChanges": [
    {"title": "string", "reason": "string", "evidence": [{"label": "string", "url": "string"}]}
  ],
  "upgradeSteps": [
    {"step": "string", "why": "string", "evidence": [{"label": "string", "url": "string"}]}
  ],
  "evidence": [
    {"label": "string", "url": "string", "kind": "release|pr|compare|commit"}
  ],
  "meta": {
    "repo": {"url": "string"},
    "fromTag": "string",
    "toTag": "string",
    "generatedAt": "RFC3339 timestamp"
  }
}"#;

const INSTRUCTIONS: &str = "\
You are a release risk analyst reviewing a dependency upgrade.
Use only the evidence provided. Score risk from 0 (safe) to 100 (certain breakage).
Respond with ONLY one valid JSON object that matches the schema below.
Do not add keys, comments, markdown fences or any text outside the JSON.";

/// Build the single instruction string sent to the model.
///
/// Deterministic for a given bundle: field order follows the bundle's
/// declaration order and no clock or randomness is involved.
pub fn build_prompt(bundle: &EvidenceBundle) -> Result<String> {
    let evidence = serde_json::to_string(bundle).map_err(DiffbreakError::internal)?;
    Ok(format!(
        "{INSTRUCTIONS}\n\nSchema:\n{RESPONSE_SCHEMA}\n\nUpgrade: {repo} from {from} to {to}\n\nEvidence:\n{evidence}\n",
        repo = bundle.repo,
        from = bundle.from,
        to = bundle.to,
    ))
}
