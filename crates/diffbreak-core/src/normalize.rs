//! Validation and normalization of model replies.

use serde_json::Value;

use crate::domain::analysis::{from_object, AnalysisResponse, RiskLevel};
use crate::domain::error::{DiffbreakError, Result};

/// Parse a raw model reply and normalize it.
///
/// Empty input, invalid JSON and JSON of the wrong shape (including an
/// array where an object belongs) all fail with
/// [`DiffbreakError::ModelResponseInvalid`].
pub fn parse_model_reply(raw: &[u8]) -> Result<AnalysisResponse> {
    let trimmed = raw.trim_ascii();
    if trimmed.is_empty() {
        return Err(DiffbreakError::ModelResponseInvalid(
            "empty model response".to_string(),
        ));
    }
    let invalid = |e: serde_json::Error| DiffbreakError::ModelResponseInvalid(e.to_string());
    let value: Value = serde_json::from_slice(trimmed).map_err(invalid)?;
    let response: AnalysisResponse = from_object(value).map_err(invalid)?;
    Ok(normalize(response))
}

/// Clamp the score into `0..=100` and derive the level from it.
///
/// Absent arrays are already empty after deserialization, so this is the
/// only rewrite needed. Idempotent.
pub fn normalize(mut response: AnalysisResponse) -> AnalysisResponse {
    response.risk.score = response.risk.score.clamp(0, 100);
    response.risk.level = RiskLevel::for_score(response.risk.score)
        .as_str()
        .to_string();
    response
}
