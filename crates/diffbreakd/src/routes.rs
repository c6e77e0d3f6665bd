//! Request handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Json};
use diffbreak_core::{AnalysisResponse, AnalyzeRequest, DetectResponse, RequestSpan};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DetectParams {
    pub repo: Option<String>,
}

pub async fn detect(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DetectParams>,
) -> Result<Json<DetectResponse>, ApiError> {
    let repo = params
        .repo
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing repo parameter".into()))?;

    let span = RequestSpan::new("detect");
    let resp = span.instrument(state.analyzer.detect(&repo)).await?;
    Ok(Json(resp))
}

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let request: AnalyzeRequest = serde_json::from_slice(&body)
        .map_err(|_| ApiError::BadRequest("invalid JSON body".into()))?;
    let validated = request
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let span = RequestSpan::new("analyze");
    let resp = span.instrument(state.analyzer.analyze(&validated)).await?;
    Ok(Json(resp))
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "diffbreak"
    }))
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
