//! Per-request accounting for the API routes.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use diffbreak_core::RequestObserver;
use tracing::info;

use crate::AppState;

/// Handler label for a matched route template.
pub fn handler_name(route: &str) -> &'static str {
    match route {
        "/detect" => "detect",
        "/api/analyze" => "analyze",
        _ => "other",
    }
}

/// Record `http_requests_total` and log one line per finished request.
pub async fn track_requests(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let handler = request
        .extensions()
        .get::<MatchedPath>()
        .map(|m| handler_name(m.as_str()))
        .unwrap_or_else(|| handler_name(&path));

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let elapsed = started.elapsed();
    state.metrics.observe_http(handler, &method, status, elapsed);
    info!(
        handler,
        method = %method,
        path = %path,
        status,
        duration_ms = elapsed.as_millis() as u64,
        "request completed"
    );
    response
}
