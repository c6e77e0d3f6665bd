//! diffbreakd: HTTP front end for diffbreak.
//!
//! Routes:
//! - `GET /detect?repo=<url>`: tags and suggested comparison endpoints
//! - `POST /api/analyze`: upgrade-risk analysis between two tags
//! - `GET /metrics`: Prometheus text exposition
//! - `GET /health`: liveness

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use diffbreak_core::{Analyzer, GitHubClient, Metrics, OllamaClient};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;

pub use error::ApiError;

/// Shared state handed to every handler.
pub struct AppState {
    pub analyzer: Analyzer,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(analyzer: Analyzer, metrics: Arc<Metrics>) -> Self {
        Self { analyzer, metrics }
    }

    /// Wire the real GitHub and Ollama clients from process configuration.
    pub fn from_config(config: &Config, metrics: Arc<Metrics>) -> Result<Self> {
        let github = GitHubClient::new(config.github_api.clone(), config.github_token.clone())
            .context("failed to build GitHub client")?;
        let model =
            OllamaClient::new(config.model_config()).context("failed to build model client")?;
        let analyzer = Analyzer::new(Arc::new(github), Arc::new(model), metrics.clone())
            .with_deadlines(config.deadlines());
        Ok(Self::new(analyzer, metrics))
    }
}

/// Build the service router. Only `allowed_origin` is echoed by CORS.
pub fn router(state: Arc<AppState>, allowed_origin: &str) -> Result<Router> {
    let origin = HeaderValue::from_str(allowed_origin.trim())
        .with_context(|| format!("invalid allowed origin: {allowed_origin}"))?;
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(86400));

    let api = Router::new()
        .route("/detect", get(routes::detect))
        .route(
            "/api/analyze",
            post(routes::analyze).fallback(routes::method_not_allowed),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::track_requests,
        ));

    let ops = Router::new()
        .route("/health", get(routes::health))
        .route("/metrics", get(routes::metrics));

    Ok(api
        .merge(ops)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state))
}
