//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use diffbreak_core::DiffbreakError;
use serde_json::json;

/// Failure of a request handler, rendered as `{"error": "<message>"}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error(transparent)]
    Domain(#[from] DiffbreakError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Domain(err) => StatusCode::from_u16(err.kind().status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    /// Text shown to the caller. Domain failures only ever expose their
    /// kind's fixed message.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Domain(err) => err.kind().public_message().to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.public_message() }))).into_response()
    }
}
