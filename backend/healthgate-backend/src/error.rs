use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Top-level API error shared by all route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Every denial reason shares one response so callers cannot tell them apart.
    #[error("not authorized: {0}")]
    Forbidden(#[from] healthgate_auth::AuthError),
    #[error("not found: {0}")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "not authorized".to_string()),
            ApiError::NotFound(path) => (StatusCode::NOT_FOUND, format!("no route for {path}")),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}
