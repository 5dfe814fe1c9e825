use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Extension, Request},
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::{handlers, state::AppState};

/// Default request body limit (64 KiB).
pub const DEFAULT_BODY_LIMIT: usize = 64 * 1024;

/// Build the primary axum router with the provided shared application state.
pub fn build_router(state: Arc<AppState>) -> Router {
    build_router_with_body_limit(state, DEFAULT_BODY_LIMIT)
}

pub fn build_router_with_body_limit(state: Arc<AppState>, body_limit: usize) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/post-health", post(handlers::health::post_health))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(Extension(state))
}

// Path only: the query string may carry credentials.
fn request_span(request: &Request) -> Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        version = ?request.version(),
    )
}
