use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Extension, RawQuery};
use axum::http::{HeaderMap, StatusCode};
use healthgate_auth::{AuthError, AuthOutcome};

use crate::credentials::{self, Transport};
use crate::{error::ApiError, state::AppState};

/// GET /health
/// Credentials come from the query string when it names a credential field,
/// from the `X-Username`/`X-Password` headers otherwise.
pub async fn health(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Result<StatusCode, ApiError> {
    let transport = credentials::select_query_or_header(query.as_deref());
    let extracted = credentials::extract(transport, &headers, query.as_deref(), &[]);
    respond(state.gate(Some(transport), extracted).await)
}

/// POST /post-health
/// Credentials come from a form-encoded or JSON body, chosen by `Content-Type`.
pub async fn post_health(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<StatusCode, ApiError> {
    let (transport, extracted) = match credentials::select_body_transport(&headers) {
        Ok(transport) => (Some(transport), read_body(transport, &headers, body)),
        Err(e) => (None, Err(e)),
    };
    respond(state.gate(transport, extracted).await)
}

// An unreadable or oversized body is a malformed payload like any other.
fn read_body(
    transport: Transport,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<healthgate_auth::Credentials, AuthError> {
    let body = body.map_err(|rejection| {
        tracing::debug!(%rejection, "failed to read request body");
        AuthError::MalformedPayload
    })?;
    credentials::extract(transport, headers, None, &body)
}

/// No checks are registered here, so an authorized request is always healthy.
fn respond(outcome: AuthOutcome) -> Result<StatusCode, ApiError> {
    match outcome {
        AuthOutcome::Authorized(_) => Ok(StatusCode::NO_CONTENT),
        AuthOutcome::Denied(e) => Err(ApiError::from(e)),
    }
}
