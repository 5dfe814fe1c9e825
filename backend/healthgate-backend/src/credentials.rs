//! Pulls a credential pair out of exactly one request transport.
//!
//! Transports are never merged: once a transport is chosen for a request,
//! credentials present anywhere else in that request are ignored.

use axum::http::{header::CONTENT_TYPE, HeaderMap};
use healthgate_auth::{AuthError, Credentials, PASSWORD_FIELD, USERNAME_FIELD};
use serde_json::Value;

const MEDIA_JSON: &str = "application/json";
const MEDIA_FORM: &str = "application/x-www-form-urlencoded";

/// Request location credentials are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Header,
    Query,
    Form,
    Json,
}

impl Transport {
    pub fn as_label(&self) -> &'static str {
        match self {
            Transport::Header => "header",
            Transport::Query => "query",
            Transport::Form => "form",
            Transport::Json => "json",
        }
    }
}

/// Transport for a bodiless request: the query string when it names either
/// credential field, the headers otherwise.
pub fn select_query_or_header(query: Option<&str>) -> Transport {
    let names_field = query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .any(|(k, _)| k == USERNAME_FIELD || k == PASSWORD_FIELD)
        })
        .unwrap_or(false);
    if names_field {
        Transport::Query
    } else {
        Transport::Header
    }
}

/// Transport for a request body, decided by the declared media type alone.
///
/// A missing or unrecognised content type refuses extraction outright, even
/// if the body would parse.
pub fn select_body_transport(headers: &HeaderMap) -> Result<Transport, AuthError> {
    match media_type(headers).as_deref() {
        Some(MEDIA_JSON) => Ok(Transport::Json),
        Some(MEDIA_FORM) => Ok(Transport::Form),
        _ => Err(AuthError::UnsupportedContentType),
    }
}

/// Lower-cased media type of the request, without parameters.
fn media_type(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let essence = raw.split(';').next().unwrap_or_default().trim();
    if essence.is_empty() {
        None
    } else {
        Some(essence.to_ascii_lowercase())
    }
}

/// Read credentials from the selected transport only.
pub fn extract(
    transport: Transport,
    headers: &HeaderMap,
    query: Option<&str>,
    body: &[u8],
) -> Result<Credentials, AuthError> {
    match transport {
        Transport::Header => Ok(from_headers(headers)),
        Transport::Query => Ok(from_query(query.unwrap_or_default())),
        Transport::Form => Ok(from_form(body)),
        Transport::Json => from_json(body),
    }
}

/// Non UTF-8 header values count as absent.
pub fn from_headers(headers: &HeaderMap) -> Credentials {
    let read = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    Credentials::from_parts(read(USERNAME_FIELD), read(PASSWORD_FIELD))
}

pub fn from_query(query: &str) -> Credentials {
    from_urlencoded(query.as_bytes())
}

pub fn from_form(body: &[u8]) -> Credentials {
    from_urlencoded(body)
}

// First occurrence wins when a field is repeated.
fn from_urlencoded(input: &[u8]) -> Credentials {
    let mut username = None;
    let mut password = None;
    for (key, value) in url::form_urlencoded::parse(input) {
        if key == USERNAME_FIELD && username.is_none() {
            username = Some(value.into_owned());
        } else if key == PASSWORD_FIELD && password.is_none() {
            password = Some(value.into_owned());
        }
    }
    Credentials::from_parts(username, password)
}

/// Parse a JSON object body. Non-string values for the credential keys are
/// treated as absent.
pub fn from_json(body: &[u8]) -> Result<Credentials, AuthError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AuthError::MissingCredential);
    }
    let value: Value = serde_json::from_slice(body).map_err(|_| AuthError::MalformedPayload)?;
    let object = value.as_object().ok_or(AuthError::MalformedPayload)?;
    let read = |name: &str| object.get(name).and_then(Value::as_str).map(str::to_owned);
    Ok(Credentials::from_parts(
        read(USERNAME_FIELD),
        read(PASSWORD_FIELD),
    ))
}
