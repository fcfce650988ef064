//! Conversion of server requests into the standard envelope.

use std::collections::BTreeMap;

use http::{HeaderMap, StatusCode};
use omni_core::{empty_body, Body, Headers, OmniError, ServerRequest};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default maximum accepted request body, in bytes.
pub const DEFAULT_BODY_LIMIT: usize = 100 * 1024;

/// Reasons a request body is rejected before reaching the handler.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("request body of {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl BodyError {
    /// Status answered for this rejection.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidJson(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<BodyError> for OmniError {
    fn from(err: BodyError) -> Self {
        OmniError::BadRequest(err.to_string())
    }
}

/// Path parameters extracted by the host's router.
///
/// Insert into the request extensions before dispatching; the adapter
/// exposes them in [`ServerMetadata::params`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(pub BTreeMap<String, String>);

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Request context exposed in the server metadata slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMetadata {
    /// HTTP method.
    pub method: String,
    /// Request path, without the query string.
    pub path: String,
    /// Decoded query parameters. Repeated keys keep every value in order.
    #[serde(default)]
    pub query: BTreeMap<String, Vec<String>>,
    /// HTTP version, e.g. `HTTP/1.1`.
    pub version: String,
    /// Path parameters from [`PathParams`].
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl ServerMetadata {
    /// Collect metadata from a request.
    pub fn from_request(request: &ServerRequest) -> Self {
        let mut query: BTreeMap<String, Vec<String>> = BTreeMap::new();
        if let Some(raw) = request.uri().query() {
            for (key, value) in url::form_urlencoded::parse(raw.as_bytes()).into_owned() {
                query.entry(key).or_default().push(value);
            }
        }

        let params = request
            .extensions()
            .get::<PathParams>()
            .map(|p| p.0.clone())
            .unwrap_or_default();

        Self {
            method: request.method().as_str().to_string(),
            path: request.uri().path().to_string(),
            query,
            version: format!("{:?}", request.version()),
            params,
        }
    }
}

/// Parse a request body.
///
/// Only JSON content is parsed; requests without a content type are treated
/// as JSON. Empty and non-JSON bodies become an empty object.
pub fn parse_body(request: &ServerRequest, limit: usize) -> Result<Body, BodyError> {
    let bytes = request.body();
    if bytes.len() > limit {
        return Err(BodyError::TooLarge {
            size: bytes.len(),
            limit,
        });
    }
    if bytes.is_empty() || !is_json_content(request.headers()) {
        return Ok(empty_body());
    }
    Ok(serde_json::from_slice(bytes)?)
}

fn is_json_content(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(http::header::CONTENT_TYPE) else {
        return true;
    };
    let Ok(content_type) = content_type.to_str() else {
        return false;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// Convert request headers. Repeated headers become sequences.
pub fn extract_headers(map: &HeaderMap) -> Headers {
    let mut headers = Headers::new();
    for (name, value) in map {
        headers.append(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
    }
    headers
}
