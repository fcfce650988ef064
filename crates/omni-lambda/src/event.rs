//! Proxy events and their conversion into the standard envelope.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use omni_core::{empty_body, Body, Headers, InvocationContext, OmniError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Reasons a proxy event is rejected before reaching the handler.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("malformed proxy event: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("invalid base64 body: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("invalid JSON body: {0}")]
    InvalidJson(#[source] serde_json::Error),
}

impl From<EventError> for OmniError {
    fn from(err: EventError) -> Self {
        OmniError::BadRequest(err.to_string())
    }
}

/// Whether a JSON value looks like an HTTP proxy event.
pub fn is_proxy_event(value: &Value) -> bool {
    value.get("httpMethod").map_or(false, Value::is_string) && value.get("path").is_some()
}

/// HTTP proxy event delivered by an API gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyEvent {
    pub http_method: String,
    pub path: String,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub multi_value_headers: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    pub query_string_parameters: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub multi_value_query_string_parameters: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    pub path_parameters: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub stage_variables: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub request_context: Option<Value>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: Option<bool>,
}

impl ProxyEvent {
    /// Parse an event from its JSON form.
    pub fn from_value(value: Value) -> Result<Self, EventError> {
        serde_json::from_value(value).map_err(EventError::Malformed)
    }

    /// Decode the body as JSON. A missing or empty body is an empty object.
    pub fn decode_body(&self) -> Result<Body, EventError> {
        let raw = match self.body.as_deref() {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(empty_body()),
        };

        if self.is_base64_encoded.unwrap_or(false) {
            let bytes = STANDARD.decode(raw)?;
            if bytes.is_empty() {
                return Ok(empty_body());
            }
            serde_json::from_slice(&bytes).map_err(EventError::InvalidJson)
        } else {
            serde_json::from_str(raw).map_err(EventError::InvalidJson)
        }
    }

    /// Merge single and multi-value headers.
    ///
    /// Multi-value entries win; one value becomes a single header value.
    pub fn headers(&self) -> Headers {
        let mut headers = Headers::new();
        if let Some(multi) = &self.multi_value_headers {
            for (name, values) in multi {
                match values.as_slice() {
                    [single] => headers.insert(name.as_str(), single.as_str()),
                    _ => headers.insert(name.as_str(), values.clone()),
                }
            }
        }
        if let Some(single) = &self.headers {
            for (name, value) in single {
                if !headers.contains_key(name) {
                    headers.insert(name.as_str(), value.as_str());
                }
            }
        }
        headers
    }

    /// Merge single and multi-value query parameters.
    ///
    /// Multi-value entries win so repeated keys keep every value.
    pub fn query(&self) -> BTreeMap<String, Vec<String>> {
        let mut query = self
            .multi_value_query_string_parameters
            .clone()
            .unwrap_or_default();
        if let Some(single) = &self.query_string_parameters {
            for (key, value) in single {
                query
                    .entry(key.clone())
                    .or_insert_with(|| vec![value.clone()]);
            }
        }
        query
    }
}

/// Invocation details exposed in the lambda metadata slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LambdaMetadata {
    pub http_method: String,
    pub path: String,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub path_parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub query: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub stage_variables: BTreeMap<String, String>,
    #[serde(default)]
    pub request_context: Option<Value>,
    #[serde(default)]
    pub context: InvocationContext,
}

impl LambdaMetadata {
    /// Collect metadata from an event and its invocation context.
    pub fn new(event: &ProxyEvent, context: InvocationContext) -> Self {
        Self {
            http_method: event.http_method.clone(),
            path: event.path.clone(),
            resource: event.resource.clone(),
            path_parameters: event.path_parameters.clone().unwrap_or_default(),
            query: event.query(),
            stage_variables: event.stage_variables.clone().unwrap_or_default(),
            request_context: event.request_context.clone(),
            context,
        }
    }
}
