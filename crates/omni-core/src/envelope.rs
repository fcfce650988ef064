//! Standard request/response envelope.

use std::collections::BTreeMap;

use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::{OmniError, Result};

/// Parsed request or response payload.
pub type Body = serde_json::Value;

/// The body used when a handler produces none.
pub fn empty_body() -> Body {
    Body::Object(serde_json::Map::new())
}

/// A header value: one string or an ordered sequence of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Single(String),
    Multi(Vec<String>),
}

impl HeaderValue {
    /// First value, if any.
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value.as_str()),
            Self::Multi(values) => values.first().map(|s| s.as_str()),
        }
    }

    /// Iterate over all values in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Multi(values) => values,
        };
        values.iter().map(|s| s.as_str())
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multi(values) => values.len(),
        }
    }

    /// Whether this is an empty sequence.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add a value, turning a single value into a sequence.
    pub fn push(&mut self, value: impl Into<String>) {
        match self {
            Self::Single(existing) => {
                let first = std::mem::take(existing);
                *self = Self::Multi(vec![first, value.into()]);
            }
            Self::Multi(values) => values.push(value.into()),
        }
    }

    /// All values as a vector.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::Single(value) => vec![value],
            Self::Multi(values) => values,
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for HeaderValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multi(values)
    }
}

impl From<Vec<&str>> for HeaderValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Multi(values.into_iter().map(String::from).collect())
    }
}

/// Header mapping. A name mapped to `None` is present but has no value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(BTreeMap<String, Option<HeaderValue>>);

impl Headers {
    /// Create an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<HeaderValue>) {
        self.0.insert(name.into(), Some(value.into()));
    }

    /// Mark a header as present without a value.
    pub fn insert_absent(&mut self, name: impl Into<String>) {
        self.0.insert(name.into(), None);
    }

    /// Append a value, keeping existing values for the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        let slot = self.0.entry(name.into()).or_insert(None);
        match slot {
            Some(existing) => existing.push(value),
            None => *slot = Some(HeaderValue::Single(value)),
        }
    }

    /// Get a header value by exact name.
    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.0.get(name).and_then(|v| v.as_ref())
    }

    /// Get a header value by name (case-insensitive).
    pub fn get_ignore_case(&self, name: &str) -> Option<&HeaderValue> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .and_then(|(_, v)| v.as_ref())
    }

    /// First value of a header, by exact name.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(HeaderValue::first)
    }

    /// Whether the name is present, with or without a value.
    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Whether the name is present without a value.
    pub fn is_absent(&self, name: &str) -> bool {
        matches!(self.0.get(name), Some(None))
    }

    /// Remove a header.
    pub fn remove(&mut self, name: &str) -> Option<Option<HeaderValue>> {
        self.0.remove(name)
    }

    /// Iterate over headers in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&HeaderValue>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Number of header names.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no headers.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<HeaderValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

impl IntoIterator for Headers {
    type Item = (String, Option<HeaderValue>);
    type IntoIter = std::collections::btree_map::IntoIter<String, Option<HeaderValue>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// The response a standard handler produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    #[serde(default = "empty_body")]
    pub body: Body,
    /// Response headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
}

impl StandardResponse {
    /// Create a response with an empty body.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            body: empty_body(),
            headers: None,
        }
    }

    /// Create a 200 response with the given body.
    pub fn ok(body: Body) -> Self {
        Self::json(200, body)
    }

    /// Create a response with a status and body.
    pub fn json(status: u16, body: Body) -> Self {
        Self {
            status,
            body,
            headers: None,
        }
    }

    /// Set the body.
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.headers
            .get_or_insert_with(Headers::new)
            .insert(name, value);
        self
    }

    /// Replace all headers.
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Check the status code, returning it as a typed value.
    pub fn validate(&self) -> Result<StatusCode> {
        StatusCode::from_u16(self.status).map_err(|_| {
            OmniError::MalformedResponse(format!("invalid status code {}", self.status))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // === HeaderValue Tests ===

    #[test]
    fn test_header_value_push_promotes_single() {
        let mut value = HeaderValue::from("a");
        value.push("b");
        assert_eq!(value, HeaderValue::from(vec!["a", "b"]));
        assert_eq!(value.first(), Some("a"));
        assert_eq!(value.len(), 2);
    }

    #[test]
    fn test_header_value_iter() {
        let single = HeaderValue::from("x");
        assert_eq!(single.iter().collect::<Vec<_>>(), vec!["x"]);

        let multi = HeaderValue::from(vec!["x", "y"]);
        assert_eq!(multi.iter().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(multi.into_vec(), vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_header_value_serde_untagged() {
        let single: HeaderValue = serde_json::from_value(json!("text/html")).unwrap();
        assert_eq!(single, HeaderValue::Single("text/html".into()));

        let multi: HeaderValue = serde_json::from_value(json!(["a=1", "b=2"])).unwrap();
        assert_eq!(multi, HeaderValue::from(vec!["a=1", "b=2"]));
    }

    // === Headers Tests ===

    #[test]
    fn test_headers_absent_distinct_from_empty() {
        let mut headers = Headers::new();
        headers.insert("x-empty", "");
        headers.insert_absent("x-absent");

        assert_eq!(headers.first("x-empty"), Some(""));
        assert!(!headers.is_absent("x-empty"));
        assert!(headers.contains_key("x-absent"));
        assert!(headers.is_absent("x-absent"));
        assert_eq!(headers.get("x-absent"), None);
        assert!(!headers.contains_key("x-missing"));
    }

    #[test]
    fn test_headers_append() {
        let mut headers = Headers::new();
        headers.append("set-cookie", "a=1");
        headers.append("set-cookie", "b=2");
        headers.insert_absent("x-late");
        headers.append("x-late", "value");

        assert_eq!(
            headers.get("set-cookie"),
            Some(&HeaderValue::from(vec!["a=1", "b=2"]))
        );
        assert_eq!(headers.first("x-late"), Some("value"));
    }

    #[test]
    fn test_headers_remove() {
        let mut headers = Headers::new();
        headers.insert("x-trace", "abc");
        headers.insert_absent("x-absent");

        assert_eq!(headers.remove("x-trace"), Some(Some(HeaderValue::from("abc"))));
        assert_eq!(headers.remove("x-absent"), Some(None));
        assert_eq!(headers.remove("x-trace"), None);
        assert!(headers.is_empty());
    }

    #[test]
    fn test_headers_keys_unique() {
        let mut headers = Headers::new();
        headers.insert("accept", "text/html");
        headers.insert("accept", "application/json");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.first("accept"), Some("application/json"));
    }

    #[test]
    fn test_headers_case_insensitive_lookup() {
        let headers: Headers = [("Content-Type", "application/json")].into_iter().collect();
        assert_eq!(headers.get("content-type"), None);
        assert_eq!(
            headers.get_ignore_case("content-type").and_then(HeaderValue::first),
            Some("application/json")
        );
    }

    #[test]
    fn test_headers_serde_null_is_absent() {
        let headers: Headers =
            serde_json::from_value(json!({"a": "1", "b": ["2", "3"], "c": null})).unwrap();
        assert_eq!(headers.first("a"), Some("1"));
        assert_eq!(headers.get("b").map(HeaderValue::len), Some(2));
        assert!(headers.is_absent("c"));
    }

    // === StandardResponse Tests ===

    #[test]
    fn test_response_defaults_to_empty_body() {
        let response = StandardResponse::new(204);
        assert_eq!(response.body, json!({}));
        assert!(response.headers.is_none());

        let parsed: StandardResponse = serde_json::from_value(json!({"status": 201})).unwrap();
        assert_eq!(parsed.body, json!({}));
    }

    #[test]
    fn test_response_builder() {
        let response = StandardResponse::ok(json!({"id": 1}))
            .with_header("x-request-id", "abc")
            .with_header("vary", vec!["accept", "origin"]);

        assert_eq!(response.status, 200);
        let headers = response.headers.unwrap();
        assert_eq!(headers.first("x-request-id"), Some("abc"));
        assert_eq!(headers.get("vary").map(HeaderValue::len), Some(2));
    }

    #[test]
    fn test_response_validate() {
        assert_eq!(
            StandardResponse::new(404).validate().unwrap(),
            StatusCode::NOT_FOUND
        );
        assert!(StandardResponse::new(42).validate().is_err());
        assert!(StandardResponse::new(1000).validate().is_err());
    }
}
