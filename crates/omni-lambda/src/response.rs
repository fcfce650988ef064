//! Proxy results built from standard responses.

use std::collections::BTreeMap;

use omni_core::{HeaderValue, Result, StandardResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// HTTP proxy result returned to an API gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResult {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub multi_value_headers: BTreeMap<String, Vec<String>>,
    /// The response body, serialized as a JSON string.
    pub body: String,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl ProxyResult {
    /// Build a proxy result from a standard response.
    ///
    /// Sequence header values go to `multiValueHeaders`; absent values are
    /// dropped. A JSON content type is added unless one was given.
    pub fn from_standard(response: &StandardResponse) -> Result<Self> {
        let status = response.validate()?;
        let mut result = Self {
            status_code: status.as_u16(),
            body: serde_json::to_string(&response.body)?,
            ..Self::default()
        };

        if let Some(headers) = &response.headers {
            for (name, value) in headers.iter() {
                match value {
                    Some(HeaderValue::Single(value)) => {
                        result.headers.insert(name.to_string(), value.clone());
                    }
                    Some(HeaderValue::Multi(values)) => {
                        result
                            .multi_value_headers
                            .insert(name.to_string(), values.clone());
                    }
                    None => {}
                }
            }
        }

        if !result.has_header("content-type") {
            result
                .headers
                .insert("content-type".to_string(), "application/json".to_string());
        }
        Ok(result)
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers.keys().any(|k| k.eq_ignore_ascii_case(name))
            || self
                .multi_value_headers
                .keys()
                .any(|k| k.eq_ignore_ascii_case(name))
    }

    /// Parse the body back into JSON.
    pub fn body_json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// The JSON form handed back to the runtime.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
