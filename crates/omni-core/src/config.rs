//! Adapter configuration.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::envelope::StandardResponse;
use crate::error::OmniError;

/// What an adapter does when the standard handler fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Answer with the configured error response.
    #[default]
    Respond,
    /// Surface the failure through the runtime's own error channel.
    Propagate,
}

/// Failure handling shared by the built-in adapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Failure handling policy.
    pub failure_policy: FailurePolicy,
    /// Status used for contained handler failures.
    pub error_status: u16,
    /// Whether error messages are included in error bodies.
    pub expose_errors: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Respond,
            error_status: 500,
            expose_errors: false,
        }
    }
}

impl AdapterConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Set the status used for handler failures.
    pub fn with_error_status(mut self, status: u16) -> Self {
        self.error_status = status;
        self
    }

    /// Include error messages in error bodies.
    pub fn with_exposed_errors(mut self, expose: bool) -> Self {
        self.expose_errors = expose;
        self
    }

    /// Whether handler failures should be propagated.
    pub fn propagates(&self) -> bool {
        self.failure_policy == FailurePolicy::Propagate
    }

    /// Response used to contain a handler failure.
    pub fn failure_response(&self, err: &OmniError) -> StandardResponse {
        let status =
            StatusCode::from_u16(self.error_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        error_response(status, err, self.expose_errors)
    }
}

/// Response used when the native request itself is unusable.
pub fn bad_request_response(status: StatusCode, err: &OmniError) -> StandardResponse {
    error_response(status, err, true)
}

fn error_response(status: StatusCode, err: &OmniError, expose: bool) -> StandardResponse {
    let message = if expose {
        err.to_string()
    } else {
        status
            .canonical_reason()
            .unwrap_or("Internal Server Error")
            .to_string()
    };
    StandardResponse::json(status.as_u16(), json!({ "error": message }))
}
