//! Error types for omni handlers.

use thiserror::Error;

/// Errors raised while detecting, adapting or invoking a handler.
#[derive(Debug, Error)]
pub enum OmniError {
    /// No registered framework recognized the call shape.
    #[error("Unrecognized call shape {shape}; registered frameworks: {registered:?}")]
    UnrecognizedCallShape {
        /// Summary of the argument kinds received.
        shape: String,
        /// Registered framework names, in priority order.
        registered: Vec<String>,
    },

    /// The standard handler returned an error or panicked.
    #[error("Handler failure: {0}")]
    HandlerFailure(#[source] anyhow::Error),

    /// The standard handler returned a response that cannot be sent.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A native handler was invoked with arguments it does not handle.
    #[error("Framework '{framework}' cannot handle call shape {shape}")]
    ShapeMismatch {
        /// Slot name of the framework.
        framework: String,
        /// Summary of the argument kinds received.
        shape: String,
    },

    /// The native request could not be converted to the standard envelope.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A response header cannot be represented by the native runtime.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OmniError {
    /// Whether the error is attributable to the standard handler.
    pub fn is_handler_failure(&self) -> bool {
        matches!(
            self,
            Self::HandlerFailure(_) | Self::MalformedResponse(_) | Self::InvalidHeader(_)
        )
    }

    /// Whether the error was caused by the inbound native request.
    pub fn is_bad_request(&self) -> bool {
        matches!(self, Self::BadRequest(_))
    }
}

/// Result type alias using OmniError.
pub type Result<T> = std::result::Result<T, OmniError>;
