//! Native call arguments.
//!
//! Serving runtimes hand their callbacks differently shaped argument lists.
//! [`NativeArg`] is the union of every argument kind a supported runtime
//! passes; a native call is a `Vec<NativeArg>` and its call shape is the
//! sequence of argument kinds.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use http::header::{HeaderName, HeaderValue as HttpHeaderValue};
use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{OmniError, Result};

/// Request object delivered by a request/response server runtime.
pub type ServerRequest = http::Request<Vec<u8>>;

#[derive(Debug)]
struct ResponseState {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    finished: bool,
}

impl Default for ResponseState {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
            finished: false,
        }
    }
}

/// Mutable response object of a request/response server runtime.
///
/// The host keeps one clone and passes another to the handler; whatever the
/// handler writes is visible through every clone.
#[derive(Debug, Clone, Default)]
pub struct ServerResponse {
    state: Arc<Mutex<ResponseState>>,
}

impl ServerResponse {
    /// Create a fresh response (200, no headers, empty body).
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ResponseState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the status code.
    pub fn set_status(&self, status: StatusCode) {
        self.lock().status = status;
    }

    /// Replace a header.
    pub fn set_header(&self, name: &str, value: &str) -> Result<()> {
        let (name, value) = parse_header(name, value)?;
        self.lock().headers.insert(name, value);
        Ok(())
    }

    /// Add a header value, keeping existing values.
    pub fn append_header(&self, name: &str, value: &str) -> Result<()> {
        let (name, value) = parse_header(name, value)?;
        self.lock().headers.append(name, value);
        Ok(())
    }

    /// Write the body and finish the response.
    pub fn send(&self, body: Vec<u8>) {
        let mut state = self.lock();
        state.body = body;
        state.finished = true;
    }

    /// Whether `send` has been called.
    pub fn is_finished(&self) -> bool {
        self.lock().finished
    }

    /// Current status code.
    pub fn status(&self) -> StatusCode {
        self.lock().status
    }

    /// First value of a header, if set and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<String> {
        self.lock()
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    }

    /// All values of a header, in insertion order.
    pub fn header_values(&self, name: &str) -> Vec<String> {
        self.lock()
            .headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect()
    }

    /// Copy of the body written so far.
    pub fn body(&self) -> Vec<u8> {
        self.lock().body.clone()
    }

    /// Snapshot the response as an `http::Response`.
    pub fn to_http(&self) -> http::Response<Vec<u8>> {
        let state = self.lock();
        let mut response = http::Response::new(state.body.clone());
        *response.status_mut() = state.status;
        *response.headers_mut() = state.headers.clone();
        response
    }
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HttpHeaderValue)> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| OmniError::InvalidHeader(format!("invalid header name '{}'", name)))?;
    let value = HttpHeaderValue::from_str(value)
        .map_err(|_| {
            OmniError::InvalidHeader(format!("invalid value for header '{}'", name.as_str()))
        })?;
    Ok((name, value))
}

/// Invocation context delivered by an event-driven function runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationContext {
    /// Runtime-assigned request identifier.
    pub request_id: String,
    /// Deployed function name.
    pub function_name: String,
    /// Deployed function version.
    pub function_version: String,
    /// Fully qualified function identifier.
    pub invoked_function_arn: String,
    /// Memory limit configured for the function.
    pub memory_limit_mb: u32,
    /// Invocation deadline, in milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
}

impl InvocationContext {
    /// Create a context for a request id.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ..Default::default()
        }
    }

    /// Set the function name.
    pub fn with_function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = name.into();
        self
    }

    /// Set the function version.
    pub fn with_function_version(mut self, version: impl Into<String>) -> Self {
        self.function_version = version.into();
        self
    }

    /// Set the memory limit.
    pub fn with_memory_limit_mb(mut self, mb: u32) -> Self {
        self.memory_limit_mb = mb;
        self
    }

    /// Set the deadline.
    pub fn with_deadline_ms(mut self, deadline_ms: u64) -> Self {
        self.deadline_ms = Some(deadline_ms);
        self
    }
}

type CallbackFn = Box<dyn FnOnce(anyhow::Result<serde_json::Value>) + Send>;

/// Completion callback of an event-driven function runtime.
pub struct Callback(CallbackFn);

impl Callback {
    /// Wrap a completion function.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(anyhow::Result<serde_json::Value>) + Send + 'static,
    {
        Self(Box::new(f))
    }

    /// Signal completion.
    pub fn call(self, outcome: anyhow::Result<serde_json::Value>) {
        (self.0)(outcome)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback")
    }
}

/// One argument of a native call.
#[derive(Debug)]
pub enum NativeArg {
    /// Plain data, such as an event object.
    Json(serde_json::Value),
    /// Server request object.
    Request(ServerRequest),
    /// Server response object.
    Response(ServerResponse),
    /// Function invocation context.
    Context(InvocationContext),
    /// Completion callback.
    Callback(Callback),
}

/// Kind of a native argument, used to describe call shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
    Request,
    Response,
    Context,
    Callback,
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
            Self::Request => "request",
            Self::Response => "response",
            Self::Context => "context",
            Self::Callback => "callback",
        };
        f.write_str(name)
    }
}

impl NativeArg {
    /// The kind of this argument.
    pub fn kind(&self) -> ArgKind {
        match self {
            Self::Json(serde_json::Value::Null) => ArgKind::Null,
            Self::Json(serde_json::Value::Bool(_)) => ArgKind::Bool,
            Self::Json(serde_json::Value::Number(_)) => ArgKind::Number,
            Self::Json(serde_json::Value::String(_)) => ArgKind::String,
            Self::Json(serde_json::Value::Array(_)) => ArgKind::Array,
            Self::Json(serde_json::Value::Object(_)) => ArgKind::Object,
            Self::Request(_) => ArgKind::Request,
            Self::Response(_) => ArgKind::Response,
            Self::Context(_) => ArgKind::Context,
            Self::Callback(_) => ArgKind::Callback,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_request(&self) -> Option<&ServerRequest> {
        match self {
            Self::Request(request) => Some(request),
            _ => None,
        }
    }

    pub fn as_response(&self) -> Option<&ServerResponse> {
        match self {
            Self::Response(response) => Some(response),
            _ => None,
        }
    }

    pub fn as_context(&self) -> Option<&InvocationContext> {
        match self {
            Self::Context(context) => Some(context),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for NativeArg {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<&str> for NativeArg {
    fn from(value: &str) -> Self {
        Self::Json(serde_json::Value::String(value.to_string()))
    }
}

impl From<ServerRequest> for NativeArg {
    fn from(request: ServerRequest) -> Self {
        Self::Request(request)
    }
}

impl From<ServerResponse> for NativeArg {
    fn from(response: ServerResponse) -> Self {
        Self::Response(response)
    }
}

impl From<InvocationContext> for NativeArg {
    fn from(context: InvocationContext) -> Self {
        Self::Context(context)
    }
}

impl From<Callback> for NativeArg {
    fn from(callback: Callback) -> Self {
        Self::Callback(callback)
    }
}

/// Describe a call shape, e.g. `(request, response)`.
pub fn describe_shape(args: &[NativeArg]) -> String {
    let kinds: Vec<String> = args.iter().map(|a| a.kind().to_string()).collect();
    format!("({})", kinds.join(", "))
}

/// How a native call completed.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Completion was signalled through a response object or callback.
    Responded,
    /// The native result is returned directly.
    Returned(serde_json::Value),
}

impl Completion {
    /// The returned value, if completion was a direct return.
    pub fn into_returned(self) -> Option<serde_json::Value> {
        match self {
            Self::Returned(value) => Some(value),
            Self::Responded => None,
        }
    }
}
