//! The server framework adapter.

use std::sync::Arc;

use omni_core::{
    bad_request_response, describe_shape, invoke, native_handler, AdapterConfig, Completion,
    FailurePolicy, Framework, FrameworkMetadata, NativeArg, NativeHandler, OmniError, Result,
    SharedHandler, StandardHandler,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::request::{extract_headers, parse_body, ServerMetadata, DEFAULT_BODY_LIMIT};
use crate::response::write_response;

/// Slot name the server framework is registered under by default.
pub const SLOT: &str = "server";

/// Configuration for the server adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Failure handling.
    pub adapter: AdapterConfig,
    /// Maximum accepted request body, in bytes.
    pub body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            adapter: AdapterConfig::default(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl ServerConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the failure handling configuration.
    pub fn with_adapter(mut self, adapter: AdapterConfig) -> Self {
        self.adapter = adapter;
        self
    }

    /// Set the failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.adapter = self.adapter.with_failure_policy(policy);
        self
    }

    /// Set the maximum accepted request body.
    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }
}

/// Adapter for runtimes that call handlers with a request object and a
/// mutable response object.
///
/// Recognizes exactly `(request, response)`. The handler's response is
/// written into the response object; the call completes with
/// [`Completion::Responded`].
#[derive(Debug, Clone, Default)]
pub struct ServerFramework {
    config: ServerConfig,
}

impl ServerFramework {
    /// Create an adapter with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an adapter with a configuration.
    pub fn with_config(config: ServerConfig) -> Self {
        Self { config }
    }

    /// The adapter configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

impl Framework for ServerFramework {
    fn check(&self, args: &[NativeArg]) -> bool {
        matches!(args, [NativeArg::Request(_), NativeArg::Response(_)])
    }

    fn handle(&self, slot: &str, handler: SharedHandler) -> NativeHandler {
        let slot: Arc<str> = Arc::from(slot);
        let config = Arc::new(self.config.clone());
        native_handler(move |args| {
            let slot = Arc::clone(&slot);
            let config = Arc::clone(&config);
            let handler = Arc::clone(&handler);
            async move { serve(&slot, &config, handler.as_ref(), args).await }
        })
    }
}

async fn serve(
    slot: &str,
    config: &ServerConfig,
    handler: &dyn StandardHandler,
    args: Vec<NativeArg>,
) -> Result<Completion> {
    let (request, response) = match <[NativeArg; 2]>::try_from(args) {
        Ok([NativeArg::Request(request), NativeArg::Response(response)]) => (request, response),
        Ok(args) => return Err(shape_mismatch(slot, &args)),
        Err(args) => return Err(shape_mismatch(slot, &args)),
    };

    let body = match parse_body(&request, config.body_limit) {
        Ok(body) => body,
        Err(err) => {
            let status = err.status();
            let err = OmniError::from(err);
            debug!(framework = slot, error = %err, "rejected request body");
            write_response(&response, &bad_request_response(status, &err))?;
            return Ok(Completion::Responded);
        }
    };
    let headers = extract_headers(request.headers());
    let metadata = FrameworkMetadata::with_slot(slot, &ServerMetadata::from_request(&request))?;

    let outcome = match invoke(handler, body, headers, Some(metadata)).await {
        Ok(standard) => write_response(&response, &standard),
        Err(err) => Err(err),
    };

    match outcome {
        Ok(()) => Ok(Completion::Responded),
        Err(err) if config.adapter.propagates() => Err(err),
        Err(err) => {
            warn!(framework = slot, error = %err, "handler failed, sending error response");
            write_response(&response, &config.adapter.failure_response(&err))?;
            Ok(Completion::Responded)
        }
    }
}

fn shape_mismatch(slot: &str, args: &[NativeArg]) -> OmniError {
    OmniError::ShapeMismatch {
        framework: slot.to_string(),
        shape: describe_shape(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::PathParams;
    use http::StatusCode;
    use omni_core::{handler_fn, InvocationContext, ServerResponse, StandardResponse};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn echo() -> SharedHandler {
        Arc::new(handler_fn(|body, headers, _metadata| async move {
            Ok(StandardResponse::ok(body).with_headers(headers))
        }))
    }

    fn failing() -> SharedHandler {
        Arc::new(handler_fn(|_, _, _| async {
            Err(anyhow::anyhow!("storage unavailable"))
        }))
    }

    fn post(body: &str) -> http::Request<Vec<u8>> {
        http::Request::builder()
            .method("POST")
            .uri("/orders?draft=true&tag=a&tag=b")
            .header("content-type", "application/json")
            .header("x-tenant", "acme")
            .body(body.as_bytes().to_vec())
            .unwrap()
    }

    fn args(request: http::Request<Vec<u8>>, response: &ServerResponse) -> Vec<NativeArg> {
        vec![NativeArg::from(request), NativeArg::from(response.clone())]
    }

    fn json_body(response: &ServerResponse) -> serde_json::Value {
        serde_json::from_slice(&response.body()).unwrap()
    }

    // === check Tests ===

    #[test]
    fn test_check_request_response_pair() {
        let framework = ServerFramework::new();
        let response = ServerResponse::new();

        assert!(framework.check(&args(post("{}"), &response)));
    }

    #[test]
    fn test_check_rejects_foreign_shapes() {
        let framework = ServerFramework::new();

        assert!(!framework.check(&[]));
        assert!(!framework.check(&[NativeArg::from("bare")]));
        assert!(!framework.check(&[
            NativeArg::from(ServerResponse::new()),
            NativeArg::from(post("{}")),
        ]));
        assert!(!framework.check(&[
            NativeArg::from(json!({"httpMethod": "GET", "path": "/"})),
            NativeArg::from(InvocationContext::new("req-1")),
        ]));
        let mut three = args(post("{}"), &ServerResponse::new());
        three.push(NativeArg::from(json!(null)));
        assert!(!framework.check(&three));
    }

    // === handle Tests ===

    #[tokio::test]
    async fn test_echo_round_trip() {
        let native = ServerFramework::new().handle(SLOT, echo());
        let response = ServerResponse::new();

        let completion = native(args(post(r#"{"sku": "A1", "qty": 2}"#), &response))
            .await
            .unwrap();

        assert_eq!(completion, Completion::Responded);
        assert!(response.is_finished());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(&response), json!({"sku": "A1", "qty": 2}));
        assert_eq!(response.header("x-tenant").as_deref(), Some("acme"));
        assert_eq!(
            response.header("content-type").as_deref(),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn test_metadata_slot() {
        let handler: SharedHandler = Arc::new(handler_fn(|_, _, metadata| async move {
            let metadata = metadata.expect("server adapter always passes metadata");
            let slots: Vec<String> = metadata.slots().map(String::from).collect();
            let server: ServerMetadata = metadata.typed("web")?.expect("slot populated");
            Ok(StandardResponse::ok(json!({
                "slots": slots,
                "method": server.method,
                "path": server.path,
                "draft": server.query.get("draft"),
                "tag": server.query.get("tag"),
                "id": server.params.get("id"),
            })))
        }));
        let native = ServerFramework::new().handle("web", handler);

        let mut request = post("{}");
        request
            .extensions_mut()
            .insert([("id", "9")].into_iter().collect::<PathParams>());
        let response = ServerResponse::new();
        native(args(request, &response)).await.unwrap();

        assert_eq!(
            json_body(&response),
            json!({
                "slots": ["web"],
                "method": "POST",
                "path": "/orders",
                "draft": ["true"],
                "tag": ["a", "b"],
                "id": "9",
            })
        );
    }

    #[tokio::test]
    async fn test_handler_failure_is_contained() {
        let native = ServerFramework::new().handle(SLOT, failing());
        let response = ServerResponse::new();

        let completion = native(args(post("{}"), &response)).await.unwrap();

        assert_eq!(completion, Completion::Responded);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(&response), json!({"error": "Internal Server Error"}));
    }

    #[tokio::test]
    async fn test_handler_failure_propagates_when_configured() {
        let config = ServerConfig::new().with_failure_policy(FailurePolicy::Propagate);
        let native = ServerFramework::with_config(config).handle(SLOT, failing());
        let response = ServerResponse::new();

        let err = native(args(post("{}"), &response)).await.unwrap_err();

        assert!(err.is_handler_failure());
        assert!(!response.is_finished());
    }

    #[tokio::test]
    async fn test_invalid_response_header_is_contained() {
        let handler: SharedHandler = Arc::new(handler_fn(|_, _, _| async {
            Ok(StandardResponse::new(200).with_header("bad name", "x"))
        }));
        let native = ServerFramework::new().handle(SLOT, handler);
        let response = ServerResponse::new();

        native(args(post("{}"), &response)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_bad_bodies_never_reach_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handler: SharedHandler = Arc::new(handler_fn(move |_, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(StandardResponse::new(200)) }
        }));
        let config = ServerConfig::new().with_body_limit(16);
        let native = ServerFramework::with_config(config).handle(SLOT, handler);

        let invalid = ServerResponse::new();
        native(args(post("{oops"), &invalid)).await.unwrap();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let oversized = ServerResponse::new();
        native(args(post(r#"{"padding": "xxxxxxxxxxxxxxxx"}"#), &oversized))
            .await
            .unwrap();
        assert_eq!(oversized.status(), StatusCode::PAYLOAD_TOO_LARGE);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_wrong_shape_is_mismatch() {
        let native = ServerFramework::new().handle(SLOT, echo());

        let err = native(vec![NativeArg::from("bare")]).await.unwrap_err();
        assert!(matches!(err, OmniError::ShapeMismatch { .. }));

        let err = native(vec![
            NativeArg::from(ServerResponse::new()),
            NativeArg::from(post("{}")),
        ])
        .await
        .unwrap_err();
        assert!(matches!(err, OmniError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_server_config_deserialize() {
        let config: ServerConfig = serde_json::from_value(json!({
            "body_limit": 1024,
            "adapter": {"error_status": 503}
        }))
        .unwrap();

        assert_eq!(config.body_limit, 1024);
        assert_eq!(config.adapter.error_status, 503);
        assert_eq!(config.adapter.failure_policy, FailurePolicy::Respond);
    }
}
