//! The lambda framework adapter.

use std::sync::Arc;

use http::StatusCode;
use omni_core::{
    bad_request_response, describe_shape, invoke, native_handler, AdapterConfig, Callback,
    Completion, Framework, FrameworkMetadata, InvocationContext, NativeArg, NativeHandler,
    OmniError, Result, SharedHandler, StandardHandler,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::event::{is_proxy_event, LambdaMetadata, ProxyEvent};
use crate::response::ProxyResult;

/// Slot name the lambda framework is registered under by default.
pub const SLOT: &str = "lambda";

/// Adapter for function runtimes that call handlers with
/// `(event, context)` or `(event, context, callback)`.
///
/// Only HTTP proxy events are recognized. With a callback the proxy result
/// is delivered through it and the call completes with
/// [`Completion::Responded`]; otherwise the result is returned as
/// [`Completion::Returned`].
#[derive(Debug, Clone, Default)]
pub struct LambdaFramework {
    config: AdapterConfig,
}

impl LambdaFramework {
    /// Create an adapter with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an adapter with a configuration.
    pub fn with_config(config: AdapterConfig) -> Self {
        Self { config }
    }

    /// The adapter configuration.
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }
}

impl Framework for LambdaFramework {
    fn check(&self, args: &[NativeArg]) -> bool {
        match args {
            [NativeArg::Json(event), NativeArg::Context(_)]
            | [NativeArg::Json(event), NativeArg::Context(_), NativeArg::Callback(_)] => {
                is_proxy_event(event)
            }
            _ => false,
        }
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

type Invocation = (Value, InvocationContext, Option<Callback>);

fn split_args(args: Vec<NativeArg>) -> std::result::Result<Invocation, Vec<NativeArg>> {
    let args = match <[NativeArg; 3]>::try_from(args) {
        Ok([NativeArg::Json(event), NativeArg::Context(context), NativeArg::Callback(callback)]) => {
            return Ok((event, context, Some(callback)))
        }
        Ok(other) => return Err(Vec::from(other)),
        Err(args) => args,
    };
    match <[NativeArg; 2]>::try_from(args) {
        Ok([NativeArg::Json(event), NativeArg::Context(context)]) => Ok((event, context, None)),
        Ok(other) => Err(Vec::from(other)),
        Err(args) => Err(args),
    }
}

async fn serve(
    slot: &str,
    config: &AdapterConfig,
    handler: &dyn StandardHandler,
    args: Vec<NativeArg>,
) -> Result<Completion> {
    let (event, context, callback) = split_args(args).map_err(|args| OmniError::ShapeMismatch {
        framework: slot.to_string(),
        shape: describe_shape(&args),
    })?;

    let outcome = match respond(slot, handler, event, context).await {
        Ok(result) => Ok(result),
        Err(err) if err.is_bad_request() => {
            debug!(framework = slot, error = %err, "rejected proxy event");
            ProxyResult::from_standard(&bad_request_response(StatusCode::BAD_REQUEST, &err))
        }
        Err(err) if config.propagates() => Err(err),
        Err(err) => {
            warn!(framework = slot, error = %err, "handler failed, sending error response");
            ProxyResult::from_standard(&config.failure_response(&err))
        }
    };

    complete(outcome, callback)
}

async fn respond(
    slot: &str,
    handler: &dyn StandardHandler,
    event: Value,
    context: InvocationContext,
) -> Result<ProxyResult> {
    let event = ProxyEvent::from_value(event)?;
    let body = event.decode_body()?;
    let headers = event.headers();
    let metadata = FrameworkMetadata::with_slot(slot, &LambdaMetadata::new(&event, context))?;

    let standard = invoke(handler, body, headers, Some(metadata)).await?;
    ProxyResult::from_standard(&standard)
}

fn complete(outcome: Result<ProxyResult>, callback: Option<Callback>) -> Result<Completion> {
    let outcome = outcome.and_then(|result| result.to_value());
    match callback {
        Some(callback) => {
            callback.call(outcome.map_err(anyhow::Error::from));
            Ok(Completion::Responded)
        }
        None => outcome.map(Completion::Returned),
    }
}
