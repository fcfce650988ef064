//! Standard handler trait and invocation helpers.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;

use crate::envelope::{Body, Headers, StandardResponse};
use crate::error::{OmniError, Result};
use crate::metadata::FrameworkMetadata;

/// The single signature business logic implements.
///
/// Adapters convert their runtime's native request into `(body, headers,
/// metadata)` and translate the returned [`StandardResponse`] back.
#[async_trait]
pub trait StandardHandler: Send + Sync + 'static {
    /// Handle one request.
    async fn handle(
        &self,
        body: Body,
        headers: Headers,
        metadata: Option<FrameworkMetadata>,
    ) -> anyhow::Result<StandardResponse>;
}

/// Shared, type-erased standard handler.
pub type SharedHandler = Arc<dyn StandardHandler>;

/// Standard handler backed by an async closure.
pub struct FnHandler<F> {
    f: F,
}

/// Wrap an async closure as a [`StandardHandler`].
///
/// # Example
///
/// ```rust,ignore
/// let echo = handler_fn(|body, headers, _metadata| async move {
///     Ok(StandardResponse::ok(body).with_headers(headers))
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Body, Headers, Option<FrameworkMetadata>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<StandardResponse>> + Send + 'static,
{
    FnHandler { f }
}

#[async_trait]
impl<F, Fut> StandardHandler for FnHandler<F>
where
    F: Fn(Body, Headers, Option<FrameworkMetadata>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<StandardResponse>> + Send + 'static,
{
    async fn handle(
        &self,
        body: Body,
        headers: Headers,
        metadata: Option<FrameworkMetadata>,
    ) -> anyhow::Result<StandardResponse> {
        (self.f)(body, headers, metadata).await
    }
}

/// Invoke a handler, containing errors and panics.
///
/// Returns `HandlerFailure` when the handler errors or panics and
/// `MalformedResponse` when the returned status is not a valid HTTP status.
pub async fn invoke(
    handler: &dyn StandardHandler,
    body: Body,
    headers: Headers,
    metadata: Option<FrameworkMetadata>,
) -> Result<StandardResponse> {
    let outcome = AssertUnwindSafe(handler.handle(body, headers, metadata))
        .catch_unwind()
        .await;

    let response = match outcome {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => return Err(OmniError::HandlerFailure(err)),
        Err(payload) => {
            return Err(OmniError::HandlerFailure(anyhow::anyhow!(
                "handler panicked: {}",
                panic_message(payload.as_ref())
            )))
        }
    };

    response.validate()?;
    Ok(response)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
