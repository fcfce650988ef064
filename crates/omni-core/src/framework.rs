//! Framework adapter contract.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::Result;
use crate::handler::SharedHandler;
use crate::native::{Completion, NativeArg};

/// Future returned by a native handler.
pub type NativeFuture = BoxFuture<'static, Result<Completion>>;

/// A handler in a runtime's native calling convention.
pub type NativeHandler = Arc<dyn Fn(Vec<NativeArg>) -> NativeFuture + Send + Sync>;

/// Build a [`NativeHandler`] from an async closure.
pub fn native_handler<F, Fut>(f: F) -> NativeHandler
where
    F: Fn(Vec<NativeArg>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Completion>> + Send + 'static,
{
    Arc::new(move |args| f(args).boxed())
}

/// Adapter between one serving runtime and the standard envelope.
///
/// Adapters are constructed once and shared across every invocation, so they
/// must not hold per-request state.
pub trait Framework: Send + Sync {
    /// Whether the arguments have this runtime's call shape.
    ///
    /// Must be cheap and side-effect free, and must return `false` rather
    /// than fail for shapes belonging to other runtimes.
    fn check(&self, args: &[NativeArg]) -> bool;

    /// Wrap a standard handler in this runtime's native calling convention.
    ///
    /// `slot` is the identifier the framework is registered under; it is the
    /// only [`FrameworkMetadata`](crate::FrameworkMetadata) slot the returned
    /// handler may populate.
    fn handle(&self, slot: &str, handler: SharedHandler) -> NativeHandler;
}

impl<T: Framework + ?Sized> Framework for Arc<T> {
    fn check(&self, args: &[NativeArg]) -> bool {
        (**self).check(args)
    }

    fn handle(&self, slot: &str, handler: SharedHandler) -> NativeHandler {
        (**self).handle(slot, handler)
    }
}
