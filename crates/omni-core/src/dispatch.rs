//! Omni dispatcher.
//!
//! [`OmniHandler`] wraps one standard handler for every registered framework
//! and, on each call, picks the first framework whose `check` accepts the
//! arguments. Detection runs on every call; nothing is cached, so the same
//! handler can serve several runtimes in one process.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, trace};

use crate::envelope::{Body, Headers, StandardResponse};
use crate::error::{OmniError, Result};
use crate::framework::{Framework, NativeFuture, NativeHandler};
use crate::handler::{SharedHandler, StandardHandler};
use crate::metadata::FrameworkMetadata;
use crate::native::{describe_shape, Completion, NativeArg};
use crate::registry::Frameworks;

struct Route {
    name: String,
    framework: Arc<dyn Framework>,
    native: NativeHandler,
}

/// A standard handler callable with any registered framework's native
/// arguments.
#[derive(Clone)]
pub struct OmniHandler {
    handler: SharedHandler,
    routes: Arc<[Route]>,
}

impl OmniHandler {
    /// Wrap a standard handler for every framework in the registry.
    pub fn new(handler: impl StandardHandler, frameworks: &Frameworks) -> Self {
        Self::from_shared(Arc::new(handler), frameworks)
    }

    /// Wrap an already shared standard handler.
    pub fn from_shared(handler: SharedHandler, frameworks: &Frameworks) -> Self {
        let routes: Vec<Route> = frameworks
            .iter()
            .map(|(name, framework)| Route {
                name: name.to_string(),
                framework: Arc::clone(framework),
                native: framework.handle(name, Arc::clone(&handler)),
            })
            .collect();

        Self {
            handler,
            routes: routes.into(),
        }
    }

    fn route_for(&self, args: &[NativeArg]) -> Option<&Route> {
        self.routes.iter().find(|route| {
            let matched = route.framework.check(args);
            trace!(framework = %route.name, matched, "checked call shape");
            matched
        })
    }

    /// Name of the framework that would handle these arguments.
    pub fn detect(&self, args: &[NativeArg]) -> Option<&str> {
        self.route_for(args).map(|route| route.name.as_str())
    }

    /// Select the framework for a call and start its native handler.
    ///
    /// Fails immediately with `UnrecognizedCallShape` when no framework
    /// recognizes the arguments.
    pub fn dispatch(&self, args: Vec<NativeArg>) -> Result<NativeFuture> {
        match self.route_for(&args) {
            Some(route) => {
                debug!(framework = %route.name, "dispatching call");
                Ok((route.native)(args))
            }
            None => {
                let shape = describe_shape(&args);
                let registered: Vec<String> = self.frameworks().map(String::from).collect();
                error!(%shape, ?registered, "no framework recognized call shape");
                Err(OmniError::UnrecognizedCallShape { shape, registered })
            }
        }
    }

    /// Dispatch a call and wait for its completion.
    pub async fn call(&self, args: Vec<NativeArg>) -> Result<Completion> {
        self.dispatch(args)?.await
    }

    /// Registered framework names, in priority order.
    pub fn frameworks(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|route| route.name.as_str())
    }

    /// The wrapped standard handler.
    pub fn handler(&self) -> &SharedHandler {
        &self.handler
    }
}

impl fmt::Debug for OmniHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OmniHandler")
            .field("frameworks", &self.frameworks().collect::<Vec<_>>())
            .finish()
    }
}

/// Calling an omni handler with the standard convention skips detection.
#[async_trait]
impl StandardHandler for OmniHandler {
    async fn handle(
        &self,
        body: Body,
        headers: Headers,
        metadata: Option<FrameworkMetadata>,
    ) -> anyhow::Result<StandardResponse> {
        self.handler.handle(body, headers, metadata).await
    }
}
