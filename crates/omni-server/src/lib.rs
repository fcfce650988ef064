//! Server adapter for omni handlers.
//!
//! Serves runtimes that hand each request to a callback as a request object
//! plus a mutable response object:
//!
//! ```rust,ignore
//! use omni_core::{Frameworks, NativeArg, OmniHandler, ServerResponse};
//! use omni_server::ServerFramework;
//!
//! let frameworks = Frameworks::new().with(omni_server::SLOT, ServerFramework::new());
//! let omni = OmniHandler::new(handler, &frameworks);
//!
//! let response = ServerResponse::new();
//! omni.call(vec![NativeArg::from(request), NativeArg::from(response.clone())]).await?;
//! let http_response = response.to_http();
//! ```
//!
//! Request bodies are parsed as JSON (bounded by [`ServerConfig::body_limit`]),
//! request headers become [`omni_core::Headers`], and method, path, query and
//! router-supplied [`PathParams`] are exposed as [`ServerMetadata`].

mod framework;
mod request;
mod response;

pub use framework::*;
pub use request::*;
pub use response::*;
