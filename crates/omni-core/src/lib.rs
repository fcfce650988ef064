//! Core abstractions for framework-agnostic request handling.
//!
//! This crate provides the fundamental types and traits:
//! - `StandardResponse`, `Headers`, `FrameworkMetadata` - the standard envelope
//! - `StandardHandler` trait - the one signature business logic implements
//! - `Framework` trait - detection and adaptation for a serving runtime
//! - `Frameworks` - ordered registry of adapters
//! - `OmniHandler` - dispatcher that picks the matching adapter per call
//!
//! # Example
//!
//! ```rust,ignore
//! use omni_core::{handler_fn, Frameworks, NativeArg, OmniHandler, StandardResponse};
//!
//! let echo = handler_fn(|body, headers, _metadata| async move {
//!     Ok(StandardResponse::ok(body).with_headers(headers))
//! });
//!
//! let omni = OmniHandler::new(echo, &frameworks);
//! let completion = omni.call(vec![NativeArg::from(request), NativeArg::from(response)]).await?;
//! ```

mod config;
mod dispatch;
mod envelope;
mod error;
mod framework;
mod handler;
mod metadata;
mod native;
mod registry;

pub use config::*;
pub use dispatch::*;
pub use envelope::*;
pub use error::*;
pub use framework::*;
pub use handler::*;
pub use metadata::*;
pub use native::*;
pub use registry::*;
