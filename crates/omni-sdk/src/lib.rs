//! Public SDK for omni handlers.
//!
//! Write business logic once as a [`StandardHandler`] and serve it from any
//! supported runtime:
//!
//! ```ignore
//! use omni_sdk::prelude::*;
//!
//! let omni = omni(handler_fn(|body, headers, _metadata| async move {
//!     Ok(StandardResponse::ok(body).with_headers(headers))
//! }));
//!
//! // From a server loop:
//! omni.call(vec![request.into(), response.clone().into()]).await?;
//!
//! // From a function runtime:
//! let result = omni.call(vec![event.into(), context.into()]).await?;
//! ```

use serde::{Deserialize, Serialize};

pub use omni_core;
pub use omni_lambda;
pub use omni_server;

use omni_core::{AdapterConfig, FrameworkMetadata, Frameworks, OmniHandler, Result, StandardHandler};
use omni_lambda::{LambdaFramework, LambdaMetadata};
use omni_server::{ServerConfig, ServerFramework, ServerMetadata};

/// Configuration for the built-in adapters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuiltinConfig {
    pub server: ServerConfig,
    pub lambda: AdapterConfig,
}

/// The built-in registry: `server`, then `lambda`.
pub fn builtin() -> Frameworks {
    builtin_with(&BuiltinConfig::default())
}

/// The built-in registry with custom adapter configuration.
pub fn builtin_with(config: &BuiltinConfig) -> Frameworks {
    Frameworks::new()
        .with(
            omni_server::SLOT,
            ServerFramework::with_config(config.server.clone()),
        )
        .with(
            omni_lambda::SLOT,
            LambdaFramework::with_config(config.lambda.clone()),
        )
}

/// Wrap a handler for every built-in runtime.
pub fn omni(handler: impl StandardHandler) -> OmniHandler {
    OmniHandler::new(handler, &builtin())
}

/// Wrap a handler for the given adapters, checked before the built-ins.
///
/// An adapter registered under a built-in name replaces that built-in.
pub fn omni_with(handler: impl StandardHandler, frameworks: Frameworks) -> OmniHandler {
    OmniHandler::new(handler, &frameworks.merge(&builtin()))
}

/// Typed view of the built-in metadata slots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuiltinMetadata {
    pub server: Option<ServerMetadata>,
    pub lambda: Option<LambdaMetadata>,
}

impl BuiltinMetadata {
    /// Read the built-in slots from a metadata mapping.
    pub fn from_metadata(metadata: &FrameworkMetadata) -> Result<Self> {
        Ok(Self {
            server: metadata.typed(omni_server::SLOT)?,
            lambda: metadata.typed(omni_lambda::SLOT)?,
        })
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{builtin, builtin_with, omni, omni_with, BuiltinConfig, BuiltinMetadata};
    pub use omni_core::*;
    pub use omni_lambda::{LambdaFramework, LambdaMetadata, ProxyEvent, ProxyResult};
    pub use omni_server::{PathParams, ServerConfig, ServerFramework, ServerMetadata};
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Registry Tests ===

    #[test]
    fn test_builtin_order() {
        let frameworks = builtin();
        let names: Vec<&str> = frameworks.names().collect();
        assert_eq!(names, vec!["server", "lambda"]);
    }

    #[test]
    fn test_builtin_config_deserialize() {
        let config: BuiltinConfig = serde_json::from_value(serde_json::json!({
            "server": {"body_limit": 2048},
            "lambda": {"failure_policy": "propagate"},
        }))
        .unwrap();

        assert_eq!(config.server.body_limit, 2048);
        assert!(config.lambda.propagates());
        assert!(!config.server.adapter.propagates());
    }

    // === Metadata Tests ===

    #[test]
    fn test_builtin_metadata_reads_present_slots() {
        let server = ServerMetadata {
            method: "GET".into(),
            path: "/".into(),
            version: "HTTP/1.1".into(),
            ..ServerMetadata::default()
        };
        let metadata = FrameworkMetadata::with_slot("server", &server).unwrap();

        let typed = BuiltinMetadata::from_metadata(&metadata).unwrap();
        assert_eq!(typed.server, Some(server));
        assert_eq!(typed.lambda, None);
    }
}
