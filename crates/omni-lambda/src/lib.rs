//! Lambda adapter for omni handlers.
//!
//! Recognizes HTTP proxy events delivered as `(event, context)` or
//! `(event, context, callback)` and answers with a proxy result.
//!
//! ```rust,ignore
//! use omni_core::{Frameworks, OmniHandler};
//! use omni_lambda::{LambdaFramework, SLOT};
//!
//! let frameworks = Frameworks::new().with(SLOT, LambdaFramework::new());
//! let omni = OmniHandler::new(my_handler, &frameworks);
//! let completion = omni.call(vec![event.into(), context.into()]).await?;
//! ```

mod event;
mod framework;
mod response;

pub use event::*;
pub use framework::*;
pub use response::*;
