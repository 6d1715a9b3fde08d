//! # faas-runtime - single-function HTTP invocation adapter
//!
//! Runs inside a function container and exposes one user handler over HTTP.
//! Every request to the container becomes one invocation:
//!
//! ```text
//!   HTTP request ──► normalize ──► Event ─┐
//!                                         ├──► Handler ──► Response ──► HTTP response
//!   function id + fresh request id ─► Context ┘                 │
//!                                                               └──► one JSON log line
//! ```
//!
//! `/healthz` and `/readyz` are answered by the server without touching the
//! handler.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use faas_runtime::prelude::*;
//!
//! #[faas_handler]
//! async fn hello(event: Event, ctx: Context) -> Result<Response, HandlerError> {
//!     Ok(Response::new(201)
//!         .header("X-Request-Id", ctx.request_id.as_str())
//!         .body(serde_json::json!({ "path": event.path })))
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), RuntimeError> {
//!     faas_runtime::logging::init()?;
//!     let config = RuntimeConfig::from_env()?;
//!     RuntimeServer::new(config, HelloHandler).run().await
//! }
//! ```
//!
//! ## Contract
//!
//! - [`Event`]: method, path, query (`name -> [values]` in request order),
//!   headers (first value per lower-cased name) and an optional raw body.
//! - [`Context`]: `function_id`, a UUID v4 `request_id`, and
//!   `contract_version` (`"v1"`).
//! - [`Response`]: `statusCode` (`0` means 200), optional headers, optional
//!   JSON body.
//!
//! A handler error or panic is logged with its message and answered with
//! `500 {"error":"internal"}`; the message never reaches the client.

pub mod function;
pub mod http;
pub mod logging;
pub mod runtime;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::function::{
        blocking, Adapter, Context, Handler, HandlerError, CONTRACT_VERSION,
    };
    pub use crate::http::{Event, Response};
    pub use crate::runtime::{RuntimeConfig, RuntimeError, RuntimeServer};
    pub use async_trait::async_trait;
    pub use faas_macro::faas_handler;
}

// Re-export for convenience
pub use faas_macro::faas_handler;
pub use function::{Adapter, Context, Handler, HandlerError, CONTRACT_VERSION};
pub use http::{Event, Response};
pub use runtime::{RuntimeConfig, RuntimeError, RuntimeServer};
