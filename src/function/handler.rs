//! Handler trait, per-invocation context and handler errors.

use crate::http::{Event, Response};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shape of `Event`/`Context`/`Response` understood by this adapter build.
pub const CONTRACT_VERSION: &str = "v1";

/// Per-invocation execution metadata, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    /// Identifies the deployed function; constant for the process lifetime.
    pub function_id: String,
    /// Unique per invocation.
    pub request_id: String,
    /// Always [`CONTRACT_VERSION`] for contexts built by this crate.
    pub contract_version: String,
}

impl Context {
    /// Create a context for the current contract version.
    pub fn new(function_id: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            function_id: function_id.into(),
            request_id: request_id.into(),
            contract_version: CONTRACT_VERSION.to_string(),
        }
    }
}

/// A user function driven by the adapter.
///
/// Closures of shape `Fn(Event, Context) -> Result<Response, HandlerError>`
/// implement this trait directly; `#[faas_handler]` generates an
/// implementation for free functions.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handle one invocation.
    async fn invoke(&self, event: Event, ctx: Context) -> Result<Response, HandlerError>;
}

#[async_trait]
impl<F> Handler for F
where
    F: Fn(Event, Context) -> Result<Response, HandlerError> + Send + Sync,
{
    async fn invoke(&self, event: Event, ctx: Context) -> Result<Response, HandlerError> {
        self(event, ctx)
    }
}

/// Runs a synchronous handler on tokio's blocking pool.
///
/// Use for CPU-heavy work that would otherwise stall the reactor thread
/// serving other connections.
pub fn blocking<F>(f: F) -> Blocking<F>
where
    F: Fn(Event, Context) -> Result<Response, HandlerError> + Send + Sync + 'static,
{
    Blocking(Arc::new(f))
}

/// Handler returned by [`blocking`].
pub struct Blocking<F>(Arc<F>);

#[async_trait]
impl<F> Handler for Blocking<F>
where
    F: Fn(Event, Context) -> Result<Response, HandlerError> + Send + Sync + 'static,
{
    async fn invoke(&self, event: Event, ctx: Context) -> Result<Response, HandlerError> {
        let f = Arc::clone(&self.0);
        tokio::task::spawn_blocking(move || f(event, ctx))
            .await
            .map_err(|err| HandlerError::new(format!("blocking handler failed: {}", err)))?
    }
}

/// Failure signal returned by a handler.
///
/// The message is logged by the adapter and never sent to the client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
    /// Error message.
    pub message: String,
}

impl HandlerError {
    /// Create a new HandlerError.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}
