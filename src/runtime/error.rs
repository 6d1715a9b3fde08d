//! Startup and serving errors.

use thiserror::Error;

/// Errors that stop the runtime. Per-invocation failures never surface here.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to install logger: {0}")]
    Logging(#[from] tracing::subscriber::SetGlobalDefaultError),
}
