//! Container entrypoint: serves the bundled hello handler.
//!
//! Configuration comes from `FAAS_FUNCTION_ID`, `FAAS_HOST`, `FAAS_PORT`
//! (or `PORT`) and `FAAS_MAX_BODY_BYTES`; log filtering from `RUST_LOG`.

use faas_runtime::prelude::*;
use serde_json::json;

/// Template handler shipped with new functions.
#[faas_handler]
async fn hello(event: Event, ctx: Context) -> Result<Response, HandlerError> {
    Ok(Response::json(json!({
        "message": "Hello World",
        "function_id": ctx.function_id,
        "request_id": ctx.request_id,
        "path": event.path,
        "contract": ctx.contract_version,
    })))
}

#[tokio::main]
async fn main() -> Result<(), RuntimeError> {
    faas_runtime::logging::init()?;

    let config = RuntimeConfig::from_env()?;
    tracing::info!(
        function_id = %config.function_id,
        addr = %config.bind_addr(),
        "starting runtime"
    );

    RuntimeServer::new(config, HelloHandler)
        .run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await
}
