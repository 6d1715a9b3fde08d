//! HTTP server: probes plus the adapter on every other path.

use crate::function::{Adapter, Handler};
use crate::runtime::{RuntimeConfig, RuntimeError};
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info};

/// Liveness probe path.
pub const HEALTH_PATH: &str = "/healthz";
/// Readiness probe path.
pub const READY_PATH: &str = "/readyz";

/// Pause after a failed accept before trying again.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Source of inbound connections.
#[async_trait]
pub trait Listener: Send + Sync {
    /// Connection stream type.
    type Io: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Wait for the next connection.
    async fn accept(&self) -> io::Result<(Self::Io, SocketAddr)>;

    /// Address the listener is bound to.
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

#[async_trait]
impl Listener for TcpListener {
    type Io = TcpStream;

    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        TcpListener::local_addr(self)
    }
}

/// Serves one function over HTTP/1.1.
///
/// `/healthz` and `/readyz` answer directly; every other request is one
/// invocation through the [`Adapter`]. Each connection runs on its own
/// tokio task.
pub struct RuntimeServer {
    /// Server configuration.
    config: RuntimeConfig,
    /// Adapter wrapping the registered handler.
    adapter: Adapter,
}

impl RuntimeServer {
    /// Create a server for `handler`; the handler is fixed for the server's lifetime.
    pub fn new(config: RuntimeConfig, handler: impl Handler + 'static) -> Self {
        let adapter = Adapter::new(config.function_id.clone(), handler)
            .with_max_body_size(config.max_body_size);
        Self { config, adapter }
    }

    /// Get the server configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Get the adapter.
    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    /// Bind the configured address and serve forever.
    pub async fn run(self) -> Result<(), RuntimeError> {
        self.run_until(std::future::pending()).await
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    ///
    /// Failing to bind is the only error; once listening, the server runs
    /// until shutdown.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), RuntimeError>
    where
        F: Future<Output = ()>,
    {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(addr.as_str())
            .await
            .map_err(|source| RuntimeError::Bind { addr, source })?;
        self.serve_with_shutdown(listener, shutdown).await;
        Ok(())
    }

    /// Serve an already bound listener forever.
    pub async fn serve<L: Listener>(self, listener: L) {
        self.serve_with_shutdown(listener, std::future::pending()).await
    }

    /// Serve an already bound listener until `shutdown` resolves.
    ///
    /// A failed accept (descriptor exhaustion, aborted handshake) is logged
    /// and retried after a short pause. Connections accepted before shutdown
    /// keep running on their own tasks.
    pub async fn serve_with_shutdown<L, F>(self, listener: L, shutdown: F)
    where
        L: Listener,
        F: Future<Output = ()>,
    {
        if let Ok(addr) = listener.local_addr() {
            info!(
                addr = %addr,
                function_id = %self.adapter.function_id(),
                "listening"
            );
        }

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, remote_addr) = match accepted {
                        Ok(accepted) => accepted,
                        Err(err) => {
                            error!(error = %err, "accept failed");
                            tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                            continue;
                        }
                    };
                    let io = TokioIo::new(stream);
                    let adapter = self.adapter.clone();

                    tokio::task::spawn(async move {
                        let service = service_fn(move |req| {
                            let adapter = adapter.clone();
                            async move { route(req, adapter).await }
                        });

                        if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                            error!(remote_addr = %remote_addr, error = %err, "error serving connection");
                        }
                    });
                }
                _ = &mut shutdown => {
                    info!("shutting down");
                    return;
                }
            }
        }
    }
}

/// Dispatch one request to a probe or the adapter.
async fn route(
    req: Request<Incoming>,
    adapter: Adapter,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let probe_body = match req.uri().path() {
        HEALTH_PATH => Some("OK"),
        READY_PATH => Some("READY"),
        _ => None,
    };
    match probe_body {
        Some(body) => Ok(probe(body)),
        None => Ok(adapter.handle(req).await),
    }
}

fn probe(body: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response
}
