//! Invocation adapter: drives a [`Handler`] from raw HTTP requests.
//!
//! One call to [`Adapter::handle`] is one invocation: the request is
//! normalized into an [`Event`], a fresh [`Context`] is built, the handler
//! runs, and its outcome becomes exactly one HTTP response plus exactly one
//! `request_ok`/`request_error` log record.

use crate::function::handler::{Context, Handler, HandlerError};
use crate::http::{Event, Response as FnResponse};
use crate::logging::INVOCATION_TARGET;
use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Body;
use hyper::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Body written for every handler failure.
pub const INTERNAL_ERROR_BODY: &str = r#"{"error":"internal"}"#;

/// Default cap on request bodies read into an [`Event`].
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Bridges hyper requests to a handler's `Event -> Response` contract.
#[derive(Clone)]
pub struct Adapter {
    handler: Arc<dyn Handler>,
    function_id: Arc<str>,
    max_body_size: usize,
}

impl Adapter {
    /// Wrap `handler`; `function_id` is stamped into every [`Context`].
    pub fn new(function_id: impl Into<String>, handler: impl Handler + 'static) -> Self {
        Self::from_arc(function_id, Arc::new(handler))
    }

    /// Wrap an already shared handler.
    pub fn from_arc(function_id: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        Self {
            handler,
            function_id: Arc::from(function_id.into()),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Set the largest body read into an event; larger bodies are dropped.
    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    /// The function id given at construction.
    pub fn function_id(&self) -> &str {
        &self.function_id
    }

    /// Run one invocation. Never fails: handler failures become a 500 with
    /// an opaque body.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        let started = Instant::now();
        let request_id = Uuid::new_v4().to_string();

        let event = self.normalize(req).await;
        let ctx = Context::new(&*self.function_id, request_id.as_str());

        let outcome = match self.dispatch(event, ctx).await {
            Ok(result) => encode(result),
            Err(err) => Err(err),
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Ok(response) => {
                info!(
                    target: INVOCATION_TARGET,
                    status = response.status().as_u16(),
                    request_id = %request_id,
                    function_id = %self.function_id,
                    duration_ms,
                    "request_ok"
                );
                response
            }
            Err(err) => {
                error!(
                    target: INVOCATION_TARGET,
                    error = %err,
                    request_id = %request_id,
                    function_id = %self.function_id,
                    duration_ms,
                    "request_error"
                );
                internal_error()
            }
        }
    }

    /// Convert a raw request into an [`Event`].
    ///
    /// A body that fails to read or exceeds the size cap is treated as absent.
    pub async fn normalize<B>(&self, req: Request<B>) -> Event
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = req.into_parts();

        let query = parts.uri.query().map(Event::parse_query).unwrap_or_default();
        let headers = first_values(&parts.headers);

        let body = match Limited::new(body, self.max_body_size).collect().await {
            Ok(collected) => Some(collected.to_bytes()).filter(|bytes| !bytes.is_empty()),
            Err(err) => {
                debug!(error = %err, "request body unavailable");
                None
            }
        };

        Event {
            method: parts.method.as_str().to_string(),
            path: parts.uri.path().to_string(),
            query,
            headers,
            body,
        }
    }

    /// Invoke the handler on its own task so a panic surfaces as a failure.
    async fn dispatch(&self, event: Event, ctx: Context) -> Result<FnResponse, HandlerError> {
        let handler = Arc::clone(&self.handler);
        match tokio::spawn(async move { handler.invoke(event, ctx).await }).await {
            Ok(outcome) => outcome,
            Err(err) if err.is_panic() => Err(HandlerError::new(format!(
                "handler panicked: {}",
                panic_message(err.into_panic())
            ))),
            Err(err) => Err(HandlerError::new(err.to_string())),
        }
    }
}

/// Flatten a header multimap, keeping the first value of each name.
fn first_values(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .keys()
        .filter_map(|name| {
            headers.get(name).map(|value| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
        })
        .collect()
}

/// Build the HTTP response for a handler result.
///
/// Everything that can fail is checked before the response exists, so a bad
/// status, header or body falls back to the failure path as a whole.
fn encode(result: FnResponse) -> Result<Response<Full<Bytes>>, HandlerError> {
    // 1xx cannot be a final response; hyper would replace it with an empty 500.
    let status = StatusCode::from_u16(result.effective_status())
        .ok()
        .filter(|status| !status.is_informational())
        .ok_or_else(|| HandlerError::new(format!("invalid status code {}", result.status_code)))?;

    let mut headers = HeaderMap::new();
    for (name, value) in result.headers.into_iter().flatten() {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| HandlerError::new(format!("invalid header name {:?}", name)))?;
        let header_value = HeaderValue::from_str(&value)
            .map_err(|_| HandlerError::new(format!("invalid value for header {:?}", name)))?;
        headers.insert(header_name, header_value);
    }

    let body = match result.body {
        Some(value) => {
            let payload = serde_json::to_vec(&value)
                .map_err(|err| HandlerError::new(format!("failed to serialize body: {}", err)))?;
            headers
                .entry(CONTENT_TYPE)
                .or_insert(HeaderValue::from_static("application/json"));
            Bytes::from(payload)
        }
        None => Bytes::new(),
    };

    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

/// The opaque 500 sent for every failure.
fn internal_error() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(
        INTERNAL_ERROR_BODY.as_bytes(),
    )));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => (*message).to_string(),
            Err(_) => "unknown panic".to_string(),
        },
    }
}
