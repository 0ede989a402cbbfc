//! Per-request DEBUG log.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, Span};

use crate::net::ListenerKind;
use crate::observability::logging::format_duration;

/// State for [`log_requests`]: which listener the request arrived on.
#[derive(Clone)]
pub struct RequestLog {
    kind: ListenerKind,
    span: Span,
}

impl RequestLog {
    /// Capture the current span so request records nest under the listener.
    pub fn new(kind: ListenerKind) -> Self {
        Self {
            kind,
            span: Span::current(),
        }
    }
}

/// Log protocol, method, host, URI, status and duration of every request.
///
/// The duration covers everything this middleware wraps, including the
/// handler timeout.
pub async fn log_requests(
    State(log): State<RequestLog>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let proto = format!("{:?}", request.version());
    let method = request.method().clone();
    let uri = request.uri().to_string();
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| request.uri().host())
        .unwrap_or_default()
        .to_string();

    let response = next.run(request).instrument(log.span.clone()).await;

    tracing::debug!(
        parent: &log.span,
        handler = %log.kind,
        proto = %proto,
        method = %method,
        host = %host,
        uri = %uri,
        status = response.status().as_u16(),
        duration = %format_duration(start.elapsed()),
        "request"
    );

    response
}
