//! GET /mcp/sse - proxied MCP event stream.

use crate::error::Result;
use crate::state::AppState;
use crate::stream::intercept;
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Logs and counts the end of a proxied stream, whichever side closed it.
struct ConnectionGuard {
    span: tracing::Span,
    opened: Instant,
}

impl ConnectionGuard {
    fn new(span: tracing::Span) -> Self {
        metrics::counter!("sse_connections_total").increment(1);
        metrics::gauge!("sse_connections_active").increment(1.0);
        Self {
            span,
            opened: Instant::now(),
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        metrics::gauge!("sse_connections_active").decrement(1.0);
        tracing::info!(
            parent: &self.span,
            duration_ms = self.opened.elapsed().as_millis() as u64,
            "SSE connection closed"
        );
    }
}

/// GET /mcp/sse - Relay the upstream SSE stream with `tools/list` rewriting.
///
/// # Flow
/// 1. Open the upstream stream (502/504 if that fails)
/// 2. Wrap its body in a per-connection interceptor
/// 3. Stream rewritten frames to the client until either side closes
///
/// Dropping the response body (client gone) drops the upstream response and
/// closes that connection. An upstream failure mid-stream ends the body.
pub async fn sse_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response> {
    let span = tracing::info_span!("sse", connection = %Uuid::new_v4());

    let upstream = state
        .upstream
        .open_sse(&headers)
        .instrument(span.clone())
        .await?;
    tracing::info!(parent: &span, "SSE client connected");

    let guard = ConnectionGuard::new(span);
    let events = intercept(upstream.bytes_stream(), state.interceptor()).map(move |chunk| {
        if let Err(e) = &chunk {
            tracing::warn!(parent: &guard.span, error = %e, "Upstream SSE stream failed");
        }
        chunk
    });

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .body(Body::from_stream(events))?;

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));

    Ok(response)
}
