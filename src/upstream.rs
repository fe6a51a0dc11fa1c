//! HTTP client for the upstream MCP gateway.

use crate::config::Config;
use crate::error::{AppError, Result};
use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderName};

/// True for headers that describe a single hop and are never relayed.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Copy `headers` without hop-by-hop entries.
pub fn end_to_end_headers(headers: &HeaderMap) -> HeaderMap {
    headers
        .iter()
        .filter(|(name, _)| !is_hop_by_hop(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

#[derive(Clone)]
pub struct UpstreamClient {
    /// No overall timeout: an SSE stream may idle indefinitely between events.
    stream_http: reqwest::Client,
    /// Bounded by the configured unary timeout.
    unary_http: reqwest::Client,
    sse_url: String,
    unary_url: String,
}

impl UpstreamClient {
    pub fn new(config: &Config) -> Result<Self> {
        let stream_http = reqwest::Client::builder().build()?;
        let unary_http = reqwest::Client::builder()
            .timeout(config.unary_timeout())
            .build()?;

        Ok(Self {
            stream_http,
            unary_http,
            sse_url: config.sse_url(),
            unary_url: config.unary_url(),
        })
    }

    /// Open the upstream SSE stream, forwarding the client's request headers.
    ///
    /// A non-success status is a connection-level failure.
    pub async fn open_sse(&self, client_headers: &HeaderMap) -> Result<reqwest::Response> {
        let mut headers = end_to_end_headers(client_headers);
        headers.remove(header::HOST);
        headers.remove(header::CONTENT_LENGTH);
        // The stream is parsed line by line, so it must arrive uncompressed.
        headers.remove(header::ACCEPT_ENCODING);

        let response = self
            .stream_http
            .get(&self.sse_url)
            .headers(headers)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "SSE endpoint returned HTTP {}",
                status
            )));
        }

        tracing::debug!(url = %self.sse_url, %status, "Upstream SSE stream opened");
        Ok(response)
    }

    /// POST a raw JSON-RPC body to the unary endpoint.
    pub async fn forward(&self, body: Bytes) -> Result<reqwest::Response> {
        let response = self
            .unary_http
            .post(&self.unary_url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        tracing::debug!(status = %response.status(), "Unary call forwarded upstream");
        Ok(response)
    }
}
