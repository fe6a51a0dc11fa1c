//! POST /mcp - unary JSON-RPC endpoint.

use crate::error::Result;
use crate::protocol::jsonrpc::called_tool_name;
use crate::protocol::{answer_expand_call, EXPAND_SCHEMA_TOOL};
use crate::state::AppState;
use crate::upstream::end_to_end_headers;
use axum::{
    body::{Body, Bytes},
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

/// POST /mcp - Answer `expandSchema` calls locally, forward everything else.
///
/// `expandSchema` failures are JSON-RPC errors with HTTP 200. Anything else,
/// including bodies that are not JSON, goes upstream byte-for-byte and the
/// upstream status, headers and body come back unchanged.
pub async fn rpc_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response> {
    if let Ok(request) = serde_json::from_slice::<Value>(&body) {
        if called_tool_name(&request) == Some(EXPAND_SCHEMA_TOOL) {
            metrics::counter!("expand_schema_requests_total").increment(1);
            let response = answer_expand_call(&state.partitioner, &request);
            return Ok(Json(response).into_response());
        }
    }

    forward_upstream(&state, body).await
}

async fn forward_upstream(state: &AppState, body: Bytes) -> Result<Response> {
    let upstream = state.upstream.forward(body).await?;

    let status = upstream.status();
    let headers = end_to_end_headers(upstream.headers());
    let bytes = upstream.bytes().await?;

    metrics::counter!("unary_forwarded_total", "status" => status.as_u16().to_string())
        .increment(1);

    let mut response = Response::builder().status(status).body(Body::from(bytes))?;
    *response.headers_mut() = headers;
    Ok(response)
}
