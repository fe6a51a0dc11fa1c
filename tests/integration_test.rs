//! Integration tests for the MCP schema proxy.
//!
//! The upstream gateway is a wiremock server; requests are driven through the
//! router with `tower::ServiceExt::oneshot`.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::{get, post},
    Router,
};
use mcp_schema_proxy::{
    handlers::{health_handler, ready_handler, rpc_handler, sse_handler},
    AppState, Config,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create a test router with every proxy endpoint.
fn create_test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/mcp/sse", get(sse_handler))
        .route("/mcp", post(rpc_handler))
        .route("/mcp/", post(rpc_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .with_state(state)
}

fn state_for(gateway_url: &str) -> Arc<AppState> {
    Arc::new(AppState::new(Config::for_gateway(gateway_url)).expect("Failed to create AppState"))
}

/// Helper to make a request and return status, headers and raw body.
async fn raw_request(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<String>,
) -> (StatusCode, axum::http::HeaderMap, String) {
    let req = match method {
        "GET" => Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
        "POST" => Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.unwrap_or_default()))
            .unwrap(),
        _ => panic!("Unsupported method"),
    };

    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, headers, String::from_utf8_lossy(&body_bytes).into_owned())
}

async fn json_post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let (status, _, text) = raw_request(app, "POST", uri, Some(body.to_string())).await;
    (status, serde_json::from_str(&text).unwrap_or(json!({})))
}

/// `data:` payloads of an SSE body, parsed as JSON where possible.
fn data_messages(body: &str) -> Vec<Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .filter_map(|payload| serde_json::from_str(payload).ok())
        .collect()
}

fn expand_call(id: u64, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": "expandSchema", "arguments": arguments }
    })
}

fn payment_tools_list() -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 2,
        "method": "tools/list",
        "result": {
            "tools": [{
                "name": "stripe_create_payment",
                "description": "Create a payment",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "amount": { "type": "number" },
                        "metadata": {
                            "type": "object",
                            "properties": {
                                "shipping": {
                                    "type": "object",
                                    "properties": { "city": { "type": "string" } }
                                }
                            }
                        }
                    },
                    "required": ["amount"]
                }
            }]
        }
    })
}

async fn mount_sse(server: &MockServer, body: String) {
    Mock::given(method("GET"))
        .and(path("/sse"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(server)
        .await;
}

// ============================================================================
// Health Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint_returns_200() {
    let app = Router::new().route("/health", get(health_handler));
    let (status, _, body) = raw_request(app, "GET", "/health", None).await;
    let body: Value = serde_json::from_str(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_ready_reports_cached_schemas() {
    let app = create_test_app(state_for("http://127.0.0.1:9"));
    let (status, _, body) = raw_request(app, "GET", "/ready", None).await;
    let body: Value = serde_json::from_str(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["cached_schemas"], 0);
}

#[tokio::test]
async fn test_ready_returns_503_after_drain_begins() {
    let state = state_for("http://127.0.0.1:9");
    state.begin_drain();
    let app = create_test_app(state.clone());

    let (status, _, body) = raw_request(app.clone(), "GET", "/ready", None).await;
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "not_ready");

    // Liveness is unaffected
    let (status, _, _) = raw_request(app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

// ============================================================================
// SSE Stream Tests
// ============================================================================

#[tokio::test]
async fn test_sse_rewrites_tools_list_and_sets_headers() {
    let server = MockServer::start().await;
    mount_sse(&server, format!("data: {}\n\n", payment_tools_list())).await;
    let app = create_test_app(state_for(&server.uri()));

    let (status, headers, body) = raw_request(app, "GET", "/mcp/sse", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "text/event-stream");
    assert_eq!(headers["cache-control"], "no-cache");
    assert_eq!(headers["connection"], "keep-alive");
    assert_eq!(headers["x-accel-buffering"], "no");

    let messages = data_messages(&body);
    assert_eq!(messages.len(), 1);
    let tools = messages[0]["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 2);
    assert_eq!(tools[1]["name"], "expandSchema");
    assert_eq!(
        tools[0]["inputSchema"]["properties"]["metadata"],
        json!({ "type": "object" })
    );
}

#[tokio::test]
async fn test_sse_handshake_and_malformed_lines() {
    let server = MockServer::start().await;
    let upstream = concat!(
        "event: endpoint\n",
        "data: /messages?session_id=abc\n",
        "\n",
        "data: {\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"initialize\",\"params\":{}}\n",
        "\n",
        "data: {not json\n",
        "\n",
        "data: {\"jsonrpc\":\"2.0\",\"id\":7,\"result\":{\"capabilities\":{}}}\n",
        "\n",
        "data: {\"jsonrpc\":\"2.0\",\"id\":7,\"result\":{}}\n",
        "\n",
    );
    mount_sse(&server, upstream.to_string()).await;
    let app = create_test_app(state_for(&server.uri()));

    let (status, _, body) = raw_request(app, "GET", "/mcp/sse", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("event: endpoint\ndata: /messages?session_id=abc\n"));
    assert!(body.contains("data: {not json\n"));

    let messages = data_messages(&body);
    let methods: Vec<Option<&str>> = messages.iter().map(|m| m["method"].as_str()).collect();
    assert_eq!(
        methods,
        vec![Some("initialize"), None, Some("notifications/initialized"), None]
    );
    assert_eq!(messages[1]["result"]["capabilities"], json!({}));
}

#[tokio::test]
async fn test_sse_forwards_client_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sse"))
        .and(header("x-client", "inspector"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(": ok\n", "text/event-stream"))
        .mount(&server)
        .await;
    let app = create_test_app(state_for(&server.uri()));

    let req = Request::builder()
        .uri("/mcp/sse")
        .header("x-client", "inspector")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b": ok\n");
}

#[tokio::test]
async fn test_sse_upstream_error_status_returns_502() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sse"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let app = create_test_app(state_for(&server.uri()));

    let (status, _, body) = raw_request(app, "GET", "/mcp/sse", None).await;
    let body: Value = serde_json::from_str(&body).unwrap();

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], 502);
}

#[tokio::test]
async fn test_sse_unreachable_upstream_returns_502() {
    let app = create_test_app(state_for("http://127.0.0.1:9"));

    let (status, _, _) = raw_request(app, "GET", "/mcp/sse", None).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

// ============================================================================
// expandSchema Tests
// ============================================================================

#[tokio::test]
async fn test_expand_schema_after_tools_list() {
    let server = MockServer::start().await;
    mount_sse(&server, format!("data: {}\n\n", payment_tools_list())).await;
    let app = create_test_app(state_for(&server.uri()));

    raw_request(app.clone(), "GET", "/mcp/sse", None).await;

    let (status, response) = json_post(
        app,
        "/mcp",
        expand_call(
            11,
            json!({ "toolName": "stripe_create_payment", "path": ["metadata", "shipping"] }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["id"], 11);
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    let schema: Value = serde_json::from_str(text).unwrap();
    assert_eq!(
        schema,
        json!({ "type": "object", "properties": { "city": { "type": "string" } } })
    );
}

#[tokio::test]
async fn test_expand_schema_missing_tool_name() {
    let app = create_test_app(state_for("http://127.0.0.1:9"));

    let (status, response) = json_post(app, "/mcp/", expand_call(1, json!({}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["id"], 1);
    assert_eq!(response["error"]["code"], -32602);
    assert_eq!(response["error"]["message"], "toolName is required");
}

#[tokio::test]
async fn test_expand_schema_unknown_tool() {
    let app = create_test_app(state_for("http://127.0.0.1:9"));

    let (status, response) =
        json_post(app, "/mcp", expand_call(5, json!({ "toolName": "nope", "path": ["x"] }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["error"]["code"], -32602);
    assert_eq!(response["error"]["message"], "Schema not found for tool: nope");
}

// ============================================================================
// Unary Forwarding Tests
// ============================================================================

#[tokio::test]
async fn test_other_calls_forwarded_verbatim() {
    let server = MockServer::start().await;
    let request_body = r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"stripe_create_payment","arguments":{"amount":5}}}"#;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("content-type", "application/json"))
        .and(body_string(request_body))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-upstream", "gateway")
                .set_body_raw(r#"{"jsonrpc":"2.0","id":3,"result":{"content":[]}}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;
    let app = create_test_app(state_for(&server.uri()));

    let (status, headers, body) =
        raw_request(app, "POST", "/mcp", Some(request_body.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-upstream"], "gateway");
    assert_eq!(body, r#"{"jsonrpc":"2.0","id":3,"result":{"content":[]}}"#);
}

#[tokio::test]
async fn test_upstream_error_status_relayed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    let app = create_test_app(state_for(&server.uri()));

    let (status, _, body) = raw_request(
        app,
        "POST",
        "/mcp",
        Some(json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" }).to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "boom");
}

#[tokio::test]
async fn test_non_json_body_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_string("not json"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .expect(1)
        .mount(&server)
        .await;
    let app = create_test_app(state_for(&server.uri()));

    let (status, _, _) = raw_request(app, "POST", "/mcp", Some("not json".to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unary_unreachable_upstream_returns_502() {
    let app = create_test_app(state_for("http://127.0.0.1:9"));

    let (status, _, body) = raw_request(
        app,
        "POST",
        "/mcp",
        Some(json!({ "jsonrpc": "2.0", "id": 1, "method": "ping" }).to_string()),
    )
    .await;
    let body: Value = serde_json::from_str(&body).unwrap();

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("unavailable"));
}
