//! Minimal JSON-RPC 2.0 vocabulary used by the proxy.
//!
//! Messages are handled as `serde_json::Value` so that anything the proxy
//! does not rewrite is relayed with its content intact.

use serde::Serialize;
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_INITIALIZED: &str = "notifications/initialized";
pub const METHOD_TOOLS_LIST: &str = "tools/list";
pub const METHOD_TOOLS_CALL: &str = "tools/call";

/// Invalid method parameter(s).
pub const INVALID_PARAMS: i64 = -32602;
/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("json-rpc error {code}: {message}")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: INVALID_PARAMS,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: INTERNAL_ERROR,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// The `notifications/initialized` message the proxy emits after relaying an
/// initialize result.
pub fn initialized_notification() -> Value {
    serde_json::json!({
        "jsonrpc": JSONRPC_VERSION,
        "method": METHOD_INITIALIZED,
    })
}

/// `method` of a message, if it has a string one.
pub fn method_of(message: &Value) -> Option<&str> {
    message.get("method").and_then(Value::as_str)
}

/// Request id of a message; `None` when absent or null.
pub fn id_of(message: &Value) -> Option<&Value> {
    message.get("id").filter(|id| !id.is_null())
}

/// True when the message is an object carrying a `result` key (any value).
pub fn has_result(message: &Value) -> bool {
    message
        .as_object()
        .is_some_and(|object| object.contains_key("result"))
}

/// Name of the tool targeted by a `tools/call` request.
pub fn called_tool_name(message: &Value) -> Option<&str> {
    if method_of(message) != Some(METHOD_TOOLS_CALL) {
        return None;
    }
    message
        .get("params")
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str)
}
