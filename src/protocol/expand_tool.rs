//! The synthetic `expandSchema` tool.
//!
//! The proxy appends this descriptor to every rewritten `tools/list` result
//! and answers calls to it locally from the full-schema cache.

use crate::protocol::jsonrpc::{id_of, JsonRpcResponse, RpcError};
use crate::schema::SchemaPartitioner;
use serde_json::{json, Value};

pub const EXPAND_SCHEMA_TOOL: &str = "expandSchema";

/// Tool descriptor advertised to clients. Its shape is part of the client
/// contract: `toolName` is required, `path` is an optional array of strings.
pub fn expand_schema_tool() -> Value {
    json!({
        "name": EXPAND_SCHEMA_TOOL,
        "description": "Get detailed schema for specific tool parameters. Use this when you need to know the structure of nested properties.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "toolName": {
                    "type": "string",
                    "description": "Name of the tool whose schema you want to expand"
                },
                "path": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Path to the property to expand (e.g., ['metadata', 'shipping']). Omit for full schema."
                }
            },
            "required": ["toolName"]
        }
    })
}

/// Validated `expandSchema` arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandArgs {
    pub tool_name: String,
    pub path: Vec<String>,
}

impl ExpandArgs {
    /// Parse `params.arguments` of a `tools/call` request.
    pub fn from_request(request: &Value) -> Result<Self, RpcError> {
        let arguments = request.get("params").and_then(|p| p.get("arguments"));

        let tool_name = arguments
            .and_then(|a| a.get("toolName"))
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| RpcError::invalid_params("toolName is required"))?;

        let path = match arguments.and_then(|a| a.get("path")) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(keys)) => keys
                .iter()
                .map(|k| k.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| RpcError::invalid_params("path must be an array of strings"))?,
            Some(_) => {
                return Err(RpcError::invalid_params("path must be an array of strings"));
            }
        };

        Ok(Self {
            tool_name: tool_name.to_string(),
            path,
        })
    }
}

/// Answer an `expandSchema` call. Every failure is a JSON-RPC error carrying
/// the request id.
pub fn answer_expand_call(partitioner: &SchemaPartitioner, request: &Value) -> JsonRpcResponse {
    let id = id_of(request).cloned().unwrap_or(Value::Null);

    match expand(partitioner, request) {
        Ok(result) => JsonRpcResponse::success(id, result),
        Err(error) => {
            tracing::debug!(code = error.code, message = %error.message, "expandSchema rejected");
            JsonRpcResponse::failure(id, error)
        }
    }
}

fn expand(partitioner: &SchemaPartitioner, request: &Value) -> Result<Value, RpcError> {
    let args = ExpandArgs::from_request(request)?;

    let schema = partitioner
        .expand(&args.tool_name, &args.path)
        .ok_or_else(|| {
            RpcError::invalid_params(format!("Schema not found for tool: {}", args.tool_name))
        })?;

    let text = serde_json::to_string_pretty(&schema)
        .map_err(|e| RpcError::internal(format!("Failed to serialize schema: {}", e)))?;

    tracing::debug!(
        tool = %args.tool_name,
        depth = args.path.len(),
        "expandSchema served from cache"
    );

    Ok(json!({
        "content": [{ "type": "text", "text": text }]
    }))
}
