//! MCP / JSON-RPC message handling shared by the stream and unary paths.

pub mod expand_tool;
pub mod jsonrpc;

pub use expand_tool::{answer_expand_call, expand_schema_tool, ExpandArgs, EXPAND_SCHEMA_TOOL};
pub use jsonrpc::{initialized_notification, JsonRpcResponse, RpcError};
