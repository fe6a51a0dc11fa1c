//! Per-connection rewriting of the upstream SSE stream.
//!
//! Each upstream line is classified and relayed:
//!
//! - blank and non-`data:` lines pass through verbatim
//! - `data:` lines that are not JSON pass through verbatim
//! - `tools/list` results get partitioned schemas plus the `expandSchema` tool
//! - the result of a tracked `initialize` request is followed by a synthesized
//!   `notifications/initialized` message
//! - every other JSON message is re-serialized unchanged
//!
//! The `notifications/initialized` message is emitted on the downstream
//! (server to client) channel. This is a compatibility shim for an upstream
//! that expects the notification without the client ever sending it over this
//! transport; it is kept as is.

use crate::protocol::jsonrpc::{
    has_result, id_of, initialized_notification, method_of, METHOD_INITIALIZE, METHOD_TOOLS_LIST,
};
use crate::protocol::expand_schema_tool;
use crate::schema::{SchemaPartitioner, TokenEstimate};
use crate::stream::sse::{data_payload, frame};
use serde_json::{json, Value};

/// Upper bound on remembered `tools/list` request ids per connection.
const MAX_PENDING_TOOL_LISTS: usize = 32;

/// Initialize handshake state of one connection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Handshake {
    #[default]
    Idle,
    /// An `initialize` request with this id was relayed; its result has not.
    AwaitingResponse(Value),
}

pub struct StreamInterceptor {
    partitioner: SchemaPartitioner,
    handshake: Handshake,
    pending_tool_lists: Vec<Value>,
}

impl StreamInterceptor {
    pub fn new(partitioner: SchemaPartitioner) -> Self {
        Self {
            partitioner,
            handshake: Handshake::Idle,
            pending_tool_lists: Vec::new(),
        }
    }

    pub fn handshake(&self) -> &Handshake {
        &self.handshake
    }

    /// Process one upstream line and return the outbound text to write, in
    /// order. Relayed JSON messages are complete `data:` frames.
    pub fn process_line(&mut self, line: &str) -> Vec<String> {
        if line.is_empty() {
            return vec!["\n".to_string()];
        }

        let Some(payload) = data_payload(line) else {
            return vec![format!("{}\n", line)];
        };

        match serde_json::from_str::<Value>(payload) {
            Ok(message) => self.process_message(message),
            Err(e) => {
                tracing::debug!(error = %e, "Relaying non-JSON data line unchanged");
                vec![format!("{}\n", line)]
            }
        }
    }

    fn process_message(&mut self, mut message: Value) -> Vec<String> {
        let method = method_of(&message).map(str::to_owned);

        if method.as_deref() == Some(METHOD_INITIALIZE) {
            if let Some(id) = id_of(&message) {
                tracing::info!(id = %id, "Detected initialize request");
                self.handshake = Handshake::AwaitingResponse(id.clone());
            }
            return vec![frame(&message)];
        }

        if self.take_tools_list_response(method.as_deref(), &message) {
            self.rewrite_tools_list(&mut message);
            return vec![frame(&message)];
        }

        if method.as_deref() == Some(METHOD_TOOLS_LIST) {
            if let Some(id) = id_of(&message) {
                self.remember_tools_list(id.clone());
            }
        }

        if has_result(&message) && self.is_initialize_response(&message) {
            tracing::info!("Detected initialize response, sending initialized notification");
            self.handshake = Handshake::Idle;
            return vec![frame(&message), frame(&initialized_notification())];
        }

        vec![frame(&message)]
    }

    fn is_initialize_response(&self, message: &Value) -> bool {
        match &self.handshake {
            Handshake::AwaitingResponse(tracked) => id_of(message) == Some(tracked),
            Handshake::Idle => false,
        }
    }

    /// True when `message` is a `tools/list` result to rewrite: either tagged
    /// with the method, or answering a `tools/list` request seen earlier.
    fn take_tools_list_response(&mut self, method: Option<&str>, message: &Value) -> bool {
        if !message.pointer("/result/tools").is_some_and(Value::is_array) {
            return false;
        }
        if method == Some(METHOD_TOOLS_LIST) {
            return true;
        }
        if method.is_some() {
            return false;
        }

        let Some(id) = id_of(message) else {
            return false;
        };
        match self.pending_tool_lists.iter().position(|pending| pending == id) {
            Some(index) => {
                self.pending_tool_lists.remove(index);
                true
            }
            None => false,
        }
    }

    fn remember_tools_list(&mut self, id: Value) {
        if self.pending_tool_lists.len() >= MAX_PENDING_TOOL_LISTS {
            self.pending_tool_lists.remove(0);
        }
        self.pending_tool_lists.push(id);
    }

    fn rewrite_tools_list(&self, message: &mut Value) {
        let Some(tools) = message
            .pointer_mut("/result/tools")
            .and_then(Value::as_array_mut)
        else {
            return;
        };

        let advertised = tools.len();
        let mut full_total = 0;
        let mut partitioned_total = 0;

        for tool in tools.iter_mut() {
            let Some(tool) = tool.as_object_mut() else {
                continue;
            };
            let name = tool
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            // A missing schema is advertised as `{}`; an explicit null passes through.
            let full = tool.get("inputSchema").cloned().unwrap_or_else(|| json!({}));

            if !name.is_empty() && tool.contains_key("inputSchema") && !full.is_null() {
                self.partitioner.store_full(&name, &full);
            }

            let TokenEstimate {
                full: full_tokens,
                partitioned: partitioned_tokens,
                reduction_percent,
            } = self.partitioner.estimate_reduction(&full);
            tracing::debug!(
                tool = %name,
                full_tokens,
                partitioned_tokens,
                reduction_percent,
                "Partitioned tool schema"
            );
            metrics::histogram!("schema_token_reduction_percent").record(reduction_percent as f64);
            full_total += full_tokens;
            partitioned_total += partitioned_tokens;

            tool.insert("inputSchema".to_string(), self.partitioner.partition(&full));
        }

        tools.push(expand_schema_tool());

        tracing::info!(
            tools = advertised,
            full_tokens = full_total,
            partitioned_tokens = partitioned_total,
            "Rewrote tools/list response"
        );
        metrics::counter!("tools_list_rewrites_total").increment(1);
    }
}
