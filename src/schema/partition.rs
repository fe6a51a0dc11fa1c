//! Schema partitioning: shallow tool schemas for `tools/list`, full detail on
//! demand through `expandSchema`.
//!
//! The dominant token cost of a large tool catalog is deeply nested parameter
//! trees (payment metadata, address blocks). Partitioning keeps the first
//! property level with the keywords a client needs to build a valid top-level
//! call, and drops everything nested below it.

use crate::schema::cache::SchemaCache;
use crate::schema::node::{ObjectSchema, SchemaNode};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Default partition depth: keep one level of property detail.
pub const DEFAULT_DEPTH: i32 = 1;

/// Keywords kept on each collapsed property, in output order.
pub const SUMMARY_FIELDS: [&str; 8] = [
    "type",
    "description",
    "enum",
    "const",
    "format",
    "pattern",
    "required",
    "default",
];

/// Approximate characters per token for the size estimate.
const CHARS_PER_TOKEN: usize = 4;

/// Produce the shallow form of `schema`.
///
/// Non-object values are returned unchanged. When `depth > 0`, every
/// object-valued property is reduced to its [`SUMMARY_FIELDS`]. An object
/// `items` schema is partitioned recursively with `depth - 1`.
///
/// The property cut is always a single level whenever `depth > 0`; `depth`
/// only changes the outcome for arrays nested inside arrays.
pub fn partition_schema(schema: &Value, depth: i32) -> Value {
    match SchemaNode::from_value(schema) {
        SchemaNode::Object(object) => SchemaNode::Object(partition_object(object, depth)).into_value(),
        other => other.into_value(),
    }
}

fn partition_object(mut object: ObjectSchema, depth: i32) -> ObjectSchema {
    if depth > 0 {
        if let Some(properties) = object.properties.as_mut() {
            for property in properties.values_mut() {
                if let SchemaNode::Object(prop) = property {
                    *prop = summarize(prop);
                }
            }
        }
    }

    if let Some(items) = object.items.take() {
        let items = match *items {
            SchemaNode::Object(inner) => {
                SchemaNode::Object(partition_object(inner, depth.saturating_sub(1)))
            }
            other => other,
        };
        object.items = Some(Box::new(items));
    }

    object
}

/// Collapse a property schema to its allow-listed keywords.
fn summarize(prop: &ObjectSchema) -> ObjectSchema {
    let fields: Map<String, Value> = SUMMARY_FIELDS
        .iter()
        .filter_map(|&key| prop.fields.get(key).map(|v| (key.to_string(), v.clone())))
        .collect();

    ObjectSchema {
        fields,
        properties: None,
        items: None,
    }
}

/// Rough size comparison between a full schema and its partitioned form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenEstimate {
    pub full: usize,
    pub partitioned: usize,
    pub reduction_percent: i64,
}

/// Estimate the token saving of partitioning `full_schema` at `depth`.
///
/// Uses compact JSON length divided by four characters per token. This is a
/// heuristic for logs and metrics, not a tokenizer measurement.
pub fn estimate_reduction(full_schema: &Value, depth: i32) -> TokenEstimate {
    let full = estimate_tokens(full_schema);
    let partitioned = estimate_tokens(&partition_schema(full_schema, depth));

    TokenEstimate {
        full,
        partitioned,
        reduction_percent: reduction_percent(full, partitioned),
    }
}

/// Percentage saved, rounded to the nearest whole percent. Zero when `full` is zero.
fn reduction_percent(full: usize, partitioned: usize) -> i64 {
    if full == 0 {
        return 0;
    }
    (100.0 * (1.0 - partitioned as f64 / full as f64)).round() as i64
}

fn estimate_tokens(value: &Value) -> usize {
    // Serializing a `Value` cannot fail; an empty string only zeroes the estimate.
    serde_json::to_string(value).map(|s| s.len()).unwrap_or(0) / CHARS_PER_TOKEN
}

/// Partitions schemas and serves expansions from a shared [`SchemaCache`].
#[derive(Clone)]
pub struct SchemaPartitioner {
    cache: Arc<dyn SchemaCache>,
    depth: i32,
}

impl SchemaPartitioner {
    pub fn new(cache: Arc<dyn SchemaCache>, depth: i32) -> Self {
        Self { cache, depth }
    }

    pub fn cache(&self) -> &Arc<dyn SchemaCache> {
        &self.cache
    }

    /// Shallow form of `schema` at the configured depth.
    pub fn partition(&self, schema: &Value) -> Value {
        partition_schema(schema, self.depth)
    }

    /// Remember the full schema of `tool_name` for later expansion.
    pub fn store_full(&self, tool_name: &str, schema: &Value) {
        self.cache.store(tool_name, schema);
    }

    /// Look up the cached full schema of `tool_name` and walk `path` into it.
    ///
    /// Each key is first matched directly on the current node, then under
    /// its `properties`. Returns `None` for an unknown tool or an unresolvable
    /// path, otherwise a copy of the reached node.
    pub fn expand<S: AsRef<str>>(&self, tool_name: &str, path: &[S]) -> Option<Value> {
        let schema = self.cache.lookup(tool_name)?;

        let mut current: &Value = &schema;
        for key in path {
            let key = key.as_ref();
            let node = current.as_object()?;
            current = match node.get(key) {
                Some(child) => child,
                None => node.get("properties").and_then(|p| p.get(key))?,
            };
        }

        Some(current.clone())
    }

    pub fn estimate_reduction(&self, full_schema: &Value) -> TokenEstimate {
        estimate_reduction(full_schema, self.depth)
    }
}
