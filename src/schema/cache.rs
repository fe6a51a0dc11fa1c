//! Full-schema cache backing `expandSchema`.
//!
//! The cache holds the untouched `inputSchema` of every tool seen in a
//! `tools/list` response. Keys are tool names; cardinality is bounded by the
//! upstream's advertised tool count, so there is no eviction or TTL.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Keyed store of full tool schemas.
///
/// Implementations are internally synchronized: callers share one instance
/// through `Arc<dyn SchemaCache>` without extra locking.
pub trait SchemaCache: Send + Sync {
    /// Insert a deep copy of `schema`, replacing any previous entry for `name`.
    fn store(&self, name: &str, schema: &Value);

    /// Fetch the entry for `name`, if one was stored.
    fn lookup(&self, name: &str) -> Option<Arc<Value>>;

    /// Number of cached tool schemas.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-lifetime in-memory cache.
///
/// Entries are stored as `Arc<Value>` and swapped in under the write lock, so
/// a concurrent `lookup` sees either the old or the new schema, never a mix.
#[derive(Debug, Default)]
pub struct InMemorySchemaCache {
    entries: RwLock<HashMap<String, Arc<Value>>>,
}

impl InMemorySchemaCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SchemaCache for InMemorySchemaCache {
    fn store(&self, name: &str, schema: &Value) {
        let entry = Arc::new(schema.clone());
        let previous = self.entries.write().insert(name.to_string(), entry);
        tracing::trace!(tool = name, replaced = previous.is_some(), "Cached full schema");
    }

    fn lookup(&self, name: &str) -> Option<Arc<Value>> {
        self.entries.read().get(name).cloned()
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}
