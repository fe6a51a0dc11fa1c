//! MCP schema-partitioning proxy
//!
//! Sits between an MCP client and an upstream tool gateway, rewrites
//! `tools/list` results into shallow schemas and serves the stripped detail
//! back through a synthetic `expandSchema` tool. This library exposes the
//! components for integration tests and embedding.

pub mod config;
pub mod error;
pub mod handlers;
pub mod protocol;
pub mod schema;
pub mod state;
pub mod stream;
pub mod upstream;

// Re-export key types for convenience
pub use config::Config;
pub use error::{AppError, Result};
pub use handlers::{health_handler, ready_handler, rpc_handler, sse_handler};
pub use schema::{InMemorySchemaCache, SchemaCache, SchemaPartitioner};
pub use state::AppState;
pub use stream::StreamInterceptor;
