//! Tool schema handling: structural model, partitioning and the full-schema cache.

pub mod cache;
pub mod node;
pub mod partition;

pub use cache::{InMemorySchemaCache, SchemaCache};
pub use node::{ObjectSchema, SchemaNode};
pub use partition::{
    estimate_reduction, partition_schema, SchemaPartitioner, TokenEstimate, DEFAULT_DEPTH,
};
