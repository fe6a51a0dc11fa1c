use crate::config::Config;
use crate::error::Result;
use crate::schema::{InMemorySchemaCache, SchemaCache, SchemaPartitioner};
use crate::stream::StreamInterceptor;
use crate::upstream::UpstreamClient;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Application state shared across all request handlers.
///
/// The schema cache is the only state shared between connections; the
/// handshake tracker lives in each connection's [`StreamInterceptor`].
pub struct AppState {
    pub partitioner: SchemaPartitioner,
    pub upstream: UpstreamClient,
    /// Cleared once shutdown begins
    pub ready: AtomicBool,
    pub config: Arc<Config>,
}

impl AppState {
    /// Initialize application state with a fresh in-memory schema cache.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_cache(config, Arc::new(InMemorySchemaCache::new()))
    }

    /// Initialize application state around an existing schema cache.
    pub fn with_cache(config: Config, cache: Arc<dyn SchemaCache>) -> Result<Self> {
        let upstream = UpstreamClient::new(&config)?;
        let partitioner = SchemaPartitioner::new(cache, config.partition_depth);

        tracing::info!(
            gateway = %config.gateway_url,
            partition_depth = config.partition_depth,
            "Proxy state initialized"
        );

        Ok(Self {
            partitioner,
            upstream,
            ready: AtomicBool::new(true),
            config: Arc::new(config),
        })
    }

    /// A fresh interceptor for one SSE connection.
    pub fn interceptor(&self) -> StreamInterceptor {
        StreamInterceptor::new(self.partitioner.clone())
    }

    /// Check if the service is ready to handle requests.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Report not ready for the rest of the process lifetime.
    pub fn begin_drain(&self) {
        self.ready.store(false, Ordering::SeqCst);
        tracing::info!("Readiness withdrawn, draining");
    }

    pub fn cached_schemas(&self) -> usize {
        self.partitioner.cache().len()
    }
}
