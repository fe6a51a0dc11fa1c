use crate::schema::DEFAULT_DEPTH;
use std::env;
use std::time::Duration;

const DEFAULT_GATEWAY_URL: &str = "http://mcp-gateway:9090";

pub struct Config {
    pub host: String,
    pub port: u16,
    /// Base URL of the upstream MCP gateway, without a trailing slash.
    /// SSE is read from `{gateway_url}/sse`, unary calls go to `{gateway_url}/`.
    pub gateway_url: String,
    /// Timeout for a forwarded unary JSON-RPC call. The SSE path has none.
    pub unary_timeout_secs: u64,
    /// Depth passed to the partitioner for `tools/list` rewriting.
    pub partition_depth: i32,
    /// Maximum accepted request body on the unary endpoint.
    pub max_body_bytes: usize,
    /// Grace period for in-flight connections after a shutdown signal.
    pub shutdown_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// - `HOST`, `PORT`: listen address (`0.0.0.0:8001`)
    /// - `MCP_GATEWAY_URL`: upstream gateway (`http://mcp-gateway:9090`)
    /// - `UNARY_TIMEOUT_SECS`: unary forward timeout (`60`)
    /// - `PARTITION_DEPTH`: partition depth (`1`)
    /// - `MAX_BODY_BYTES`: unary body limit (10 MiB)
    /// - `SHUTDOWN_TIMEOUT`: drain period in seconds (`10`)
    pub fn from_env() -> anyhow::Result<Self> {
        let gateway_url =
            env::var("MCP_GATEWAY_URL").unwrap_or_else(|_| DEFAULT_GATEWAY_URL.to_string());
        if !gateway_url.starts_with("http://") && !gateway_url.starts_with("https://") {
            anyhow::bail!("MCP_GATEWAY_URL must be an http(s) URL, got {:?}", gateway_url);
        }

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8001".to_string())
                .parse()?,
            gateway_url: normalize_base_url(&gateway_url),
            unary_timeout_secs: env::var("UNARY_TIMEOUT_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()?,
            partition_depth: env::var("PARTITION_DEPTH")
                .unwrap_or_else(|_| DEFAULT_DEPTH.to_string())
                .parse()?,
            max_body_bytes: env::var("MAX_BODY_BYTES")
                .unwrap_or_else(|_| (10 * 1024 * 1024).to_string())
                .parse()?,
            shutdown_timeout_secs: env::var("SHUTDOWN_TIMEOUT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
        })
    }

    /// Default configuration pointed at `gateway_url`.
    pub fn for_gateway(gateway_url: impl AsRef<str>) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8001,
            gateway_url: normalize_base_url(gateway_url.as_ref()),
            unary_timeout_secs: 60,
            partition_depth: DEFAULT_DEPTH,
            max_body_bytes: 10 * 1024 * 1024,
            shutdown_timeout_secs: 10,
        }
    }

    pub fn sse_url(&self) -> String {
        format!("{}/sse", self.gateway_url)
    }

    pub fn unary_url(&self) -> String {
        format!("{}/", self.gateway_url)
    }

    pub fn unary_timeout(&self) -> Duration {
        Duration::from_secs(self.unary_timeout_secs)
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
