//! Configuration handling for the askdata server.
//!
//! This module provides configuration management via CLI arguments and environment variables.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ROW_LIMIT: u32 = 100;

// Pool defaults mirror the connection profile the service was tuned for:
// a handful of persistent connections, recycled every 30 minutes, checked
// before checkout.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_MAX_CONNECTIONS_SQLITE: u32 = 1;
pub const DEFAULT_POOL_RECYCLE_SECS: u64 = 1800;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_LLM_MODEL: &str = "gemma2-9b-it";

/// Configuration for the askdata server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "askdata",
    about = "HTTP service for querying SQL databases and uploaded documents with natural language",
    version,
    author
)]
pub struct Config {
    /// HTTP host to bind to
    #[arg(long, default_value = DEFAULT_HTTP_HOST, env = "ASKDATA_HTTP_HOST")]
    pub http_host: String,

    /// HTTP port to bind to
    #[arg(long, default_value_t = DEFAULT_HTTP_PORT, env = "ASKDATA_HTTP_PORT")]
    pub http_port: u16,

    /// Directory where uploaded documents are stored
    #[arg(long, default_value = DEFAULT_UPLOAD_DIR, env = "ASKDATA_UPLOAD_DIR")]
    pub upload_dir: PathBuf,

    /// Time-to-live for cached query responses, in seconds
    #[arg(long, default_value_t = DEFAULT_CACHE_TTL_SECS, env = "ASKDATA_CACHE_TTL")]
    pub cache_ttl: u64,

    /// Query timeout in seconds
    #[arg(long, default_value_t = DEFAULT_QUERY_TIMEOUT_SECS, env = "ASKDATA_QUERY_TIMEOUT")]
    pub query_timeout: u64,

    /// Maximum number of rows returned per query
    #[arg(long, default_value_t = DEFAULT_ROW_LIMIT, env = "ASKDATA_ROW_LIMIT")]
    pub row_limit: u32,

    /// Allow planned SQL statements that modify data.
    /// By default only read-only statements are executed.
    #[arg(long, env = "ASKDATA_ALLOW_WRITES")]
    pub allow_writes: bool,

    /// Base URL of the OpenAI-compatible chat completions API
    #[arg(long, default_value = DEFAULT_LLM_BASE_URL, env = "ASKDATA_LLM_BASE_URL")]
    pub llm_base_url: String,

    /// Model used for query interpretation and document answers
    #[arg(long, default_value = DEFAULT_LLM_MODEL, env = "ASKDATA_LLM_MODEL")]
    pub llm_model: String,

    /// API key for the chat completions API (environment only - never passed on the command line)
    #[arg(long, hide = true, env = "ASKDATA_LLM_API_KEY")]
    pub llm_api_key: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "ASKDATA_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "ASKDATA_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            cache_ttl: DEFAULT_CACHE_TTL_SECS,
            query_timeout: DEFAULT_QUERY_TIMEOUT_SECS,
            row_limit: DEFAULT_ROW_LIMIT,
            allow_writes: false,
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_api_key: None,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Get the HTTP bind address.
    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// Get the cache TTL as a Duration.
    pub fn cache_ttl_duration(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    /// Get the query timeout as a Duration.
    pub fn query_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.query_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.http_host, DEFAULT_HTTP_HOST);
        assert_eq!(config.http_port, DEFAULT_HTTP_PORT);
        assert_eq!(config.cache_ttl, DEFAULT_CACHE_TTL_SECS);
        assert!(!config.allow_writes);
    }

    #[test]
    fn test_http_bind_addr() {
        let config = Config {
            http_host: "0.0.0.0".to_string(),
            http_port: 3000,
            ..Config::default()
        };
        assert_eq!(config.http_bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_timeout_durations() {
        let config = Config {
            cache_ttl: 120,
            query_timeout: 60,
            ..Config::default()
        };
        assert_eq!(config.cache_ttl_duration(), Duration::from_secs(120));
        assert_eq!(config.query_timeout_duration(), Duration::from_secs(60));
    }
}
