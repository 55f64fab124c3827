//! askdata - Main entry point.
//!
//! Serves the HTTP API for querying SQL databases (SQLite, PostgreSQL,
//! MySQL) and uploaded documents with natural language.

use askdata::cache::QueryCache;
use askdata::config::Config;
use askdata::db::{EngineCache, EngineOptions, QueryExecutor};
use askdata::docs::DocumentStore;
use askdata::llm::{LlmClient, QueryPlanner, UnconfiguredPlanner};
use askdata::query::QueryService;
use askdata::server::{AppState, HttpServer};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    init_tracing(&config);

    info!(
        host = %config.http_host,
        port = config.http_port,
        "Starting askdata v{}",
        env!("CARGO_PKG_VERSION")
    );

    let engines = Arc::new(EngineCache::new(EngineOptions {
        writable: config.allow_writes,
        ..EngineOptions::default()
    }));

    let cache = Arc::new(QueryCache::new(config.cache_ttl_duration()));
    cache.clone().start_cleanup_task();

    let documents = Arc::new(DocumentStore::new(&config.upload_dir));
    documents.init().await?;
    info!(dir = %documents.root().display(), "Document store ready");

    let planner: Arc<dyn QueryPlanner> = match LlmClient::from_config(&config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!(
                error = %e,
                "Query interpretation disabled; schema ingestion, uploads, and keyword search remain available"
            );
            Arc::new(UnconfiguredPlanner)
        }
    };

    let executor = QueryExecutor::with_defaults(config.query_timeout, config.row_limit);
    let query = Arc::new(QueryService::new(
        engines.clone(),
        executor,
        cache.clone(),
        documents.clone(),
        planner,
        config.allow_writes,
    ));

    let state = AppState {
        engines,
        cache,
        documents,
        query,
    };

    let server = HttpServer::new(state, &config.http_host, config.http_port);
    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
