//! HTTP server.
//!
//! Builds the axum router over shared application state and runs it with
//! graceful shutdown on SIGINT/SIGTERM. Long-lived client connections could
//! otherwise keep the process alive, so shutdown is forced after a timeout
//! or a second signal.

pub mod handlers;

use crate::cache::QueryCache;
use crate::db::EngineCache;
use crate::docs::DocumentStore;
use crate::error::{AppError, AppResult};
use crate::query::QueryService;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub engines: Arc<EngineCache>,
    pub cache: Arc<QueryCache>,
    pub documents: Arc<DocumentStore>,
    pub query: Arc<QueryService>,
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/api/health", get(handlers::health))
        .route("/api/ingest/documents", post(handlers::ingest_documents))
        .route("/api/ingest/database", post(handlers::ingest_database))
        .route("/api/query", post(handlers::run_query))
        .route("/api/query/documents", post(handlers::search_documents))
        .route("/api/query/paged", post(handlers::paged_query))
        .route("/clear-cache", get(handlers::clear_cache))
        .with_state(state)
}

/// HTTP server wrapper.
pub struct HttpServer {
    state: AppState,
    host: String,
    port: u16,
}

impl HttpServer {
    /// Create a new server.
    pub fn new(state: AppState, host: impl Into<String>, port: u16) -> Self {
        Self {
            state,
            host: host.into(),
            port,
        }
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Serve until a shutdown signal arrives.
    pub async fn run(&self) -> AppResult<()> {
        let bind_addr = self.bind_addr();
        info!("Starting askdata server on {}", bind_addr);

        let app = build_router(self.state.clone());

        let listener = TcpListener::bind(&bind_addr).await.map_err(|e| {
            AppError::connection(
                format!("Failed to bind to {}: {}", bind_addr, e),
                "Check that the port is available",
            )
        })?;

        info!("HTTP endpoints ready");

        const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(30);

        let shutdown_notify = Arc::new(tokio::sync::Notify::new());
        let shutdown_notify_clone = shutdown_notify.clone();

        let shutdown_signal = async move {
            wait_for_signal().await;
            shutdown_notify_clone.notify_one();
        };

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal);

        // Race the server against a forced exit once shutdown was requested
        tokio::select! {
            result = server => {
                match result {
                    Ok(()) => info!("HTTP server stopped"),
                    Err(e) => {
                        error!(error = %e, "HTTP server error");
                        return Err(AppError::internal(format!("HTTP server error: {}", e)));
                    }
                }
            }
            _ = async {
                shutdown_notify.notified().await;
                info!(
                    timeout_secs = GRACEFUL_TIMEOUT.as_secs(),
                    "Waiting for connections to close (send signal again to force exit)..."
                );

                tokio::select! {
                    _ = tokio::time::sleep(GRACEFUL_TIMEOUT) => {
                        warn!("Graceful shutdown timeout, forcing exit");
                    }
                    _ = wait_for_signal() => {
                        warn!("Received second signal, forcing immediate exit");
                    }
                }
            } => {}
        }

        info!("Closing database pools");
        self.state.engines.close_all().await;

        Ok(())
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_signal() {
    let ctrl_c = signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
