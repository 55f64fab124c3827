//! HTTP handlers.

use crate::db::SchemaInspector;
use crate::docs::UploadedFile;
use crate::error::{AppError, AppResult};
use crate::models::{
    DocumentIngestResponse, DocumentSearchRequest, DocumentSearchResponse, IngestDatabaseRequest,
    PagedQueryRequest, PagedQueryResponse, QueryRequest, QueryResponse, SchemaResponse,
};
use crate::server::AppState;
use axum::Json;
use axum::extract::{Multipart, State};
use axum::response::Html;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// Landing page.
pub async fn home() -> Html<&'static str> {
    Html(include_str!("index.html"))
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub connections: usize,
    pub cached_queries: usize,
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        connections: state.engines.count().await,
        cached_queries: state.cache.len().await,
    })
}

/// Accept a multipart upload batch under the `files` field.
pub async fn ingest_documents(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<DocumentIngestResponse>> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::invalid_input(format!("Invalid multipart payload: {}", e)))?
    {
        if field.name() != Some("files") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::invalid_input(format!("Failed to read upload: {}", e)))?
            .to_vec();
        files.push(UploadedFile { filename, bytes });
    }

    let stored = state.documents.store_batch(files).await?;
    info!(count = stored.len(), "Documents ingested");
    Ok(Json(DocumentIngestResponse::for_batch(stored)))
}

/// Connect to a database and return its schema snapshot.
pub async fn ingest_database(
    State(state): State<AppState>,
    Json(req): Json<IngestDatabaseRequest>,
) -> AppResult<Json<SchemaResponse>> {
    let pool = state.engines.acquire(&req.connection_string).await?;
    let tables = SchemaInspector::snapshot(&pool).await?;
    info!(tables = tables.len(), "Database schema ingested");
    Ok(Json(SchemaResponse { tables }))
}

/// Run a natural language query against the database and/or documents.
pub async fn run_query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> AppResult<Json<QueryResponse>> {
    let response = state.query.run(&req).await?;
    Ok(Json(response))
}

/// Keyword search over every stored document, no interpreter involved.
pub async fn search_documents(
    State(state): State<AppState>,
    Json(req): Json<DocumentSearchRequest>,
) -> AppResult<Json<DocumentSearchResponse>> {
    let response = state.query.search_documents(&req.query).await?;
    Ok(Json(response))
}

/// Run caller-supplied read-only SQL with paging.
pub async fn paged_query(
    State(state): State<AppState>,
    Json(req): Json<PagedQueryRequest>,
) -> AppResult<Json<PagedQueryResponse>> {
    let response = state.query.paged(&req).await?;
    Ok(Json(response))
}

/// Drop every cached query response.
pub async fn clear_cache(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.cache.clear().await;
    Json(serde_json::json!({ "message": "Cache cleared" }))
}
