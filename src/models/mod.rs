//! Data models for the askdata server.
//!
//! This module re-exports all wire types used throughout the application.

pub mod connection;
pub mod ingest;
pub mod query;
pub mod schema;

// Re-export commonly used types
pub use connection::DatabaseType;
pub use ingest::{DocumentIngestResponse, IngestDatabaseRequest};
pub use query::{
    DEFAULT_PAGE_SIZE, DatabaseQueryData, DocumentIntent, DocumentMatch, DocumentQueryData,
    DocumentSearchRequest, DocumentSearchResponse, MAX_ROW_LIMIT, PagedQueryRequest,
    PagedQueryResponse, QueryRequest, QueryResponse,
};
pub use schema::{ColumnInfo, ForeignKeyRef, SchemaResponse, TableSchema};
