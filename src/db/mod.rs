//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Connection pool caching keyed by connection string
//! - Query execution
//! - Schema introspection
//! - Type mappings

pub mod executor;
pub mod pool;
pub mod schema;
pub mod types;

pub use executor::{QueryExecutor, QueryOutcome};
pub use pool::{DbPool, EngineCache, EngineOptions};
pub use schema::SchemaInspector;
