//! askdata library.
//!
//! This library backs a single-process HTTP service that answers natural
//! language questions against SQL databases (SQLite, PostgreSQL, MySQL) and
//! uploaded documents, plus a typed console client for driving the service.

pub mod cache;
pub mod config;
pub mod console;
pub mod db;
pub mod docs;
pub mod error;
pub mod llm;
pub mod models;
pub mod query;
pub mod server;

pub use config::Config;
pub use error::AppError;
pub use query::QueryService;
