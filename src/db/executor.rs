//! Query execution engine.
//!
//! This module executes planned SQL with:
//! - Row limits (enforced via streaming - only fetches needed rows)
//! - Query timeouts
//!
//! Statements arrive as raw SQL produced by the interpreter, so there is no
//! parameter binding here; read-only enforcement happens before execution.
//!
//! # Architecture
//!
//! The executor uses database-specific implementations organized in
//! submodules (mysql, postgres, sqlite), each providing identical
//! functionality adapted to the database's type system.

use crate::config::{DEFAULT_QUERY_TIMEOUT_SECS, DEFAULT_ROW_LIMIT};
use crate::db::pool::DbPool;
use crate::db::types::RowToJson;
use crate::error::{AppError, AppResult};
use crate::models::MAX_ROW_LIMIT;
use futures_util::StreamExt;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Result of executing one SQL statement.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    /// Column names in result order.
    pub columns: Vec<String>,
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
    /// True when the row limit cut the result short.
    pub truncated: bool,
    pub execution_time_ms: u64,
}

/// Query executor that handles database query execution.
pub struct QueryExecutor {
    default_timeout: Duration,
    default_limit: u32,
}

impl QueryExecutor {
    /// Create a new query executor with default settings.
    pub fn new() -> Self {
        Self {
            default_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
            default_limit: DEFAULT_ROW_LIMIT,
        }
    }

    /// Create a new query executor with custom settings.
    pub fn with_defaults(timeout_secs: u64, row_limit: u32) -> Self {
        Self {
            default_timeout: Duration::from_secs(timeout_secs),
            default_limit: row_limit.min(MAX_ROW_LIMIT),
        }
    }

    /// Execute a statement with the default row limit.
    pub async fn fetch(&self, pool: &DbPool, sql: &str) -> AppResult<QueryOutcome> {
        self.fetch_with_limit(pool, sql, self.default_limit).await
    }

    /// Execute a statement, returning at most `limit` rows.
    pub async fn fetch_with_limit(
        &self,
        pool: &DbPool,
        sql: &str,
        limit: u32,
    ) -> AppResult<QueryOutcome> {
        let start = Instant::now();
        // Clamp to [1, MAX_ROW_LIMIT] so limit=0 cannot mark every result truncated
        let row_limit = limit.clamp(1, MAX_ROW_LIMIT);
        let query_timeout = self.default_timeout;

        debug!(
            sql = %sql,
            limit = row_limit,
            timeout_secs = query_timeout.as_secs(),
            "Executing query"
        );

        match pool {
            DbPool::MySql(p) => {
                let rows = mysql::fetch_rows(p, sql, row_limit, query_timeout).await?;
                Ok(process_rows(rows, row_limit, start))
            }
            DbPool::Postgres(p) => {
                let rows = postgres::fetch_rows(p, sql, row_limit, query_timeout).await?;
                Ok(process_rows(rows, row_limit, start))
            }
            DbPool::SQLite(p) => {
                let rows = sqlite::fetch_rows(p, sql, row_limit, query_timeout).await?;
                Ok(process_rows(rows, row_limit, start))
            }
        }
    }
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Process rows from any database type into a QueryOutcome.
fn process_rows<R: RowToJson>(rows: Vec<R>, row_limit: u32, start: Instant) -> QueryOutcome {
    let execution_time_ms = start.elapsed().as_millis() as u64;

    if rows.is_empty() {
        return QueryOutcome {
            columns: Vec::new(),
            rows: Vec::new(),
            truncated: false,
            execution_time_ms,
        };
    }

    let columns = rows[0].column_names();
    let total_rows = rows.len();
    let truncated = total_rows > row_limit as usize;
    let rows_to_take = (row_limit as usize).min(total_rows);

    let json_rows: Vec<serde_json::Map<String, serde_json::Value>> = rows
        .iter()
        .take(rows_to_take)
        .map(|r| r.to_json_map())
        .collect();

    if truncated {
        warn!(
            total_rows = total_rows,
            limit = row_limit,
            "Query result truncated"
        );
    }

    QueryOutcome {
        columns,
        rows: json_rows,
        truncated,
        execution_time_ms,
    }
}

// =============================================================================
// Common Helper Functions
// =============================================================================

fn collect_rows<R>(results: Vec<Result<R, sqlx::Error>>) -> AppResult<Vec<R>> {
    let mut rows = Vec::with_capacity(results.len());
    for result in results {
        rows.push(result.map_err(AppError::from)?);
    }
    Ok(rows)
}

fn timeout_error(operation: &str, timeout: Duration) -> AppError {
    AppError::timeout(operation, timeout.as_secs() as u32)
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================
//
// Each module below provides the same interface adapted to its database type.
// The code structure is intentionally parallel to make differences obvious.

mod mysql {
    use super::*;
    use sqlx::MySqlPool;
    use sqlx::mysql::MySqlRow;

    pub async fn fetch_rows(
        pool: &MySqlPool,
        sql: &str,
        row_limit: u32,
        query_timeout: Duration,
    ) -> AppResult<Vec<MySqlRow>> {
        use sqlx::Executor;
        // Fetch one extra row to detect truncation without draining the cursor
        let fetch_limit = row_limit as usize + 1;
        let stream = pool.fetch(sql);
        let rows_future = stream.take(fetch_limit).collect::<Vec<_>>();

        match timeout(query_timeout, rows_future).await {
            Ok(results) => collect_rows(results),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }
}

mod postgres {
    use super::*;
    use sqlx::PgPool;
    use sqlx::postgres::PgRow;

    pub async fn fetch_rows(
        pool: &PgPool,
        sql: &str,
        row_limit: u32,
        query_timeout: Duration,
    ) -> AppResult<Vec<PgRow>> {
        use sqlx::Executor;
        let fetch_limit = row_limit as usize + 1;
        let stream = pool.fetch(sql);
        let rows_future = stream.take(fetch_limit).collect::<Vec<_>>();

        match timeout(query_timeout, rows_future).await {
            Ok(results) => collect_rows(results),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }
}

mod sqlite {
    use super::*;
    use sqlx::SqlitePool;
    use sqlx::sqlite::SqliteRow;

    pub async fn fetch_rows(
        pool: &SqlitePool,
        sql: &str,
        row_limit: u32,
        query_timeout: Duration,
    ) -> AppResult<Vec<SqliteRow>> {
        use sqlx::Executor;
        let fetch_limit = row_limit as usize + 1;
        let stream = pool.fetch(sql);
        let rows_future = stream.take(fetch_limit).collect::<Vec<_>>();

        match timeout(query_timeout, rows_future).await {
            Ok(results) => collect_rows(results),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_defaults() {
        let executor = QueryExecutor::new();
        assert_eq!(
            executor.default_timeout,
            Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS)
        );
        assert_eq!(executor.default_limit, DEFAULT_ROW_LIMIT);
    }

    #[test]
    fn test_executor_custom_settings() {
        let executor = QueryExecutor::with_defaults(60, 500);
        assert_eq!(executor.default_timeout, Duration::from_secs(60));
        assert_eq!(executor.default_limit, 500);
    }

    #[test]
    fn test_executor_limit_capped() {
        let executor = QueryExecutor::with_defaults(30, 99999);
        assert_eq!(executor.default_limit, MAX_ROW_LIMIT);
    }
}
