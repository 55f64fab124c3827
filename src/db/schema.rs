//! Schema introspection module.
//!
//! This module produces the schema snapshot returned by the database ingest
//! endpoint: every base table with its columns and foreign keys, across
//! SQLite, PostgreSQL, and MySQL.
//!
//! # Architecture
//!
//! SQL queries are organized in the `queries` submodule with constants for
//! each database type. Database-specific implementations are in their
//! respective submodules (postgres, mysql, sqlite), each providing the same
//! interface.

use crate::db::pool::DbPool;
use crate::error::AppResult;
use crate::models::{ColumnInfo, ForeignKeyRef, TableSchema};
use tracing::debug;

/// Schema inspector for database introspection.
pub struct SchemaInspector;

impl SchemaInspector {
    /// Snapshot all base tables with columns and foreign keys.
    pub async fn snapshot(pool: &DbPool) -> AppResult<Vec<TableSchema>> {
        match pool {
            DbPool::Postgres(p) => postgres::snapshot(p).await,
            DbPool::MySql(p) => mysql::snapshot(p).await,
            DbPool::SQLite(p) => sqlite::snapshot(p).await,
        }
    }

    /// Condensed `{table: [column names]}` map handed to the query
    /// interpreter as schema context.
    pub fn summarize(tables: &[TableSchema]) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = tables
            .iter()
            .map(|t| {
                let cols: Vec<serde_json::Value> = t
                    .columns
                    .iter()
                    .map(|c| serde_json::Value::String(c.name.clone()))
                    .collect();
                (t.name.clone(), serde_json::Value::Array(cols))
            })
            .collect();
        serde_json::Value::Object(map)
    }
}

/// Group (constraint key, column, ref table, ref column) rows into one
/// foreign key entry per constraint, preserving first-seen order.
fn group_foreign_keys(rows: Vec<(String, String, String, String)>) -> Vec<ForeignKeyRef> {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: std::collections::HashMap<String, ForeignKeyRef> =
        std::collections::HashMap::new();

    for (key, column, ref_table, ref_column) in rows {
        match grouped.get_mut(&key) {
            Some(fk) => fk.push_pair(column, ref_column),
            None => {
                order.push(key.clone());
                grouped.insert(key, ForeignKeyRef::single(column, ref_table, ref_column));
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| grouped.remove(&key))
        .collect()
}

// =============================================================================
// SQL Query Templates
// =============================================================================

mod queries {
    pub mod postgres {
        pub const LIST_TABLES: &str = r#"
            SELECT table_name
            FROM information_schema.tables
            WHERE table_schema = 'public'
            AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#;

        pub const DESCRIBE_COLUMNS: &str = r#"
        SELECT
            c.column_name,
            c.data_type,
            c.is_nullable,
            CASE WHEN pk.column_name IS NOT NULL THEN true ELSE false END as is_primary_key
        FROM information_schema.columns c
        LEFT JOIN (
            SELECT kcu.column_name
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON tc.constraint_name = kcu.constraint_name
                AND tc.table_schema = kcu.table_schema
            WHERE tc.table_name = $1
            AND tc.table_schema = 'public'
            AND tc.constraint_type = 'PRIMARY KEY'
        ) pk ON c.column_name = pk.column_name
        WHERE c.table_name = $1 AND c.table_schema = 'public'
        ORDER BY c.ordinal_position
        "#;

        pub const DESCRIBE_FOREIGN_KEYS: &str = r#"
        SELECT
            tc.constraint_name,
            kcu.column_name,
            ccu.table_name AS ref_table,
            ccu.column_name AS ref_column
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
            ON tc.constraint_name = kcu.constraint_name
            AND tc.table_schema = kcu.table_schema
        JOIN information_schema.constraint_column_usage ccu
            ON ccu.constraint_name = tc.constraint_name
            AND ccu.table_schema = tc.table_schema
        WHERE tc.table_name = $1
        AND tc.table_schema = 'public'
        AND tc.constraint_type = 'FOREIGN KEY'
        ORDER BY tc.constraint_name, kcu.ordinal_position
        "#;
    }

    pub mod mysql {
        pub const LIST_TABLES: &str = r#"
            SELECT CONVERT(TABLE_NAME USING utf8) AS TABLE_NAME
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = DATABASE()
            AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
            "#;

        pub const DESCRIBE_COLUMNS: &str = r#"
        SELECT
            CONVERT(COLUMN_NAME USING utf8) AS COLUMN_NAME,
            CONVERT(COLUMN_TYPE USING utf8) AS COLUMN_TYPE,
            CONVERT(IS_NULLABLE USING utf8) AS IS_NULLABLE,
            CONVERT(COLUMN_KEY USING utf8) AS COLUMN_KEY
        FROM information_schema.columns
        WHERE TABLE_NAME = ? AND TABLE_SCHEMA = DATABASE()
        ORDER BY ORDINAL_POSITION
        "#;

        pub const DESCRIBE_FOREIGN_KEYS: &str = r#"
        SELECT
            CONVERT(CONSTRAINT_NAME USING utf8) AS CONSTRAINT_NAME,
            CONVERT(COLUMN_NAME USING utf8) AS COLUMN_NAME,
            CONVERT(REFERENCED_TABLE_NAME USING utf8) AS REFERENCED_TABLE_NAME,
            CONVERT(REFERENCED_COLUMN_NAME USING utf8) AS REFERENCED_COLUMN_NAME
        FROM information_schema.KEY_COLUMN_USAGE
        WHERE TABLE_NAME = ?
        AND TABLE_SCHEMA = DATABASE()
        AND REFERENCED_TABLE_NAME IS NOT NULL
        ORDER BY CONSTRAINT_NAME, ORDINAL_POSITION
        "#;
    }

    pub mod sqlite {
        pub const LIST_TABLES: &str = r#"
            SELECT name FROM sqlite_master
            WHERE type = 'table'
            AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#;
    }
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================

mod postgres {
    use super::*;
    use sqlx::{PgPool, Row};

    pub async fn snapshot(pool: &PgPool) -> AppResult<Vec<TableSchema>> {
        let rows = sqlx::query(queries::postgres::LIST_TABLES)
            .fetch_all(pool)
            .await?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row.get("table_name");
            if name.is_empty() {
                continue;
            }
            tables.push(describe_table(pool, &name).await?);
        }

        debug!(count = tables.len(), "Snapshot of PostgreSQL schema");
        Ok(tables)
    }

    async fn describe_table(pool: &PgPool, table_name: &str) -> AppResult<TableSchema> {
        let rows = sqlx::query(queries::postgres::DESCRIBE_COLUMNS)
            .bind(table_name)
            .fetch_all(pool)
            .await?;

        let mut table = TableSchema::new(table_name);
        for row in &rows {
            let name: String = row.get("column_name");
            let data_type: String = row.get("data_type");
            let nullable: String = row.get("is_nullable");
            let is_pk: bool = row.get("is_primary_key");
            table = table.with_column(
                ColumnInfo::new(&name, &data_type, nullable == "YES").with_primary_key(is_pk),
            );
        }

        let fk_rows = sqlx::query(queries::postgres::DESCRIBE_FOREIGN_KEYS)
            .bind(table_name)
            .fetch_all(pool)
            .await?;

        let pairs = fk_rows
            .iter()
            .map(|row| {
                (
                    row.get::<String, _>("constraint_name"),
                    row.get::<String, _>("column_name"),
                    row.get::<String, _>("ref_table"),
                    row.get::<String, _>("ref_column"),
                )
            })
            .collect();
        table.foreign_keys = group_foreign_keys(pairs);

        Ok(table)
    }
}

mod mysql {
    use super::*;
    use sqlx::{MySqlPool, Row};

    /// Safely get a string from a MySQL row.
    /// MySQL may return VARBINARY instead of VARCHAR depending on charset configuration.
    fn get_string(row: &sqlx::mysql::MySqlRow, column: &str) -> String {
        row.try_get::<String, _>(column)
            .ok()
            .or_else(|| {
                row.try_get::<Vec<u8>, _>(column)
                    .ok()
                    .and_then(|bytes| String::from_utf8(bytes).ok())
            })
            .unwrap_or_default()
    }

    pub async fn snapshot(pool: &MySqlPool) -> AppResult<Vec<TableSchema>> {
        let rows = sqlx::query(queries::mysql::LIST_TABLES)
            .fetch_all(pool)
            .await?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in &rows {
            let name = get_string(row, "TABLE_NAME");
            if name.is_empty() {
                continue;
            }
            tables.push(describe_table(pool, &name).await?);
        }

        debug!(count = tables.len(), "Snapshot of MySQL schema");
        Ok(tables)
    }

    async fn describe_table(pool: &MySqlPool, table_name: &str) -> AppResult<TableSchema> {
        let rows = sqlx::query(queries::mysql::DESCRIBE_COLUMNS)
            .bind(table_name)
            .fetch_all(pool)
            .await?;

        let mut table = TableSchema::new(table_name);
        for row in &rows {
            let name = get_string(row, "COLUMN_NAME");
            let column_type = get_string(row, "COLUMN_TYPE");
            let nullable = get_string(row, "IS_NULLABLE");
            let is_pk = get_string(row, "COLUMN_KEY") == "PRI";
            table = table.with_column(
                ColumnInfo::new(&name, &column_type, nullable == "YES").with_primary_key(is_pk),
            );
        }

        let fk_rows = sqlx::query(queries::mysql::DESCRIBE_FOREIGN_KEYS)
            .bind(table_name)
            .fetch_all(pool)
            .await?;

        let pairs = fk_rows
            .iter()
            .map(|row| {
                (
                    get_string(row, "CONSTRAINT_NAME"),
                    get_string(row, "COLUMN_NAME"),
                    get_string(row, "REFERENCED_TABLE_NAME"),
                    get_string(row, "REFERENCED_COLUMN_NAME"),
                )
            })
            .collect();
        table.foreign_keys = group_foreign_keys(pairs);

        Ok(table)
    }
}

mod sqlite {
    use super::*;
    use sqlx::{Row, SqlitePool};

    pub async fn snapshot(pool: &SqlitePool) -> AppResult<Vec<TableSchema>> {
        let rows = sqlx::query(queries::sqlite::LIST_TABLES)
            .fetch_all(pool)
            .await?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row.get("name");
            tables.push(describe_table(pool, &name).await?);
        }

        debug!(count = tables.len(), "Snapshot of SQLite schema");
        Ok(tables)
    }

    async fn describe_table(pool: &SqlitePool, table_name: &str) -> AppResult<TableSchema> {
        let pragma_query = format!("PRAGMA table_info('{}')", table_name.replace('\'', "''"));
        let rows = sqlx::query(&pragma_query).fetch_all(pool).await?;

        let mut table = TableSchema::new(table_name);
        for row in &rows {
            let name: String = row.get("name");
            let data_type: String = row.get("type");
            let notnull: i32 = row.get("notnull");
            let pk: i32 = row.get("pk");
            table = table.with_column(
                ColumnInfo::new(&name, &data_type, notnull == 0).with_primary_key(pk > 0),
            );
        }

        let fk_query = format!(
            "PRAGMA foreign_key_list('{}')",
            table_name.replace('\'', "''")
        );
        let fk_rows = sqlx::query(&fk_query).fetch_all(pool).await.unwrap_or_default();

        // PRAGMA foreign_key_list reports one row per column pair; rows of a
        // composite key share the same id.
        let pairs = fk_rows
            .iter()
            .map(|row| {
                (
                    row.get::<i64, _>("id").to_string(),
                    row.get::<String, _>("from"),
                    row.get::<String, _>("table"),
                    row.get::<String, _>("to"),
                )
            })
            .collect();
        table.foreign_keys = group_foreign_keys(pairs);

        Ok(table)
    }
}
