//! SQL statement validation for read-only enforcement.
//!
//! Planned SQL comes out of a language model, so it is never trusted to be a
//! read. Unless the server runs with `--allow-writes`, every statement is
//! parsed and anything that is not a plain read is rejected before it
//! touches a pool.
//!
//! Uses [sqlparser](https://docs.rs/sqlparser/) for AST-based validation so
//! formatting tricks and dialect variations cannot smuggle a write through.

use crate::error::{AppError, AppResult};
use crate::models::DatabaseType;
use sqlparser::ast::Statement;
use sqlparser::dialect::{Dialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

/// Kind of SQL statement detected by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// SELECT and other read-only statements (SHOW, EXPLAIN SELECT, ...)
    Read,
    /// INSERT, UPDATE, DELETE, MERGE, COPY
    DmlWrite,
    /// CREATE, DROP, ALTER, TRUNCATE
    Ddl,
    /// BEGIN, COMMIT, ROLLBACK, SAVEPOINT
    Transaction,
    /// CALL, EXECUTE, PREPARE
    ProcedureCall,
    /// GRANT, SET, PRAGMA, and other server-state statements
    Administrative,
    /// Anything the classifier does not recognize
    Unknown,
}

fn get_dialect(db_type: DatabaseType) -> Box<dyn Dialect> {
    match db_type {
        DatabaseType::PostgreSQL => Box::new(PostgreSqlDialect {}),
        DatabaseType::MySQL => Box::new(MySqlDialect {}),
        DatabaseType::SQLite => Box::new(SQLiteDialect {}),
    }
}

/// Validate SQL for read-only execution.
///
/// Returns `Ok(())` when every statement is a read, or
/// `Err(AppError::Permission)` naming the offending operation otherwise.
pub fn validate_readonly(sql: &str, db_type: DatabaseType) -> AppResult<()> {
    let dialect = get_dialect(db_type);

    let statements = Parser::parse_sql(dialect.as_ref(), sql)
        .map_err(|e| AppError::invalid_input(format!("Failed to parse SQL statement: {}", e)))?;

    if statements.is_empty() {
        return Err(AppError::invalid_input("Empty SQL statement"));
    }

    for stmt in statements {
        let (kind, operation) = classify_statement(&stmt);
        if kind != StatementKind::Read {
            return Err(AppError::permission(
                operation,
                reject_reason(kind),
            ));
        }
    }

    Ok(())
}

fn reject_reason(kind: StatementKind) -> &'static str {
    match kind {
        StatementKind::Read => "",
        StatementKind::DmlWrite => {
            "Write statements are not executed. Start the server with --allow-writes to permit them."
        }
        StatementKind::Ddl => {
            "Schema modifications are not executed. Start the server with --allow-writes to permit them."
        }
        StatementKind::Transaction => "Transaction control statements are not executed.",
        StatementKind::ProcedureCall => {
            "Procedure calls are not executed; their behavior cannot be verified as read-only."
        }
        StatementKind::Administrative => "Administrative statements are not executed.",
        StatementKind::Unknown => "Unrecognized SQL statement; only read queries are executed.",
    }
}

/// Classify a parsed statement.
pub fn classify_statement(stmt: &Statement) -> (StatementKind, &'static str) {
    match stmt {
        // Read-only operations - allowed
        Statement::Query(_) => (StatementKind::Read, "SELECT"),
        Statement::ShowTables { .. } => (StatementKind::Read, "SHOW TABLES"),
        Statement::ShowColumns { .. } => (StatementKind::Read, "SHOW COLUMNS"),
        Statement::ShowDatabases { .. } => (StatementKind::Read, "SHOW DATABASES"),
        Statement::ShowSchemas { .. } => (StatementKind::Read, "SHOW SCHEMAS"),
        Statement::ShowCreate { .. } => (StatementKind::Read, "SHOW CREATE"),
        Statement::ShowVariable { .. } => (StatementKind::Read, "SHOW VARIABLE"),
        Statement::ShowVariables { .. } => (StatementKind::Read, "SHOW VARIABLES"),
        Statement::ShowStatus { .. } => (StatementKind::Read, "SHOW STATUS"),
        Statement::ExplainTable { .. } => (StatementKind::Read, "EXPLAIN TABLE"),

        // EXPLAIN is only a read when the underlying statement is one
        Statement::Explain { statement, .. } => {
            let (inner_kind, inner_name) = classify_statement(statement);
            if inner_kind == StatementKind::Read {
                (StatementKind::Read, "EXPLAIN")
            } else {
                (inner_kind, inner_name)
            }
        }

        // DML writes - blocked
        Statement::Insert(_) => (StatementKind::DmlWrite, "INSERT"),
        Statement::Update { .. } => (StatementKind::DmlWrite, "UPDATE"),
        Statement::Delete(_) => (StatementKind::DmlWrite, "DELETE"),
        Statement::Merge { .. } => (StatementKind::DmlWrite, "MERGE"),
        Statement::Copy { .. } => (StatementKind::DmlWrite, "COPY"),

        // DDL - blocked
        Statement::CreateTable { .. } => (StatementKind::Ddl, "CREATE TABLE"),
        Statement::CreateView { .. } => (StatementKind::Ddl, "CREATE VIEW"),
        Statement::CreateIndex(_) => (StatementKind::Ddl, "CREATE INDEX"),
        Statement::CreateSchema { .. } => (StatementKind::Ddl, "CREATE SCHEMA"),
        Statement::CreateDatabase { .. } => (StatementKind::Ddl, "CREATE DATABASE"),
        Statement::CreateFunction { .. } => (StatementKind::Ddl, "CREATE FUNCTION"),
        Statement::CreateProcedure { .. } => (StatementKind::Ddl, "CREATE PROCEDURE"),
        Statement::CreateTrigger { .. } => (StatementKind::Ddl, "CREATE TRIGGER"),
        Statement::AlterTable { .. } => (StatementKind::Ddl, "ALTER TABLE"),
        Statement::AlterView { .. } => (StatementKind::Ddl, "ALTER VIEW"),
        Statement::AlterIndex { .. } => (StatementKind::Ddl, "ALTER INDEX"),
        Statement::Drop { .. } => (StatementKind::Ddl, "DROP"),
        Statement::DropFunction { .. } => (StatementKind::Ddl, "DROP FUNCTION"),
        Statement::DropProcedure { .. } => (StatementKind::Ddl, "DROP PROCEDURE"),
        Statement::DropTrigger { .. } => (StatementKind::Ddl, "DROP TRIGGER"),
        Statement::Truncate { .. } => (StatementKind::Ddl, "TRUNCATE"),

        // Transaction control - blocked
        Statement::StartTransaction { .. } => (StatementKind::Transaction, "BEGIN"),
        Statement::Commit { .. } => (StatementKind::Transaction, "COMMIT"),
        Statement::Rollback { .. } => (StatementKind::Transaction, "ROLLBACK"),
        Statement::Savepoint { .. } => (StatementKind::Transaction, "SAVEPOINT"),
        Statement::ReleaseSavepoint { .. } => (StatementKind::Transaction, "RELEASE SAVEPOINT"),

        // Procedure/function calls - blocked (cannot verify behavior)
        Statement::Call { .. } => (StatementKind::ProcedureCall, "CALL"),
        Statement::Execute { .. } => (StatementKind::ProcedureCall, "EXECUTE"),
        Statement::Prepare { .. } => (StatementKind::ProcedureCall, "PREPARE"),
        Statement::Deallocate { .. } => (StatementKind::ProcedureCall, "DEALLOCATE"),

        // Administrative operations - blocked
        Statement::Grant { .. } => (StatementKind::Administrative, "GRANT"),
        Statement::Revoke { .. } => (StatementKind::Administrative, "REVOKE"),
        Statement::Set(_) => (StatementKind::Administrative, "SET"),
        Statement::Use(_) => (StatementKind::Administrative, "USE"),
        Statement::Kill { .. } => (StatementKind::Administrative, "KILL"),
        Statement::Vacuum { .. } => (StatementKind::Administrative, "VACUUM"),
        Statement::Analyze { .. } => (StatementKind::Administrative, "ANALYZE"),
        Statement::LockTables { .. } => (StatementKind::Administrative, "LOCK"),
        Statement::UnlockTables => (StatementKind::Administrative, "UNLOCK"),
        Statement::Flush { .. } => (StatementKind::Administrative, "FLUSH"),
        Statement::Pragma { .. } => (StatementKind::Administrative, "PRAGMA"),
        Statement::AttachDatabase { .. } => (StatementKind::Administrative, "ATTACH"),

        // Everything else - blocked (conservative approach)
        _ => (StatementKind::Unknown, "Unknown"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_DB_TYPE: DatabaseType = DatabaseType::PostgreSQL;

    #[test]
    fn test_validate_readonly_select_ok() {
        assert!(validate_readonly("SELECT * FROM users", TEST_DB_TYPE).is_ok());
    }

    #[test]
    fn test_validate_readonly_insert_error() {
        let result = validate_readonly("INSERT INTO users VALUES (1)", TEST_DB_TYPE);
        assert!(matches!(result, Err(AppError::Permission { .. })));
    }

    #[test]
    fn test_validate_readonly_update_error() {
        assert!(validate_readonly("UPDATE users SET name = 'test'", TEST_DB_TYPE).is_err());
    }

    #[test]
    fn test_validate_readonly_ddl_error() {
        assert!(validate_readonly("CREATE TABLE t (id INT)", TEST_DB_TYPE).is_err());
        assert!(validate_readonly("DROP TABLE users", TEST_DB_TYPE).is_err());
    }

    #[test]
    fn test_explain_select_allowed() {
        assert!(validate_readonly("EXPLAIN SELECT * FROM users", TEST_DB_TYPE).is_ok());
    }

    #[test]
    fn test_explain_insert_blocked() {
        assert!(
            validate_readonly("EXPLAIN INSERT INTO users VALUES (1)", TEST_DB_TYPE).is_err()
        );
    }

    #[test]
    fn test_cte_allowed() {
        let sql = "WITH active AS (SELECT id FROM users WHERE active) SELECT * FROM active";
        assert!(validate_readonly(sql, TEST_DB_TYPE).is_ok());
    }

    #[test]
    fn test_multiple_statements_blocked() {
        let sql = "SELECT 1; INSERT INTO users VALUES (1)";
        assert!(validate_readonly(sql, TEST_DB_TYPE).is_err());
    }

    #[test]
    fn test_empty_sql_rejected() {
        assert!(validate_readonly("", TEST_DB_TYPE).is_err());
    }
}
