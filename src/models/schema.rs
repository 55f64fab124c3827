//! Schema-related data models.
//!
//! This module defines the wire types for database schema snapshots. A
//! snapshot describes every table with its columns and foreign keys; a
//! multi-column foreign key appears as a single entry with parallel
//! `column` / `ref_column` lists.

use serde::{Deserialize, Serialize};

/// Response body of the database ingest endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaResponse {
    pub tables: Vec<TableSchema>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub foreign_keys: Vec<ForeignKeyRef>,
}

impl TableSchema {
    /// Create a new, empty table schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Add a column definition.
    pub fn with_column(mut self, column: ColumnInfo) -> Self {
        self.columns.push(column);
        self
    }

    /// Add a foreign key reference.
    pub fn with_foreign_key(mut self, fk: ForeignKeyRef) -> Self {
        self.foreign_keys.push(fk);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Full type as reported by the database (e.g., `varchar(30)`, `BIGINT`)
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
}

impl ColumnInfo {
    /// Create a new column definition.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
            primary_key: false,
        }
    }

    /// Set whether this is a primary key column.
    pub fn with_primary_key(mut self, is_pk: bool) -> Self {
        self.primary_key = is_pk;
        self
    }
}

/// A foreign key constraint. `column` and `ref_column` are parallel lists so
/// composite keys stay grouped under one constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    pub column: Vec<String>,
    pub ref_table: String,
    pub ref_column: Vec<String>,
}

impl ForeignKeyRef {
    /// Create a foreign key over a single column pair.
    pub fn single(
        column: impl Into<String>,
        ref_table: impl Into<String>,
        ref_column: impl Into<String>,
    ) -> Self {
        Self {
            column: vec![column.into()],
            ref_table: ref_table.into(),
            ref_column: vec![ref_column.into()],
        }
    }

    /// Append a column pair to this constraint.
    pub fn push_pair(&mut self, column: impl Into<String>, ref_column: impl Into<String>) {
        self.column.push(column.into());
        self.ref_column.push(ref_column.into());
    }
}
