//! Table and column descriptors read from the catalog.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Quote an SQL identifier, doubling embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// A schema-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TableRef {
    /// Schema (namespace) name.
    pub schema: String,
    /// Table name.
    pub name: String,
}

impl TableRef {
    /// Create a table reference.
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// The quoted `"schema"."table"` form used in statements.
    pub fn qualified(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.name))
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// Column metadata from `information_schema.columns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Declared type, as reported by `data_type` (e.g. `integer`, `text`).
    pub data_type: String,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Default expression, if any.
    pub default: Option<String>,
}

impl ColumnInfo {
    /// Create a column descriptor without a default.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
            default: None,
        }
    }
}

/// Snapshot of the target table's shape.
///
/// Only the columns of interest are present in `columns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDescriptor {
    /// The table described.
    pub table: TableRef,
    /// Number of rows at inspection time.
    pub row_count: u64,
    /// Column name -> column metadata.
    pub columns: BTreeMap<String, ColumnInfo>,
}

impl TableDescriptor {
    /// Build a descriptor from a list of columns.
    pub fn new(table: TableRef, row_count: u64, columns: impl IntoIterator<Item = ColumnInfo>) -> Self {
        Self {
            table,
            row_count,
            columns: columns.into_iter().map(|c| (c.name.clone(), c)).collect(),
        }
    }

    /// Look up a column.
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.get(name)
    }

    /// Whether the column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }
}
