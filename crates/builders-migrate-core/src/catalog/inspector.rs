//! Schema inspection.
//!
//! Reads schema existence, table existence, row count and column metadata.
//! Never writes.

use super::table::{TableDescriptor, TableRef};
use crate::config::TableLayout;
use crate::db::Database;
use crate::error::{MigrateError, Result};
use tracing::info;

/// Outcome of inspecting the target table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inspection {
    /// The schema does not exist; nothing further can be inspected.
    SchemaMissing,
    /// The schema exists but the table does not.
    TableMissing,
    /// The table exists.
    Table(TableDescriptor),
}

/// Reads the current shape of the target table.
pub struct SchemaInspector;

impl SchemaInspector {
    /// Inspect `table`, reporting only the layout's columns of interest.
    pub async fn inspect<D: Database>(
        db: &mut D,
        table: &TableRef,
        layout: &TableLayout,
    ) -> Result<Inspection> {
        let schema_exists = db
            .schema_exists(&table.schema)
            .await
            .map_err(MigrateError::query("schema lookup"))?;
        if !schema_exists {
            return Ok(Inspection::SchemaMissing);
        }
        info!(schema = %table.schema, "schema exists");

        let table_exists = db
            .table_exists(table)
            .await
            .map_err(MigrateError::query("table lookup"))?;
        if !table_exists {
            return Ok(Inspection::TableMissing);
        }
        info!(table = %table, "table exists");

        Self::describe(db, table, layout).await.map(Inspection::Table)
    }

    /// Read row count and column metadata of an existing table.
    pub async fn describe<D: Database>(
        db: &mut D,
        table: &TableRef,
        layout: &TableLayout,
    ) -> Result<TableDescriptor> {
        let row_count = db
            .row_count(table)
            .await
            .map_err(MigrateError::query("row count"))?;
        info!(table = %table, row_count, "counted existing records");

        let columns = db
            .columns(table, &layout.columns_of_interest())
            .await
            .map_err(MigrateError::query("column lookup"))?;

        Ok(TableDescriptor::new(table.clone(), row_count, columns))
    }
}
