//! Database access used by the migration procedure.
//!
//! The inspector, auditor, executor and reporter only talk to the database
//! through [`Database`], so the whole procedure can run against PostgreSQL
//! or an in-memory table in tests.

pub mod postgres;

pub use postgres::PgDatabase;

use crate::catalog::{ColumnInfo, TableRef};
use crate::migration::MigrationStep;
use std::collections::BTreeMap;

/// Operations the procedure needs from a live database.
///
/// Every method is a single round-trip. Nothing here retries or opens a
/// transaction spanning more than one call.
#[allow(async_fn_in_trait)]
pub trait Database {
    /// Whether `schema` exists.
    async fn schema_exists(&mut self, schema: &str) -> Result<bool, sqlx::Error>;

    /// Create `schema` if it does not exist.
    async fn create_schema(&mut self, schema: &str) -> Result<(), sqlx::Error>;

    /// Whether the table exists.
    async fn table_exists(&mut self, table: &TableRef) -> Result<bool, sqlx::Error>;

    /// Exact number of rows in the table.
    async fn row_count(&mut self, table: &TableRef) -> Result<u64, sqlx::Error>;

    /// Column metadata for the named columns that exist, ordered by name.
    async fn columns(
        &mut self,
        table: &TableRef,
        names: &[String],
    ) -> Result<Vec<ColumnInfo>, sqlx::Error>;

    /// NULL count for each of `columns`, computed in one scan.
    ///
    /// Every column passed must exist.
    async fn null_counts(
        &mut self,
        table: &TableRef,
        columns: &[String],
    ) -> Result<BTreeMap<String, u64>, sqlx::Error>;

    /// Apply one migration step as a single, independently committed statement.
    async fn apply(&mut self, table: &TableRef, step: &MigrationStep) -> Result<(), sqlx::Error>;
}
