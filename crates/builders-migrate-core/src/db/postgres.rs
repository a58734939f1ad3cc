//! PostgreSQL implementation of [`Database`] over a single connection.

use super::Database;
use crate::catalog::{quote_ident, ColumnInfo, TableRef};
use crate::migration::MigrationStep;
use sqlx::{Connection, PgConnection, Row};
use std::collections::BTreeMap;

/// A single PostgreSQL connection.
///
/// Statements run in autocommit mode, so each applied step commits on its own.
pub struct PgDatabase {
    conn: PgConnection,
}

impl PgDatabase {
    /// Open a connection.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let conn = PgConnection::connect(database_url).await?;
        Ok(Self { conn })
    }

    /// Close the connection gracefully.
    pub async fn close(self) -> Result<(), sqlx::Error> {
        self.conn.close().await
    }
}

impl Database for PgDatabase {
    async fn schema_exists(&mut self, schema: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.schemata
                WHERE schema_name::text = $1
            )
            "#,
        )
        .bind(schema)
        .fetch_one(&mut self.conn)
        .await
    }

    async fn create_schema(&mut self, schema: &str) -> Result<(), sqlx::Error> {
        let sql = format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema));
        sqlx::raw_sql(&sql).execute(&mut self.conn).await?;
        Ok(())
    }

    async fn table_exists(&mut self, table: &TableRef) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema::text = $1 AND table_name::text = $2
            )
            "#,
        )
        .bind(&table.schema)
        .bind(&table.name)
        .fetch_one(&mut self.conn)
        .await
    }

    async fn row_count(&mut self, table: &TableRef) -> Result<u64, sqlx::Error> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.qualified());
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&mut self.conn).await?;
        Ok(count.max(0) as u64)
    }

    async fn columns(
        &mut self,
        table: &TableRef,
        names: &[String],
    ) -> Result<Vec<ColumnInfo>, sqlx::Error> {
        // information_schema uses domain types sqlx cannot decode directly.
        let rows: Vec<(String, String, String, Option<String>)> = sqlx::query_as(
            r#"
            SELECT
                column_name::text,
                data_type::text,
                is_nullable::text,
                column_default::text
            FROM information_schema.columns
            WHERE table_schema::text = $1
              AND table_name::text = $2
              AND column_name::text = ANY($3::text[])
            ORDER BY column_name
            "#,
        )
        .bind(&table.schema)
        .bind(&table.name)
        .bind(names)
        .fetch_all(&mut self.conn)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(name, data_type, is_nullable, default)| ColumnInfo {
                name,
                data_type,
                nullable: is_nullable == "YES",
                default,
            })
            .collect())
    }

    async fn null_counts(
        &mut self,
        table: &TableRef,
        columns: &[String],
    ) -> Result<BTreeMap<String, u64>, sqlx::Error> {
        if columns.is_empty() {
            return Ok(BTreeMap::new());
        }

        let filters: Vec<String> = columns
            .iter()
            .map(|c| format!("COUNT(*) FILTER (WHERE {} IS NULL)", quote_ident(c)))
            .collect();
        let sql = format!("SELECT {} FROM {}", filters.join(", "), table.qualified());

        let row = sqlx::query(&sql).fetch_one(&mut self.conn).await?;

        let mut counts = BTreeMap::new();
        for (idx, column) in columns.iter().enumerate() {
            let count: i64 = row.try_get(idx)?;
            counts.insert(column.clone(), count.max(0) as u64);
        }
        Ok(counts)
    }

    async fn apply(&mut self, table: &TableRef, step: &MigrationStep) -> Result<(), sqlx::Error> {
        let sql = step.to_sql(table);
        sqlx::raw_sql(&sql).execute(&mut self.conn).await?;
        Ok(())
    }
}
