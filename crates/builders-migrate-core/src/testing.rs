//! In-memory [`Database`] for tests.
//!
//! Applies steps with PostgreSQL semantics: `SET NOT NULL` fails while NULLs
//! remain, `ADD COLUMN IF NOT EXISTS` is a no-op on an existing column,
//! widening keeps values.

use crate::catalog::{ColumnInfo, TableRef};
use crate::db::Database;
use crate::migration::MigrationStep;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A cell value. `Null` is SQL NULL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Text(String),
    Int(i64),
    Bytes(Vec<u8>),
}

/// Rows and column metadata of one table.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    columns: Vec<ColumnInfo>,
    rows: Vec<BTreeMap<String, Value>>,
}

impl MemoryTable {
    /// A fully migrated `builders_project` table with no rows.
    pub fn builders_project() -> Self {
        let columns = [
            ("slug", "text"),
            ("description", "text"),
            ("website", "text"),
            ("image", "text"),
            ("total_users", "bigint"),
            ("claim_admin", "bytea"),
        ]
        .into_iter()
        .map(|(name, ty)| ColumnInfo::new(name, ty, false))
        .collect();
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Add a column, or replace the metadata of an existing one.
    ///
    /// Existing rows get a generated value, or NULL when the column is nullable.
    pub fn with_column(mut self, column: ColumnInfo) -> Self {
        if let Some(existing) = self.columns.iter_mut().find(|c| c.name == column.name) {
            *existing = column;
            return self;
        }
        for (idx, row) in self.rows.iter_mut().enumerate() {
            let value = if column.nullable {
                Value::Null
            } else {
                sample_value(&column, idx)
            };
            row.insert(column.name.clone(), value);
        }
        self.columns.push(column);
        self
    }

    /// Drop a column and its values.
    pub fn without_column(mut self, name: &str) -> Self {
        self.columns.retain(|c| c.name != name);
        for row in &mut self.rows {
            row.remove(name);
        }
        self
    }

    /// Mark a column nullable.
    pub fn with_nullable(mut self, name: &str) -> Self {
        if let Some(column) = self.columns.iter_mut().find(|c| c.name == name) {
            column.nullable = true;
        }
        self
    }

    /// Change the declared type of a column.
    pub fn with_type(mut self, name: &str, data_type: &str) -> Self {
        if let Some(column) = self.columns.iter_mut().find(|c| c.name == name) {
            column.data_type = data_type.to_string();
        }
        self
    }

    /// Append `count` rows with non-NULL values in every column.
    pub fn with_rows(mut self, count: usize) -> Self {
        for _ in 0..count {
            let idx = self.rows.len();
            let row = self
                .columns
                .iter()
                .map(|c| (c.name.clone(), sample_value(c, idx)))
                .collect();
            self.rows.push(row);
        }
        self
    }

    /// Overwrite one cell.
    pub fn with_value(mut self, row: usize, column: &str, value: Value) -> Self {
        self.rows[row].insert(column.to_string(), value);
        self
    }

    /// Overwrite one cell in place, as an external writer would.
    pub fn set_value(&mut self, row: usize, column: &str, value: Value) {
        self.rows[row].insert(column.to_string(), value);
    }

    /// Column metadata.
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// One cell.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn null_count(&self, column: &str) -> u64 {
        self.rows
            .iter()
            .filter(|r| matches!(r.get(column), None | Some(Value::Null)))
            .count() as u64
    }

    fn require_column(&self, name: &str) -> Result<usize, sqlx::Error> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| db_error(format!("column \"{name}\" does not exist")))
    }

    fn apply(&mut self, step: &MigrationStep) -> Result<(), sqlx::Error> {
        match step {
            MigrationStep::BackfillNullMetadata { columns } => {
                for column in columns {
                    self.require_column(column)?;
                }
                for row in &mut self.rows {
                    for column in columns {
                        let cell = row.entry(column.clone()).or_insert(Value::Null);
                        if *cell == Value::Null {
                            *cell = Value::Text(String::new());
                        }
                    }
                }
            }
            MigrationStep::WidenCounterType {
                column, to_type, ..
            } => {
                let idx = self.require_column(column)?;
                self.columns[idx].data_type = to_type.clone();
            }
            MigrationStep::AddAdminColumn { column, data_type } => {
                if self.column(column).is_none() {
                    let info = ColumnInfo::new(column.clone(), data_type.clone(), true);
                    for row in &mut self.rows {
                        row.insert(column.clone(), Value::Null);
                    }
                    self.columns.push(info);
                }
            }
            MigrationStep::EnforceNotNull { column } => {
                let idx = self.require_column(column)?;
                if self.null_count(column) > 0 {
                    return Err(db_error(format!(
                        "column \"{column}\" of relation contains null values"
                    )));
                }
                self.columns[idx].nullable = false;
            }
        }
        Ok(())
    }
}

fn sample_value(column: &ColumnInfo, row: usize) -> Value {
    match column.data_type.as_str() {
        "smallint" | "integer" | "bigint" => Value::Int(row as i64 * 10 + 7),
        "bytea" => Value::Bytes(vec![row as u8; 20]),
        _ => Value::Text(format!("{}-{}", column.name, row)),
    }
}

fn db_error(message: impl Into<String>) -> sqlx::Error {
    sqlx::Error::Protocol(message.into())
}

/// In-memory database with failure injection.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    schemas: BTreeSet<String>,
    tables: HashMap<TableRef, MemoryTable>,
    read_failure: Option<String>,
    read_failure_after_apply: Option<String>,
    step_failures: HashMap<String, (String, Option<u32>)>,
    applied: Vec<String>,
    statements: Vec<String>,
    null_count_queries: usize,
}

impl MemoryDatabase {
    /// A database with no schemas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty schema.
    pub fn with_schema(mut self, schema: &str) -> Self {
        self.schemas.insert(schema.to_string());
        self
    }

    /// A database holding one table (and its schema).
    pub fn with_table(table: TableRef, data: MemoryTable) -> Self {
        let mut db = Self::new().with_schema(&table.schema);
        db.tables.insert(table, data);
        db
    }

    /// Make every read fail.
    pub fn fail_reads(mut self, message: &str) -> Self {
        self.read_failure = Some(message.to_string());
        self
    }

    /// Make every read fail once a step has been applied.
    pub fn fail_reads_after_apply(mut self, message: &str) -> Self {
        self.read_failure_after_apply = Some(message.to_string());
        self
    }

    /// Make the named step fail every time.
    pub fn fail_step(mut self, step: &str, message: &str) -> Self {
        self.step_failures
            .insert(step.to_string(), (message.to_string(), None));
        self
    }

    /// Make the named step fail once, then succeed.
    pub fn fail_step_once(mut self, step: &str, message: &str) -> Self {
        self.step_failures
            .insert(step.to_string(), (message.to_string(), Some(1)));
        self
    }

    /// Table contents.
    pub fn table(&self, table: &TableRef) -> &MemoryTable {
        &self.tables[table]
    }

    /// Mutable table contents.
    pub fn table_mut(&mut self, table: &TableRef) -> &mut MemoryTable {
        self.tables.get_mut(table).expect("table exists")
    }

    /// Names of all successfully applied steps, across runs.
    pub fn applied_steps(&self) -> &[String] {
        &self.applied
    }

    /// Statements of all successfully applied steps.
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Number of NULL-count scans issued.
    pub fn null_count_queries(&self) -> usize {
        self.null_count_queries
    }

    /// Whether a schema exists.
    pub fn has_schema(&self, schema: &str) -> bool {
        self.schemas.contains(schema)
    }

    fn check_read(&self) -> Result<(), sqlx::Error> {
        if let Some(message) = &self.read_failure {
            return Err(db_error(message.clone()));
        }
        if let Some(message) = &self.read_failure_after_apply {
            if !self.applied.is_empty() {
                return Err(db_error(message.clone()));
            }
        }
        Ok(())
    }

    fn existing(&self, table: &TableRef) -> Result<&MemoryTable, sqlx::Error> {
        self.tables
            .get(table)
            .ok_or_else(|| db_error(format!("relation \"{table}\" does not exist")))
    }
}

impl Database for MemoryDatabase {
    async fn schema_exists(&mut self, schema: &str) -> Result<bool, sqlx::Error> {
        self.check_read()?;
        Ok(self.schemas.contains(schema))
    }

    async fn create_schema(&mut self, schema: &str) -> Result<(), sqlx::Error> {
        self.schemas.insert(schema.to_string());
        Ok(())
    }

    async fn table_exists(&mut self, table: &TableRef) -> Result<bool, sqlx::Error> {
        self.check_read()?;
        Ok(self.tables.contains_key(table))
    }

    async fn row_count(&mut self, table: &TableRef) -> Result<u64, sqlx::Error> {
        self.check_read()?;
        Ok(self.existing(table)?.row_count() as u64)
    }

    async fn columns(
        &mut self,
        table: &TableRef,
        names: &[String],
    ) -> Result<Vec<ColumnInfo>, sqlx::Error> {
        self.check_read()?;
        let mut columns: Vec<ColumnInfo> = self
            .existing(table)?
            .columns
            .iter()
            .filter(|c| names.contains(&c.name))
            .cloned()
            .collect();
        columns.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(columns)
    }

    async fn null_counts(
        &mut self,
        table: &TableRef,
        columns: &[String],
    ) -> Result<BTreeMap<String, u64>, sqlx::Error> {
        self.check_read()?;
        self.null_count_queries += 1;
        let data = self.existing(table)?;
        let mut counts = BTreeMap::new();
        for column in columns {
            data.require_column(column)?;
            counts.insert(column.clone(), data.null_count(column));
        }
        Ok(counts)
    }

    async fn apply(&mut self, table: &TableRef, step: &MigrationStep) -> Result<(), sqlx::Error> {
        let name = step.name();
        if let Some((message, remaining)) = self.step_failures.get_mut(&name) {
            match remaining {
                None => return Err(db_error(message.clone())),
                Some(n) if *n > 0 => {
                    *n -= 1;
                    return Err(db_error(message.clone()));
                }
                Some(_) => {}
            }
        }

        let data = self
            .tables
            .get_mut(table)
            .ok_or_else(|| db_error(format!("relation \"{table}\" does not exist")))?;
        data.apply(step)?;

        self.applied.push(name);
        self.statements.push(step.to_sql(table));
        Ok(())
    }
}
