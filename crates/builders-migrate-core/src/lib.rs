//! builders-migrate core - inspection, audit, planning and execution.
//!
//! Repairs the `builders_project` table written by the chain indexer: fills
//! NULL metadata, widens the user counter, adds the admin-claim column and
//! tightens NOT NULL constraints once the data allows it. Each run derives
//! its plan from the live table, so running it again is always safe.
//!
//! # Example
//!
//! ```ignore
//! use builders_migrate_core::{run, MigrateConfig};
//!
//! let config = MigrateConfig::new(database_url).with_schema("builders_v4_prod");
//! let outcome = run(&config).await?;
//! ```

pub mod audit;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod migration;
pub mod runner;

#[cfg(test)]
mod testing;

pub use audit::{AuditResult, DataAuditor};
pub use catalog::{ColumnInfo, Inspection, SchemaInspector, TableDescriptor, TableRef};
pub use config::{redact_url, MigrateConfig, TableLayout, DEFAULT_DATABASE_URL, DEFAULT_SCHEMA};
pub use db::{Database, PgDatabase};
pub use error::{MigrateError, Result};
pub use migration::{
    Anomaly, ExecutionResult, MigrationConfig, MigrationError, MigrationExecutor, MigrationPhase,
    MigrationPlan, MigrationStep, StateReport, VerificationReport,
};
pub use runner::{check_and_migrate, run, MigrationOutcome};
