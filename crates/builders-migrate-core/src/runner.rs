//! The check-and-migrate procedure.
//!
//! Inspector -> Auditor -> Planner -> Executor -> Reporter, strictly in
//! sequence over one connection.

use crate::audit::DataAuditor;
use crate::catalog::{Inspection, SchemaInspector, TableRef};
use crate::config::MigrateConfig;
use crate::db::{Database, PgDatabase};
use crate::error::{MigrateError, Result};
use crate::migration::{
    Anomaly, MigrationConfig, MigrationExecutor, MigrationPlan, StateReport, VerificationReport,
};
use serde::Serialize;
use tracing::{info, warn};

/// How a run ended. Every variant is a success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MigrationOutcome {
    /// The schema did not exist and was created; nothing else to do.
    SchemaCreated {
        /// Created schema.
        schema: String,
    },
    /// The schema does not exist (dry run, nothing created).
    SchemaMissing {
        /// Missing schema.
        schema: String,
    },
    /// The table does not exist; nothing to migrate.
    TableMissing {
        /// Missing table.
        table: TableRef,
    },
    /// The table has no rows; nothing to migrate.
    EmptyTable {
        /// Empty table.
        table: TableRef,
    },
    /// The plan was empty.
    UpToDate {
        /// Findings left for the operator.
        anomalies: Vec<Anomaly>,
    },
    /// Dry run: the plan was rendered but not applied.
    DryRun {
        /// The computed plan.
        plan: MigrationPlan,
        /// Statements that would run, in order.
        statements: Vec<String>,
    },
    /// The plan was applied.
    Migrated {
        /// Steps applied, in order.
        applied: Vec<String>,
        /// Post-migration verification, absent if it could not be collected.
        verification: Option<VerificationReport>,
    },
}

impl MigrationOutcome {
    /// Findings the operator should look at.
    pub fn anomalies(&self) -> &[Anomaly] {
        match self {
            MigrationOutcome::UpToDate { anomalies } => anomalies,
            MigrationOutcome::DryRun { plan, .. } => &plan.anomalies,
            MigrationOutcome::Migrated {
                verification: Some(report),
                ..
            } => &report.anomalies,
            _ => &[],
        }
    }
}

/// Connect, run [`check_and_migrate`], and close the connection on every path.
pub async fn run(config: &MigrateConfig) -> Result<MigrationOutcome> {
    validate_config(config)?;

    let mut db = PgDatabase::connect(&config.database_url)
        .await
        .map_err(MigrateError::Connection)?;
    info!(url = %config.redacted_url(), "connected to database");

    let result = check_and_migrate(&mut db, config).await;

    if let Err(e) = db.close().await {
        warn!(error = %e, "failed to close database connection");
    }

    result
}

/// Inspect the table, plan the repairs and apply them.
///
/// Does not open a write statement unless the plan is non-empty (or the
/// schema has to be created).
pub async fn check_and_migrate<D: Database>(
    db: &mut D,
    config: &MigrateConfig,
) -> Result<MigrationOutcome> {
    validate_config(config)?;

    let layout = &config.layout;
    let table = TableRef::new(&config.schema, &layout.table);

    let descriptor = match SchemaInspector::inspect(db, &table, layout).await? {
        Inspection::SchemaMissing if config.dry_run => {
            warn!(schema = %config.schema, "schema does not exist (dry run, not creating it)");
            return Ok(MigrationOutcome::SchemaMissing {
                schema: config.schema.clone(),
            });
        }
        Inspection::SchemaMissing => {
            warn!(schema = %config.schema, "schema does not exist, creating it");
            db.create_schema(&config.schema)
                .await
                .map_err(MigrateError::query("schema creation"))?;
            info!(schema = %config.schema, "schema created");
            return Ok(MigrationOutcome::SchemaCreated {
                schema: config.schema.clone(),
            });
        }
        Inspection::TableMissing => {
            warn!(table = %table, "table does not exist, no migration needed");
            return Ok(MigrationOutcome::TableMissing { table });
        }
        Inspection::Table(descriptor) => descriptor,
    };

    if descriptor.is_empty() {
        info!(table = %table, "no existing data, no migration needed");
        return Ok(MigrationOutcome::EmptyTable { table });
    }

    let audit = DataAuditor::audit(db, &descriptor, layout).await?;
    let state = StateReport { descriptor, audit };
    state.log("current state");

    let plan = MigrationPlan::from_state(&state.descriptor, &state.audit, layout);
    for anomaly in &plan.anomalies {
        warn!("{anomaly}");
    }

    if plan.is_empty() {
        info!("no migration needed, all data is already compatible");
        return Ok(MigrationOutcome::UpToDate {
            anomalies: plan.anomalies,
        });
    }

    info!(steps = ?plan.step_names(), "migration needed");

    let executor = MigrationExecutor::new(MigrationConfig {
        dry_run: config.dry_run,
    });
    let result = executor.execute(db, &table, &plan).await?;

    if result.dry_run {
        return Ok(MigrationOutcome::DryRun {
            plan,
            statements: result.statements,
        });
    }

    info!(applied = result.applied.len(), "migration completed successfully");

    let verification = match VerificationReport::collect(db, &table, layout).await {
        Ok(report) => {
            report.log();
            Some(report)
        }
        Err(e) => {
            warn!(
                error = &e as &dyn std::error::Error,
                "post-migration verification failed; applied steps stand"
            );
            None
        }
    };

    Ok(MigrationOutcome::Migrated {
        applied: result.applied,
        verification,
    })
}

fn validate_config(config: &MigrateConfig) -> Result<()> {
    if config.database_url.trim().is_empty() {
        return Err(MigrateError::Config("database URL is empty".to_string()));
    }
    if config.schema.trim().is_empty() {
        return Err(MigrateError::Config("schema name is empty".to_string()));
    }
    if config.layout.table.trim().is_empty() {
        return Err(MigrateError::Config("table name is empty".to_string()));
    }
    Ok(())
}
