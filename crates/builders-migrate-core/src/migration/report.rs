//! State and verification reports.

use super::plan::MigrationPlan;
use super::step::Anomaly;
use crate::audit::{AuditResult, DataAuditor};
use crate::catalog::{SchemaInspector, TableDescriptor, TableRef};
use crate::config::TableLayout;
use crate::db::Database;
use crate::error::Result;
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// Column information and NULL counts of the table at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateReport {
    /// Table shape.
    pub descriptor: TableDescriptor,
    /// Audit findings.
    pub audit: AuditResult,
}

impl StateReport {
    /// Emit the report through `tracing`, one event per column.
    pub fn log(&self, label: &str) {
        info!(table = %self.descriptor.table, rows = self.descriptor.row_count, "{label}");
        for column in self.descriptor.columns.values() {
            info!(
                column = %column.name,
                data_type = %column.data_type,
                nullable = column.nullable,
                "column info"
            );
        }
        for (column, nulls) in &self.audit.null_counts {
            info!(column = %column, nulls, "NULL count");
        }
    }
}

impl fmt::Display for StateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} ({} rows)",
            self.descriptor.table, self.descriptor.row_count
        )?;
        writeln!(f, "Columns:")?;
        for column in self.descriptor.columns.values() {
            writeln!(
                f,
                "  - {}: {} (nullable: {})",
                column.name,
                column.data_type,
                if column.nullable { "YES" } else { "NO" }
            )?;
        }
        writeln!(f, "NULL value counts:")?;
        for (column, nulls) in &self.audit.null_counts {
            writeln!(f, "  - {column}: {nulls}")?;
        }
        Ok(())
    }
}

/// Post-migration verification.
///
/// Built from a fresh inspection and audit, so it reflects what the database
/// holds now, not what the executor believes it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    /// Table state after migration.
    pub state: StateReport,
    /// Steps a new run would still apply.
    pub remaining_steps: Vec<String>,
    /// Findings left for the operator.
    pub anomalies: Vec<Anomaly>,
}

impl VerificationReport {
    /// Re-inspect and re-audit `table`. Read-only.
    pub async fn collect<D: Database>(
        db: &mut D,
        table: &TableRef,
        layout: &TableLayout,
    ) -> Result<Self> {
        let descriptor = SchemaInspector::describe(db, table, layout).await?;
        let audit = DataAuditor::audit(db, &descriptor, layout).await?;
        let plan = MigrationPlan::from_state(&descriptor, &audit, layout);

        Ok(Self {
            state: StateReport { descriptor, audit },
            remaining_steps: plan.step_names(),
            anomalies: plan.anomalies,
        })
    }

    /// No steps remain and nothing needs the operator.
    pub fn is_clean(&self) -> bool {
        self.remaining_steps.is_empty() && self.anomalies.is_empty()
    }

    /// Emit the report through `tracing`; unresolved findings are warnings.
    pub fn log(&self) {
        self.state.log("post-migration state");
        for step in &self.remaining_steps {
            warn!(step = %step, "step still pending after migration");
        }
        for anomaly in &self.anomalies {
            warn!("{anomaly}");
        }
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.state)?;
        if !self.remaining_steps.is_empty() {
            writeln!(f, "Pending steps:")?;
            for step in &self.remaining_steps {
                writeln!(f, "  - {step}")?;
            }
        }
        if !self.anomalies.is_empty() {
            writeln!(f, "Warnings:")?;
            for anomaly in &self.anomalies {
                writeln!(f, "  - {anomaly}")?;
            }
        }
        Ok(())
    }
}
