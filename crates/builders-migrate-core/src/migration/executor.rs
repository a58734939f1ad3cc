//! Migration executor - applies a plan step by step.
//!
//! Each step is its own statement and commits on its own. The first failure
//! stops the run; steps already applied stay applied, and re-planning from
//! the resulting state only asks for what is left.

use super::error::MigrationError;
use super::plan::MigrationPlan;
use crate::catalog::TableRef;
use crate::db::Database;
use serde::Serialize;
use tracing::{error, info};

/// Migration executor configuration.
#[derive(Debug, Clone, Default)]
pub struct MigrationConfig {
    /// Whether to run in dry-run mode (no actual changes).
    pub dry_run: bool,
}

/// Result of executing a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    /// Names of the steps applied, in order.
    pub applied: Vec<String>,
    /// Statements applied (or, in dry-run mode, that would be applied).
    pub statements: Vec<String>,
    /// Total steps in the plan.
    pub total_steps: usize,
    /// Whether the statements were only rendered.
    pub dry_run: bool,
}

/// Applies migration plans to a database.
pub struct MigrationExecutor {
    config: MigrationConfig,
}

impl MigrationExecutor {
    /// Create a new migration executor.
    pub fn new(config: MigrationConfig) -> Self {
        Self { config }
    }

    /// Execute `plan` against `table`, stopping on the first failure.
    pub async fn execute<D: Database>(
        &self,
        db: &mut D,
        table: &TableRef,
        plan: &MigrationPlan,
    ) -> Result<ExecutionResult, MigrationError> {
        plan.validate()?;

        let mut result = ExecutionResult {
            applied: Vec::new(),
            statements: Vec::new(),
            total_steps: plan.step_count(),
            dry_run: self.config.dry_run,
        };

        for (idx, step) in plan.steps.iter().enumerate() {
            let sql = step.to_sql(table);

            if self.config.dry_run {
                info!(step = %step.name(), sql = %sql, "would apply");
                result.statements.push(sql);
                continue;
            }

            info!(
                step = %step.name(),
                position = idx + 1,
                total = result.total_steps,
                "applying: {step}"
            );

            if let Err(source) = db.apply(table, step).await {
                error!(step = %step.name(), error = %source, "step failed");
                return Err(MigrationError::StepFailed {
                    step_index: idx + 1,
                    step: step.name(),
                    applied: result.applied.len(),
                    source,
                });
            }

            info!(step = %step.name(), "step applied");
            result.applied.push(step.name());
            result.statements.push(sql);
        }

        Ok(result)
    }
}
