//! Migration plan generation.
//!
//! Maps inspector and auditor findings to an ordered list of steps. Pure:
//! no I/O, same input always yields the same plan.

use super::error::MigrationError;
use super::step::{Anomaly, MigrationPhase, MigrationStep};
use crate::audit::{is_narrower_integer, AuditResult};
use crate::catalog::TableDescriptor;
use crate::config::TableLayout;
use serde::Serialize;

/// Ordered steps plus the findings that need an operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationPlan {
    /// Steps in execution order.
    pub steps: Vec<MigrationStep>,
    /// Findings not resolved by any step.
    pub anomalies: Vec<Anomaly>,
}

impl MigrationPlan {
    /// Compute the plan for the current table state.
    ///
    /// Data-shape steps (backfill, widen, add column) always precede the
    /// NOT NULL steps that depend on them.
    pub fn from_state(desc: &TableDescriptor, audit: &AuditResult, layout: &TableLayout) -> Self {
        // An empty table satisfies every constraint.
        if desc.is_empty() {
            return Self::default();
        }

        let mut reshape = Vec::new();
        let mut contract = Vec::new();
        let mut anomalies = Vec::new();

        for column in &layout.metadata_columns {
            if !desc.has_column(column) {
                anomalies.push(Anomaly::MissingColumn {
                    column: column.clone(),
                });
            }
        }

        let dirty: Vec<String> = audit
            .metadata_with_nulls(layout)
            .into_iter()
            .filter(|c| desc.has_column(c))
            .collect();
        if !dirty.is_empty() {
            reshape.push(MigrationStep::BackfillNullMetadata { columns: dirty });
        }

        match desc.column(&layout.counter_column) {
            None => anomalies.push(Anomaly::MissingColumn {
                column: layout.counter_column.clone(),
            }),
            Some(counter) if audit.counter_type_mismatch => {
                reshape.push(MigrationStep::WidenCounterType {
                    column: counter.name.clone(),
                    from_type: counter.data_type.clone(),
                    to_type: layout.counter_type.clone(),
                });
            }
            Some(counter) => {
                let same = counter.data_type.eq_ignore_ascii_case(&layout.counter_type);
                if !same && !is_narrower_integer(&counter.data_type, &layout.counter_type) {
                    anomalies.push(Anomaly::UnexpectedCounterType {
                        column: counter.name.clone(),
                        data_type: counter.data_type.clone(),
                        expected: layout.counter_type.clone(),
                    });
                }
            }
        }

        match desc.column(&layout.admin_column) {
            None => {
                reshape.push(MigrationStep::AddAdminColumn {
                    column: layout.admin_column.clone(),
                    data_type: layout.admin_column_type.clone(),
                });
                anomalies.push(Anomaly::AdminColumnNeedsBackfill {
                    column: layout.admin_column.clone(),
                    null_count: desc.row_count,
                });
            }
            Some(admin) if admin.nullable => {
                let null_count = audit.null_count(&admin.name);
                if null_count == 0 {
                    contract.push(MigrationStep::EnforceNotNull {
                        column: admin.name.clone(),
                    });
                } else {
                    anomalies.push(Anomaly::AdminColumnNeedsBackfill {
                        column: admin.name.clone(),
                        null_count,
                    });
                }
            }
            Some(_) => {}
        }

        for column in &layout.metadata_columns {
            if desc.column(column).is_some_and(|c| c.nullable) {
                contract.push(MigrationStep::EnforceNotNull {
                    column: column.clone(),
                });
            }
        }

        let mut steps = reshape;
        steps.extend(contract);

        Self { steps, anomalies }
    }

    /// Get the number of steps in the plan.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Check if this plan is empty (no steps).
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Names of the steps, in order.
    pub fn step_names(&self) -> Vec<String> {
        self.steps.iter().map(MigrationStep::name).collect()
    }

    /// Get steps of a specific phase.
    pub fn steps_in_phase(&self, phase: MigrationPhase) -> Vec<&MigrationStep> {
        self.steps.iter().filter(|s| s.phase() == phase).collect()
    }

    /// Check that no data-shape step follows a contract step.
    pub fn validate(&self) -> Result<(), MigrationError> {
        let mut contracting = false;
        for (idx, step) in self.steps.iter().enumerate() {
            if step.phase() == MigrationPhase::Contract {
                contracting = true;
            } else if contracting {
                return Err(MigrationError::OrderViolation {
                    step_index: idx + 1,
                    step: step.name(),
                });
            }
        }
        Ok(())
    }
}
