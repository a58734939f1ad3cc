//! Migration steps and non-fatal findings.

use crate::catalog::{quote_ident, TableRef};
use serde::Serialize;
use std::fmt;

/// Phase a step belongs to.
///
/// Every `Contract` step tightens a constraint that depends on the data
/// already having been reshaped, so it runs after all other phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationPhase {
    /// Replace NULLs with a defined value.
    Backfill,
    /// Widen or add columns.
    Expand,
    /// Tighten constraints.
    Contract,
}

impl fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationPhase::Backfill => write!(f, "backfill"),
            MigrationPhase::Expand => write!(f, "expand"),
            MigrationPhase::Contract => write!(f, "contract"),
        }
    }
}

/// One atomic schema or data change, rendered as exactly one statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MigrationStep {
    /// Replace NULL with `''` in all listed metadata columns, in one pass.
    BackfillNullMetadata {
        /// Columns holding NULLs.
        columns: Vec<String>,
    },
    /// Widen the counter column; existing values are preserved.
    WidenCounterType {
        /// Counter column.
        column: String,
        /// Declared type before the change.
        from_type: String,
        /// Required type.
        to_type: String,
    },
    /// Add the admin column as nullable.
    AddAdminColumn {
        /// Column to add.
        column: String,
        /// Declared type of the new column.
        data_type: String,
    },
    /// Set NOT NULL on a column whose data is already clean.
    EnforceNotNull {
        /// Column to tighten.
        column: String,
    },
}

impl MigrationStep {
    /// Stable identifier used in logs and reports.
    pub fn name(&self) -> String {
        match self {
            MigrationStep::BackfillNullMetadata { .. } => "backfill-null-metadata".to_string(),
            MigrationStep::WidenCounterType { .. } => "widen-counter-type".to_string(),
            MigrationStep::AddAdminColumn { .. } => "add-admin-column".to_string(),
            MigrationStep::EnforceNotNull { column } => format!("enforce-not-null:{column}"),
        }
    }

    /// Phase this step belongs to.
    pub fn phase(&self) -> MigrationPhase {
        match self {
            MigrationStep::BackfillNullMetadata { .. } => MigrationPhase::Backfill,
            MigrationStep::WidenCounterType { .. } | MigrationStep::AddAdminColumn { .. } => {
                MigrationPhase::Expand
            }
            MigrationStep::EnforceNotNull { .. } => MigrationPhase::Contract,
        }
    }

    /// Whether this step changes data or column values for `column`.
    pub fn reshapes(&self, column: &str) -> bool {
        match self {
            MigrationStep::BackfillNullMetadata { columns } => columns.iter().any(|c| c == column),
            MigrationStep::WidenCounterType { column: c, .. }
            | MigrationStep::AddAdminColumn { column: c, .. } => c == column,
            MigrationStep::EnforceNotNull { .. } => false,
        }
    }

    /// Render the statement applying this step to `table`.
    ///
    /// Re-applying any rendered statement to an already migrated table is a
    /// no-op (`IF NOT EXISTS`, `WHERE ... IS NULL`, `SET NOT NULL`, same-type
    /// `ALTER TYPE`), or fails without changing data.
    pub fn to_sql(&self, table: &TableRef) -> String {
        let table = table.qualified();
        match self {
            MigrationStep::BackfillNullMetadata { columns } => {
                let assignments: Vec<String> = columns
                    .iter()
                    .map(|c| {
                        let c = quote_ident(c);
                        format!("{c} = COALESCE({c}, '')")
                    })
                    .collect();
                let predicates: Vec<String> = columns
                    .iter()
                    .map(|c| format!("{} IS NULL", quote_ident(c)))
                    .collect();
                format!(
                    "UPDATE {table} SET {} WHERE {}",
                    assignments.join(", "),
                    predicates.join(" OR ")
                )
            }
            MigrationStep::WidenCounterType { column, to_type, .. } => {
                let column = quote_ident(column);
                let to_type = to_type.to_ascii_uppercase();
                format!("ALTER TABLE {table} ALTER COLUMN {column} TYPE {to_type} USING {column}::{to_type}")
            }
            MigrationStep::AddAdminColumn { column, data_type } => format!(
                "ALTER TABLE {table} ADD COLUMN IF NOT EXISTS {} {}",
                quote_ident(column),
                data_type.to_ascii_uppercase()
            ),
            MigrationStep::EnforceNotNull { column } => format!(
                "ALTER TABLE {table} ALTER COLUMN {} SET NOT NULL",
                quote_ident(column)
            ),
        }
    }
}

impl fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationStep::BackfillNullMetadata { columns } => {
                write!(f, "backfill NULL metadata ({}) with empty strings", columns.join(", "))
            }
            MigrationStep::WidenCounterType {
                column,
                from_type,
                to_type,
            } => write!(f, "widen {column} from {from_type} to {to_type}"),
            MigrationStep::AddAdminColumn { column, data_type } => {
                write!(f, "add nullable column {column} {data_type}")
            }
            MigrationStep::EnforceNotNull { column } => write!(f, "set {column} NOT NULL"),
        }
    }
}

/// A finding the planner reports but cannot resolve automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    /// The admin column holds NULLs (or was just added) and has no backfill
    /// source, so it stays nullable.
    AdminColumnNeedsBackfill {
        /// Admin column.
        column: String,
        /// Rows with NULL in the column.
        null_count: u64,
    },
    /// A column of interest is missing and is not added automatically.
    MissingColumn {
        /// Missing column.
        column: String,
    },
    /// The counter column has a type that is neither the required type nor a
    /// narrower integer.
    UnexpectedCounterType {
        /// Counter column.
        column: String,
        /// Declared type found.
        data_type: String,
        /// Required type.
        expected: String,
    },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::AdminColumnNeedsBackfill { column, null_count } => write!(
                f,
                "{column} has {null_count} NULL value(s) and stays nullable; backfill it from the contract"
            ),
            Anomaly::MissingColumn { column } => write!(f, "column {column} does not exist"),
            Anomaly::UnexpectedCounterType {
                column,
                data_type,
                expected,
            } => write!(
                f,
                "{column} is declared {data_type}, expected {expected}; not converted automatically"
            ),
        }
    }
}
