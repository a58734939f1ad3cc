//! Data audit of the target table.
//!
//! Counts NULLs in the audited columns with one aggregated scan and checks
//! whether the counter column is declared narrower than required.

use crate::catalog::TableDescriptor;
use crate::config::TableLayout;
use crate::db::Database;
use crate::error::{MigrateError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// Findings of one audit pass. Stale as soon as new rows are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditResult {
    /// NULL count per audited column that exists.
    pub null_counts: BTreeMap<String, u64>,
    /// Counter column is a narrower integer than required.
    pub counter_type_mismatch: bool,
}

impl AuditResult {
    /// NULL count for `column`, zero when it was not audited.
    pub fn null_count(&self, column: &str) -> u64 {
        self.null_counts.get(column).copied().unwrap_or(0)
    }

    /// Metadata columns that still hold NULLs, in layout order.
    pub fn metadata_with_nulls(&self, layout: &TableLayout) -> Vec<String> {
        layout
            .metadata_columns
            .iter()
            .filter(|c| self.null_count(c) > 0)
            .cloned()
            .collect()
    }

    /// Whether any audited column holds NULLs.
    pub fn has_nulls(&self) -> bool {
        self.null_counts.values().any(|&n| n > 0)
    }
}

/// Byte width of a PostgreSQL integer type name.
fn integer_width(data_type: &str) -> Option<u8> {
    match data_type.to_ascii_lowercase().as_str() {
        "smallint" | "int2" => Some(2),
        "integer" | "int" | "int4" => Some(4),
        "bigint" | "int8" => Some(8),
        _ => None,
    }
}

/// Whether `actual` is an integer type narrower than `required`.
pub fn is_narrower_integer(actual: &str, required: &str) -> bool {
    match (integer_width(actual), integer_width(required)) {
        (Some(a), Some(r)) => a < r,
        _ => false,
    }
}

/// Audits table data.
pub struct DataAuditor;

impl DataAuditor {
    /// Audit the table described by `desc`.
    ///
    /// Only columns present in `desc` are referenced. An empty table is
    /// reported clean without touching the database.
    pub async fn audit<D: Database>(
        db: &mut D,
        desc: &TableDescriptor,
        layout: &TableLayout,
    ) -> Result<AuditResult> {
        let counter_type_mismatch = desc
            .column(&layout.counter_column)
            .map(|c| is_narrower_integer(&c.data_type, &layout.counter_type))
            .unwrap_or(false);

        let audited: Vec<String> = layout
            .audited_columns()
            .into_iter()
            .filter(|c| desc.has_column(c))
            .collect();

        if desc.is_empty() {
            return Ok(AuditResult {
                null_counts: audited.into_iter().map(|c| (c, 0)).collect(),
                counter_type_mismatch: false,
            });
        }

        let null_counts = db
            .null_counts(&desc.table, &audited)
            .await
            .map_err(MigrateError::query("NULL audit"))?;

        info!(
            table = %desc.table,
            columns = audited.len(),
            counter_type_mismatch,
            "audit complete"
        );

        Ok(AuditResult {
            null_counts,
            counter_type_mismatch,
        })
    }
}
