//! Rendering of the final outcome.

use std::io::Write;

use builders_migrate_core::MigrationOutcome;
use clap::ValueEnum;

/// Output format for the final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable summary
    Text,
    /// JSON document
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Render an outcome in the given format.
pub fn render(outcome: &MigrationOutcome, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(outcome)),
        OutputFormat::Json => serde_json::to_string_pretty(outcome),
    }
}

/// Write the rendered outcome, and nothing else, to `out`.
pub fn write_report<W: Write>(
    out: &mut W,
    outcome: &MigrationOutcome,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let rendered = render(outcome, format)?;
    writeln!(out, "{rendered}")?;
    out.flush()?;
    Ok(())
}

fn render_text(outcome: &MigrationOutcome) -> String {
    let mut output = match outcome {
        MigrationOutcome::SchemaCreated { schema } => {
            format!("Schema {schema} did not exist and was created.")
        }
        MigrationOutcome::SchemaMissing { schema } => {
            format!("Schema {schema} does not exist (dry run, nothing created).")
        }
        MigrationOutcome::TableMissing { table } => {
            format!("Table {table} does not exist, no migration needed.")
        }
        MigrationOutcome::EmptyTable { table } => {
            format!("Table {table} is empty, no migration needed.")
        }
        MigrationOutcome::UpToDate { .. } => "Schema is up to date.".to_string(),
        MigrationOutcome::DryRun { plan, statements } => {
            let mut lines = vec![format!("Dry run: {} step(s) planned.", plan.step_count())];
            for (idx, (step, sql)) in plan.steps.iter().zip(statements).enumerate() {
                lines.push(format!("  {}. [{}] {}", idx + 1, step.phase(), step.name()));
                lines.push(format!("     {sql}"));
            }
            lines.join("\n")
        }
        MigrationOutcome::Migrated {
            applied,
            verification,
        } => {
            let mut lines = vec![format!("Migration completed: {} step(s) applied.", applied.len())];
            lines.extend(applied.iter().map(|name| format!("  - {name}")));
            match verification {
                Some(report) => lines.push(report.to_string()),
                None => lines.push("Post-migration verification could not be collected.".into()),
            }
            lines.join("\n")
        }
    };

    // Verification already lists its own anomalies.
    let anomalies = match outcome {
        MigrationOutcome::Migrated { .. } => &[][..],
        other => other.anomalies(),
    };
    if !anomalies.is_empty() {
        output.push_str("\nAnomalies:");
        for anomaly in anomalies {
            output.push_str(&format!("\n  ! {anomaly}"));
        }
    }
    output
}
