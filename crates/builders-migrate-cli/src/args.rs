//! Command line arguments.

use builders_migrate_core::{MigrateConfig, TableLayout, DEFAULT_DATABASE_URL, DEFAULT_SCHEMA};
use clap::Parser;

use crate::output::OutputFormat;

/// Check the builders_project table and apply the repairs it needs.
#[derive(Debug, Parser)]
#[command(name = "builders-migrate")]
#[command(version, about = "Inspect and repair the builders_project table")]
pub struct Args {
    /// PostgreSQL connection string. The default is for local development only.
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL, hide_env_values = true)]
    pub database_url: String,

    /// Schema containing the table.
    #[arg(short, long, env = "DATABASE_SCHEMA", default_value = DEFAULT_SCHEMA)]
    pub schema: String,

    /// Table to inspect.
    #[arg(short, long, default_value = "builders_project")]
    pub table: String,

    /// Print the plan without applying it.
    #[arg(long)]
    pub dry_run: bool,

    /// Format of the final report.
    #[arg(long, default_value = "text", value_enum)]
    pub format: OutputFormat,
}

impl Args {
    /// Build the migration configuration.
    pub fn into_config(self) -> MigrateConfig {
        let layout = TableLayout {
            table: self.table,
            ..TableLayout::default()
        };
        MigrateConfig::new(self.database_url)
            .with_schema(self.schema)
            .with_layout(layout)
            .with_dry_run(self.dry_run)
    }
}
