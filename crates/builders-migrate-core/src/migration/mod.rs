//! Migration planning and execution for the target table.
//!
//! The procedure is a pure function of the current database state:
//!
//! 1. [`MigrationPlan::from_state`] turns a table descriptor and an audit into
//!    an ordered list of [`MigrationStep`]s.
//! 2. [`MigrationExecutor`] applies the steps one statement at a time,
//!    stopping at the first failure.
//! 3. [`VerificationReport`] re-reads the table afterwards.
//!
//! No history is recorded. Re-running after a partial failure recomputes the
//! plan and only the remaining steps are requested.
//!
//! # Phases
//!
//! | Phase | Steps | Notes |
//! |-------|-------|-------|
//! | **Backfill** | `backfill-null-metadata` | NULL -> `''`, never overwrites values |
//! | **Expand** | `widen-counter-type`, `add-admin-column` | values preserved, column added nullable |
//! | **Contract** | `enforce-not-null:<column>` | always last |

pub mod error;
pub mod executor;
pub mod plan;
pub mod report;
pub mod step;

pub use error::MigrationError;
pub use executor::{ExecutionResult, MigrationConfig, MigrationExecutor};
pub use plan::MigrationPlan;
pub use report::{StateReport, VerificationReport};
pub use step::{Anomaly, MigrationPhase, MigrationStep};
