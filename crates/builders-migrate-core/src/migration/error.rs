//! Migration-specific error types.

use thiserror::Error;

/// Errors raised while validating or applying a plan.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A step failed; the steps before it stay applied.
    #[error("step {step_index} ({step}) failed after {applied} applied step(s)")]
    StepFailed {
        /// 1-based position of the failed step in the plan.
        step_index: usize,
        /// Name of the failed step.
        step: String,
        /// Number of steps committed before the failure.
        applied: usize,
        /// Underlying database error.
        #[source]
        source: sqlx::Error,
    },

    /// A constraint-tightening step is ordered before a data-shape step.
    #[error("step {step_index} ({step}) must run before every contract step")]
    OrderViolation {
        /// 1-based position of the misplaced step.
        step_index: usize,
        /// Name of the misplaced step.
        step: String,
    },
}
