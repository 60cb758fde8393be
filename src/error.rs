//! Error types.

use crate::model::ValidationError;

/// Failure modes of the assignment engine.
///
/// Only `InvalidProblem` and `InvalidConfig` prevent a solving run from
/// starting. `StructuralViolation` raised by an internally generated move is
/// caught by the engine and counts as a rejected move.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolverError {
    /// A chain mutator was asked to create a cycle, a dangling link, or to
    /// reorder a pinned assignment.
    #[error("structural violation: {0}")]
    StructuralViolation(String),

    /// The input solution breaks one or more chain invariants.
    #[error("invalid problem: {}", format_violations(.0))]
    InvalidProblem(Vec<ValidationError>),

    /// A problem change could not be applied.
    #[error("invalid problem change: {0}")]
    InvalidChange(String),

    /// The solver configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SolverError {
    pub(crate) fn structural(message: impl Into<String>) -> Self {
        SolverError::StructuralViolation(message.into())
    }
}

fn format_violations(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
