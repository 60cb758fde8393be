//! Domain model of chained task assignment.
//!
//! Users anchor chains of task assignments. A solution owns every user and
//! assignment in two arenas and exposes navigation plus invariant-preserving
//! mutators; nothing else writes chain links.
//!
//! Two sentinels are always present: the planning user, which pools
//! unassigned work, and the dummy assignment, which keeps that pool non-empty.

mod assignment;
mod changes;
pub mod constants;
mod solution;
mod task;
mod user;
mod validation;

pub use assignment::{AssignmentIdx, ChainElement, TaskAssignment};
pub use changes::ProblemChange;
pub use solution::{ChainIter, TaskAssigningSolution};
pub use task::{Group, PriorityLevel, Task, DEFAULT_DURATION_MINUTES, DEFAULT_PRIORITY};
pub use user::{User, UserIdx};
pub use validation::{validate_input, ValidationError, ValidationErrorKind, ValidationResult};
