//! Sentinel anchors present in every solution.

use super::{Task, TaskAssignment, User};

/// Id of the reserved user holding unassigned work.
pub const PLANNING_USER_ID: &str = "planninguser";

/// Id of the placeholder task keeping the planning user chain non-empty.
pub const DUMMY_TASK_ID: &str = "dummy-task";

/// The unassigned-pool user.
pub fn planning_user() -> User {
    User::new(PLANNING_USER_ID, true)
}

/// The placeholder task. It requires no group and only the planning user
/// may own it.
pub fn dummy_task() -> Task {
    Task::new(DUMMY_TASK_ID)
        .with_name(DUMMY_TASK_ID)
        .with_potential_user(PLANNING_USER_ID)
}

/// A free assignment wrapping [`dummy_task`].
pub fn dummy_task_assignment() -> TaskAssignment {
    TaskAssignment::new(dummy_task())
}
