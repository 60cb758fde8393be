//! Problem changes applied between solving runs.
//!
//! A hosting application re-optimizing as work arrives applies changes to
//! the last best solution and solves again. Each change either applies
//! completely or leaves the solution untouched.

use tracing::debug;

use super::{Task, TaskAssigningSolution, TaskAssignment, User};
use crate::error::SolverError;

/// A producer-side modification of a solution.
#[derive(Debug, Clone, PartialEq)]
pub enum ProblemChange {
    /// Adds a free, unchained assignment for a new task.
    AddTask(Task),
    /// Deletes a non-pinned task.
    RemoveTask(String),
    /// Freezes a chained task in its current position.
    PinTask(String),
    /// Lets the optimizer move a pinned task again.
    ReleaseTask(String),
    /// Adds a user with an empty chain.
    AddUser(User),
    /// Disables a user and unchains its non-pinned tasks.
    DisableUser(String),
}

impl ProblemChange {
    /// Applies the change.
    ///
    /// # Errors
    /// [`SolverError::InvalidChange`] for unknown or duplicate ids, sentinel
    /// targets, or removal of a pinned task.
    pub fn apply(&self, solution: &mut TaskAssigningSolution) -> Result<(), SolverError> {
        debug!(change = ?self, "applying problem change");
        match self {
            ProblemChange::AddTask(task) => {
                if solution.find_task(&task.id).is_some() {
                    return Err(SolverError::InvalidChange(format!(
                        "task '{}' already exists",
                        task.id
                    )));
                }
                solution.push_assignment(TaskAssignment::new(task.clone()));
            }
            ProblemChange::RemoveTask(id) => {
                let a = find_real_task(solution, id)?;
                if solution.assignment(a).pinned() {
                    return Err(SolverError::InvalidChange(format!(
                        "task '{id}' is pinned; release it first"
                    )));
                }
                solution.force_unlink(a);
                solution.delete_unchained(a);
            }
            ProblemChange::PinTask(id) => {
                let a = find_real_task(solution, id)?;
                if !solution.assignment(a).is_initialized() {
                    return Err(SolverError::InvalidChange(format!(
                        "task '{id}' is not chained and cannot be pinned"
                    )));
                }
                solution.set_pinned(a, true);
            }
            ProblemChange::ReleaseTask(id) => {
                let a = find_real_task(solution, id)?;
                solution.set_pinned(a, false);
            }
            ProblemChange::AddUser(user) => {
                if solution.find_user(&user.id).is_some() {
                    return Err(SolverError::InvalidChange(format!(
                        "user '{}' already exists",
                        user.id
                    )));
                }
                solution.push_user(user.clone());
            }
            ProblemChange::DisableUser(id) => {
                let u = solution
                    .find_user(id)
                    .ok_or_else(|| SolverError::InvalidChange(format!("unknown user '{id}'")))?;
                if u == solution.planning_user() {
                    return Err(SolverError::InvalidChange(
                        "the planning user cannot be disabled".into(),
                    ));
                }
                let released: Vec<_> = solution
                    .chain(u)
                    .filter(|&a| !solution.assignment(a).pinned())
                    .collect();
                for a in released {
                    solution.force_unlink(a);
                }
                solution.user_mut(u).enabled = false;
            }
        }
        Ok(())
    }
}

fn find_real_task(
    solution: &TaskAssigningSolution,
    id: &str,
) -> Result<super::AssignmentIdx, SolverError> {
    let a = solution
        .find_task(id)
        .ok_or_else(|| SolverError::InvalidChange(format!("unknown task '{id}'")))?;
    if solution.is_sentinel(a) {
        return Err(SolverError::InvalidChange(
            "the dummy assignment cannot be changed".into(),
        ));
    }
    Ok(a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::constants::{dummy_task_assignment, planning_user};
    use crate::model::{AssignmentIdx, ChainElement, UserIdx};

    fn solution() -> TaskAssigningSolution {
        let users = vec![planning_user(), User::new("u1", true)];
        let assignments = vec![
            TaskAssignment::new(Task::new("T1")).with_previous(ChainElement::User(UserIdx(1))),
            TaskAssignment::new(Task::new("T2"))
                .with_pinned(true)
                .with_previous(ChainElement::Assignment(AssignmentIdx(0))),
            TaskAssignment::new(Task::new("T3"))
                .with_previous(ChainElement::Assignment(AssignmentIdx(1))),
            dummy_task_assignment().with_previous(ChainElement::User(UserIdx(0))),
        ];
        TaskAssigningSolution::new("s", users, assignments).unwrap()
    }

    #[test]
    fn test_add_and_remove_task() {
        let mut s = solution();
        ProblemChange::AddTask(Task::new("T4")).apply(&mut s).unwrap();
        let t4 = s.find_task("T4").unwrap();
        assert!(!s.assignment(t4).is_initialized());

        ProblemChange::RemoveTask("T3".into()).apply(&mut s).unwrap();
        assert!(s.find_task("T3").is_none());
        assert_eq!(s.assignments().len(), 4);
        s.check_integrity().unwrap();
    }

    #[test]
    fn test_duplicate_task_rejected() {
        let mut s = solution();
        let err = ProblemChange::AddTask(Task::new("T1")).apply(&mut s);
        assert!(matches!(err, Err(SolverError::InvalidChange(_))));
    }

    #[test]
    fn test_pinned_task_removal_needs_release() {
        let mut s = solution();
        assert!(ProblemChange::RemoveTask("T2".into()).apply(&mut s).is_err());
        ProblemChange::ReleaseTask("T2".into()).apply(&mut s).unwrap();
        ProblemChange::RemoveTask("T2".into()).apply(&mut s).unwrap();
        let u1 = s.find_user("u1").unwrap();
        let chain: Vec<_> = s.chain(u1).map(|a| s.assignment(a).task().id.clone()).collect();
        assert_eq!(chain, vec!["T1", "T3"]);
        s.check_integrity().unwrap();
    }

    #[test]
    fn test_sentinel_is_protected() {
        let mut s = solution();
        assert!(ProblemChange::RemoveTask("dummy-task".into()).apply(&mut s).is_err());
        assert!(ProblemChange::DisableUser("planninguser".into()).apply(&mut s).is_err());
    }

    #[test]
    fn test_pin_requires_chained_task() {
        let mut s = solution();
        ProblemChange::AddTask(Task::new("T9")).apply(&mut s).unwrap();
        assert!(ProblemChange::PinTask("T9".into()).apply(&mut s).is_err());
        ProblemChange::PinTask("T1".into()).apply(&mut s).unwrap();
        assert!(s.assignment(s.find_task("T1").unwrap()).pinned());
    }

    #[test]
    fn test_disable_user_keeps_pinned_work() {
        let mut s = solution();
        ProblemChange::DisableUser("u1".into()).apply(&mut s).unwrap();
        let u1 = s.find_user("u1").unwrap();
        assert!(!s.user(u1).enabled);
        let chain: Vec<_> = s.chain(u1).map(|a| s.assignment(a).task().id.clone()).collect();
        assert_eq!(chain, vec!["T2"]);
        assert_eq!(s.uninitialized_count(), 2);
        s.check_integrity().unwrap();
    }

    #[test]
    fn test_add_user() {
        let mut s = solution();
        ProblemChange::AddUser(User::new("u2", true)).apply(&mut s).unwrap();
        let u2 = s.find_user("u2").unwrap();
        assert_eq!(s.head_of(u2), None);
        assert!(ProblemChange::AddUser(User::new("u2", true)).apply(&mut s).is_err());
    }
}
