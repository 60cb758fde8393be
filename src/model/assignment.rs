//! Chain nodes and arena indices.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::{Task, UserIdx};

/// Stable index of an assignment in the solution arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AssignmentIdx(pub usize);

impl fmt::Display for AssignmentIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a{}", self.0)
    }
}

/// Predecessor of an assignment: a user (chain head) or another assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ChainElement {
    User(UserIdx),
    Assignment(AssignmentIdx),
}

impl fmt::Display for ChainElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainElement::User(u) => write!(f, "{u}"),
            ChainElement::Assignment(a) => write!(f, "{a}"),
        }
    }
}

/// A task bound to a position in a user's chain.
///
/// `previous_element` is the planning variable: `None` means the assignment
/// is not chained yet. `next_element`, `user` and the times are derived by the
/// owning solution after every mutation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TaskAssignment {
    pub(crate) task: Arc<Task>,
    pub(crate) pinned: bool,
    pub(crate) previous_element: Option<ChainElement>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) next_element: Option<AssignmentIdx>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) user: Option<UserIdx>,
    pub(crate) start_time_in_minutes: i64,
    pub(crate) end_time_in_minutes: i64,
}

impl TaskAssignment {
    /// Wraps a task in a free, unchained assignment.
    pub fn new(task: impl Into<Arc<Task>>) -> Self {
        Self {
            task: task.into(),
            pinned: false,
            previous_element: None,
            next_element: None,
            user: None,
            start_time_in_minutes: 0,
            end_time_in_minutes: 0,
        }
    }

    pub fn with_pinned(mut self, pinned: bool) -> Self {
        self.pinned = pinned;
        self
    }

    /// Sets the producer-supplied predecessor link.
    pub fn with_previous(mut self, previous: ChainElement) -> Self {
        self.previous_element = Some(previous);
        self
    }

    /// Sets the producer-supplied times. They are recomputed from the chain
    /// once the assignment joins a solution.
    pub fn with_times(mut self, start: i64, end: i64) -> Self {
        self.start_time_in_minutes = start;
        self.end_time_in_minutes = end;
        self
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn pinned(&self) -> bool {
        self.pinned
    }

    pub fn previous_element(&self) -> Option<ChainElement> {
        self.previous_element
    }

    pub fn next_element(&self) -> Option<AssignmentIdx> {
        self.next_element
    }

    /// The user anchoring this assignment's chain, if chained.
    pub fn user(&self) -> Option<UserIdx> {
        self.user
    }

    pub fn is_initialized(&self) -> bool {
        self.previous_element.is_some()
    }

    pub fn start_time_in_minutes(&self) -> i64 {
        self.start_time_in_minutes
    }

    pub fn end_time_in_minutes(&self) -> i64 {
        self.end_time_in_minutes
    }
}
