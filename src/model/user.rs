//! User (worker) model.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::constants::PLANNING_USER_ID;
use super::{AssignmentIdx, Group, Task};

/// Stable index of a user in the solution arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UserIdx(pub usize);

impl fmt::Display for UserIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.0)
    }
}

/// An actor able to execute tasks.
///
/// A user anchors at most one chain; `next_element` is the first assignment
/// of that chain and is maintained by the solution, never by the producer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct User {
    /// Unique user identifier.
    pub id: String,
    /// Whether the user may receive work.
    pub enabled: bool,
    /// Groups held by the user.
    pub groups: BTreeSet<Group>,
    /// Skills held by the user.
    pub skills: BTreeSet<String>,
    /// Affinities of the user.
    pub affinities: BTreeSet<String>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) next_element: Option<AssignmentIdx>,
}

impl User {
    /// Creates a user with no groups or skills.
    pub fn new(id: impl Into<String>, enabled: bool) -> Self {
        Self {
            id: id.into(),
            enabled,
            groups: BTreeSet::new(),
            skills: BTreeSet::new(),
            affinities: BTreeSet::new(),
            next_element: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<Group>) -> Self {
        self.groups.insert(group.into());
        self
    }

    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.skills.insert(skill.into());
        self
    }

    pub fn with_affinity(mut self, affinity: impl Into<String>) -> Self {
        self.affinities.insert(affinity.into());
        self
    }

    /// First assignment of this user's chain.
    pub fn next_element(&self) -> Option<AssignmentIdx> {
        self.next_element
    }

    /// Whether this is the reserved unassigned-pool user.
    pub fn is_planning_user(&self) -> bool {
        self.id == PLANNING_USER_ID
    }

    /// Whether the user may execute the task: listed directly, holding one
    /// of its groups, or being the planning user.
    pub fn is_potential_owner(&self, task: &Task) -> bool {
        self.is_planning_user()
            || task.potential_users.contains(&self.id)
            || task.potential_groups.iter().any(|g| self.groups.contains(g))
    }

    /// Whether the user holds every skill the task requires.
    pub fn has_required_skills(&self, task: &Task) -> bool {
        self.is_planning_user() || task.required_skills.is_subset(&self.skills)
    }

    /// Number of affinities shared with the task.
    pub fn matched_affinities(&self, task: &Task) -> usize {
        task.affinities.intersection(&self.affinities).count()
    }
}
