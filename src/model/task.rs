//! Task and group (capability) model.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Default duration of a task when none is given, in minutes.
pub const DEFAULT_DURATION_MINUTES: i64 = 1;

/// Default task priority (medium).
pub const DEFAULT_PRIORITY: i32 = 5;

/// A capability a user may hold and a task may require.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Group(String);

impl Group {
    /// Creates a group from its identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The group identifier.
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Group {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Priority band of a task, derived from its numeric priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityLevel {
    /// Priority 0–2.
    High,
    /// Priority 3–6.
    Medium,
    /// Priority 7 and above.
    Low,
}

/// A unit of work to be assigned.
///
/// Tasks are immutable inputs. A task is assignable to a user that is listed
/// in `potential_users` or holds at least one of `potential_groups`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Task {
    /// Unique task identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Priority, 0 (most urgent) to 10.
    pub priority: i32,
    /// Users allowed to execute the task, by id.
    pub potential_users: BTreeSet<String>,
    /// Groups allowed to execute the task (any-of).
    pub potential_groups: BTreeSet<Group>,
    /// Skills the executing user must hold (all-of).
    pub required_skills: BTreeSet<String>,
    /// Affinities rewarded when shared with the executing user.
    pub affinities: BTreeSet<String>,
    /// Expected duration in minutes.
    pub duration_minutes: i64,
}

impl Task {
    /// Creates a new task with the given ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            priority: DEFAULT_PRIORITY,
            potential_users: BTreeSet::new(),
            potential_groups: BTreeSet::new(),
            required_skills: BTreeSet::new(),
            affinities: BTreeSet::new(),
            duration_minutes: DEFAULT_DURATION_MINUTES,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_potential_user(mut self, user_id: impl Into<String>) -> Self {
        self.potential_users.insert(user_id.into());
        self
    }

    pub fn with_potential_group(mut self, group: impl Into<Group>) -> Self {
        self.potential_groups.insert(group.into());
        self
    }

    pub fn with_required_skill(mut self, skill: impl Into<String>) -> Self {
        self.required_skills.insert(skill.into());
        self
    }

    pub fn with_affinity(mut self, affinity: impl Into<String>) -> Self {
        self.affinities.insert(affinity.into());
        self
    }

    /// Sets the duration in minutes. Negative values are clamped to zero.
    pub fn with_duration_minutes(mut self, minutes: i64) -> Self {
        self.duration_minutes = minutes.max(0);
        self
    }

    /// Priority band used by the default constraints.
    pub fn priority_level(&self) -> PriorityLevel {
        match self.priority {
            p if p <= 2 => PriorityLevel::High,
            p if p <= 6 => PriorityLevel::Medium,
            _ => PriorityLevel::Low,
        }
    }
}

impl From<String> for Group {
    fn from(id: String) -> Self {
        Self(id)
    }
}
