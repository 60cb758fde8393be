//! Entity (assignment) selection.

use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;

use super::{BailoutGuard, Selection};
use crate::model::{AssignmentIdx, TaskAssigningSolution};

/// Predicate restricting which assignments a selector yields.
#[derive(Debug, Clone, Copy)]
pub enum EntityFilter {
    /// Neither pinned nor a sentinel.
    Movable,
    /// Already chained.
    Initialized,
    /// Not chained yet.
    Uninitialized,
    /// Not in the planning user chain.
    NotInPool,
    /// Caller-supplied predicate.
    Custom(fn(&TaskAssigningSolution, AssignmentIdx) -> bool),
}

impl EntityFilter {
    pub fn accepts(&self, solution: &TaskAssigningSolution, a: AssignmentIdx) -> bool {
        match self {
            EntityFilter::Movable => solution.is_movable(a),
            EntityFilter::Initialized => solution.assignment(a).is_initialized(),
            EntityFilter::Uninitialized => !solution.assignment(a).is_initialized(),
            EntityFilter::NotInPool => solution.user_of(a) != Some(solution.planning_user()),
            EntityFilter::Custom(f) => f(solution, a),
        }
    }
}

/// How a selector walks its space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SelectionMode {
    /// Every matching assignment once, in arena order.
    Bounded,
    /// Random sampling with replacement from all assignments; filters are
    /// applied after sampling, so the guard bounds the search.
    Endless,
}

/// Selects assignments from the current solution.
#[derive(Debug, Clone)]
pub struct EntitySelector {
    mode: SelectionMode,
    filters: Vec<EntityFilter>,
}

impl EntitySelector {
    pub fn bounded() -> Self {
        Self {
            mode: SelectionMode::Bounded,
            filters: Vec::new(),
        }
    }

    pub fn endless() -> Self {
        Self {
            mode: SelectionMode::Endless,
            filters: Vec::new(),
        }
    }

    /// Adds a filter; all filters must accept a candidate.
    pub fn with_filter(mut self, filter: EntityFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn accepts(&self, solution: &TaskAssigningSolution, a: AssignmentIdx) -> bool {
        self.filters.iter().all(|f| f.accepts(solution, a))
    }

    /// Finite enumeration of matching assignments in arena order.
    pub fn iter<'a>(
        &'a self,
        solution: &'a TaskAssigningSolution,
    ) -> impl Iterator<Item = AssignmentIdx> + 'a {
        solution
            .assignment_indices()
            .filter(move |&a| self.accepts(solution, a))
    }

    /// Matching assignments in a random order.
    pub fn shuffled<R: Rng>(&self, solution: &TaskAssigningSolution, rng: &mut R) -> Vec<AssignmentIdx> {
        let mut all: Vec<AssignmentIdx> = self.iter(solution).collect();
        all.shuffle(rng);
        all
    }

    /// Number of matching assignments. Only meaningful for bounded use.
    pub fn size(&self, solution: &TaskAssigningSolution) -> usize {
        self.iter(solution).count()
    }

    /// Samples one matching assignment.
    ///
    /// Endless mode samples all assignments with replacement and filters
    /// afterwards: every filtered-out sample counts against the guard, and
    /// once the guard is exhausted the call bails out with
    /// [`Selection::Exhausted`]. Bounded mode draws uniformly from the
    /// matching set and reports an empty set as exhausted without touching
    /// the guard.
    pub fn select<R: Rng>(
        &self,
        solution: &TaskAssigningSolution,
        rng: &mut R,
        guard: &mut BailoutGuard,
    ) -> Selection<AssignmentIdx> {
        if guard.is_exhausted() {
            return guard.bail_out(self);
        }
        match self.mode {
            SelectionMode::Bounded => {
                let matching: Vec<AssignmentIdx> = self.iter(solution).collect();
                if matching.is_empty() {
                    return Selection::Exhausted;
                }
                Selection::Candidate(matching[rng.random_range(0..matching.len())])
            }
            SelectionMode::Endless => {
                let n = solution.assignments().len();
                if n == 0 {
                    return guard.bail_out(self);
                }
                loop {
                    if guard.is_exhausted() {
                        return guard.bail_out(self);
                    }
                    let a = AssignmentIdx(rng.random_range(0..n));
                    if self.accepts(solution, a) {
                        return Selection::Candidate(a);
                    }
                    guard.record_rejection();
                }
            }
        }
    }
}

impl fmt::Display for EntitySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            SelectionMode::Bounded => "Bounded",
            SelectionMode::Endless => "Endless",
        };
        if self.filters.is_empty() {
            write!(f, "{mode}(FromSolution(TaskAssignment))")
        } else {
            write!(f, "Filtering({mode}(FromSolution(TaskAssignment)), {:?})", self.filters)
        }
    }
}
