//! Chain-preserving moves.

use std::fmt;

use crate::error::SolverError;
use crate::model::{AssignmentIdx, ChainElement, TaskAssigningSolution};

/// A structural change to the solution's chains.
///
/// Applying a move returns its exact inverse, so tentative moves can be
/// rolled back without cloning the solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainMove {
    /// Moves one assignment after `to`.
    Change {
        assignment: AssignmentIdx,
        to: ChainElement,
    },
    /// Moves the segment `first..=last` after `to`.
    SubChainChange {
        first: AssignmentIdx,
        last: AssignmentIdx,
        to: ChainElement,
    },
    /// Exchanges the positions of two assignments.
    Swap {
        left: AssignmentIdx,
        right: AssignmentIdx,
    },
    /// Reverses the segment `first..=last`.
    Reverse {
        first: AssignmentIdx,
        last: AssignmentIdx,
    },
}

impl ChainMove {
    /// Cheap pre-check filtering no-ops and moves touching frozen
    /// assignments. Neighbour pin rules are enforced by the mutators.
    pub fn is_doable(&self, solution: &TaskAssigningSolution) -> bool {
        let chained = |a: AssignmentIdx| solution.assignment(a).is_initialized();
        let target_ok = |to: ChainElement| match to {
            ChainElement::User(u) => {
                let user = solution.user(u);
                user.enabled || user.is_planning_user()
            }
            ChainElement::Assignment(t) => chained(t),
        };
        match *self {
            ChainMove::Change { assignment, to } => {
                solution.is_movable(assignment)
                    && chained(assignment)
                    && to != ChainElement::Assignment(assignment)
                    && solution.previous(assignment) != Some(to)
                    && target_ok(to)
            }
            ChainMove::SubChainChange { first, last, to } => {
                if solution.previous(first) == Some(to) || !target_ok(to) {
                    return false;
                }
                match solution.segment(first, last) {
                    Some(nodes) => nodes.iter().all(|&n| {
                        solution.is_movable(n) && to != ChainElement::Assignment(n)
                    }),
                    None => false,
                }
            }
            ChainMove::Swap { left, right } => {
                left != right
                    && solution.is_movable(left)
                    && solution.is_movable(right)
                    && chained(left)
                    && chained(right)
            }
            ChainMove::Reverse { first, last } => {
                first != last
                    && solution
                        .segment(first, last)
                        .is_some_and(|nodes| nodes.iter().all(|&n| solution.is_movable(n)))
            }
        }
    }

    /// Applies the move and returns its inverse.
    ///
    /// Besides the chain invariants enforced by the mutators, a move never
    /// changes the successor of a pinned assignment: both links of a pinned
    /// node stay fixed for the whole local search.
    ///
    /// # Errors
    /// [`SolverError::StructuralViolation`] if the mutation would break a
    /// chain invariant; the solution is then unchanged.
    pub fn do_move(&self, solution: &mut TaskAssigningSolution) -> Result<ChainMove, SolverError> {
        self.check_pinned_successors(solution)?;
        match *self {
            ChainMove::Change { assignment, to } => {
                let from = solution.previous(assignment).ok_or_else(|| {
                    SolverError::structural(format!("{assignment} is not chained"))
                })?;
                solution.move_subchain(assignment, assignment, to)?;
                Ok(ChainMove::Change {
                    assignment,
                    to: from,
                })
            }
            ChainMove::SubChainChange { first, last, to } => {
                let from = solution.previous(first).ok_or_else(|| {
                    SolverError::structural(format!("{first} is not chained"))
                })?;
                solution.move_subchain(first, last, to)?;
                Ok(ChainMove::SubChainChange {
                    first,
                    last,
                    to: from,
                })
            }
            ChainMove::Swap { left, right } => {
                solution.swap(left, right)?;
                Ok(ChainMove::Swap { left, right })
            }
            ChainMove::Reverse { first, last } => {
                solution.reverse(first, last)?;
                Ok(ChainMove::Reverse {
                    first: last,
                    last: first,
                })
            }
        }
    }

    fn check_pinned_successors(&self, solution: &TaskAssigningSolution) -> Result<(), SolverError> {
        let pinned = |element: Option<ChainElement>| {
            matches!(element, Some(ChainElement::Assignment(p)) if solution.assignment(p).pinned())
        };
        let detaches_or_attaches = match *self {
            ChainMove::Change { assignment, to } => {
                pinned(solution.previous(assignment)) || pinned(Some(to))
            }
            ChainMove::SubChainChange { first, to, .. } => {
                pinned(solution.previous(first)) || pinned(Some(to))
            }
            ChainMove::Swap { left, right } => {
                pinned(solution.previous(left)) || pinned(solution.previous(right))
            }
            ChainMove::Reverse { first, .. } => pinned(solution.previous(first)),
        };
        if detaches_or_attaches {
            return Err(SolverError::structural(format!(
                "{self} would change the successor of a pinned assignment"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for ChainMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainMove::Change { assignment, to } => write!(f, "{assignment} -> {to}"),
            ChainMove::SubChainChange { first, last, to } => {
                write!(f, "[{first}..{last}] -> {to}")
            }
            ChainMove::Swap { left, right } => write!(f, "{left} <-> {right}"),
            ChainMove::Reverse { first, last } => write!(f, "reverse [{first}..{last}]"),
        }
    }
}
