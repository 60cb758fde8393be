//! Weighted random move generation.

use rand::Rng;
use std::fmt;

use super::{BailoutGuard, ChainMove, EntityFilter, EntitySelector, Selection};
use crate::model::{AssignmentIdx, ChainElement, TaskAssigningSolution, UserIdx};

/// Relative frequency of each move kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveWeights {
    pub change: u32,
    pub swap: u32,
    pub sub_chain_change: u32,
    pub reverse: u32,
}

impl Default for MoveWeights {
    fn default() -> Self {
        Self {
            change: 4,
            swap: 2,
            sub_chain_change: 1,
            reverse: 1,
        }
    }
}

impl MoveWeights {
    pub fn with_change(mut self, weight: u32) -> Self {
        self.change = weight;
        self
    }

    pub fn with_swap(mut self, weight: u32) -> Self {
        self.swap = weight;
        self
    }

    pub fn with_sub_chain_change(mut self, weight: u32) -> Self {
        self.sub_chain_change = weight;
        self
    }

    pub fn with_reverse(mut self, weight: u32) -> Self {
        self.reverse = weight;
        self
    }

    pub fn total(&self) -> u32 {
        self.change + self.swap + self.sub_chain_change + self.reverse
    }

    /// Validates the weights.
    pub fn validate(&self) -> Result<(), String> {
        if self.total() == 0 {
            return Err("at least one move weight must be positive".into());
        }
        Ok(())
    }

    fn pick<R: Rng>(&self, rng: &mut R) -> MoveKind {
        let mut roll = rng.random_range(0..self.total());
        for (kind, weight) in [
            (MoveKind::Change, self.change),
            (MoveKind::Swap, self.swap),
            (MoveKind::SubChainChange, self.sub_chain_change),
        ] {
            if roll < weight {
                return kind;
            }
            roll -= weight;
        }
        MoveKind::Reverse
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MoveKind {
    Change,
    Swap,
    SubChainChange,
    Reverse,
}

/// Endless source of doable moves over movable, chained assignments.
///
/// Every sampled entity that cannot be turned into a doable move counts as a
/// rejection against the caller's [`BailoutGuard`].
#[derive(Debug, Clone)]
pub struct MoveSelector {
    entities: EntitySelector,
    weights: MoveWeights,
    max_subchain_len: usize,
}

impl MoveSelector {
    pub fn new(weights: MoveWeights, max_subchain_len: usize) -> Self {
        Self {
            entities: EntitySelector::endless()
                .with_filter(EntityFilter::Movable)
                .with_filter(EntityFilter::Initialized),
            weights,
            max_subchain_len: max_subchain_len.max(2),
        }
    }

    /// Replaces the entity selector, e.g. to add filters.
    pub fn with_entity_selector(mut self, entities: EntitySelector) -> Self {
        self.entities = entities;
        self
    }

    pub fn entity_selector(&self) -> &EntitySelector {
        &self.entities
    }

    /// Draws the next doable move, or [`Selection::Exhausted`] once the
    /// guard gives up.
    ///
    /// Returning a candidate does not reset the guard: the caller records
    /// success once the move has actually been applied, or a rejection when
    /// applying it fails.
    pub fn next_move<R: Rng>(
        &self,
        solution: &TaskAssigningSolution,
        rng: &mut R,
        guard: &mut BailoutGuard,
    ) -> Selection<ChainMove> {
        loop {
            let Selection::Candidate(first) = self.entities.select(solution, rng, guard) else {
                return Selection::Exhausted;
            };
            let candidate = match self.weights.pick(rng) {
                MoveKind::Change => Some(ChainMove::Change {
                    assignment: first,
                    to: random_destination(solution, rng),
                }),
                MoveKind::SubChainChange => {
                    let len = rng.random_range(1..=self.max_subchain_len);
                    let last = walk_movable(solution, first, len);
                    Some(ChainMove::SubChainChange {
                        first,
                        last,
                        to: random_destination(solution, rng),
                    })
                }
                MoveKind::Reverse => {
                    let len = rng.random_range(2..=self.max_subchain_len);
                    let last = walk_movable(solution, first, len);
                    Some(ChainMove::Reverse { first, last })
                }
                MoveKind::Swap => match self.entities.select(solution, rng, guard) {
                    Selection::Candidate(right) => Some(ChainMove::Swap { left: first, right }),
                    Selection::Exhausted => return Selection::Exhausted,
                },
            };
            match candidate {
                Some(mv) if mv.is_doable(solution) => return Selection::Candidate(mv),
                _ => guard.record_rejection(),
            }
        }
    }
}

impl fmt::Display for MoveSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnionMoveSelector({})", self.entities)
    }
}

/// Uniform over every user and assignment, so longer chains attract
/// proportionally more insertions.
fn random_destination<R: Rng>(solution: &TaskAssigningSolution, rng: &mut R) -> ChainElement {
    let users = solution.users().len();
    let roll = rng.random_range(0..users + solution.assignments().len());
    if roll < users {
        ChainElement::User(UserIdx(roll))
    } else {
        ChainElement::Assignment(AssignmentIdx(roll - users))
    }
}

/// Last node of the longest movable run of at most `len` nodes from `first`.
fn walk_movable(solution: &TaskAssigningSolution, first: AssignmentIdx, len: usize) -> AssignmentIdx {
    let mut last = first;
    for _ in 1..len {
        match solution.next(last) {
            Some(n) if solution.is_movable(n) => last = n,
            _ => break,
        }
    }
    last
}
