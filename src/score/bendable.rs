//! Multi-level comparable score.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A score with an initialization level, hard levels and soft levels.
///
/// Scores compare lexicographically: `init` first, then every hard level in
/// order, then every soft level in order. Higher is better at every level,
/// so penalties are negative.
///
/// `init` is the negated number of assignments not yet chained; a solution
/// is initialized when it reaches zero.
///
/// # Examples
///
/// ```
/// use u_assign::score::BendableScore;
///
/// let a = BendableScore::of(vec![0, 0], vec![-1, -5]);
/// let b = BendableScore::of(vec![0, -1], vec![0, 0]);
/// assert!(a > b);
/// assert_eq!(a.to_string(), "[0/0]hard/[-1/-5]soft");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BendableScore {
    init: i64,
    hard: Vec<i64>,
    soft: Vec<i64>,
}

impl BendableScore {
    /// All-zero score with the given number of levels.
    pub fn zero(hard_levels: usize, soft_levels: usize) -> Self {
        Self {
            init: 0,
            hard: vec![0; hard_levels],
            soft: vec![0; soft_levels],
        }
    }

    pub fn of(hard: Vec<i64>, soft: Vec<i64>) -> Self {
        Self { init: 0, hard, soft }
    }

    pub fn with_init(mut self, init: i64) -> Self {
        self.init = init;
        self
    }

    pub fn init(&self) -> i64 {
        self.init
    }

    pub fn hard(&self) -> &[i64] {
        &self.hard
    }

    pub fn soft(&self) -> &[i64] {
        &self.soft
    }

    pub fn hard_levels(&self) -> usize {
        self.hard.len()
    }

    pub fn soft_levels(&self) -> usize {
        self.soft.len()
    }

    /// Whether every assignment is chained.
    pub fn is_solution_initialized(&self) -> bool {
        self.init >= 0
    }

    /// Initialized and no hard level negative.
    pub fn is_feasible(&self) -> bool {
        self.is_solution_initialized() && self.hard.iter().all(|&h| h >= 0)
    }

    /// Same score with the init level reset to zero.
    pub fn without_init(&self) -> Self {
        Self {
            init: 0,
            hard: self.hard.clone(),
            soft: self.soft.clone(),
        }
    }

    /// Whether both scores agree on every hard level.
    pub fn same_hard(&self, other: &Self) -> bool {
        self.hard == other.hard
    }

    /// `self.soft - other.soft` at the first soft level where they differ.
    pub fn first_soft_difference(&self, other: &Self) -> i64 {
        self.soft
            .iter()
            .zip(&other.soft)
            .map(|(a, b)| a - b)
            .find(|d| *d != 0)
            .unwrap_or(0)
    }
}

impl Ord for BendableScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.init
            .cmp(&other.init)
            .then_with(|| self.hard.cmp(&other.hard))
            .then_with(|| self.soft.cmp(&other.soft))
    }
}

impl PartialOrd for BendableScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn join(levels: &[i64]) -> String {
    levels
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join("/")
}

impl fmt::Display for BendableScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.init != 0 {
            write!(f, "{}init/", self.init)?;
        }
        write!(f, "[{}]hard/[{}]soft", join(&self.hard), join(&self.soft))
    }
}
