//! Constraint evaluator contract and engine-side scoring.

use std::sync::Arc;

use super::BendableScore;
use crate::model::TaskAssigningSolution;

/// Computes the hard and soft levels of a solution.
///
/// Implementations must be pure: the same solution state always yields the
/// same score and nothing is mutated. The engine adds the init level itself.
///
/// # Examples
///
/// ```
/// use u_assign::model::TaskAssigningSolution;
/// use u_assign::score::{BendableScore, ScoreCalculator};
///
/// struct CountPool;
///
/// impl ScoreCalculator for CountPool {
///     fn hard_levels(&self) -> usize { 0 }
///     fn soft_levels(&self) -> usize { 1 }
///     fn calculate(&self, s: &TaskAssigningSolution) -> BendableScore {
///         let pooled = s.chain(s.planning_user()).count() as i64;
///         BendableScore::of(vec![], vec![-pooled])
///     }
/// }
/// ```
pub trait ScoreCalculator: Send + Sync {
    fn hard_levels(&self) -> usize;

    fn soft_levels(&self) -> usize;

    /// Scores the solution. The returned init level is ignored.
    fn calculate(&self, solution: &TaskAssigningSolution) -> BendableScore;
}

impl<C: ScoreCalculator + ?Sized> ScoreCalculator for Box<C> {
    fn hard_levels(&self) -> usize {
        (**self).hard_levels()
    }

    fn soft_levels(&self) -> usize {
        (**self).soft_levels()
    }

    fn calculate(&self, solution: &TaskAssigningSolution) -> BendableScore {
        (**self).calculate(solution)
    }
}

impl<C: ScoreCalculator + ?Sized> ScoreCalculator for Arc<C> {
    fn hard_levels(&self) -> usize {
        (**self).hard_levels()
    }

    fn soft_levels(&self) -> usize {
        (**self).soft_levels()
    }

    fn calculate(&self, solution: &TaskAssigningSolution) -> BendableScore {
        (**self).calculate(solution)
    }
}

/// Adapts a closure returning `(hard, soft)` level vectors.
pub struct FnScoreCalculator<F> {
    hard_levels: usize,
    soft_levels: usize,
    f: F,
}

impl<F> FnScoreCalculator<F>
where
    F: Fn(&TaskAssigningSolution) -> (Vec<i64>, Vec<i64>) + Send + Sync,
{
    pub fn new(hard_levels: usize, soft_levels: usize, f: F) -> Self {
        Self {
            hard_levels,
            soft_levels,
            f,
        }
    }
}

impl<F> ScoreCalculator for FnScoreCalculator<F>
where
    F: Fn(&TaskAssigningSolution) -> (Vec<i64>, Vec<i64>) + Send + Sync,
{
    fn hard_levels(&self) -> usize {
        self.hard_levels
    }

    fn soft_levels(&self) -> usize {
        self.soft_levels
    }

    fn calculate(&self, solution: &TaskAssigningSolution) -> BendableScore {
        let (hard, soft) = (self.f)(solution);
        debug_assert_eq!(hard.len(), self.hard_levels, "hard level count mismatch");
        debug_assert_eq!(soft.len(), self.soft_levels, "soft level count mismatch");
        BendableScore::of(hard, soft)
    }
}

/// Engine-side wrapper around a calculator.
///
/// Adds the init level, stores the score on the solution and counts
/// calculations for speed reporting.
pub struct ScoreDirector<'a, C: ScoreCalculator + ?Sized> {
    calculator: &'a C,
    calculation_count: u64,
}

impl<'a, C: ScoreCalculator + ?Sized> ScoreDirector<'a, C> {
    pub fn new(calculator: &'a C) -> Self {
        Self {
            calculator,
            calculation_count: 0,
        }
    }

    pub fn calculator(&self) -> &'a C {
        self.calculator
    }

    /// Scores the solution and stores the result on it.
    pub fn calculate_score(&mut self, solution: &mut TaskAssigningSolution) -> BendableScore {
        let score = self.peek_score(solution);
        solution.set_score(score.clone());
        score
    }

    /// Scores the solution without storing the result.
    pub fn peek_score(&mut self, solution: &TaskAssigningSolution) -> BendableScore {
        self.calculation_count += 1;
        let init = -(solution.uninitialized_count() as i64);
        self.calculator.calculate(solution).with_init(init)
    }

    pub fn calculation_count(&self) -> u64 {
        self.calculation_count
    }

    /// Merges counts from directors used on cloned solutions.
    pub fn add_calculations(&mut self, count: u64) {
        self.calculation_count += count;
    }
}
