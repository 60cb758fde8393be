//! Cheapest-insertion construction pass.

use rayon::prelude::*;
use tracing::debug;

use super::config::{ConstructionConfig, PickEarly};
use crate::error::SolverError;
use crate::model::{AssignmentIdx, ChainElement, TaskAssigningSolution, UserIdx};
use crate::score::{BendableScore, ScoreCalculator, ScoreDirector};
use crate::selector::{EntityFilter, EntitySelector};
use crate::solver::Termination;

/// Result of a construction pass.
#[derive(Debug, Clone)]
pub struct ConstructionResult {
    /// Number of assignments placed.
    pub steps: usize,

    /// Score after the last placement.
    pub score: BendableScore,

    /// Score calculations performed by this pass.
    pub score_calculations: u64,

    /// Whether the pass stopped before placing every assignment.
    pub cancelled: bool,
}

/// Best position found for one assignment.
#[derive(Debug, Clone)]
struct Placement {
    position: ChainElement,
    score: BendableScore,
    early: bool,
}

/// Places every unchained assignment, one at a time, at the position giving
/// the best score. Decisions are never revisited.
pub struct ConstructionRunner;

impl ConstructionRunner {
    /// Runs the pass without a time budget.
    pub fn run<C: ScoreCalculator + ?Sized>(
        solution: &mut TaskAssigningSolution,
        director: &mut ScoreDirector<'_, C>,
        config: &ConstructionConfig,
    ) -> Result<ConstructionResult, SolverError> {
        Self::run_with_termination(solution, director, config, &Termination::unlimited())
    }

    /// Runs the pass, stopping between placements when `termination` is
    /// cancelled or out of time.
    ///
    /// # Errors
    /// [`SolverError::InvalidConfig`] for a bad config; a
    /// [`SolverError::StructuralViolation`] here indicates a bug, since
    /// only legal positions are tried.
    pub fn run_with_termination<C: ScoreCalculator + ?Sized>(
        solution: &mut TaskAssigningSolution,
        director: &mut ScoreDirector<'_, C>,
        config: &ConstructionConfig,
        termination: &Termination,
    ) -> Result<ConstructionResult, SolverError> {
        config.validate().map_err(SolverError::InvalidConfig)?;
        let calculations_before = director.calculation_count();
        let mut steps = 0usize;
        let mut cancelled = false;

        let dummy = solution.dummy_assignment();
        if !solution.assignment(dummy).is_initialized() {
            let pool = solution.planning_user();
            let tail = solution
                .chain(pool)
                .last()
                .map_or(ChainElement::User(pool), ChainElement::Assignment);
            solution.insert(dummy, tail)?;
            steps += 1;
        }

        let pending: Vec<AssignmentIdx> = EntitySelector::bounded()
            .with_filter(EntityFilter::Uninitialized)
            .iter(solution)
            .filter(|&a| a != dummy)
            .collect();

        for a in pending {
            if termination.is_cancelled() || termination.is_time_exhausted() {
                cancelled = true;
                break;
            }
            let users = eligible_users(solution, a, config);
            let placement = if config.parallel {
                best_placement_parallel(solution, director, a, &users, config.pick_early)?
            } else {
                best_placement(solution, director, a, &users, config.pick_early)?
            };
            let placement = placement.ok_or_else(|| {
                SolverError::structural(format!("no legal position for {a}"))
            })?;

            solution.insert(a, placement.position)?;
            steps += 1;
            debug!(
                step = steps,
                task = %solution.assignment(a).task().id,
                position = %placement.position,
                score = %placement.score,
                "Construction step"
            );
        }

        let score = director.calculate_score(solution);
        Ok(ConstructionResult {
            steps,
            score,
            score_calculations: director.calculation_count() - calculations_before,
            cancelled,
        })
    }
}

/// Users that may receive `a`: the planning user first, then real users by
/// ascending id, which fixes the tie-break order.
fn eligible_users(
    solution: &TaskAssigningSolution,
    a: AssignmentIdx,
    config: &ConstructionConfig,
) -> Vec<UserIdx> {
    let task = solution.assignment(a).task();
    let pool = solution.planning_user();
    let mut users: Vec<UserIdx> = solution
        .user_indices()
        .filter(|&u| {
            if u == solution.planning_user() {
                return true;
            }
            let user = solution.user(u);
            user.enabled
                && (!config.hard_filtering
                    || (user.is_potential_owner(task) && user.has_required_skills(task)))
        })
        .collect();
    users.sort_by_key(|&u| (u != pool, solution.user(u).id.as_str()));
    users
}

/// Insertion points of one chain that keep every pinned predecessor intact.
fn legal_positions(solution: &TaskAssigningSolution, user: UserIdx) -> Vec<ChainElement> {
    std::iter::once(ChainElement::User(user))
        .chain(solution.chain(user).map(ChainElement::Assignment))
        .filter(|&p| {
            solution
                .next_of(p)
                .is_none_or(|n| !solution.assignment(n).pinned())
        })
        .collect()
}

/// Scans the positions of `users` in order; later candidates replace the
/// current best only when strictly better.
fn scan<C: ScoreCalculator + ?Sized>(
    solution: &mut TaskAssigningSolution,
    director: &mut ScoreDirector<'_, C>,
    a: AssignmentIdx,
    users: &[UserIdx],
    pick_early: PickEarly,
    before: &BendableScore,
) -> Result<Option<Placement>, SolverError> {
    let mut best: Option<Placement> = None;
    for &u in users {
        for position in legal_positions(solution, u) {
            solution.insert(a, position)?;
            let score = director.peek_score(solution);
            solution.remove(a)?;

            let early = pick_early == PickEarly::FirstNonDeteriorating
                && score.without_init() >= *before;
            if best.as_ref().is_none_or(|b| score > b.score) || early {
                best = Some(Placement {
                    position,
                    score,
                    early,
                });
            }
            if early {
                return Ok(best);
            }
        }
    }
    Ok(best)
}

fn best_placement<C: ScoreCalculator + ?Sized>(
    solution: &mut TaskAssigningSolution,
    director: &mut ScoreDirector<'_, C>,
    a: AssignmentIdx,
    users: &[UserIdx],
    pick_early: PickEarly,
) -> Result<Option<Placement>, SolverError> {
    let before = director.peek_score(solution).without_init();
    scan(solution, director, a, users, pick_early, &before)
}

/// Scores each user's positions on a clone of the solution, then reduces the
/// per-user winners in user order so the outcome matches the sequential scan.
fn best_placement_parallel<C: ScoreCalculator + ?Sized>(
    solution: &TaskAssigningSolution,
    director: &mut ScoreDirector<'_, C>,
    a: AssignmentIdx,
    users: &[UserIdx],
    pick_early: PickEarly,
) -> Result<Option<Placement>, SolverError> {
    let before = director.peek_score(solution).without_init();
    let calculator = director.calculator();
    let per_user: Vec<Result<(Option<Placement>, u64), SolverError>> = users
        .par_iter()
        .map(|&u| {
            let mut local = solution.clone();
            let mut local_director = ScoreDirector::new(calculator);
            let placement = scan(&mut local, &mut local_director, a, &[u], pick_early, &before)?;
            Ok((placement, local_director.calculation_count()))
        })
        .collect();

    let mut best: Option<Placement> = None;
    for result in per_user {
        let (placement, count) = result?;
        director.add_calculations(count);
        if best.as_ref().is_some_and(|b| b.early) {
            continue;
        }
        if let Some(p) = placement {
            if p.early || best.as_ref().is_none_or(|b| p.score > b.score) {
                best = Some(p);
            }
        }
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::constants::{dummy_task_assignment, planning_user};
    use crate::model::{Task, TaskAssignment, User};
    use crate::score::DefaultConstraints;

    fn problem() -> TaskAssigningSolution {
        let users = vec![
            planning_user(),
            User::new("hr1", true).with_group("HR"),
            User::new("hr2", true).with_group("HR"),
            User::new("it", true).with_group("IT"),
        ];
        let assignments = vec![
            TaskAssignment::new(Task::new("T0").with_potential_group("HR")),
            TaskAssignment::new(Task::new("T1").with_potential_group("HR")),
            TaskAssignment::new(Task::new("T2").with_potential_group("IT")),
            TaskAssignment::new(Task::new("T3").with_potential_group("FIN")),
            dummy_task_assignment(),
        ];
        TaskAssigningSolution::new("p", users, assignments).unwrap()
    }

    #[test]
    fn test_every_assignment_is_chained() {
        let mut s = problem();
        let calculator = DefaultConstraints::new();
        let mut director = ScoreDirector::new(&calculator);
        let result =
            ConstructionRunner::run(&mut s, &mut director, &ConstructionConfig::default()).unwrap();

        assert_eq!(result.steps, 5);
        assert!(!result.cancelled);
        assert_eq!(s.uninitialized_count(), 0);
        assert!(result.score.is_solution_initialized());
        assert!(result.score.is_feasible());
        assert_eq!(s.score(), Some(&result.score));
        s.check_integrity().unwrap();

        // HR work is balanced over both HR users; unownable work stays pooled.
        assert_eq!(s.user_of(AssignmentIdx(0)), Some(UserIdx(1)));
        assert_eq!(s.user_of(AssignmentIdx(1)), Some(UserIdx(2)));
        assert_eq!(s.user_of(AssignmentIdx(2)), Some(UserIdx(3)));
        assert_eq!(s.user_of(AssignmentIdx(3)), Some(s.planning_user()));
        assert_eq!(s.user_of(s.dummy_assignment()), Some(s.planning_user()));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let calculator = DefaultConstraints::new();

        let mut seq = problem();
        let mut director = ScoreDirector::new(&calculator);
        ConstructionRunner::run(&mut seq, &mut director, &ConstructionConfig::default()).unwrap();

        let mut par = problem();
        let mut par_director = ScoreDirector::new(&calculator);
        ConstructionRunner::run(
            &mut par,
            &mut par_director,
            &ConstructionConfig::default().with_parallel(true),
        )
        .unwrap();

        assert_eq!(seq, par);
        assert_eq!(director.calculation_count(), par_director.calculation_count());
    }

    #[test]
    fn test_never_inserts_before_pinned() {
        let users = vec![planning_user(), User::new("u1", true).with_group("HR")];
        let assignments = vec![
            TaskAssignment::new(Task::new("P").with_potential_group("HR"))
                .with_pinned(true)
                .with_previous(ChainElement::User(UserIdx(1))),
            TaskAssignment::new(Task::new("F").with_potential_group("HR").with_priority(0)),
            dummy_task_assignment(),
        ];
        let mut s = TaskAssigningSolution::new("p", users, assignments).unwrap();
        let calculator = DefaultConstraints::new();
        let mut director = ScoreDirector::new(&calculator);
        ConstructionRunner::run(&mut s, &mut director, &ConstructionConfig::default()).unwrap();

        assert_eq!(s.head_of(UserIdx(1)), Some(AssignmentIdx(0)));
        assert_eq!(s.previous(AssignmentIdx(0)), Some(ChainElement::User(UserIdx(1))));
    }

    #[test]
    fn test_ties_go_to_lowest_user_id() {
        let users = vec![
            planning_user(),
            User::new("zed", true).with_group("HR"),
            User::new("amy", true).with_group("HR"),
        ];
        let assignments = vec![
            TaskAssignment::new(Task::new("T0").with_potential_group("HR")),
            dummy_task_assignment(),
        ];
        let mut s = TaskAssigningSolution::new("p", users, assignments).unwrap();
        let calculator = DefaultConstraints::new();
        let mut director = ScoreDirector::new(&calculator);
        ConstructionRunner::run(&mut s, &mut director, &ConstructionConfig::default()).unwrap();

        let owner = s.user_of(AssignmentIdx(0)).unwrap();
        assert_eq!(s.user(owner).id, "amy");
    }

    #[test]
    fn test_pick_early_takes_first_position() {
        let mut s = problem();
        let calculator = crate::score::FnScoreCalculator::new(1, 1, |_: &TaskAssigningSolution| {
            (vec![0], vec![0])
        });
        let mut director = ScoreDirector::new(&calculator);
        let config = ConstructionConfig::default().with_pick_early(PickEarly::FirstNonDeteriorating);
        ConstructionRunner::run(&mut s, &mut director, &config).unwrap();
        // A flat score makes the planning user head the first acceptable spot.
        for a in 0..4 {
            assert_eq!(s.user_of(AssignmentIdx(a)), Some(s.planning_user()));
        }
    }

    #[test]
    fn test_cancelled_before_start() {
        use std::sync::atomic::AtomicBool;
        use std::sync::Arc;

        let mut s = problem();
        let calculator = DefaultConstraints::new();
        let mut director = ScoreDirector::new(&calculator);
        let termination = Termination::new(None, None, Some(Arc::new(AtomicBool::new(true))));
        let result = ConstructionRunner::run_with_termination(
            &mut s,
            &mut director,
            &ConstructionConfig::default(),
            &termination,
        )
        .unwrap();
        assert!(result.cancelled);
        assert_eq!(result.score.init(), -4);
    }
}
