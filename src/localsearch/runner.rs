//! Local search step loop.

use rand::Rng;
use std::fmt;
use std::time::Instant;
use tracing::debug;

use super::acceptor::Acceptor;
use super::config::LocalSearchConfig;
use crate::error::SolverError;
use crate::model::TaskAssigningSolution;
use crate::score::{BendableScore, ScoreCalculator, ScoreDirector};
use crate::selector::{BailoutGuard, ChainMove, MoveSelector, Selection};
use crate::solver::Termination;

/// Where a phase is in its step cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseState {
    /// Not started.
    Idle,
    /// Evaluating moves for the current step.
    Stepping,
    /// The last step produced a new phase best.
    Improved,
    /// The last step did not beat the phase best.
    Plateaued,
    /// A stop condition was met.
    Terminated,
}

/// Why a phase stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// Phase or solver step budget reached.
    StepLimit,
    /// Phase or solver time budget reached.
    TimeLimit,
    /// Too many consecutive steps without a new phase best.
    UnimprovedStepLimit,
    /// Cancellation requested.
    Cancelled,
    /// The move selector bailed out before producing a single move.
    SelectorExhausted,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TerminationReason::StepLimit => "step limit",
            TerminationReason::TimeLimit => "time limit",
            TerminationReason::UnimprovedStepLimit => "unimproved step limit",
            TerminationReason::Cancelled => "cancelled",
            TerminationReason::SelectorExhausted => "selector exhausted",
        };
        f.write_str(name)
    }
}

/// Result of a local search phase.
#[derive(Debug, Clone)]
pub struct LocalSearchResult {
    /// Steps taken, including steps that picked no move.
    pub steps: u64,

    /// Best score reached during the phase.
    pub best_score: BendableScore,

    /// Score of the working solution when the phase stopped.
    pub last_score: BendableScore,

    /// Why the phase stopped.
    pub reason: TerminationReason,

    /// Steps during which the selector bailed out.
    pub bailouts: u64,

    /// Moves accepted by the acceptor, picked or not.
    pub accepted_moves: u64,

    /// Moves rejected by a chain mutator.
    pub structural_rejections: u64,

    /// Steps ending in [`PhaseState::Improved`].
    pub improved_steps: u64,

    /// Steps ending in [`PhaseState::Plateaued`].
    pub plateaued_steps: u64,

    /// Score calculations performed by this phase.
    pub score_calculations: u64,
}

/// Mutable bookkeeping of one phase.
struct PhaseScope {
    state: PhaseState,
    steps: u64,
    unimproved: u64,
    last_step_score: BendableScore,
    best_score: BendableScore,
    started: Instant,
}

impl PhaseScope {
    fn transition(&mut self, next: PhaseState) {
        debug_assert!(
            self.state != PhaseState::Terminated,
            "terminated phase cannot resume"
        );
        self.state = next;
    }

    fn check_termination(
        &self,
        config: &LocalSearchConfig,
        termination: &Termination,
    ) -> Option<TerminationReason> {
        if termination.is_cancelled() {
            return Some(TerminationReason::Cancelled);
        }
        if termination.is_terminated() {
            return Some(if termination.is_time_exhausted() {
                TerminationReason::TimeLimit
            } else {
                TerminationReason::StepLimit
            });
        }
        if config.max_steps > 0 && self.steps >= config.max_steps {
            return Some(TerminationReason::StepLimit);
        }
        if config
            .time_limit
            .is_some_and(|limit| self.started.elapsed() >= limit)
        {
            return Some(TerminationReason::TimeLimit);
        }
        if config.unimproved_step_limit > 0 && self.unimproved >= config.unimproved_step_limit {
            return Some(TerminationReason::UnimprovedStepLimit);
        }
        None
    }
}

/// Runs local search phases.
pub struct LocalSearchRunner;

impl LocalSearchRunner {
    /// Improves `solution` in place until a stop condition is met.
    ///
    /// Each step draws up to `max_moves_per_step` moves from a
    /// [`MoveSelector`] guarded by a fresh [`BailoutGuard`], applies each one
    /// tentatively, scores it and rolls it back. The best accepted move is
    /// then applied for good. `on_best` is called after every step that
    /// beats the phase best, with the solution, its score and the phase step.
    ///
    /// # Errors
    /// [`SolverError::InvalidConfig`] for a bad config. A structural error
    /// while undoing or redoing a move is an engine bug and propagates;
    /// structural errors from tentative moves are counted and skipped.
    pub fn run<C, R, F>(
        solution: &mut TaskAssigningSolution,
        director: &mut ScoreDirector<'_, C>,
        config: &LocalSearchConfig,
        bailout_ceiling: usize,
        rng: &mut R,
        termination: &Termination,
        mut on_best: F,
    ) -> Result<LocalSearchResult, SolverError>
    where
        C: ScoreCalculator + ?Sized,
        R: Rng,
        F: FnMut(&TaskAssigningSolution, &BendableScore, u64),
    {
        config.validate().map_err(SolverError::InvalidConfig)?;
        let calculations_before = director.calculation_count();

        let selector = MoveSelector::new(config.move_weights, config.max_subchain_len);
        let mut acceptor = Acceptor::new(&config.acceptor);
        let start_score = director.calculate_score(solution);
        acceptor.phase_started(&start_score);

        let mut scope = PhaseScope {
            state: PhaseState::Idle,
            steps: 0,
            unimproved: 0,
            last_step_score: start_score.clone(),
            best_score: start_score,
            started: Instant::now(),
        };
        let mut bailouts = 0u64;
        let mut accepted_moves = 0u64;
        let mut structural_rejections = 0u64;
        let mut improved_steps = 0u64;
        let mut plateaued_steps = 0u64;

        let reason = loop {
            if let Some(reason) = scope.check_termination(config, termination) {
                break reason;
            }
            scope.transition(PhaseState::Stepping);

            let mut guard = BailoutGuard::new(bailout_ceiling);
            let mut picked: Option<(ChainMove, BendableScore)> = None;
            let mut selected = 0usize;
            let mut applied = 0usize;
            let mut accepted = 0usize;

            while selected < config.max_moves_per_step && accepted < config.accepted_count_limit {
                let Selection::Candidate(mv) = selector.next_move(solution, rng, &mut guard) else {
                    break;
                };
                selected += 1;

                let undo = match mv.do_move(solution) {
                    Ok(undo) => {
                        applied += 1;
                        guard.record_success();
                        undo
                    }
                    Err(err) => {
                        structural_rejections += 1;
                        guard.record_rejection();
                        debug!(step = scope.steps, %mv, error = %err, "Move rejected");
                        continue;
                    }
                };
                let score = director.peek_score(solution);
                undo.do_move(solution)?;

                if acceptor.is_accepted(&score, &scope.last_step_score, rng) {
                    accepted += 1;
                    if picked.as_ref().is_none_or(|(_, best)| score > *best) {
                        picked = Some((mv, score));
                    }
                }
            }
            accepted_moves += accepted as u64;
            if guard.bailed_out() {
                bailouts += 1;
            }
            if selected == 0 || (applied == 0 && guard.bailed_out()) {
                break TerminationReason::SelectorExhausted;
            }

            scope.steps += 1;
            termination.record_step();

            if let Some((mv, score)) = picked {
                mv.do_move(solution)?;
                solution.set_score(score.clone());
                scope.last_step_score = score;
            }
            acceptor.step_ended(&scope.last_step_score);

            if scope.last_step_score > scope.best_score {
                scope.best_score = scope.last_step_score.clone();
                scope.unimproved = 0;
                improved_steps += 1;
                scope.transition(PhaseState::Improved);
                on_best(solution, &scope.best_score, scope.steps);
            } else {
                scope.unimproved += 1;
                plateaued_steps += 1;
                scope.transition(PhaseState::Plateaued);
            }
            debug!(
                step = scope.steps,
                state = ?scope.state,
                score = %scope.last_step_score,
                best_score = %scope.best_score,
                selected,
                accepted,
                "Local search step"
            );
        };
        scope.transition(PhaseState::Terminated);

        Ok(LocalSearchResult {
            steps: scope.steps,
            best_score: scope.best_score,
            last_score: scope.last_step_score,
            reason,
            bailouts,
            accepted_moves,
            structural_rejections,
            improved_steps,
            plateaued_steps,
            score_calculations: director.calculation_count() - calculations_before,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localsearch::AcceptorConfig;
    use crate::model::constants::{dummy_task_assignment, planning_user};
    use crate::model::{AssignmentIdx, ChainElement, Task, TaskAssignment, User, UserIdx};
    use crate::score::DefaultConstraints;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Everything starts in the pool; two HR users are free.
    fn pooled() -> TaskAssigningSolution {
        let users = vec![
            planning_user(),
            User::new("hr1", true).with_group("HR"),
            User::new("hr2", true).with_group("HR"),
        ];
        let mut assignments = vec![dummy_task_assignment().with_previous(ChainElement::User(UserIdx(0)))];
        for i in 0..6 {
            assignments.push(
                TaskAssignment::new(Task::new(format!("T{i}")).with_potential_group("HR"))
                    .with_previous(ChainElement::Assignment(AssignmentIdx(i))),
            );
        }
        TaskAssigningSolution::new("p", users, assignments).unwrap()
    }

    fn run(
        solution: &mut TaskAssigningSolution,
        config: &LocalSearchConfig,
        ceiling: usize,
    ) -> (LocalSearchResult, Vec<BendableScore>) {
        let calculator = DefaultConstraints::new();
        let mut director = ScoreDirector::new(&calculator);
        let mut rng = StdRng::seed_from_u64(5);
        let mut seen = Vec::new();
        let result = LocalSearchRunner::run(
            solution,
            &mut director,
            config,
            ceiling,
            &mut rng,
            &Termination::unlimited(),
            |s, score, _| {
                assert_eq!(s.score(), Some(score));
                seen.push(score.clone());
            },
        )
        .unwrap();
        (result, seen)
    }

    #[test]
    fn test_hill_climbing_empties_pool() {
        let mut s = pooled();
        let config = LocalSearchConfig::default()
            .with_acceptor(AcceptorConfig::HillClimbing)
            .with_accepted_count_limit(5)
            .with_max_steps(300);
        let (result, seen) = run(&mut s, &config, 1000);

        assert!(result.best_score.is_feasible());
        assert_eq!(result.best_score.soft()[0], 0, "no real task left in the pool");
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(seen.last(), Some(&result.best_score));
        s.check_integrity().unwrap();
    }

    #[test]
    fn test_step_limit_stops_phase() {
        let mut s = pooled();
        let config = LocalSearchConfig::default()
            .with_max_steps(10)
            .with_unimproved_step_limit(0);
        let (result, _) = run(&mut s, &config, 1000);
        assert_eq!(result.reason, TerminationReason::StepLimit);
        assert_eq!(result.steps, 10);
    }

    #[test]
    fn test_nothing_movable_terminates_by_bailout() {
        let mut s = TaskAssigningSolution::new(
            "pinned",
            vec![planning_user(), User::new("u1", true)],
            vec![
                TaskAssignment::new(Task::new("A1"))
                    .with_pinned(true)
                    .with_previous(ChainElement::User(UserIdx(1))),
                dummy_task_assignment().with_previous(ChainElement::User(UserIdx(0))),
            ],
        )
        .unwrap();
        let before = s.clone();
        let (result, seen) = run(&mut s, &LocalSearchConfig::default(), 50);
        assert_eq!(result.reason, TerminationReason::SelectorExhausted);
        assert_eq!(result.steps, 0);
        assert_eq!(result.bailouts, 1);
        assert!(seen.is_empty());
        assert_eq!(s.previous(AssignmentIdx(0)), before.previous(AssignmentIdx(0)));
    }

    #[test]
    fn test_structural_failures_exhaust_the_step() {
        // u1 -> F -> P (pinned): F is the only movable assignment and any
        // move of it would change the predecessor of P.
        let mut s = TaskAssigningSolution::new(
            "stuck",
            vec![planning_user(), User::new("u1", true), User::new("u2", true)],
            vec![
                TaskAssignment::new(Task::new("F")).with_previous(ChainElement::User(UserIdx(1))),
                TaskAssignment::new(Task::new("P"))
                    .with_pinned(true)
                    .with_previous(ChainElement::Assignment(AssignmentIdx(0))),
                dummy_task_assignment().with_previous(ChainElement::User(UserIdx(0))),
            ],
        )
        .unwrap();
        let before = s.clone();
        let (result, seen) = run(&mut s, &LocalSearchConfig::default(), 50);
        assert_eq!(result.reason, TerminationReason::SelectorExhausted);
        assert_eq!(result.steps, 0);
        assert_eq!(result.bailouts, 1);
        assert!(result.structural_rejections <= 50);
        assert!(seen.is_empty());
        assert_eq!(s.next(AssignmentIdx(0)), before.next(AssignmentIdx(0)));
    }

    #[test]
    fn test_cancelled_before_first_step() {
        use std::sync::atomic::AtomicBool;
        use std::sync::Arc;

        let mut s = pooled();
        let calculator = DefaultConstraints::new();
        let mut director = ScoreDirector::new(&calculator);
        let mut rng = StdRng::seed_from_u64(5);
        let termination = Termination::new(None, None, Some(Arc::new(AtomicBool::new(true))));
        let result = LocalSearchRunner::run(
            &mut s,
            &mut director,
            &LocalSearchConfig::default(),
            1000,
            &mut rng,
            &termination,
            |_, _, _| {},
        )
        .unwrap();
        assert_eq!(result.reason, TerminationReason::Cancelled);
        assert_eq!(result.steps, 0);
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let mut s = pooled();
        let calculator = DefaultConstraints::new();
        let mut director = ScoreDirector::new(&calculator);
        let mut rng = StdRng::seed_from_u64(5);
        let err = LocalSearchRunner::run(
            &mut s,
            &mut director,
            &LocalSearchConfig::default().with_max_moves_per_step(0),
            1000,
            &mut rng,
            &Termination::unlimited(),
            |_, _, _| {},
        );
        assert!(matches!(err, Err(SolverError::InvalidConfig(_))));
    }
}
