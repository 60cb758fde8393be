//! Phase sequencing and best solution tracking.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::config::SolverConfig;
use super::event::{EventDispatcher, EventListener, ListenerList, PhaseKind, SolverEvent};
use super::termination::Termination;
use crate::construction::ConstructionRunner;
use crate::error::SolverError;
use crate::localsearch::{LocalSearchResult, LocalSearchRunner};
use crate::model::TaskAssigningSolution;
use crate::score::{BendableScore, ScoreCalculator, ScoreDirector};

/// Result of a solving run.
#[derive(Debug, Clone)]
pub struct SolverResult {
    /// The best solution found.
    pub best_solution: TaskAssigningSolution,

    /// Score of the best solution.
    pub best_score: BendableScore,

    /// Whether cancellation stopped the run.
    pub cancelled: bool,

    /// Assignments placed by the construction heuristic.
    pub construction_steps: usize,

    /// Local search steps over all phases.
    pub local_search_steps: u64,

    /// Local search steps during which a selector bailed out.
    pub bailouts: u64,

    /// Per-phase local search statistics, in run order.
    pub phases: Vec<LocalSearchResult>,

    /// Total score calculations.
    pub score_calculation_count: u64,

    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

/// Retains the best solution seen and announces every strict improvement.
struct BestRecaller {
    solution: Option<Arc<TaskAssigningSolution>>,
    score: Option<BendableScore>,
}

impl BestRecaller {
    fn new() -> Self {
        Self {
            solution: None,
            score: None,
        }
    }

    fn offer(
        &mut self,
        candidate: &TaskAssigningSolution,
        score: &BendableScore,
        elapsed: Duration,
        step: u64,
        dispatcher: &EventDispatcher,
    ) {
        if self.score.as_ref().is_some_and(|best| score <= best) {
            return;
        }
        let snapshot = Arc::new(candidate.clone());
        debug!(score = %score, step, "New best solution");
        self.solution = Some(snapshot.clone());
        self.score = Some(score.clone());
        dispatcher.emit(SolverEvent::BestSolutionChanged {
            solution: snapshot,
            score: score.clone(),
            elapsed,
            step,
        });
    }
}

fn calculation_speed(count: u64, elapsed: Duration) -> u64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        (count as f64 / secs) as u64
    } else {
        count
    }
}

/// Runs construction once, then every configured local search phase.
///
/// # Examples
///
/// ```
/// use u_assign::model::constants::{dummy_task_assignment, planning_user};
/// use u_assign::model::{Task, TaskAssigningSolution, TaskAssignment, User};
/// use u_assign::score::DefaultConstraints;
/// use u_assign::localsearch::LocalSearchConfig;
/// use u_assign::solver::{Solver, SolverConfig};
///
/// let problem = TaskAssigningSolution::new(
///     "demo",
///     vec![planning_user(), User::new("alice", true).with_group("HR")],
///     vec![
///         TaskAssignment::new(Task::new("T1").with_potential_group("HR")),
///         TaskAssignment::new(Task::new("T2").with_potential_group("HR")),
///         dummy_task_assignment(),
///     ],
/// )
/// .unwrap();
///
/// let config = SolverConfig::default()
///     .with_seed(7)
///     .with_local_search(vec![LocalSearchConfig::default().with_max_steps(50)]);
/// let solver = Solver::new(config, DefaultConstraints::new());
/// let result = solver.solve(problem).unwrap();
/// assert!(result.best_score.is_feasible());
/// ```
pub struct Solver<C: ScoreCalculator> {
    config: SolverConfig,
    calculator: C,
    listeners: ListenerList,
    cancel: Arc<AtomicBool>,
}

impl<C: ScoreCalculator> Solver<C> {
    pub fn new(config: SolverConfig, calculator: C) -> Self {
        Self {
            config,
            calculator,
            listeners: Arc::new(Mutex::new(Vec::new())),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Registers a callback for [`SolverEvent`]s.
    ///
    /// Callbacks run on a dedicated thread; every event of a run has been
    /// delivered by the time [`Solver::solve`] returns.
    pub fn add_event_listener<F>(&self, listener: F)
    where
        F: FnMut(&SolverEvent) + Send + 'static,
    {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(listener) as EventListener);
    }

    /// Shared flag; storing `true` requests cancellation.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Requests cancellation. Observed at the next step or phase boundary.
    ///
    /// The request is sticky: a later [`Solver::solve`] on this solver stops
    /// before placing any task until [`Solver::clear_cancel`] is called. A
    /// cancel issued just before a run starts is therefore never lost.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Withdraws a cancellation request so the solver can be reused.
    pub fn clear_cancel(&self) {
        self.cancel.store(false, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Solves the problem and returns the best solution found.
    ///
    /// # Errors
    /// [`SolverError::InvalidConfig`] for a bad config,
    /// [`SolverError::StructuralViolation`] for a corrupted input chain.
    /// Infeasibility is reported through the score, not as an error.
    pub fn solve(&self, problem: TaskAssigningSolution) -> Result<SolverResult, SolverError> {
        self.config.validate().map_err(SolverError::InvalidConfig)?;
        problem.check_integrity()?;

        let started = Instant::now();
        let termination = Termination::new(
            self.config.time_limit,
            self.config.step_limit,
            Some(self.cancel.clone()),
        );
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::random()),
        };
        let pinned = problem
            .assignment_indices()
            .filter(|&a| problem.assignment(a).pinned())
            .count();
        info!(
            solution_id = %problem.id(),
            users = problem.users().len(),
            assignments = problem.assignments().len(),
            pinned,
            uninitialized = problem.uninitialized_count(),
            seed = ?self.config.seed,
            "Solving started"
        );

        let dispatcher = EventDispatcher::start(self.listeners.clone());
        let mut director = ScoreDirector::new(&self.calculator);
        let mut working = problem;
        let mut best = BestRecaller::new();

        let construction = ConstructionRunner::run_with_termination(
            &mut working,
            &mut director,
            &self.config.construction,
            &termination,
        )?;
        best.offer(
            &working,
            &construction.score,
            started.elapsed(),
            termination.steps(),
            &dispatcher,
        );
        info!(
            phase = %PhaseKind::ConstructionHeuristic,
            index = 0,
            score = %construction.score,
            steps = construction.steps,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Phase ended"
        );
        dispatcher.emit(SolverEvent::PhaseEnded {
            solution: Arc::new(working.clone()),
            phase: PhaseKind::ConstructionHeuristic,
            index: 0,
            score: construction.score.clone(),
            steps: construction.steps as u64,
            elapsed: started.elapsed(),
        });

        let mut phases = Vec::with_capacity(self.config.local_search.len());
        if !construction.cancelled {
            for (i, phase_config) in self.config.local_search.iter().enumerate() {
                if termination.is_terminated() {
                    break;
                }
                let index = i + 1;
                let phase_started = Instant::now();
                let result = LocalSearchRunner::run(
                    &mut working,
                    &mut director,
                    phase_config,
                    self.config.bailout_ceiling,
                    &mut rng,
                    &termination,
                    |solution, score, _| {
                        best.offer(
                            solution,
                            score,
                            started.elapsed(),
                            termination.steps(),
                            &dispatcher,
                        )
                    },
                )?;
                best.offer(
                    &working,
                    &result.last_score,
                    started.elapsed(),
                    termination.steps(),
                    &dispatcher,
                );
                let phase_elapsed = phase_started.elapsed();
                info!(
                    phase = %PhaseKind::LocalSearch,
                    index,
                    score = %result.best_score,
                    steps = result.steps,
                    reason = %result.reason,
                    bailouts = result.bailouts,
                    elapsed_ms = phase_elapsed.as_millis() as u64,
                    score_calculation_speed =
                        calculation_speed(result.score_calculations, phase_elapsed),
                    "Phase ended"
                );
                dispatcher.emit(SolverEvent::PhaseEnded {
                    solution: Arc::new(working.clone()),
                    phase: PhaseKind::LocalSearch,
                    index,
                    score: result.best_score.clone(),
                    steps: result.steps,
                    elapsed: started.elapsed(),
                });
                phases.push(result);
            }
        }
        dispatcher.finish();

        let best_score = best.score.unwrap_or_else(|| construction.score.clone());
        let best_solution = match best.solution {
            Some(snapshot) => Arc::try_unwrap(snapshot).unwrap_or_else(|shared| (*shared).clone()),
            None => working,
        };
        let elapsed = started.elapsed();
        let score_calculation_count = director.calculation_count();
        let result = SolverResult {
            best_solution,
            best_score,
            cancelled: termination.is_cancelled(),
            construction_steps: construction.steps,
            local_search_steps: termination.steps(),
            bailouts: phases.iter().map(|p| p.bailouts).sum(),
            phases,
            score_calculation_count,
            elapsed,
        };
        info!(
            elapsed_ms = elapsed.as_millis() as u64,
            score = %result.best_score,
            feasible = result.best_score.is_feasible(),
            steps = result.local_search_steps,
            bailouts = result.bailouts,
            cancelled = result.cancelled,
            score_calculation_speed = calculation_speed(score_calculation_count, elapsed),
            "Solving ended"
        );
        Ok(result)
    }
}
