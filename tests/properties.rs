//! Solver-level guarantees: pins hold, notifications only improve, endless
//! selection always terminates, and seeded runs are reproducible.

use std::io;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use u_assign::construction::{ConstructionConfig, ConstructionRunner};
use u_assign::localsearch::{AcceptorConfig, LocalSearchConfig};
use u_assign::model::constants::{dummy_task_assignment, planning_user};
use u_assign::model::{
    AssignmentIdx, ChainElement, Task, TaskAssigningSolution, TaskAssignment, User, UserIdx,
};
use u_assign::score::{BendableScore, DefaultConstraints, ScoreDirector};
use u_assign::selector::{BailoutGuard, EntityFilter, EntitySelector, DEFAULT_BAILOUT_CEILING};
use u_assign::solver::{Solver, SolverConfig, SolverEvent};

/// Four users over two groups, each with a pinned prefix, plus twelve free
/// tasks with mixed priorities, skills and affinities.
fn problem() -> TaskAssigningSolution {
    let users = vec![
        planning_user(),
        User::new("ann", true).with_group("HR").with_skill("english"),
        User::new("ben", true).with_group("HR").with_affinity("payroll"),
        User::new("cid", true).with_group("IT").with_skill("english"),
        User::new("dee", false).with_group("IT"),
    ];
    let mut assignments = vec![
        TaskAssignment::new(Task::new("P0").with_potential_group("HR"))
            .with_pinned(true)
            .with_previous(ChainElement::User(UserIdx(1))),
        TaskAssignment::new(Task::new("P1").with_potential_group("HR"))
            .with_pinned(true)
            .with_previous(ChainElement::Assignment(AssignmentIdx(0))),
        TaskAssignment::new(Task::new("P2").with_potential_group("IT"))
            .with_pinned(true)
            .with_previous(ChainElement::User(UserIdx(3))),
        dummy_task_assignment(),
    ];
    for i in 0..12 {
        let group = if i % 3 == 0 { "IT" } else { "HR" };
        let mut task = Task::new(format!("T{i}"))
            .with_potential_group(group)
            .with_priority((i * 7) % 11)
            .with_duration_minutes(1 + i64::from(i % 4));
        if i % 5 == 0 {
            task = task.with_required_skill("english");
        }
        if i % 4 == 1 {
            task = task.with_affinity("payroll");
        }
        assignments.push(TaskAssignment::new(task));
    }
    TaskAssigningSolution::new("properties", users, assignments).unwrap()
}

fn config(seed: u64) -> SolverConfig {
    SolverConfig::default().with_seed(seed).with_local_search(vec![
        LocalSearchConfig::default().with_max_steps(300),
        LocalSearchConfig::default()
            .with_acceptor(AcceptorConfig::SimulatedAnnealing {
                initial_temperature: 5.0,
                cooling_rate: 0.99,
            })
            .with_max_steps(200),
    ])
}

fn pinned(solution: &TaskAssigningSolution) -> Vec<AssignmentIdx> {
    solution
        .assignment_indices()
        .filter(|&a| solution.assignment(a).pinned())
        .collect()
}

#[test]
fn pinned_links_never_change() {
    let before = problem();
    let result = Solver::new(config(11), DefaultConstraints::new())
        .solve(before.clone())
        .unwrap();
    let after = &result.best_solution;

    for p in pinned(&before) {
        assert_eq!(after.previous(p), before.previous(p), "predecessor of {p}");
        assert_eq!(after.user_of(p), before.user_of(p), "owner of {p}");
    }
    after.check_integrity().unwrap();
}

#[test]
fn local_search_keeps_both_links_of_pinned_assignments() {
    // Construction may append after a pinned tail; from then on local search
    // must leave both neighbours of every pinned assignment in place.
    let calculator = DefaultConstraints::new();
    let mut constructed = problem();
    let mut director = ScoreDirector::new(&calculator);
    ConstructionRunner::run(&mut constructed, &mut director, &ConstructionConfig::default())
        .unwrap();

    let config = SolverConfig::default().with_seed(17).with_local_search(vec![
        LocalSearchConfig::default().with_max_steps(400),
        LocalSearchConfig::default()
            .with_acceptor(AcceptorConfig::HillClimbing)
            .with_max_steps(100),
    ]);
    let result = Solver::new(config, DefaultConstraints::new())
        .solve(constructed.clone())
        .unwrap();
    let after = &result.best_solution;

    for p in pinned(&constructed) {
        assert_eq!(after.previous(p), constructed.previous(p), "predecessor of {p}");
        assert_eq!(after.next(p), constructed.next(p), "successor of {p}");
    }
}

#[test]
fn free_successor_of_pinned_head_is_not_detached() {
    // u1 -> P (pinned) -> F1 -> F2 -> F3
    let users = vec![
        planning_user(),
        User::new("u1", true).with_group("HR"),
        User::new("u2", true).with_group("HR"),
    ];
    let mut assignments = vec![TaskAssignment::new(Task::new("P").with_potential_group("HR"))
        .with_pinned(true)
        .with_previous(ChainElement::User(UserIdx(1)))];
    for i in 1..=3 {
        assignments.push(
            TaskAssignment::new(Task::new(format!("F{i}")).with_potential_group("HR"))
                .with_previous(ChainElement::Assignment(AssignmentIdx(i - 1))),
        );
    }
    assignments.push(dummy_task_assignment());
    let problem = TaskAssigningSolution::new("pinned-head", users, assignments).unwrap();
    let p = problem.find_task("P").unwrap();
    let f1 = problem.find_task("F1").unwrap();

    let config = SolverConfig::default()
        .with_seed(1)
        .with_local_search(vec![LocalSearchConfig::default().with_max_steps(300)]);
    let result = Solver::new(config, DefaultConstraints::new())
        .solve(problem)
        .unwrap();
    let best = &result.best_solution;

    assert_eq!(best.previous(p), Some(ChainElement::User(UserIdx(1))));
    assert_eq!(best.next(p), Some(f1));
    best.check_integrity().unwrap();
}

#[test]
fn notified_scores_strictly_improve() {
    let solver = Solver::new(config(5), DefaultConstraints::new());
    let scores: Arc<Mutex<Vec<BendableScore>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = scores.clone();
    solver.add_event_listener(move |event| {
        if let SolverEvent::BestSolutionChanged { solution, score, .. } = event {
            assert_eq!(solution.score(), Some(score));
            sink.lock().unwrap().push(score.clone());
        }
    });
    let result = solver.solve(problem()).unwrap();

    let scores = scores.lock().unwrap();
    assert!(scores.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(scores.last(), Some(&result.best_score));
    assert!(result.best_score.is_solution_initialized());
}

#[test]
fn seeded_runs_are_identical() {
    let run = |seed: u64| {
        let solver = Solver::new(config(seed), DefaultConstraints::new());
        let trail = Arc::new(Mutex::new(Vec::new()));
        let sink = trail.clone();
        solver.add_event_listener(move |event| {
            if let SolverEvent::BestSolutionChanged { score, step, .. } = event {
                sink.lock().unwrap().push((score.clone(), *step));
            }
        });
        let result = solver.solve(problem()).unwrap();
        let trail = trail.lock().unwrap().clone();
        (result.best_solution, result.local_search_steps, trail)
    };

    let first = run(42);
    let second = run(42);
    assert_eq!(first.0, second.0);
    assert_eq!(first.1, second.1);
    assert_eq!(first.2, second.2);
}

#[derive(Clone)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn empty_filter_bails_out_within_ceiling() {
    let logs = Arc::new(Mutex::new(Vec::new()));
    let writer = Capture(logs.clone());
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();

    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        tracing::subscriber::with_default(subscriber, || {
            let solution = problem();
            let selector = EntitySelector::endless()
                .with_filter(EntityFilter::Custom(|_, _| false));
            let mut guard = BailoutGuard::new(DEFAULT_BAILOUT_CEILING);
            let mut rng = StdRng::seed_from_u64(0);
            let selection = selector.select(&solution, &mut rng, &mut guard);
            let _ = tx.send((selection.is_exhausted(), guard.attempts()));
        });
    });

    let (exhausted, attempts) = rx
        .recv_timeout(Duration::from_secs(30))
        .expect("selection must terminate");
    assert!(exhausted);
    assert_eq!(attempts, DEFAULT_BAILOUT_CEILING);

    let text = String::from_utf8(logs.lock().unwrap().clone()).unwrap();
    assert!(text.contains("Bailing out of endless selector"), "{text}");
}

#[test]
fn all_pinned_problem_stops_each_phase_on_bailout() {
    let users = vec![planning_user(), User::new("u1", true), User::new("u2", true)];
    let assignments = vec![
        TaskAssignment::new(Task::new("A").with_potential_user("u1"))
            .with_pinned(true)
            .with_previous(ChainElement::User(UserIdx(1))),
        TaskAssignment::new(Task::new("B").with_potential_user("u2"))
            .with_pinned(true)
            .with_previous(ChainElement::User(UserIdx(2))),
        dummy_task_assignment().with_previous(ChainElement::User(UserIdx(0))),
    ];
    let problem = TaskAssigningSolution::new("frozen", users, assignments).unwrap();
    let config = SolverConfig::default()
        .with_seed(3)
        .with_bailout_ceiling(500)
        .with_local_search(vec![LocalSearchConfig::default(), LocalSearchConfig::default()]);

    let result = Solver::new(config, DefaultConstraints::new())
        .solve(problem.clone())
        .unwrap();
    assert_eq!(result.bailouts, 2);
    assert_eq!(result.local_search_steps, 0);
    for a in problem.assignment_indices() {
        assert_eq!(result.best_solution.previous(a), problem.previous(a));
    }
}
