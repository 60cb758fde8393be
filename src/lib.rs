//! Chained task-assignment optimization engine.
//!
//! Tasks are distributed over users so that each user's tasks form an
//! ordered chain. The engine keeps every chain a simple linked list, never
//! moves pinned assignments, and searches in two stages:
//!
//! - **Construction Heuristic**: a single cheapest-insertion pass that
//!   chains every unassigned task.
//! - **Local Search**: iterative improvement through change, sub-chain
//!   change, swap and reverse moves, accepted by hill climbing, late
//!   acceptance or simulated annealing.
//!
//! Candidate selection over filtered spaces is bounded by a bailout guard:
//! when almost nothing is movable the selector gives up on the step instead
//! of spinning, so a run always terminates.
//!
//! # Architecture
//!
//! - [`model`]: users, tasks, assignments, the solution arena and its
//!   invariant-preserving chain mutators.
//! - [`score`]: the bendable score, the [`score::ScoreCalculator`] contract
//!   and the default rule set.
//! - [`selector`]: entity and move selection with the bailout guard.
//! - [`construction`], [`localsearch`]: the two phases.
//! - [`solver`]: phase sequencing, best solution tracking, events and
//!   cancellation.
//!
//! # Example
//!
//! ```
//! use u_assign::model::constants::{dummy_task_assignment, planning_user};
//! use u_assign::model::{ChainElement, Task, TaskAssigningSolution, TaskAssignment, User, UserIdx};
//! use u_assign::score::DefaultConstraints;
//! use u_assign::localsearch::LocalSearchConfig;
//! use u_assign::solver::{Solver, SolverConfig};
//!
//! let users = vec![
//!     planning_user(),
//!     User::new("alice", true).with_group("HR"),
//!     User::new("bob", true).with_group("IT"),
//! ];
//! let assignments = vec![
//!     // Already being worked on by alice.
//!     TaskAssignment::new(Task::new("onboarding").with_potential_group("HR"))
//!         .with_pinned(true)
//!         .with_previous(ChainElement::User(UserIdx(1))),
//!     TaskAssignment::new(Task::new("payroll").with_potential_group("HR")),
//!     TaskAssignment::new(Task::new("laptop").with_potential_group("IT")),
//!     dummy_task_assignment(),
//! ];
//! let problem = TaskAssigningSolution::new("example", users, assignments).unwrap();
//!
//! let config = SolverConfig::default()
//!     .with_seed(1)
//!     .with_local_search(vec![LocalSearchConfig::default().with_max_steps(100)]);
//! let result = Solver::new(config, DefaultConstraints::new())
//!     .solve(problem)
//!     .unwrap();
//!
//! assert!(result.best_score.is_feasible());
//! let best = &result.best_solution;
//! let laptop = best.find_task("laptop").unwrap();
//! assert_eq!(best.user(best.user_of(laptop).unwrap()).id, "bob");
//! ```

pub mod construction;
pub mod error;
pub mod localsearch;
pub mod model;
pub mod score;
pub mod selector;
pub mod solver;

pub use error::SolverError;
