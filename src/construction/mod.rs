//! Construction heuristic.
//!
//! A single pass over the unchained assignments in arena order. Each one is
//! tentatively inserted at every legal position of every eligible user and
//! kept where the score is best. Ties go to the lowest user index, then the
//! lowest position. Pinned assignments only serve as fixed anchors: nothing is
//! ever inserted in front of them.
//!
//! # Examples
//!
//! ```
//! use u_assign::construction::{ConstructionConfig, ConstructionRunner};
//! use u_assign::model::constants::{dummy_task_assignment, planning_user};
//! use u_assign::model::{Task, TaskAssigningSolution, TaskAssignment, User};
//! use u_assign::score::{DefaultConstraints, ScoreDirector};
//!
//! let mut solution = TaskAssigningSolution::new(
//!     "demo",
//!     vec![planning_user(), User::new("alice", true).with_group("HR")],
//!     vec![
//!         TaskAssignment::new(Task::new("review").with_potential_group("HR")),
//!         dummy_task_assignment(),
//!     ],
//! )
//! .unwrap();
//!
//! let constraints = DefaultConstraints::new();
//! let mut director = ScoreDirector::new(&constraints);
//! let result =
//!     ConstructionRunner::run(&mut solution, &mut director, &ConstructionConfig::default())
//!         .unwrap();
//! assert!(result.score.is_feasible());
//! assert_eq!(solution.uninitialized_count(), 0);
//! ```

mod config;
mod runner;

pub use config::{ConstructionConfig, PickEarly};
pub use runner::{ConstructionResult, ConstructionRunner};
