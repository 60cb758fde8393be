//! Candidate selection for local search.
//!
//! Selectors sample entities and moves from the live solution. Endless
//! selection is bounded by a [`BailoutGuard`] threaded through every call:
//! once the guard's ceiling of consecutive rejections is reached the call
//! returns [`Selection::Exhausted`] and the step contributes no move.
//!
//! # Examples
//!
//! ```
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use u_assign::model::constants::{dummy_task_assignment, planning_user};
//! use u_assign::model::TaskAssigningSolution;
//! use u_assign::selector::{BailoutGuard, MoveSelector, MoveWeights};
//!
//! // Nothing but the dummy: every sample is rejected.
//! let solution = TaskAssigningSolution::new(
//!     "empty",
//!     vec![planning_user()],
//!     vec![dummy_task_assignment()],
//! )
//! .unwrap();
//! let selector = MoveSelector::new(MoveWeights::default(), 3);
//! let mut guard = BailoutGuard::new(100);
//! let mut rng = StdRng::seed_from_u64(42);
//! assert!(selector.next_move(&solution, &mut rng, &mut guard).is_exhausted());
//! ```

mod bailout;
mod entity;
mod move_selector;
mod moves;

pub use bailout::{BailoutGuard, Selection, DEFAULT_BAILOUT_CEILING};
pub use entity::{EntityFilter, EntitySelector, SelectionMode};
pub use move_selector::{MoveSelector, MoveWeights};
pub use moves::ChainMove;
