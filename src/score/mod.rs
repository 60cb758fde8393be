//! Scoring: the bendable score, the evaluator contract and the default
//! task-assigning constraints.

mod bendable;
mod calculator;
pub mod constraints;

pub use bendable::BendableScore;
pub use calculator::{FnScoreCalculator, ScoreCalculator, ScoreDirector};
pub use constraints::DefaultConstraints;
