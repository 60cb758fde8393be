//! Local search phase.
//!
//! Each step draws moves from an endless [`MoveSelector`](crate::selector::MoveSelector),
//! evaluates them tentatively against an acceptance policy and applies the
//! best accepted one. A step whose selector bails out without producing a
//! single move ends the phase.

mod acceptor;
mod config;
mod runner;

pub use config::{AcceptorConfig, LocalSearchConfig};
pub use runner::{LocalSearchResult, LocalSearchRunner, PhaseState, TerminationReason};
