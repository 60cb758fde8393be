//! Solver orchestration: phase sequencing, best solution tracking,
//! termination and progress events.

mod config;
mod event;
mod runner;
mod termination;

pub use config::SolverConfig;
pub use event::{EventListener, PhaseKind, SolverEvent};
pub use runner::{Solver, SolverResult};
pub use termination::Termination;
