//! Solver-wide stop conditions.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Global budget shared by every phase of one solving run.
///
/// Polled at step and phase boundaries only; a cancel request never
/// interrupts a tentative move.
#[derive(Debug)]
pub struct Termination {
    start: Instant,
    time_limit: Option<Duration>,
    step_limit: Option<u64>,
    cancel: Option<Arc<AtomicBool>>,
    steps: AtomicU64,
}

impl Termination {
    pub fn new(
        time_limit: Option<Duration>,
        step_limit: Option<u64>,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            start: Instant::now(),
            time_limit,
            step_limit,
            cancel,
            steps: AtomicU64::new(0),
        }
    }

    /// A budget that only stops on cancellation.
    pub fn unlimited() -> Self {
        Self::new(None, None, None)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Whether any global limit is reached.
    pub fn is_terminated(&self) -> bool {
        if self.is_cancelled() {
            return true;
        }
        if let Some(limit) = self.step_limit {
            if self.steps() >= limit {
                return true;
            }
        }
        self.time_limit.is_some_and(|limit| self.elapsed() >= limit)
    }

    pub fn is_time_exhausted(&self) -> bool {
        self.time_limit.is_some_and(|limit| self.elapsed() >= limit)
    }

    pub fn record_step(&self) {
        self.steps.fetch_add(1, Ordering::Relaxed);
    }

    /// Steps taken across all phases.
    pub fn steps(&self) -> u64 {
        self.steps.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
