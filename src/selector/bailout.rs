//! Termination guard for endless selection.

use tracing::warn;

/// Default number of consecutive rejections before an endless selector
/// gives up for the current step.
pub const DEFAULT_BAILOUT_CEILING: usize = 10_000;

/// Outcome of a selection call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<T> {
    /// A candidate passing every filter.
    Candidate(T),
    /// The guard ceiling was reached; no further candidates this step.
    Exhausted,
}

impl<T> Selection<T> {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Selection::Exhausted)
    }

    pub fn candidate(self) -> Option<T> {
        match self {
            Selection::Candidate(c) => Some(c),
            Selection::Exhausted => None,
        }
    }
}

/// Counts consecutive rejected samples against a fixed ceiling.
///
/// One guard lives for one local search step and is threaded through every
/// selection call of that step. Filtered-out samples and candidates found
/// unusable downstream both count; only a candidate that was actually
/// applied resets the count (see [`BailoutGuard::record_success`]). Once
/// exhausted, the guard stays exhausted.
#[derive(Debug, Clone)]
pub struct BailoutGuard {
    attempts: usize,
    ceiling: usize,
    bailed_out: bool,
}

impl BailoutGuard {
    pub fn new(ceiling: usize) -> Self {
        Self {
            attempts: 0,
            ceiling,
            bailed_out: false,
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    pub fn record_rejection(&mut self) {
        self.attempts += 1;
    }

    /// Resets the consecutive count after a candidate was applied.
    pub fn record_success(&mut self) {
        if !self.bailed_out {
            self.attempts = 0;
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.bailed_out || self.attempts >= self.ceiling
    }

    /// Whether this guard has already bailed out.
    pub fn bailed_out(&self) -> bool {
        self.bailed_out
    }

    /// Marks the guard exhausted and logs the bailout once.
    pub fn bail_out<T>(&mut self, selector: &dyn std::fmt::Display) -> Selection<T> {
        if !self.bailed_out {
            self.bailed_out = true;
            warn!(
                selector = %selector,
                attempts = self.attempts,
                ceiling = self.ceiling,
                "Bailing out of endless selector to avoid infinite loop"
            );
        }
        Selection::Exhausted
    }
}
