//! Solver configuration.

use std::time::Duration;

use crate::construction::ConstructionConfig;
use crate::localsearch::LocalSearchConfig;
use crate::selector::DEFAULT_BAILOUT_CEILING;

/// Configuration of a whole solving run: one construction pass followed by
/// the local search phases in order.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_assign::localsearch::{AcceptorConfig, LocalSearchConfig};
/// use u_assign::solver::SolverConfig;
///
/// let config = SolverConfig::default()
///     .with_seed(42)
///     .with_time_limit(Duration::from_secs(30))
///     .with_bailout_ceiling(5_000)
///     .with_local_search(vec![
///         LocalSearchConfig::default().with_acceptor(AcceptorConfig::HillClimbing),
///     ]);
/// assert_eq!(config.seed, Some(42));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverConfig {
    /// Random seed. Identical seed and input give identical runs.
    pub seed: Option<u64>,

    /// Stop after this duration.
    pub time_limit: Option<Duration>,

    /// Stop after this many local search steps, over all phases.
    pub step_limit: Option<u64>,

    /// Consecutive rejected samples before an endless selector bails out of
    /// the current step.
    pub bailout_ceiling: usize,

    /// Construction heuristic settings.
    pub construction: ConstructionConfig,

    /// Local search phases, run in order.
    pub local_search: Vec<LocalSearchConfig>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            seed: None,
            time_limit: None,
            step_limit: None,
            bailout_ceiling: DEFAULT_BAILOUT_CEILING,
            construction: ConstructionConfig::default(),
            local_search: vec![LocalSearchConfig::default()],
        }
    }
}

impl SolverConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }

    pub fn with_bailout_ceiling(mut self, ceiling: usize) -> Self {
        self.bailout_ceiling = ceiling;
        self
    }

    pub fn with_construction(mut self, construction: ConstructionConfig) -> Self {
        self.construction = construction;
        self
    }

    pub fn with_local_search(mut self, phases: Vec<LocalSearchConfig>) -> Self {
        self.local_search = phases;
        self
    }

    /// Appends one local search phase.
    pub fn with_local_search_phase(mut self, phase: LocalSearchConfig) -> Self {
        self.local_search.push(phase);
        self
    }

    /// Validates the configuration and every phase config.
    pub fn validate(&self) -> Result<(), String> {
        if self.bailout_ceiling == 0 {
            return Err("bailout_ceiling must be at least 1".into());
        }
        self.construction
            .validate()
            .map_err(|e| format!("construction: {e}"))?;
        for (i, phase) in self.local_search.iter().enumerate() {
            phase
                .validate()
                .map_err(|e| format!("local search phase {i}: {e}"))?;
        }
        Ok(())
    }
}
