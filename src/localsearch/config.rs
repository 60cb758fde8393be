//! Local search configuration and acceptance policies.

use std::time::Duration;

use crate::selector::MoveWeights;

/// Acceptance policy deciding which evaluated moves may be picked.
///
/// # References
///
/// - Late acceptance: Burke & Bykov (2017)
/// - Simulated annealing: Kirkpatrick et al. (1983)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AcceptorConfig {
    /// Accepts a move whose score is not worse than the last step's.
    HillClimbing,

    /// Also accepts a move not worse than the step score `size` steps ago.
    ///
    /// Typical `size`: 400 for task assignment.
    LateAcceptance {
        /// History length.
        size: usize,
    },

    /// Tolerates soft deterioration with probability `exp(diff / T)`.
    ///
    /// Only the first differing soft level counts; moves worsening the init
    /// or any hard level are never tolerated. `T` is multiplied by
    /// `cooling_rate` after every step.
    SimulatedAnnealing {
        /// Starting temperature, in soft score units.
        initial_temperature: f64,
        /// Cooling factor in (0, 1).
        cooling_rate: f64,
    },
}

impl Default for AcceptorConfig {
    fn default() -> Self {
        AcceptorConfig::LateAcceptance { size: 400 }
    }
}

/// Configuration for one local search phase.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_assign::localsearch::{AcceptorConfig, LocalSearchConfig};
///
/// let config = LocalSearchConfig::default()
///     .with_acceptor(AcceptorConfig::HillClimbing)
///     .with_max_steps(5_000)
///     .with_unimproved_step_limit(500)
///     .with_time_limit(Duration::from_secs(2));
/// assert_eq!(config.max_steps, 5_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocalSearchConfig {
    /// Acceptance policy.
    pub acceptor: AcceptorConfig,

    /// Accepted moves gathered per step before the best one is picked.
    pub accepted_count_limit: usize,

    /// Upper bound on moves evaluated per step.
    pub max_moves_per_step: usize,

    /// Phase step budget. 0 = no limit.
    pub max_steps: u64,

    /// Phase time budget.
    pub time_limit: Option<Duration>,

    /// Consecutive steps without a new phase best before stopping.
    /// 0 = no limit.
    pub unimproved_step_limit: u64,

    /// Relative frequency of each move kind.
    pub move_weights: MoveWeights,

    /// Longest segment moved or reversed by a single move.
    pub max_subchain_len: usize,
}

impl Default for LocalSearchConfig {
    fn default() -> Self {
        Self {
            acceptor: AcceptorConfig::default(),
            accepted_count_limit: 1,
            max_moves_per_step: 100,
            max_steps: 0,
            time_limit: None,
            unimproved_step_limit: 1000,
            move_weights: MoveWeights::default(),
            max_subchain_len: 3,
        }
    }
}

impl LocalSearchConfig {
    pub fn with_acceptor(mut self, acceptor: AcceptorConfig) -> Self {
        self.acceptor = acceptor;
        self
    }

    pub fn with_accepted_count_limit(mut self, n: usize) -> Self {
        self.accepted_count_limit = n;
        self
    }

    pub fn with_max_moves_per_step(mut self, n: usize) -> Self {
        self.max_moves_per_step = n;
        self
    }

    pub fn with_max_steps(mut self, n: u64) -> Self {
        self.max_steps = n;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_unimproved_step_limit(mut self, n: u64) -> Self {
        self.unimproved_step_limit = n;
        self
    }

    pub fn with_move_weights(mut self, weights: MoveWeights) -> Self {
        self.move_weights = weights;
        self
    }

    pub fn with_max_subchain_len(mut self, n: usize) -> Self {
        self.max_subchain_len = n;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.accepted_count_limit == 0 {
            return Err("accepted_count_limit must be at least 1".into());
        }
        if self.max_moves_per_step == 0 {
            return Err("max_moves_per_step must be at least 1".into());
        }
        if self.max_subchain_len < 2 {
            return Err(format!(
                "max_subchain_len must be at least 2, got {}",
                self.max_subchain_len
            ));
        }
        self.move_weights.validate()?;
        match self.acceptor {
            AcceptorConfig::HillClimbing => {}
            AcceptorConfig::LateAcceptance { size } => {
                if size == 0 {
                    return Err("late acceptance size must be at least 1".into());
                }
            }
            AcceptorConfig::SimulatedAnnealing {
                initial_temperature,
                cooling_rate,
            } => {
                if initial_temperature <= 0.0 {
                    return Err(format!(
                        "initial_temperature must be positive, got {initial_temperature}"
                    ));
                }
                if cooling_rate <= 0.0 || cooling_rate >= 1.0 {
                    return Err(format!("cooling_rate must be in (0, 1), got {cooling_rate}"));
                }
            }
        }
        Ok(())
    }
}
