//! Construction heuristic configuration.

/// When the position scan for one task may stop before every position has
/// been scored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PickEarly {
    /// Score every legal position and keep the best.
    #[default]
    Never,
    /// Take the first position whose score, init level aside, is not worse
    /// than before the insertion.
    FirstNonDeteriorating,
}

/// Configuration for the construction heuristic.
///
/// # Examples
///
/// ```
/// use u_assign::construction::{ConstructionConfig, PickEarly};
///
/// let config = ConstructionConfig::default()
///     .with_hard_filtering(false)
///     .with_pick_early(PickEarly::FirstNonDeteriorating)
///     .with_parallel(true);
/// assert!(!config.hard_filtering);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstructionConfig {
    /// Skip users that are not potential owners of the task or lack one of
    /// its required skills. The planning user is always eligible.
    pub hard_filtering: bool,

    /// Early pick policy.
    pub pick_early: PickEarly,

    /// Score the positions of different users on the rayon pool.
    pub parallel: bool,
}

impl Default for ConstructionConfig {
    fn default() -> Self {
        Self {
            hard_filtering: true,
            pick_early: PickEarly::Never,
            parallel: false,
        }
    }
}

impl ConstructionConfig {
    pub fn with_hard_filtering(mut self, enabled: bool) -> Self {
        self.hard_filtering = enabled;
        self
    }

    pub fn with_pick_early(mut self, pick_early: PickEarly) -> Self {
        self.pick_early = pick_early;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Validates the configuration.
    ///
    /// Every combination of settings is currently valid.
    pub fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}
