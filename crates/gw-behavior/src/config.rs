use serde::{Deserialize, Serialize};

/// Tuning of the behaviour engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Extra power multiplier while enraged (0.5 = +50%).
    pub enrage_power_bonus: f64,
    /// Search node limit for one step.
    pub path_max_iterations: usize,
    /// Smooth paths before stepping.
    pub smooth_paths: bool,
    /// Added to the flee threshold of juveniles.
    pub juvenile_flee_bonus: f64,
    /// Removed from the flee threshold of elders.
    pub elder_flee_reduction: f64,
    /// Added to every enrage threshold of elders.
    pub elder_enrage_bonus: f64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            enrage_power_bonus: 0.5,
            path_max_iterations: 500,
            smooth_paths: true,
            juvenile_flee_bonus: 0.2,
            elder_flee_reduction: 0.1,
            elder_enrage_bonus: 0.1,
        }
    }
}

impl BehaviorConfig {
    /// Set the enrage bonus.
    pub fn with_enrage_bonus(mut self, bonus: f64) -> Self {
        self.enrage_power_bonus = bonus;
        self
    }

    /// Set the search node limit.
    pub fn with_path_iterations(mut self, iterations: usize) -> Self {
        self.path_max_iterations = iterations;
        self
    }

    /// Enable or disable path smoothing.
    pub fn with_smoothing(mut self, smooth: bool) -> Self {
        self.smooth_paths = smooth;
        self
    }
}
