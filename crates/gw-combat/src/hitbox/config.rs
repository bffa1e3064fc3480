use serde::{Deserialize, Serialize};

use super::aggregate::HitBoxAggregate;
use crate::error::{CombatError, CombatResult};

/// Tuning of the hit box simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitBoxConfig {
    /// Substeps for hit boxes between the two speed thresholds.
    pub substeps_per_tick: u32,
    /// Speeds below this use `low_speed_substeps`.
    pub low_speed_threshold: f64,
    /// Speeds above this use `high_speed_substeps`.
    pub high_speed_threshold: f64,
    /// Substeps for slow hit boxes.
    pub low_speed_substeps: u32,
    /// Substeps for fast hit boxes.
    pub high_speed_substeps: u32,
    /// Tile and object checks allowed per tick across all hit boxes of all maps.
    pub max_collision_checks_per_tick: u32,
}

impl Default for HitBoxConfig {
    fn default() -> Self {
        Self {
            substeps_per_tick: 2,
            low_speed_threshold: 1.0,
            high_speed_threshold: 2.0,
            low_speed_substeps: 1,
            high_speed_substeps: 4,
            max_collision_checks_per_tick: 5_000,
        }
    }
}

impl HitBoxConfig {
    /// Set the collision budget.
    pub fn with_max_checks(mut self, checks: u32) -> Self {
        self.max_collision_checks_per_tick = checks;
        self
    }

    /// Set the speed thresholds.
    pub fn with_thresholds(mut self, low: f64, high: f64) -> Self {
        self.low_speed_threshold = low;
        self.high_speed_threshold = high;
        self
    }

    /// Set the substep counts of the three bands.
    pub fn with_substeps(mut self, low: u32, mid: u32, high: u32) -> Self {
        self.low_speed_substeps = low;
        self.substeps_per_tick = mid;
        self.high_speed_substeps = high;
        self
    }
}

/// Validated [`HitBoxConfig`] with substep selection.
#[derive(Debug, Clone, PartialEq)]
pub struct HitBoxConfigService {
    config: HitBoxConfig,
}

impl HitBoxConfigService {
    /// Validate a config: thresholds ordered, bands monotonic, every count at least 1.
    pub fn new(config: HitBoxConfig) -> CombatResult<Self> {
        let c = &config;
        if c.low_speed_substeps == 0 || c.substeps_per_tick == 0 || c.high_speed_substeps == 0 {
            return Err(CombatError::InvalidConfig("substep counts must be at least 1".into()));
        }
        if !(c.low_speed_substeps <= c.substeps_per_tick && c.substeps_per_tick <= c.high_speed_substeps) {
            return Err(CombatError::InvalidConfig(format!(
                "substep bands must not decrease: {} / {} / {}",
                c.low_speed_substeps, c.substeps_per_tick, c.high_speed_substeps
            )));
        }
        if !(c.low_speed_threshold.is_finite()
            && c.high_speed_threshold.is_finite()
            && 0.0 <= c.low_speed_threshold
            && c.low_speed_threshold <= c.high_speed_threshold)
        {
            return Err(CombatError::InvalidConfig(format!(
                "speed thresholds out of order: {} > {}",
                c.low_speed_threshold, c.high_speed_threshold
            )));
        }
        if c.max_collision_checks_per_tick == 0 {
            return Err(CombatError::InvalidConfig("collision budget must be at least 1".into()));
        }
        Ok(Self { config })
    }

    /// The validated config.
    pub fn config(&self) -> &HitBoxConfig {
        &self.config
    }

    /// Substeps for a given speed (largest absolute velocity component).
    pub fn substeps_for_speed(&self, speed: f64) -> u32 {
        let c = &self.config;
        if speed < c.low_speed_threshold {
            c.low_speed_substeps
        } else if speed > c.high_speed_threshold {
            c.high_speed_substeps
        } else {
            c.substeps_per_tick
        }
    }

    /// Substeps for a hit box, chosen by its velocity band.
    pub fn get_substeps_for_hit_box(&self, hit_box: &HitBoxAggregate) -> u32 {
        self.substeps_for_speed(hit_box.velocity().magnitude())
    }

    /// Checks allowed per tick.
    pub fn max_collision_checks_per_tick(&self) -> u32 {
        self.config.max_collision_checks_per_tick
    }
}
