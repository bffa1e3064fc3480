use gw_behavior::BehaviorConfig;
use gw_combat::{AggroMemoryPolicy, HitBoxConfig};
use serde::{Deserialize, Serialize};

/// Configuration for a simulation run.
///
/// Every field has a default, so a JSON file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed for deterministic simulation.
    pub seed: u64,
    /// Maximum event log size (oldest events dropped when exceeded). 0 = unlimited.
    pub max_events: usize,
    /// Substeps and collision budget of hit boxes.
    pub hit_box: HitBoxConfig,
    /// Behaviour engine tuning.
    pub behavior: BehaviorConfig,
    /// How long monsters remember who hurt them.
    pub aggro_memory: AggroMemoryPolicy,
    /// Ticks between two weather rolls. 0 disables weather changes.
    pub weather_update_interval: u64,
    /// Chance that a weather roll changes the weather.
    pub weather_change_chance: f64,
    /// Whether spawn tables repopulate maps.
    pub spawn_enabled: bool,
    /// Mana every living monster regains per tick.
    pub mp_regen_per_tick: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_events: 0,
            hit_box: HitBoxConfig::default(),
            behavior: BehaviorConfig::default(),
            aggro_memory: AggroMemoryPolicy::default(),
            weather_update_interval: 10,
            weather_change_chance: 0.3,
            spawn_enabled: true,
            mp_regen_per_tick: 1,
        }
    }
}

impl SimConfig {
    /// Set the RNG seed for deterministic simulation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the maximum event log size (0 = unlimited).
    pub fn with_max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }

    /// Replace the hit box tuning.
    pub fn with_hit_box(mut self, hit_box: HitBoxConfig) -> Self {
        self.hit_box = hit_box;
        self
    }

    /// Replace the behaviour tuning.
    pub fn with_behavior(mut self, behavior: BehaviorConfig) -> Self {
        self.behavior = behavior;
        self
    }

    /// Set the aggro memory policy.
    pub fn with_aggro_memory(mut self, policy: AggroMemoryPolicy) -> Self {
        self.aggro_memory = policy;
        self
    }

    /// Set the weather roll interval and change chance.
    pub fn with_weather(mut self, interval: u64, change_chance: f64) -> Self {
        self.weather_update_interval = interval;
        self.weather_change_chance = change_chance;
        self
    }

    /// Enable or disable spawning.
    pub fn with_spawning(mut self, enabled: bool) -> Self {
        self.spawn_enabled = enabled;
        self
    }
}
