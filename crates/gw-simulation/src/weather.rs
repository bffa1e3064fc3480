use gw_core::WorldTick;
use gw_map::WeatherSimulationService;
use tracing::info;

use crate::config::SimConfig;
use crate::context::SimContext;
use crate::error::SimResult;
use crate::system::System;

/// Rolls every weather zone at a fixed interval.
#[derive(Debug, Clone)]
pub struct WeatherSystem {
    interval: u64,
    change_chance: f64,
    changes: u64,
}

impl WeatherSystem {
    /// Roll every `interval` ticks; 0 never rolls.
    pub fn new(interval: u64, change_chance: f64) -> Self {
        Self {
            interval,
            change_chance,
            changes: 0,
        }
    }

    /// Interval and change chance taken from `config`.
    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.weather_update_interval, config.weather_change_chance)
    }

    /// Weather changes applied so far.
    pub fn changes(&self) -> u64 {
        self.changes
    }
}

impl System for WeatherSystem {
    fn name(&self) -> &str {
        "weather"
    }

    fn is_due(&self, tick: WorldTick) -> bool {
        self.interval > 0 && tick.value() % self.interval == 0
    }

    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let tick = ctx.tick();
        for mut zone in ctx.ports.weather.find_all() {
            let before = zone.current();
            let changed = ctx
                .rng
                .with(|rng| WeatherSimulationService::update_zone(&mut zone, rng, self.change_chance, tick))?;
            if !changed {
                continue;
            }
            info!(tick = %tick, zone = %zone.id(), from = %before, to = %zone.current(), "weather changed");
            self.changes += 1;
            ctx.emit_all(zone.take_events());
            ctx.ports.weather.save(zone);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use gw_core::{EventType, SpotId, WeatherType, WeatherZoneId};
    use gw_map::{PhysicalMapAggregate, WeatherZone};

    use super::*;
    use crate::context::SharedRng;
    use crate::memory::{InMemoryStore, WorldState};

    #[test]
    fn due_only_on_interval_ticks() {
        let system = WeatherSystem::new(5, 1.0);
        assert!(!system.is_due(WorldTick(4)));
        assert!(system.is_due(WorldTick(5)));
        assert!(system.is_due(WorldTick(10)));
        assert!(!WeatherSystem::new(0, 1.0).is_due(WorldTick(5)));
    }

    #[test]
    fn certain_change_follows_the_transition_table() {
        let spot = SpotId::new(1).unwrap();
        let store = InMemoryStore::new(
            WorldState::new()
                .with_map(PhysicalMapAggregate::from_ascii(spot, &[".."]).unwrap())
                .with_weather_zone(WeatherZone::new(WeatherZoneId::new(1).unwrap(), [spot], WeatherType::Storm)),
        );
        let ports = store.ports();
        let config = SimConfig::default();
        let mut ctx = SimContext::new(&ports, &config, SharedRng::seeded(3), WorldTick(10));
        let mut system = WeatherSystem::new(10, 1.0);

        system.tick(&mut ctx).unwrap();

        // storm has a single legal successor
        assert_eq!(ports.weather_at(spot), Some(WeatherType::Rain));
        assert_eq!(system.changes(), 1);
        let events = ctx.take_pending();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), EventType::WeatherChanged);
    }
}
