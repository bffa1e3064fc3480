//! Weather zones and their transition rules.
//!
//! Weather moves along a fixed transition table; a zone can only jump to a
//! state outside the table when the change is forced.

use std::collections::BTreeSet;

use gw_core::{SpotId, WeatherType, WeatherZoneId, WorldEventKind, WorldTick};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{MapError, MapResult};

/// A region of one or more spots sharing weather.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherZone {
    id: WeatherZoneId,
    spot_ids: BTreeSet<SpotId>,
    current: WeatherType,
    intensity: f64,
    changed_at: WorldTick,
    #[serde(skip)]
    events: Vec<WorldEventKind>,
}

impl WeatherZone {
    /// A zone starting in `current` at full intensity.
    pub fn new(id: WeatherZoneId, spot_ids: impl IntoIterator<Item = SpotId>, current: WeatherType) -> Self {
        Self {
            id,
            spot_ids: spot_ids.into_iter().collect(),
            current,
            intensity: 1.0,
            changed_at: WorldTick::ZERO,
            events: Vec::new(),
        }
    }

    /// Identity.
    pub fn id(&self) -> WeatherZoneId {
        self.id
    }

    /// Current weather.
    pub fn current(&self) -> WeatherType {
        self.current
    }

    /// Strength of the current weather, `0.0..=1.0`.
    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    /// Tick of the last change.
    pub fn changed_at(&self) -> WorldTick {
        self.changed_at
    }

    /// Whether the zone covers `spot_id`.
    pub fn covers(&self, spot_id: SpotId) -> bool {
        self.spot_ids.contains(&spot_id)
    }

    /// Spots in the zone.
    pub fn spot_ids(&self) -> impl Iterator<Item = SpotId> + '_ {
        self.spot_ids.iter().copied()
    }

    /// Change the weather.
    ///
    /// Unforced changes must follow the transition table. Changing to the
    /// current type does nothing.
    pub fn change_weather(&mut self, target: WeatherType, force: bool, tick: WorldTick) -> MapResult<()> {
        if target == self.current {
            return Ok(());
        }
        if !force && !WeatherSimulationService::can_transition(self.current, target) {
            return Err(MapError::InvalidWeatherTransition {
                from: self.current,
                to: target,
            });
        }
        let from = self.current;
        self.current = target;
        self.changed_at = tick;
        self.events.push(WorldEventKind::WeatherChanged {
            zone_id: self.id,
            from,
            to: target,
            forced: force,
        });
        Ok(())
    }

    /// Set intensity, clamped into `0.0..=1.0`.
    pub fn set_intensity(&mut self, intensity: f64) {
        self.intensity = intensity.clamp(0.0, 1.0);
    }

    /// Hand over pending events.
    pub fn take_events(&mut self) -> Vec<WorldEventKind> {
        std::mem::take(&mut self.events)
    }
}

/// The weather transition table and random weather evolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeatherSimulationService;

impl WeatherSimulationService {
    /// States reachable from `current` without forcing.
    pub fn get_possible_transitions(current: WeatherType) -> &'static [WeatherType] {
        use WeatherType::*;
        match current {
            Clear => &[Cloudy, Fog],
            Cloudy => &[Clear, Rain, Fog, Snow],
            Rain => &[Cloudy, Storm],
            Storm => &[Rain],
            Fog => &[Clear, Cloudy],
            Snow => &[Cloudy, Blizzard],
            Blizzard => &[Snow],
        }
    }

    /// Whether `to` is directly reachable from `from`.
    pub fn can_transition(from: WeatherType, to: WeatherType) -> bool {
        Self::get_possible_transitions(from).contains(&to)
    }

    /// Roll the next weather: with probability `change_chance` pick a uniformly
    /// random legal successor, otherwise stay.
    pub fn roll_next<R: Rng + ?Sized>(current: WeatherType, rng: &mut R, change_chance: f64) -> WeatherType {
        if !rng.random_bool(change_chance.clamp(0.0, 1.0)) {
            return current;
        }
        let options = Self::get_possible_transitions(current);
        options[rng.random_range(0..options.len())]
    }

    /// Roll and apply one update to `zone`. Returns true when the weather changed.
    pub fn update_zone<R: Rng + ?Sized>(
        zone: &mut WeatherZone,
        rng: &mut R,
        change_chance: f64,
        tick: WorldTick,
    ) -> MapResult<bool> {
        let next = Self::roll_next(zone.current(), rng, change_chance);
        if next == zone.current() {
            return Ok(false);
        }
        zone.change_weather(next, false, tick)?;
        zone.set_intensity(rng.random_range(0.3..=1.0));
        Ok(true)
    }
}
