//! Interfaces the simulation consumes from its infrastructure.
//!
//! Repositories hand out owned copies of aggregates and take them back via
//! `save`; nothing is shared between a loaded aggregate and the store until
//! it is saved. All methods take `&self` so one adapter can serve every
//! system and handler of a tick.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use gw_combat::{HitBoxAggregate, Monster, MonsterTemplate, SpawnTable};
use gw_core::{DomainEvent, HitBoxId, MonsterId, SpotId, TemplateId, WeatherType, WorldObjectId, WorldTick};
use gw_map::{PhysicalMapAggregate, WeatherZone};

use crate::error::{SimError, SimResult};

/// Storage of physical maps.
pub trait PhysicalMapRepository {
    /// The map of a spot.
    fn find_by_spot_id(&self, spot_id: SpotId) -> Option<PhysicalMapAggregate>;
    /// Every stored spot, ascending.
    fn spot_ids(&self) -> Vec<SpotId>;
    /// Store a map, replacing the previous version.
    fn save(&self, map: PhysicalMapAggregate);
    /// A fresh world object id.
    fn generate_world_object_id(&self) -> SimResult<WorldObjectId>;
}

/// Storage of hit boxes.
pub trait HitBoxRepository {
    /// A fresh hit box id.
    fn generate_id(&self) -> SimResult<HitBoxId>;
    /// `count` fresh hit box ids, ascending.
    fn generate_ids(&self, count: usize) -> SimResult<Vec<HitBoxId>>;
    /// Store hit boxes, replacing previous versions.
    fn save_all(&self, hit_boxes: Vec<HitBoxAggregate>);
    /// Active hit boxes of a spot, by id.
    fn find_active_by_spot_id(&self, spot_id: SpotId) -> Vec<HitBoxAggregate>;
    /// Every hit box of a spot, by id.
    fn find_by_spot_id(&self, spot_id: SpotId) -> Vec<HitBoxAggregate>;
    /// Drop inactive hit boxes of a spot. Returns how many were dropped.
    fn purge_inactive(&self, spot_id: SpotId) -> usize;
}

/// Storage of monster aggregates.
pub trait MonsterRepository {
    /// A monster by id.
    fn find_by_id(&self, id: MonsterId) -> Option<Monster>;
    /// The monster whose body is `object_id` on `spot_id`.
    fn find_by_object_id(&self, spot_id: SpotId, object_id: WorldObjectId) -> Option<Monster>;
    /// Every monster of a spot, dead ones included.
    fn find_by_spot_id(&self, spot_id: SpotId) -> Vec<Monster>;
    /// Store a monster.
    fn save(&self, monster: Monster);
    /// A fresh monster id.
    fn generate_id(&self) -> SimResult<MonsterId>;
}

/// Monster design data.
pub trait MonsterTemplateRepository {
    /// A template by id.
    fn find_by_id(&self, id: TemplateId) -> Option<MonsterTemplate>;
}

/// Spawn tables by spot.
pub trait SpawnTableRepository {
    /// The table of a spot.
    fn find_by_spot_id(&self, spot_id: SpotId) -> Option<SpawnTable>;
    /// Store a table.
    fn save(&self, table: SpawnTable);
}

/// Weather zones.
pub trait WeatherZoneRepository {
    /// Every zone, by id.
    fn find_all(&self) -> Vec<WeatherZone>;
    /// The zone covering a spot.
    fn find_by_spot_id(&self, spot_id: SpotId) -> Option<WeatherZone>;
    /// Store a zone.
    fn save(&self, zone: WeatherZone);
}

/// Threat memory, see [`gw_combat::AggroTable`].
pub trait AggroStore {
    /// Add threat from `attacker_id` toward `victim_id`.
    fn add_aggro(
        &self,
        spot_id: SpotId,
        victim_id: WorldObjectId,
        attacker_id: WorldObjectId,
        amount: f64,
        current_tick: WorldTick,
    );
    /// Remembered threat per attacker of a victim.
    fn get_threat_by_attacker(
        &self,
        spot_id: SpotId,
        victim_id: WorldObjectId,
        current_tick: WorldTick,
    ) -> BTreeMap<WorldObjectId, f64>;
    /// Forget everything about a victim and about it as an attacker.
    fn forget(&self, spot_id: SpotId, object_id: WorldObjectId);
    /// Drop forgotten entries.
    fn prune(&self, current_tick: WorldTick);
}

/// The world clock.
pub trait GameTimeProvider {
    /// The tick in progress, or the last completed one between ticks.
    fn get_current_tick(&self) -> WorldTick;
    /// Move to the next tick and return it.
    fn advance_tick(&self) -> WorldTick;
}

/// Money of travellers, charged by gateway tolls.
pub trait Wallet {
    /// Money `object_id` can spend.
    fn balance(&self, object_id: WorldObjectId) -> u32;
    /// Deduct `amount`, saturating at zero.
    fn charge(&self, object_id: WorldObjectId, amount: u32);
}

/// The transaction around one tick or one asynchronous handler run.
pub trait UnitOfWork {
    /// Open a transaction.
    fn begin(&mut self) -> SimResult<()>;
    /// Queue events for synchronous processing.
    fn add_events(&mut self, events: Vec<DomainEvent>);
    /// The next queued event; it counts as processed from now on.
    fn next_pending(&mut self) -> Option<DomainEvent>;
    /// Make every change permanent and return the processed events.
    fn commit(&mut self) -> SimResult<Vec<DomainEvent>>;
    /// Discard every change and every queued event.
    fn rollback(&mut self);
    /// Whether a transaction is open.
    fn is_active(&self) -> bool;
}

/// Every port the systems and handlers use.
#[derive(Clone)]
pub struct Ports {
    /// Maps.
    pub maps: Rc<dyn PhysicalMapRepository>,
    /// Hit boxes.
    pub hit_boxes: Rc<dyn HitBoxRepository>,
    /// Monsters.
    pub monsters: Rc<dyn MonsterRepository>,
    /// Templates.
    pub templates: Rc<dyn MonsterTemplateRepository>,
    /// Spawn tables.
    pub spawn_tables: Rc<dyn SpawnTableRepository>,
    /// Weather zones.
    pub weather: Rc<dyn WeatherZoneRepository>,
    /// Threat memory.
    pub aggro: Rc<dyn AggroStore>,
    /// Clock.
    pub time: Rc<dyn GameTimeProvider>,
    /// Traveller money.
    pub wallet: Rc<dyn Wallet>,
}

impl fmt::Debug for Ports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ports")
            .field("tick", &self.time.get_current_tick())
            .field("spots", &self.maps.spot_ids())
            .finish_non_exhaustive()
    }
}

impl Ports {
    /// The weather over a spot, if it lies in a zone.
    pub fn weather_at(&self, spot_id: SpotId) -> Option<WeatherType> {
        self.weather.find_by_spot_id(spot_id).map(|z| z.current())
    }

    /// A map or `MapNotFound`.
    pub fn map_or_err(&self, spot_id: SpotId) -> SimResult<PhysicalMapAggregate> {
        self.maps.find_by_spot_id(spot_id).ok_or(SimError::MapNotFound(spot_id))
    }
}
