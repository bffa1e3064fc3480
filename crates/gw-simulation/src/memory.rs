//! In-memory adapters for every port.
//!
//! All adapters are views of one [`InMemoryStore`], so a snapshot taken when
//! a transaction begins covers maps, hit boxes, monsters, spawn tables,
//! weather, threat, funds, the clock and the id counters together.

use std::cell::{Ref, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use gw_combat::{AggroMemoryPolicy, AggroTable, HitBoxAggregate, Monster, MonsterTemplate, SpawnTable};
use gw_core::{
    DomainEvent, HitBoxId, MonsterId, SpotId, TemplateId, WeatherZoneId, WorldObjectId, WorldTick,
};
use gw_map::{PhysicalMapAggregate, WeatherZone};
use tracing::debug;

use crate::error::{SimError, SimResult};
use crate::ports::{
    AggroStore, GameTimeProvider, HitBoxRepository, MonsterRepository, MonsterTemplateRepository,
    PhysicalMapRepository, Ports, SpawnTableRepository, UnitOfWork, Wallet, WeatherZoneRepository,
};

/// Everything the world consists of.
#[derive(Debug, Clone, Default)]
pub struct WorldState {
    maps: BTreeMap<SpotId, PhysicalMapAggregate>,
    hit_boxes: BTreeMap<HitBoxId, HitBoxAggregate>,
    monsters: BTreeMap<MonsterId, Monster>,
    templates: BTreeMap<TemplateId, MonsterTemplate>,
    spawn_tables: BTreeMap<SpotId, SpawnTable>,
    weather_zones: BTreeMap<WeatherZoneId, WeatherZone>,
    aggro: AggroTable,
    funds: BTreeMap<WorldObjectId, u32>,
    tick: WorldTick,
    last_object_id: u64,
    last_hit_box_id: u64,
    last_monster_id: u64,
}

impl WorldState {
    /// An empty world at tick zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a map. Generated object ids start above its highest object id.
    pub fn with_map(mut self, map: PhysicalMapAggregate) -> Self {
        let highest = map.objects().map(|o| o.id.value()).max().unwrap_or(0);
        self.last_object_id = self.last_object_id.max(highest);
        self.maps.insert(map.spot_id(), map);
        self
    }

    /// Add a monster template.
    pub fn with_template(mut self, template: MonsterTemplate) -> Self {
        self.templates.insert(template.id, template);
        self
    }

    /// Add a spawn table.
    pub fn with_spawn_table(mut self, table: SpawnTable) -> Self {
        self.spawn_tables.insert(table.spot_id(), table);
        self
    }

    /// Add a weather zone.
    pub fn with_weather_zone(mut self, zone: WeatherZone) -> Self {
        self.weather_zones.insert(zone.id(), zone);
        self
    }

    /// Add a monster whose body is already on its map.
    pub fn with_monster(mut self, monster: Monster) -> Self {
        self.last_monster_id = self.last_monster_id.max(monster.id().value());
        self.monsters.insert(monster.id(), monster);
        self
    }

    /// Add a hit box.
    pub fn with_hit_box(mut self, hit_box: HitBoxAggregate) -> Self {
        self.last_hit_box_id = self.last_hit_box_id.max(hit_box.id().value());
        self.hit_boxes.insert(hit_box.id(), hit_box);
        self
    }

    /// Give a traveller money.
    pub fn with_funds(mut self, object_id: WorldObjectId, amount: u32) -> Self {
        self.funds.insert(object_id, amount);
        self
    }

    /// A stored map.
    pub fn map(&self, spot_id: SpotId) -> Option<&PhysicalMapAggregate> {
        self.maps.get(&spot_id)
    }

    /// Every stored map, by spot.
    pub fn maps(&self) -> impl Iterator<Item = &PhysicalMapAggregate> {
        self.maps.values()
    }

    /// Every monster, by id.
    pub fn monsters(&self) -> impl Iterator<Item = &Monster> {
        self.monsters.values()
    }

    /// A monster by id.
    pub fn monster(&self, id: MonsterId) -> Option<&Monster> {
        self.monsters.get(&id)
    }

    /// A template by id.
    pub fn template(&self, id: TemplateId) -> Option<&MonsterTemplate> {
        self.templates.get(&id)
    }

    /// Every hit box, by id.
    pub fn hit_boxes(&self) -> impl Iterator<Item = &HitBoxAggregate> {
        self.hit_boxes.values()
    }

    /// Every weather zone, by id.
    pub fn weather_zones(&self) -> impl Iterator<Item = &WeatherZone> {
        self.weather_zones.values()
    }

    /// Threat memory.
    pub fn aggro(&self) -> &AggroTable {
        &self.aggro
    }

    /// Money of a traveller.
    pub fn funds(&self, object_id: WorldObjectId) -> u32 {
        self.funds.get(&object_id).copied().unwrap_or(0)
    }

    /// The clock.
    pub fn tick(&self) -> WorldTick {
        self.tick
    }
}

#[derive(Debug)]
struct StoreInner {
    state: WorldState,
    snapshot: Option<WorldState>,
}

/// Shared handle to one [`WorldState`] with snapshot and restore.
///
/// Cloning the handle shares the state.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    inner: Rc<RefCell<StoreInner>>,
}

impl InMemoryStore {
    /// A store holding `state`.
    pub fn new(state: WorldState) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner { state, snapshot: None })),
        }
    }

    /// Read access to the current state.
    pub fn read(&self) -> Ref<'_, WorldState> {
        Ref::map(self.inner.borrow(), |inner| &inner.state)
    }

    /// Replace the threat memory with an empty table under `policy`.
    pub fn reset_aggro(&self, policy: AggroMemoryPolicy) {
        self.write(|s| s.aggro = AggroTable::new(policy));
    }

    /// Every port backed by this store.
    pub fn ports(&self) -> Ports {
        Ports {
            maps: Rc::new(self.clone()),
            hit_boxes: Rc::new(self.clone()),
            monsters: Rc::new(self.clone()),
            templates: Rc::new(self.clone()),
            spawn_tables: Rc::new(self.clone()),
            weather: Rc::new(self.clone()),
            aggro: Rc::new(self.clone()),
            time: Rc::new(self.clone()),
            wallet: Rc::new(self.clone()),
        }
    }

    /// Remember the current state. Returns false if a snapshot already exists.
    pub fn snapshot(&self) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.snapshot.is_some() {
            return false;
        }
        inner.snapshot = Some(inner.state.clone());
        true
    }

    /// Go back to the remembered state.
    pub fn restore(&self) {
        let mut inner = self.inner.borrow_mut();
        if let Some(snapshot) = inner.snapshot.take() {
            inner.state = snapshot;
        }
    }

    /// Forget the remembered state, keeping the current one.
    pub fn release(&self) {
        self.inner.borrow_mut().snapshot = None;
    }

    fn with<R>(&self, f: impl FnOnce(&WorldState) -> R) -> R {
        f(&self.inner.borrow().state)
    }

    fn write<R>(&self, f: impl FnOnce(&mut WorldState) -> R) -> R {
        f(&mut self.inner.borrow_mut().state)
    }
}

impl PhysicalMapRepository for InMemoryStore {
    fn find_by_spot_id(&self, spot_id: SpotId) -> Option<PhysicalMapAggregate> {
        self.with(|s| s.maps.get(&spot_id).cloned())
    }

    fn spot_ids(&self) -> Vec<SpotId> {
        self.with(|s| s.maps.keys().copied().collect())
    }

    fn save(&self, map: PhysicalMapAggregate) {
        self.write(|s| s.maps.insert(map.spot_id(), map));
    }

    fn generate_world_object_id(&self) -> SimResult<WorldObjectId> {
        let next = self.write(|s| {
            s.last_object_id += 1;
            s.last_object_id
        });
        Ok(WorldObjectId::new(next)?)
    }
}

impl HitBoxRepository for InMemoryStore {
    fn generate_id(&self) -> SimResult<HitBoxId> {
        let next = self.write(|s| {
            s.last_hit_box_id += 1;
            s.last_hit_box_id
        });
        Ok(HitBoxId::new(next)?)
    }

    fn generate_ids(&self, count: usize) -> SimResult<Vec<HitBoxId>> {
        let first = self.write(|s| {
            let first = s.last_hit_box_id + 1;
            s.last_hit_box_id += count as u64;
            first
        });
        (first..first + count as u64)
            .map(|n| HitBoxId::new(n).map_err(SimError::from))
            .collect()
    }

    fn save_all(&self, hit_boxes: Vec<HitBoxAggregate>) {
        self.write(|s| {
            for hit_box in hit_boxes {
                s.hit_boxes.insert(hit_box.id(), hit_box);
            }
        });
    }

    fn find_active_by_spot_id(&self, spot_id: SpotId) -> Vec<HitBoxAggregate> {
        self.with(|s| {
            s.hit_boxes
                .values()
                .filter(|hb| hb.spot_id() == spot_id && hb.is_active())
                .cloned()
                .collect()
        })
    }

    fn find_by_spot_id(&self, spot_id: SpotId) -> Vec<HitBoxAggregate> {
        self.with(|s| {
            s.hit_boxes
                .values()
                .filter(|hb| hb.spot_id() == spot_id)
                .cloned()
                .collect()
        })
    }

    fn purge_inactive(&self, spot_id: SpotId) -> usize {
        self.write(|s| {
            let before = s.hit_boxes.len();
            s.hit_boxes.retain(|_, hb| hb.spot_id() != spot_id || hb.is_active());
            before - s.hit_boxes.len()
        })
    }
}

impl MonsterRepository for InMemoryStore {
    fn find_by_id(&self, id: MonsterId) -> Option<Monster> {
        self.with(|s| s.monsters.get(&id).cloned())
    }

    fn find_by_object_id(&self, spot_id: SpotId, object_id: WorldObjectId) -> Option<Monster> {
        self.with(|s| {
            s.monsters
                .values()
                .find(|m| m.spot_id() == spot_id && m.object_id() == object_id)
                .cloned()
        })
    }

    fn find_by_spot_id(&self, spot_id: SpotId) -> Vec<Monster> {
        self.with(|s| s.monsters.values().filter(|m| m.spot_id() == spot_id).cloned().collect())
    }

    fn save(&self, monster: Monster) {
        self.write(|s| s.monsters.insert(monster.id(), monster));
    }

    fn generate_id(&self) -> SimResult<MonsterId> {
        let next = self.write(|s| {
            s.last_monster_id += 1;
            s.last_monster_id
        });
        Ok(MonsterId::new(next)?)
    }
}

impl MonsterTemplateRepository for InMemoryStore {
    fn find_by_id(&self, id: TemplateId) -> Option<MonsterTemplate> {
        self.with(|s| s.templates.get(&id).cloned())
    }
}

impl SpawnTableRepository for InMemoryStore {
    fn find_by_spot_id(&self, spot_id: SpotId) -> Option<SpawnTable> {
        self.with(|s| s.spawn_tables.get(&spot_id).cloned())
    }

    fn save(&self, table: SpawnTable) {
        self.write(|s| s.spawn_tables.insert(table.spot_id(), table));
    }
}

impl WeatherZoneRepository for InMemoryStore {
    fn find_all(&self) -> Vec<WeatherZone> {
        self.with(|s| s.weather_zones.values().cloned().collect())
    }

    fn find_by_spot_id(&self, spot_id: SpotId) -> Option<WeatherZone> {
        self.with(|s| s.weather_zones.values().find(|z| z.covers(spot_id)).cloned())
    }

    fn save(&self, zone: WeatherZone) {
        self.write(|s| s.weather_zones.insert(zone.id(), zone));
    }
}

impl AggroStore for InMemoryStore {
    fn add_aggro(
        &self,
        spot_id: SpotId,
        victim_id: WorldObjectId,
        attacker_id: WorldObjectId,
        amount: f64,
        current_tick: WorldTick,
    ) {
        self.write(|s| s.aggro.add_aggro(spot_id, victim_id, attacker_id, amount, current_tick));
    }

    fn get_threat_by_attacker(
        &self,
        spot_id: SpotId,
        victim_id: WorldObjectId,
        current_tick: WorldTick,
    ) -> BTreeMap<WorldObjectId, f64> {
        self.with(|s| s.aggro.get_threat_by_attacker(spot_id, victim_id, current_tick))
    }

    fn forget(&self, spot_id: SpotId, object_id: WorldObjectId) {
        self.write(|s| {
            s.aggro.clear_victim(spot_id, object_id);
            s.aggro.forget_attacker(spot_id, object_id);
        });
    }

    fn prune(&self, current_tick: WorldTick) {
        self.write(|s| s.aggro.prune(current_tick));
    }
}

impl GameTimeProvider for InMemoryStore {
    fn get_current_tick(&self) -> WorldTick {
        self.with(|s| s.tick)
    }

    fn advance_tick(&self) -> WorldTick {
        self.write(|s| {
            s.tick = s.tick.next();
            s.tick
        })
    }
}

impl Wallet for InMemoryStore {
    fn balance(&self, object_id: WorldObjectId) -> u32 {
        self.with(|s| s.funds(object_id))
    }

    fn charge(&self, object_id: WorldObjectId, amount: u32) {
        self.write(|s| {
            let funds = s.funds.entry(object_id).or_default();
            *funds = funds.saturating_sub(amount);
        });
    }
}

/// A unit of work over an [`InMemoryStore`] snapshot.
#[derive(Debug)]
pub struct InMemoryUnitOfWork {
    store: InMemoryStore,
    pending: VecDeque<DomainEvent>,
    processed: Vec<DomainEvent>,
    active: bool,
}

impl InMemoryUnitOfWork {
    /// A closed unit of work on `store`.
    pub fn new(store: InMemoryStore) -> Self {
        Self {
            store,
            pending: VecDeque::new(),
            processed: Vec::new(),
            active: false,
        }
    }
}

impl UnitOfWork for InMemoryUnitOfWork {
    fn begin(&mut self) -> SimResult<()> {
        if self.active || !self.store.snapshot() {
            return Err(SimError::TransactionActive);
        }
        self.active = true;
        Ok(())
    }

    fn add_events(&mut self, events: Vec<DomainEvent>) {
        self.pending.extend(events);
    }

    fn next_pending(&mut self) -> Option<DomainEvent> {
        let event = self.pending.pop_front()?;
        self.processed.push(event.clone());
        Some(event)
    }

    fn commit(&mut self) -> SimResult<Vec<DomainEvent>> {
        if !self.active {
            return Err(SimError::NoTransaction);
        }
        self.store.release();
        self.active = false;
        let mut events = std::mem::take(&mut self.processed);
        events.extend(self.pending.drain(..));
        Ok(events)
    }

    fn rollback(&mut self) {
        if !self.active {
            return;
        }
        self.store.restore();
        self.active = false;
        debug!(
            discarded = self.processed.len() + self.pending.len(),
            "transaction rolled back"
        );
        self.pending.clear();
        self.processed.clear();
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
