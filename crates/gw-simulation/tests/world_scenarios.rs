//! End-to-end ticks through `WorldSimulationService`.

use gw_combat::{
    BehaviorProfile, HitBoxAggregate, HitBoxConfig, HitBoxShape, HitBoxSpawn, HitBoxVelocity, LootEntry, Monster, MonsterTemplate,
    ObstacleCollisionPolicy, TargetCollisionPolicy,
};
use gw_core::{
    Area, BaseStats, BehaviorState, Coordinate, DomainEvent, EventType, GatewayId, HitBoxId, ItemId, MonsterId,
    MovementCapability, Race, SpotId, TemplateId, WeatherType, WeatherZoneId, WorldEventKind, WorldObjectId,
    WorldTick,
};
use gw_map::{
    Gateway, MapError, ObjectComponent, PhysicalMapAggregate, TransitionCondition, TransitionPolicy, WeatherZone,
    WorldObject,
};
use gw_simulation::scenario::{self, GATE_TOLL, PLAYER_FUNDS};
use gw_simulation::{
    EventHandler, InMemoryStore, SimConfig, SimContext, SimError, SimResult, StaticTransitionRules, System,
    WorldSimulationService, WorldState,
};

fn spot(n: u64) -> SpotId {
    SpotId::new(n).unwrap()
}

fn obj(n: u64) -> WorldObjectId {
    WorldObjectId::new(n).unwrap()
}

fn at(x: i32, y: i32) -> Coordinate {
    Coordinate::planar(x, y).unwrap()
}

/// No weather rolls, no spawning.
fn quiet() -> SimConfig {
    SimConfig::default().with_weather(0, 0.0).with_spawning(false)
}

fn types(events: &[DomainEvent]) -> Vec<EventType> {
    events.iter().map(DomainEvent::event_type).collect()
}

/// A lone monster (obj#2) on a 5x5 field, with `hp` left of `max_hp`.
fn lone_monster(template: MonsterTemplate, position: Coordinate, hp: u32) -> WorldState {
    let monster_id = MonsterId::new(1).unwrap();
    let mut map = PhysicalMapAggregate::from_ascii(spot(1), &[".....", ".....", ".....", ".....", "....."]).unwrap();
    map.add_object(WorldObject::monster(obj(2), position, template.behavior_component(monster_id, position)))
        .unwrap();
    map.take_events();
    let mut monster = Monster::spawn(monster_id, &template, spot(1), obj(2), position, WorldTick::ZERO);
    if hp < template.max_hp {
        monster.apply_damage(template.max_hp - hp, false, obj(99), position).unwrap();
    }
    monster.take_events();
    WorldState::new().with_map(map).with_template(template).with_monster(monster)
}

fn stationary_hit_box(origin: Coordinate, duration: u64, attacker: Option<BaseStats>) -> HitBoxAggregate {
    hit_box_on(1, spot(1), origin, duration, attacker)
}

fn hit_box_on(
    id: u64,
    spot_id: SpotId,
    origin: Coordinate,
    duration: u64,
    attacker: Option<BaseStats>,
) -> HitBoxAggregate {
    let mut hit_box = HitBoxAggregate::create(HitBoxSpawn {
        id: HitBoxId::new(id).unwrap(),
        spot_id,
        owner_id: obj(99),
        shape: HitBoxShape::single_cell(),
        origin,
        velocity: HitBoxVelocity::zero(),
        start_tick: WorldTick(1),
        activation_tick: WorldTick(1),
        duration,
        power_multiplier: 1.0,
        attacker_stats: attacker,
        obstacle_policy: ObstacleCollisionPolicy::Deactivate,
        target_policy: TargetCollisionPolicy::KeepActive,
        capability: MovementCapability::projectile(),
        rehit_interval: None,
    })
    .unwrap();
    hit_box.take_events();
    hit_box
}

#[test]
fn stationary_hit_box_hits_its_target_once() {
    let template = MonsterTemplate::new(TemplateId::new(1).unwrap(), "golem", Race::Beast, 100);
    let state = lone_monster(template, at(2, 2), 100).with_hit_box(stationary_hit_box(at(2, 2), 5, None));
    let mut sim = WorldSimulationService::new(quiet(), InMemoryStore::new(state)).unwrap();

    sim.run(8).unwrap();

    assert_eq!(sim.events().of_type(EventType::HitBoxHitRecorded).len(), 1);
    assert_eq!(sim.events().of_type(EventType::MonsterDamaged).len(), 1);
    let store = sim.store().read();
    let monster = store.monster(MonsterId::new(1).unwrap()).unwrap();
    assert!(monster.hp().current() < 100);
    assert_eq!(store.hit_boxes().count(), 0, "expired hit box is purged");
}

#[test]
fn collision_budget_is_shared_by_every_map() {
    let mut state = WorldState::new();
    for n in 1..=2 {
        let mut map = PhysicalMapAggregate::from_ascii(spot(n), &["...", "...", "..."]).unwrap();
        map.add_object(WorldObject::player(obj(n), at(1, 1))).unwrap();
        map.take_events();
        state = state
            .with_map(map)
            .with_hit_box(hit_box_on(n, spot(n), at(1, 1), 5, None));
    }
    // One cell check plus one object check per hit box.
    let config = quiet().with_hit_box(HitBoxConfig::default().with_max_checks(2));
    let mut sim = WorldSimulationService::new(config, InMemoryStore::new(state)).unwrap();

    sim.tick().unwrap();
    assert_eq!(sim.events().of_type(EventType::HitBoxHitRecorded).len(), 1);

    sim.tick().unwrap();
    let hits = sim.events().of_type(EventType::HitBoxHitRecorded);
    assert_eq!(hits.len(), 2);
    let targets: Vec<_> = hits
        .iter()
        .filter_map(|e| match &e.kind {
            WorldEventKind::HitBoxHitRecorded { target_id, .. } => Some(*target_id),
            _ => None,
        })
        .collect();
    assert_eq!(targets, vec![obj(1), obj(2)]);
}

#[test]
fn wounded_monster_flees_instead_of_chasing() {
    let template = MonsterTemplate::new(TemplateId::new(1).unwrap(), "wolf", Race::Beast, 20).with_behavior(
        BehaviorProfile {
            flee_threshold: 0.3,
            ..BehaviorProfile::default()
        },
    );
    let mut state = lone_monster(template, at(2, 2), 4);
    let mut map = state.map(spot(1)).unwrap().clone();
    map.add_object(WorldObject::player(obj(1), at(0, 2))).unwrap();
    map.take_events();
    state = state.with_map(map);
    let mut sim = WorldSimulationService::new(quiet(), InMemoryStore::new(state)).unwrap();

    sim.tick().unwrap();

    let changed: Vec<_> = sim
        .events()
        .events()
        .iter()
        .filter_map(|e| match e.kind {
            WorldEventKind::BehaviorStateChanged { to, .. } => Some(to),
            _ => None,
        })
        .collect();
    assert_eq!(changed, vec![BehaviorState::Flee]);
    let store = sim.store().read();
    let wolf = store.map(spot(1)).unwrap().object(obj(2)).unwrap();
    assert_eq!(wolf.component.behavior().unwrap().state, BehaviorState::Flee);
    assert!(wolf.coordinate().manhattan_distance(at(0, 2)) >= 2);
}

#[test]
fn clear_weather_cannot_turn_to_rain_unforced() {
    let mut zone = WeatherZone::new(WeatherZoneId::new(1).unwrap(), [spot(1)], WeatherType::Clear);

    let err = zone.change_weather(WeatherType::Rain, false, WorldTick(1)).unwrap_err();

    assert!(matches!(err, MapError::InvalidWeatherTransition { .. }));
    assert_eq!(zone.current(), WeatherType::Clear);
    zone.change_weather(WeatherType::Rain, true, WorldTick(1)).unwrap();
    assert_eq!(zone.current(), WeatherType::Rain);
}

#[test]
fn lethal_hit_removes_the_body_and_drops_loot() {
    let template = MonsterTemplate::new(TemplateId::new(1).unwrap(), "rabbit", Race::Critter, 5).with_loot(vec![
        LootEntry {
            item_id: ItemId::new(7).unwrap(),
            quantity: 2,
        },
    ]);
    let strong = BaseStats {
        attack: 100,
        ..BaseStats::default()
    };
    let state = lone_monster(template, at(3, 3), 5).with_hit_box(stationary_hit_box(at(3, 3), 1, Some(strong)));
    let mut sim = WorldSimulationService::new(quiet(), InMemoryStore::new(state)).unwrap();

    sim.tick().unwrap();

    let seen = types(sim.events().events());
    for expected in [
        EventType::HitBoxHitRecorded,
        EventType::MonsterDamaged,
        EventType::MonsterDied,
        EventType::WorldObjectRemoved,
        EventType::ItemDropped,
    ] {
        assert!(seen.contains(&expected), "missing {expected:?} in {seen:?}");
    }
    let died_at = seen.iter().position(|t| *t == EventType::MonsterDied).unwrap();
    let dropped_at = seen.iter().position(|t| *t == EventType::ItemDropped).unwrap();
    assert!(died_at < dropped_at, "loot drops after the committed death");

    let store = sim.store().read();
    let map = store.map(spot(1)).unwrap();
    assert!(map.object(obj(2)).is_none());
    let loot = map.objects_at(at(3, 3));
    assert_eq!(loot.len(), 1);
    assert!(matches!(
        &loot[0].component,
        ObjectComponent::GroundItem(item) if item.quantity == 2
    ));
    assert!(!store.monster(MonsterId::new(1).unwrap()).unwrap().is_alive());
}

#[test]
fn same_seed_replays_the_same_world() {
    fn run(seed: u64) -> Vec<(WorldTick, WorldEventKind)> {
        let arena = scenario::arena().unwrap();
        let config = SimConfig::default().with_seed(seed);
        let mut sim =
            WorldSimulationService::with_transition_rules(config, InMemoryStore::new(arena.state), arena.rules)
                .unwrap();
        sim.run(60).unwrap();
        sim.events().events().iter().map(|e| (e.tick, e.kind.clone())).collect()
    }

    let first = run(7);
    assert!(!first.is_empty());
    assert_eq!(first, run(7));
}

#[test]
fn arena_spawns_one_monster_per_entry_on_the_first_tick() {
    let arena = scenario::arena().unwrap();
    let mut sim = WorldSimulationService::new(SimConfig::default(), InMemoryStore::new(arena.state)).unwrap();

    assert_eq!(sim.tick().unwrap(), WorldTick(1));

    assert_eq!(sim.events().of_type(EventType::MonsterSpawned).len(), 4);
    let store = sim.store().read();
    assert_eq!(store.monsters().count(), 4);
    for monster in store.monsters() {
        let map = store.map(monster.spot_id()).unwrap();
        assert_eq!(map.object(monster.object_id()).unwrap().coordinate(), monster.home());
    }
}

/// Fails on every event it sees.
#[derive(Debug)]
struct Faulty;

impl EventHandler for Faulty {
    fn name(&self) -> &str {
        "faulty"
    }

    fn handle(&self, _event: &DomainEvent, _ctx: &mut SimContext<'_>) -> SimResult<()> {
        Err(SimError::Map(MapError::InvalidGrid("corrupt".into())))
    }
}

#[test]
fn failing_sync_handler_rolls_back_the_whole_tick() {
    let arena = scenario::arena().unwrap();
    let mut sim = WorldSimulationService::new(SimConfig::default(), InMemoryStore::new(arena.state)).unwrap();
    sim.register_sync_handler(EventType::MonsterSpawned, Faulty);

    let err = sim.tick().unwrap_err();

    assert!(matches!(err, SimError::System { ref context, .. } if context == "faulty"));
    assert_eq!(sim.current_tick(), WorldTick::ZERO);
    assert!(sim.events().is_empty());
    let store = sim.store().read();
    assert_eq!(store.monsters().count(), 0);
    assert_eq!(store.map(arena.meadow).unwrap().object_count(), 1);
}

#[test]
fn failing_async_handler_leaves_the_tick_committed() {
    let arena = scenario::arena().unwrap();
    let mut sim = WorldSimulationService::new(SimConfig::default(), InMemoryStore::new(arena.state)).unwrap();
    sim.register_async_handler(EventType::MonsterSpawned, Faulty);

    assert_eq!(sim.tick().unwrap(), WorldTick(1));

    assert_eq!(sim.events().of_type(EventType::MonsterSpawned).len(), 4);
    assert_eq!(sim.store().read().monsters().count(), 4);
    assert_eq!(sim.tick().unwrap(), WorldTick(2));
}

/// Walks the player one step east on the first tick.
#[derive(Debug)]
struct StepEast {
    player: WorldObjectId,
}

impl System for StepEast {
    fn name(&self) -> &str {
        "step-east"
    }

    fn is_due(&self, tick: WorldTick) -> bool {
        tick == WorldTick(1)
    }

    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let mut map = ctx.ports.map_or_err(spot(1))?;
        let Some(from) = map.object(self.player).map(WorldObject::coordinate) else {
            return Ok(());
        };
        map.move_object(self.player, at(from.x() + 1, from.y()))?;
        ctx.emit_all(map.take_events());
        ctx.ports.maps.save(map);
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// A player at (2,1) next to a gate at (3,1) leading to (1,1) on spot 2.
fn gate_world(weather: WeatherType) -> (WorldSimulationService, WorldObjectId) {
    let player = obj(1);
    let mut meadow = PhysicalMapAggregate::from_ascii(spot(1), &["....", "....", "...."]).unwrap();
    meadow
        .add_gateway(Gateway::new(GatewayId::new(1).unwrap(), "gate", Area::point(at(3, 1)), spot(2), at(1, 1)))
        .unwrap();
    meadow.add_object(WorldObject::player(player, at(2, 1))).unwrap();
    meadow.take_events();
    let ruins = PhysicalMapAggregate::from_ascii(spot(2), &["...", "...", "..."]).unwrap();
    let state = WorldState::new()
        .with_map(meadow)
        .with_map(ruins)
        .with_weather_zone(WeatherZone::new(WeatherZoneId::new(1).unwrap(), [spot(1)], weather))
        .with_funds(player, PLAYER_FUNDS);
    let rules = StaticTransitionRules::new().with_policy(TransitionPolicy {
        from_spot_id: spot(1),
        to_spot_id: spot(2),
        conditions: vec![
            TransitionCondition::Toll { amount: GATE_TOLL },
            TransitionCondition::BlockedByWeather {
                types: vec![WeatherType::Storm],
            },
        ],
    });
    let mut sim = WorldSimulationService::with_transition_rules(quiet(), InMemoryStore::new(state), rules).unwrap();
    sim.add_system(StepEast { player });
    (sim, player)
}

#[test]
fn stepping_on_a_gate_transfers_the_player_and_charges_the_toll() {
    let (mut sim, player) = gate_world(WeatherType::Clear);

    sim.tick().unwrap();

    assert_eq!(
        types(sim.events().events()),
        vec![
            EventType::WorldObjectMoved,
            EventType::GatewayTriggered,
            EventType::WorldObjectRemoved,
            EventType::WorldObjectAdded,
            EventType::ObjectTransferred,
        ]
    );
    let store = sim.store().read();
    assert!(store.map(spot(1)).unwrap().object(player).is_none());
    assert_eq!(store.map(spot(2)).unwrap().object(player).unwrap().coordinate(), at(1, 1));
    assert_eq!(store.funds(player), PLAYER_FUNDS - GATE_TOLL);
}

#[test]
fn storm_keeps_the_gate_closed() {
    let (mut sim, player) = gate_world(WeatherType::Storm);

    sim.tick().unwrap();

    let denied = sim.events().of_type(EventType::TransitionDenied);
    assert_eq!(denied.len(), 1);
    let store = sim.store().read();
    assert_eq!(store.map(spot(1)).unwrap().object(player).unwrap().coordinate(), at(3, 1));
    assert_eq!(store.funds(player), PLAYER_FUNDS);
}
