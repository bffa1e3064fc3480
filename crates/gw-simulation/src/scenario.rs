//! The built-in arena: two maps joined by a gateway, four monster kinds
//! and a player standing in the meadow.

use gw_combat::{
    BehaviorProfile, GrowthStage, GrowthStageDefinition, HitBoxShape, HitBoxSpec, LootEntry, MonsterTemplate,
    SkillSpec, SpawnEntry, SpawnTable, TargetPriority,
};
use gw_core::{
    Area, BaseStats, Coordinate, GatewayId, ItemId, PackId, Race, SpotId, TemplateId, WeatherType, WeatherZoneId,
    WorldObjectId,
};
use gw_map::{Gateway, PhysicalMapAggregate, TransitionCondition, TransitionPolicy, WeatherZone, WorldObject};

use crate::error::SimResult;
use crate::handlers::StaticTransitionRules;
use crate::memory::WorldState;

const MEADOW: [&str; 8] = [
    "............",
    "..TT....,,..",
    "..TT....,,..",
    "............",
    "....##......",
    "....##...TT.",
    ".........TT.",
    "............",
];

const RUINS: [&str; 6] = [
    "##########",
    "#........#",
    "...#..#..#",
    "#........#",
    "#..====..#",
    "##########",
];

/// Toll charged at the meadow gate.
pub const GATE_TOLL: u32 = 5;

/// Money the player starts with.
pub const PLAYER_FUNDS: u32 = 20;

/// A ready-to-run world and its gateway rules.
#[derive(Debug, Clone)]
pub struct Arena {
    /// Maps, templates, spawn tables, weather and funds.
    pub state: WorldState,
    /// Gate policies.
    pub rules: StaticTransitionRules,
    /// The starting map.
    pub meadow: SpotId,
    /// The map behind the gate.
    pub ruins: SpotId,
    /// The player object in the meadow.
    pub player: WorldObjectId,
}

fn at(x: i32, y: i32) -> SimResult<Coordinate> {
    Ok(Coordinate::planar(x, y)?)
}

fn templates() -> SimResult<Vec<MonsterTemplate>> {
    let wolf = MonsterTemplate::new(TemplateId::new(1)?, "wolf", Race::Beast, 30)
        .with_behavior(BehaviorProfile {
            flee_threshold: 0.2,
            hunger_rate: 0.05,
            ..BehaviorProfile::default()
        })
        .with_growth(vec![
            GrowthStageDefinition {
                stage: GrowthStage::Juvenile,
                min_age_ticks: 0,
            },
            GrowthStageDefinition {
                stage: GrowthStage::Adult,
                min_age_ticks: 20,
            },
        ])
        .with_pack(PackId::new(1)?)
        .with_loot(vec![LootEntry {
            item_id: ItemId::new(1)?,
            quantity: 1,
        }])
        .with_feed_value(0.4);

    let firebolt = SkillSpec {
        name: "firebolt".into(),
        range: 4,
        mp_cost: 5,
        cooldown_ticks: 3,
        cast_ticks: 1,
        hit_boxes: vec![HitBoxSpec::projectile(2.0, 4).with_power(1.5)],
    };
    let boss = MonsterTemplate::new(TemplateId::new(2)?, "goblin chief", Race::Goblin, 80)
        .with_mp(20)
        .with_stats(BaseStats {
            attack: 14,
            defense: 4,
            ..BaseStats::default()
        })
        .with_skills(vec![SkillSpec::basic_attack(), firebolt])
        .with_behavior(BehaviorProfile {
            vision_range: 8,
            phase_thresholds: vec![0.5],
            target_priority: TargetPriority::HighestThreat,
            leash_distance: 6,
            ..BehaviorProfile::default()
        })
        .with_loot(vec![LootEntry {
            item_id: ItemId::new(2)?,
            quantity: 3,
        }]);

    let rabbit = MonsterTemplate::new(TemplateId::new(3)?, "rabbit", Race::Critter, 6)
        .with_behavior(BehaviorProfile {
            vision_range: 4,
            patrol_offsets: vec![(1, 0), (1, 1), (0, 1)],
            ..BehaviorProfile::default()
        })
        .with_loot(vec![LootEntry {
            item_id: ItemId::new(3)?,
            quantity: 1,
        }])
        .with_feed_value(0.6);

    let ground_slam = SkillSpec {
        name: "ground slam".into(),
        range: 1,
        mp_cost: 4,
        cooldown_ticks: 4,
        cast_ticks: 2,
        hit_boxes: vec![HitBoxSpec::area(HitBoxShape::cross(1), 2, None)],
    };
    let skeleton = MonsterTemplate::new(TemplateId::new(4)?, "skeleton", Race::Undead, 25)
        .with_mp(8)
        .with_skills(vec![ground_slam, SkillSpec::basic_attack()])
        .with_loot(vec![LootEntry {
            item_id: ItemId::new(4)?,
            quantity: 2,
        }]);

    Ok(vec![wolf, boss, rabbit, skeleton])
}

/// The arena scenario.
pub fn arena() -> SimResult<Arena> {
    let meadow_id = SpotId::new(1)?;
    let ruins_id = SpotId::new(2)?;
    let player = WorldObjectId::new(1)?;

    let mut meadow = PhysicalMapAggregate::from_ascii(meadow_id, &MEADOW)?;
    meadow.add_gateway(Gateway::new(
        GatewayId::new(1)?,
        "ruin gate",
        Area::rect(at(11, 3)?, at(11, 4)?)?,
        ruins_id,
        at(1, 2)?,
    ))?;
    meadow.add_object(WorldObject::player(player, at(2, 5)?))?;
    meadow.take_events();

    let mut ruins = PhysicalMapAggregate::from_ascii(ruins_id, &RUINS)?;
    ruins.add_gateway(Gateway::new(
        GatewayId::new(2)?,
        "meadow gate",
        Area::point(at(0, 2)?),
        meadow_id,
        at(10, 3)?,
    ))?;
    ruins.take_events();

    let meadow_spawns = SpawnTable::new(
        meadow_id,
        vec![
            SpawnEntry {
                template_id: TemplateId::new(1)?,
                area: Area::rect(at(7, 0)?, at(11, 7)?)?,
                max_count: 2,
                respawn_ticks: 15,
            },
            SpawnEntry {
                template_id: TemplateId::new(3)?,
                area: Area::circle(at(3, 2)?, 3),
                max_count: 3,
                respawn_ticks: 8,
            },
        ],
    );
    let ruins_spawns = SpawnTable::new(
        ruins_id,
        vec![
            SpawnEntry {
                template_id: TemplateId::new(4)?,
                area: Area::rect(at(1, 1)?, at(8, 4)?)?,
                max_count: 2,
                respawn_ticks: 20,
            },
            SpawnEntry {
                template_id: TemplateId::new(2)?,
                area: Area::point(at(6, 1)?),
                max_count: 1,
                respawn_ticks: 50,
            },
        ],
    );

    let mut state = WorldState::new()
        .with_map(meadow)
        .with_map(ruins)
        .with_spawn_table(meadow_spawns)
        .with_spawn_table(ruins_spawns)
        .with_weather_zone(WeatherZone::new(
            WeatherZoneId::new(1)?,
            [meadow_id, ruins_id],
            WeatherType::Clear,
        ))
        .with_funds(player, PLAYER_FUNDS);
    for template in templates()? {
        state = state.with_template(template);
    }

    let rules = StaticTransitionRules::new().with_policy(TransitionPolicy {
        from_spot_id: meadow_id,
        to_spot_id: ruins_id,
        conditions: vec![
            TransitionCondition::Toll { amount: GATE_TOLL },
            TransitionCondition::BlockedByWeather {
                types: vec![WeatherType::Storm],
            },
        ],
    });

    Ok(Arena {
        state,
        rules,
        meadow: meadow_id,
        ruins: ruins_id,
        player,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_is_consistent() {
        let arena = arena().unwrap();
        let meadow = arena.state.map(arena.meadow).unwrap();
        assert!(meadow.object(arena.player).is_some());
        assert_eq!(arena.state.funds(arena.player), PLAYER_FUNDS);
        assert_eq!(arena.state.maps().count(), 2);
        assert_eq!(arena.state.weather_zones().count(), 1);
        for gateway in meadow.gateways() {
            let target = arena.state.map(gateway.target_spot_id).unwrap();
            assert!(target.tile(gateway.landing).is_some());
        }
    }

    #[test]
    fn every_spawn_entry_names_a_known_template() {
        let arena = arena().unwrap();
        for spot in [arena.meadow, arena.ruins] {
            let ports = crate::memory::InMemoryStore::new(arena.state.clone()).ports();
            let table = ports.spawn_tables.find_by_spot_id(spot).unwrap();
            for entry in table.entries() {
                assert!(arena.state.template(entry.template_id).is_some());
            }
        }
    }
}
