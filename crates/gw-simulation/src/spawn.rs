use std::collections::BTreeMap;

use gw_combat::{Monster, SpawnEntry};
use gw_core::{Coordinate, SpotId, TemplateId};
use gw_map::{PhysicalMapAggregate, WorldObject};
use rand::Rng;
use tracing::{debug, info};

use crate::context::SimContext;
use crate::error::{SimError, SimResult};
use crate::system::System;

/// Repopulates maps from their spawn tables.
///
/// At most one monster per table entry spawns per tick, on a random free
/// cell of the entry's area that the template can stand on.
#[derive(Debug, Clone, Default)]
pub struct SpawnSystem {
    spawned: u64,
}

impl SpawnSystem {
    /// A spawn system that has spawned nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Monsters spawned so far.
    pub fn spawned(&self) -> u64 {
        self.spawned
    }

    fn spawn_entry(
        &mut self,
        ctx: &mut SimContext<'_>,
        map: &mut PhysicalMapAggregate,
        entry: &SpawnEntry,
    ) -> SimResult<bool> {
        let tick = ctx.tick();
        let spot_id = map.spot_id();
        let template = ctx
            .ports
            .templates
            .find_by_id(entry.template_id)
            .ok_or(SimError::TemplateNotFound(entry.template_id))?;
        let free: Vec<Coordinate> = entry
            .area
            .coordinates()
            .into_iter()
            .filter(|c| map.tile(*c).is_some_and(|t| t.is_passable(&template.capability)))
            .filter(|c| map.blocker_at(*c, None).is_none())
            .collect();
        if free.is_empty() {
            debug!(tick = %tick, spot = %spot_id, template = %template.id, "no free spawn cell");
            return Ok(false);
        }
        let home = free[ctx.rng.with(|rng| rng.random_range(0..free.len()))];

        let monster_id = ctx.ports.monsters.generate_id()?;
        let object_id = ctx.ports.maps.generate_world_object_id()?;
        map.add_object(WorldObject::monster(
            object_id,
            home,
            template.behavior_component(monster_id, home),
        ))?;
        let mut monster = Monster::spawn(monster_id, &template, spot_id, object_id, home, tick);
        info!(tick = %tick, spot = %spot_id, monster = %monster_id, template = %template.name, %home, "monster spawned");

        ctx.emit_all(map.take_events());
        ctx.emit_all(monster.take_events());
        ctx.ports.monsters.save(monster);
        self.spawned += 1;
        Ok(true)
    }

    fn alive_by_template(ctx: &SimContext<'_>, spot_id: SpotId) -> BTreeMap<TemplateId, u32> {
        let mut alive = BTreeMap::new();
        for monster in ctx.ports.monsters.find_by_spot_id(spot_id) {
            if monster.is_alive() {
                *alive.entry(monster.template_id()).or_default() += 1;
            }
        }
        alive
    }
}

impl System for SpawnSystem {
    fn name(&self) -> &str {
        "spawning"
    }

    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        if !ctx.config.spawn_enabled {
            return Ok(());
        }
        let tick = ctx.tick();
        for spot_id in ctx.ports.maps.spot_ids() {
            let Some(mut table) = ctx.ports.spawn_tables.find_by_spot_id(spot_id) else {
                continue;
            };
            let due = table.due_entries(&Self::alive_by_template(ctx, spot_id), tick);
            if due.is_empty() {
                continue;
            }
            let mut map = ctx.ports.map_or_err(spot_id)?;
            for index in due {
                let entry = table.entries()[index].clone();
                if self.spawn_entry(ctx, &mut map, &entry)? {
                    table.record_spawn(index, tick);
                }
            }
            ctx.ports.maps.save(map);
            ctx.ports.spawn_tables.save(table);
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
