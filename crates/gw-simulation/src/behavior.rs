//! Drives every autonomous actor one step per tick.

use gw_behavior::{
    BehaviorConfig, BehaviorService, DispositionResolver, GrowthContext, PackAllegianceService, PerceptionService,
    PlanActionContext, PlannedAction, RaceHostilityService, TargetSelectionContext, busy_until,
};
use gw_combat::{HitBoxFactory, Monster, SkillCast, TargetPriority};
use gw_core::{SpotId, WeatherType, WorldEventKind, WorldObjectId};
use gw_map::PhysicalMapAggregate;
use tracing::{debug, warn};

use crate::context::SimContext;
use crate::error::SimResult;
use crate::system::System;

/// Runs perception, the behaviour state machine and the planned action for
/// each autonomous actor, in id order per map.
///
/// Actors act one after another on the same map copy, so a later actor sees
/// where an earlier one moved. A failing actor is rolled back on its own and
/// logged; the rest of the map still acts.
#[derive(Debug, Clone)]
pub struct BehaviorSystem {
    service: BehaviorService,
    hostility: RaceHostilityService,
    failures: u64,
}

impl BehaviorSystem {
    /// A system running the behaviour engine with `config`.
    pub fn new(config: BehaviorConfig) -> Self {
        Self {
            service: BehaviorService::new(config),
            hostility: RaceHostilityService::standard(),
            failures: 0,
        }
    }

    /// Replace the race hostility table.
    pub fn with_hostility(mut self, hostility: RaceHostilityService) -> Self {
        self.hostility = hostility;
        self
    }

    /// Actor updates that failed and were skipped.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// One actor's turn on `map`. Writes monsters and hit boxes only once
    /// every fallible step succeeded.
    fn update_actor(
        &self,
        ctx: &SimContext<'_>,
        map: &mut PhysicalMapAggregate,
        actor_id: WorldObjectId,
        weather: Option<WeatherType>,
    ) -> SimResult<Vec<WorldEventKind>> {
        let tick = ctx.tick();
        let spot_id = map.spot_id();
        let Some(object) = map.object(actor_id) else {
            return Ok(Vec::new());
        };
        if object.is_busy(tick) {
            return Ok(Vec::new());
        }
        let Some(mut component) = object.component.behavior().cloned() else {
            return Ok(Vec::new());
        };

        let mut monster = component.monster_id.and_then(|id| ctx.ports.monsters.find_by_id(id));
        if monster.as_ref().is_some_and(|m| !m.is_alive()) {
            return Ok(Vec::new());
        }
        let template = monster
            .as_ref()
            .and_then(|m| ctx.ports.templates.find_by_id(m.template_id()));
        let growth = match (&monster, &template) {
            (Some(m), Some(t)) => GrowthContext::for_stage(t.growth_stage_at(m.age(tick)), self.service.config()),
            _ => GrowthContext::default(),
        };
        let target_priority = template
            .as_ref()
            .map_or(TargetPriority::default(), |t| t.behavior.target_priority);
        let hp = monster.as_ref().map_or(1.0, Monster::hp_percentage);
        let skills = monster.as_ref().map(|m| m.skills().to_vec()).unwrap_or_default();
        let available_slots = monster.as_ref().map(|m| m.available_slots(tick)).unwrap_or_default();

        component.grow_hungry();
        let resolver = DispositionResolver::new(&PackAllegianceService, &self.hostility);
        let observation = PerceptionService::observe(map, actor_id, hp, weather, &resolver, tick)?;
        let targeting =
            TargetSelectionContext::with_threat(ctx.ports.aggro.get_threat_by_attacker(spot_id, actor_id, tick));
        let plan = PlanActionContext {
            growth,
            targeting: &targeting,
            target_priority,
            skills: &skills,
            available_slots: &available_slots,
        };
        let decision = self.service.decide(map, &mut component, &observation, &plan);
        let facing = component.actor.direction;

        let mut events: Vec<WorldEventKind> = decision.state_event(&observation).into_iter().collect();
        if let Some(slot) = map.component_mut(actor_id)?.behavior_mut() {
            *slot = component;
        }

        let mut hit_boxes = Vec::new();
        match decision.action {
            PlannedAction::Wait => {}
            PlannedAction::Move { to } => map.move_object(actor_id, to)?,
            PlannedAction::UseSkill {
                slot,
                target_id,
                target_position,
            } => {
                let Some(caster) = monster.as_mut() else {
                    return Ok(events);
                };
                let direction = observation.position.direction_to(target_position).unwrap_or(facing);
                map.face(actor_id, direction)?;
                let skill = caster.use_skill(slot, Some(target_id), tick)?;
                let cast = SkillCast {
                    spot_id,
                    caster_id: actor_id,
                    caster_position: observation.position,
                    caster_direction: direction,
                    target_position: Some(target_position),
                    attacker_stats: Some(caster.stats()),
                    power_bonus: self.service.power_bonus(decision.state),
                    current_tick: tick,
                };
                let ids = ctx.ports.hit_boxes.generate_ids(skill.hit_boxes.len())?;
                hit_boxes = HitBoxFactory::create_for_skill(&skill, &cast, ids)?;
            }
        }
        if let Some(until) = busy_until(tick, &decision.action, &skills) {
            map.set_busy_until(actor_id, until)?;
        }

        events.extend(map.take_events());
        if let Some(mut caster) = monster {
            events.extend(caster.take_events());
            ctx.ports.monsters.save(caster);
        }
        for hit_box in &mut hit_boxes {
            events.extend(hit_box.take_events());
        }
        if !hit_boxes.is_empty() {
            ctx.ports.hit_boxes.save_all(hit_boxes);
        }
        Ok(events)
    }

    fn regenerate(&self, ctx: &SimContext<'_>, spot_id: SpotId) {
        let amount = ctx.config.mp_regen_per_tick;
        if amount == 0 {
            return;
        }
        for mut monster in ctx.ports.monsters.find_by_spot_id(spot_id) {
            if monster.is_alive() {
                monster.regenerate_mp(amount);
                ctx.ports.monsters.save(monster);
            }
        }
    }
}

impl System for BehaviorSystem {
    fn name(&self) -> &str {
        "behavior"
    }

    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let tick = ctx.tick();
        for spot_id in ctx.ports.maps.spot_ids() {
            let Some(mut map) = ctx.ports.maps.find_by_spot_id(spot_id) else {
                continue;
            };
            map.take_events();
            let weather = ctx.ports.weather_at(spot_id);
            let mut acted = 0usize;
            for actor_id in map.actor_ids() {
                let Some(snapshot) = map.object(actor_id).cloned() else {
                    continue;
                };
                let buffered = map.get_events().len();
                match self.update_actor(ctx, &mut map, actor_id, weather) {
                    Ok(events) => {
                        acted += usize::from(!events.is_empty());
                        ctx.emit_all(events);
                    }
                    Err(err) => {
                        if let Err(restore_err) = map.restore_object(snapshot) {
                            warn!(tick = %tick, spot = %spot_id, actor = %actor_id, %restore_err, "actor rollback failed");
                        }
                        map.truncate_events(buffered);
                        self.failures += 1;
                        warn!(tick = %tick, spot = %spot_id, actor = %actor_id, %err, "actor update failed");
                    }
                }
            }
            ctx.ports.maps.save(map);
            self.regenerate(ctx, spot_id);
            debug!(tick = %tick, spot = %spot_id, acted, "behaviour updated");
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
