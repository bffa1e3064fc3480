//! The built-in domain event handlers.
//!
//! Handlers skip events whose objects are already gone: a stale reference
//! is an expected outcome of earlier handlers in the same tick, not a
//! failure.

use std::collections::BTreeSet;

use gw_combat::{DamageCalculator, DamageInput};
use gw_core::{DomainEvent, SpotId, WorldEventKind, WorldObjectId};
use gw_map::{
    TransitionConditionService, TransitionContext, TransitionDecision, TransitionPolicy, TransitionPolicyRepository,
    TransitionRelationChecker, WorldObject,
};
use tracing::{debug, info};

use crate::context::SimContext;
use crate::error::SimResult;
use crate::publisher::EventHandler;

/// Turns a recorded hit into damage and threat on the struck monster.
#[derive(Debug, Default)]
pub struct HitDamageHandler;

impl EventHandler for HitDamageHandler {
    fn name(&self) -> &str {
        "hit-damage"
    }

    fn handle(&self, event: &DomainEvent, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let WorldEventKind::HitBoxHitRecorded {
            spot_id,
            owner_id,
            target_id,
            hit_coordinate,
            power_multiplier,
            attacker_stats,
            ..
        } = &event.kind
        else {
            return Ok(());
        };
        let Some(mut monster) = ctx.ports.monsters.find_by_object_id(*spot_id, *target_id) else {
            debug!(spot = %spot_id, target = %target_id, "hit target is not a monster");
            return Ok(());
        };
        if !monster.is_alive() {
            return Ok(());
        }

        let position = ctx
            .ports
            .maps
            .find_by_spot_id(*spot_id)
            .and_then(|map| map.object(*target_id).map(WorldObject::coordinate))
            .unwrap_or(*hit_coordinate);
        let input = DamageInput {
            attacker: attacker_stats.unwrap_or_default(),
            defense: monster.stats().defense,
            power_multiplier: *power_multiplier,
        };
        let damage = ctx.rng.with(|rng| DamageCalculator::calculate(&input, rng));
        let applied = monster.apply_damage(damage.amount, damage.critical, *owner_id, position)?;
        ctx.ports
            .aggro
            .add_aggro(*spot_id, *target_id, *owner_id, f64::from(damage.amount), ctx.tick());
        debug!(
            tick = %ctx.tick(),
            monster = %monster.id(),
            attacker = %owner_id,
            damage = damage.amount,
            remaining = applied.remaining_hp,
            "hit resolved"
        );

        ctx.emit_all(monster.take_events());
        ctx.ports.monsters.save(monster);
        Ok(())
    }
}

/// Removes a dead monster's body, clears its threat and feeds its killer.
#[derive(Debug, Default)]
pub struct MonsterDeathHandler;

impl EventHandler for MonsterDeathHandler {
    fn name(&self) -> &str {
        "monster-death"
    }

    fn handle(&self, event: &DomainEvent, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let WorldEventKind::MonsterDied {
            spot_id,
            monster_id,
            object_id,
            killer_id,
            ..
        } = &event.kind
        else {
            return Ok(());
        };
        ctx.ports.aggro.forget(*spot_id, *object_id);
        let Some(mut map) = ctx.ports.maps.find_by_spot_id(*spot_id) else {
            return Ok(());
        };
        if map.object(*object_id).is_none() {
            return Ok(());
        }
        map.remove_object(*object_id)?;

        if let Some(killer_id) = killer_id {
            let feed_value = ctx
                .ports
                .monsters
                .find_by_id(*monster_id)
                .and_then(|m| ctx.ports.templates.find_by_id(m.template_id()))
                .map_or(0.0, |t| t.feed_value);
            if feed_value > 0.0 {
                if let Some(behavior) = map.component_mut(*killer_id).ok().and_then(|c| c.behavior_mut()) {
                    behavior.feed(feed_value);
                    debug!(killer = %killer_id, feed_value, "killer fed");
                }
            }
        }

        ctx.emit_all(map.take_events());
        ctx.ports.maps.save(map);
        Ok(())
    }
}

/// Drops a dead monster's loot where it fell.
#[derive(Debug, Default)]
pub struct LootDropHandler;

impl EventHandler for LootDropHandler {
    fn name(&self) -> &str {
        "loot-drop"
    }

    fn handle(&self, event: &DomainEvent, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let WorldEventKind::MonsterDied {
            spot_id,
            monster_id,
            coordinate,
            ..
        } = &event.kind
        else {
            return Ok(());
        };
        let Some(template) = ctx
            .ports
            .monsters
            .find_by_id(*monster_id)
            .and_then(|m| ctx.ports.templates.find_by_id(m.template_id()))
        else {
            return Ok(());
        };
        if template.loot.is_empty() {
            return Ok(());
        }

        let mut map = ctx.ports.map_or_err(*spot_id)?;
        for loot in &template.loot {
            let object_id = ctx.ports.maps.generate_world_object_id()?;
            map.add_object(WorldObject::ground_item(object_id, *coordinate, loot.item_id, loot.quantity))?;
            map.record_event(WorldEventKind::ItemDropped {
                spot_id: *spot_id,
                object_id,
                item_id: loot.item_id,
                coordinate: *coordinate,
            });
        }
        ctx.emit_all(map.take_events());
        ctx.ports.maps.save(map);
        Ok(())
    }
}

/// Fixed transition policies and relations.
#[derive(Debug, Clone, Default)]
pub struct StaticTransitionRules {
    policies: Vec<TransitionPolicy>,
    relations: BTreeSet<(WorldObjectId, String)>,
}

impl StaticTransitionRules {
    /// Rules with no gate policies and no relations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a policy. A later policy for the same spot pair wins.
    pub fn with_policy(mut self, policy: TransitionPolicy) -> Self {
        self.policies
            .retain(|p| (p.from_spot_id, p.to_spot_id) != (policy.from_spot_id, policy.to_spot_id));
        self.policies.push(policy);
        self
    }

    /// Grant `relation` to `object_id`.
    pub fn with_relation(mut self, object_id: WorldObjectId, relation: impl Into<String>) -> Self {
        self.relations.insert((object_id, relation.into()));
        self
    }
}

impl TransitionPolicyRepository for StaticTransitionRules {
    fn find_policy(&self, from_spot_id: SpotId, to_spot_id: SpotId) -> Option<TransitionPolicy> {
        self.policies
            .iter()
            .find(|p| p.from_spot_id == from_spot_id && p.to_spot_id == to_spot_id)
            .cloned()
    }
}

impl TransitionRelationChecker for StaticTransitionRules {
    fn has_relation(&self, object_id: WorldObjectId, relation: &str) -> bool {
        self.relations.contains(&(object_id, relation.to_string()))
    }
}

/// Moves a traveller through a triggered gateway, or records why it may not pass.
#[derive(Debug, Default)]
pub struct GatewayTransferHandler {
    rules: StaticTransitionRules,
}

impl GatewayTransferHandler {
    /// A handler enforcing `rules`.
    pub fn new(rules: StaticTransitionRules) -> Self {
        Self { rules }
    }

    fn deny(ctx: &mut SimContext<'_>, object_id: WorldObjectId, from: SpotId, to: SpotId, reasons: Vec<String>) {
        info!(tick = %ctx.tick(), object = %object_id, from = %from, to = %to, ?reasons, "transition denied");
        ctx.emit(WorldEventKind::TransitionDenied {
            object_id,
            from_spot_id: from,
            to_spot_id: to,
            reasons,
        });
    }
}

impl EventHandler for GatewayTransferHandler {
    fn name(&self) -> &str {
        "gateway-transfer"
    }

    fn handle(&self, event: &DomainEvent, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let WorldEventKind::GatewayTriggered {
            spot_id,
            object_id,
            target_spot_id,
            landing,
            ..
        } = &event.kind
        else {
            return Ok(());
        };
        let (from, to, object_id, landing) = (*spot_id, *target_spot_id, *object_id, *landing);
        let mut from_map = ctx.ports.map_or_err(from)?;
        let Some(traveller) = from_map.object(object_id) else {
            return Ok(());
        };
        let is_blocking = traveller.is_blocking;

        let Some(mut to_map) = ctx.ports.maps.find_by_spot_id(to) else {
            Self::deny(ctx, object_id, from, to, vec![format!("unknown destination {to}")]);
            return Ok(());
        };
        if !to_map.contains(landing) || (is_blocking && to_map.blocker_at(landing, None).is_some()) {
            Self::deny(ctx, object_id, from, to, vec![format!("landing {landing} is not free")]);
            return Ok(());
        }

        let decision = TransitionConditionService::evaluate(
            &self.rules,
            &self.rules,
            &TransitionContext {
                object_id,
                from_spot_id: from,
                to_spot_id: to,
                weather: ctx.ports.weather_at(from),
                funds: ctx.ports.wallet.balance(object_id),
            },
        );
        let toll = match decision {
            TransitionDecision::Allowed { toll } => toll,
            TransitionDecision::Denied { reasons } => {
                Self::deny(ctx, object_id, from, to, reasons);
                return Ok(());
            }
        };

        if toll > 0 {
            ctx.ports.wallet.charge(object_id, toll);
        }
        let traveller = from_map.remove_object(object_id)?;
        to_map.add_object(traveller.relocated(landing))?;
        info!(tick = %ctx.tick(), object = %object_id, from = %from, to = %to, toll, "object transferred");

        ctx.emit_all(from_map.take_events());
        ctx.emit_all(to_map.take_events());
        ctx.emit(WorldEventKind::ObjectTransferred {
            object_id,
            from_spot_id: from,
            to_spot_id: to,
            landing,
        });
        ctx.ports.maps.save(from_map);
        ctx.ports.maps.save(to_map);
        Ok(())
    }
}
