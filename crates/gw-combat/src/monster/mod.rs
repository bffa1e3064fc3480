//! The monster aggregate and its design data.
//!
//! A [`Monster`] holds the combat side of a monster (hit points, mana,
//! cooldowns); its body on the map is a [`gw_map::WorldObject`] with an
//! autonomous behaviour component linked by `object_id`.

pub mod spawn;
pub mod template;

use std::collections::BTreeMap;

use gw_core::{
    BaseStats, Coordinate, Hp, MonsterId, Mp, SpotId, TemplateId, WorldEventKind, WorldObjectId,
    WorldTick,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CombatError, CombatResult};
use crate::skill::SkillSpec;

pub use spawn::{SpawnEntry, SpawnTable};
pub use template::{
    BehaviorProfile, GrowthStage, GrowthStageDefinition, LootEntry, MonsterTemplate, TargetPriority,
};

/// Whether a monster still takes part in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonsterStatus {
    /// Acting normally.
    #[default]
    Alive,
    /// Hit points reached zero.
    Dead,
}

/// Outcome of [`Monster::apply_damage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageApplied {
    /// Hit points left.
    pub remaining_hp: u32,
    /// Whether this hit killed the monster.
    pub died: bool,
}

/// Combat state of one spawned monster.
#[derive(Debug, Clone, PartialEq)]
pub struct Monster {
    id: MonsterId,
    template_id: TemplateId,
    spot_id: SpotId,
    object_id: WorldObjectId,
    hp: Hp,
    mp: Mp,
    stats: BaseStats,
    status: MonsterStatus,
    home: Coordinate,
    spawned_at: WorldTick,
    skills: Vec<SkillSpec>,
    /// First tick each slot can be used again.
    ready_at: BTreeMap<usize, WorldTick>,
    killer_id: Option<WorldObjectId>,
    events: Vec<WorldEventKind>,
}

impl Monster {
    /// Spawn a monster from `template` and record `MonsterSpawned`.
    pub fn spawn(
        id: MonsterId,
        template: &MonsterTemplate,
        spot_id: SpotId,
        object_id: WorldObjectId,
        home: Coordinate,
        current_tick: WorldTick,
    ) -> Self {
        debug!(monster = %id, template = %template.id, spot = %spot_id, "monster spawned");
        Self {
            id,
            template_id: template.id,
            spot_id,
            object_id,
            hp: Hp::full(template.max_hp),
            mp: Mp::full(template.max_mp),
            stats: template.stats,
            status: MonsterStatus::Alive,
            home,
            spawned_at: current_tick,
            skills: template.skills.clone(),
            ready_at: BTreeMap::new(),
            killer_id: None,
            events: vec![WorldEventKind::MonsterSpawned {
                spot_id,
                monster_id: id,
                object_id,
                coordinate: home,
            }],
        }
    }

    /// Monster id.
    pub fn id(&self) -> MonsterId {
        self.id
    }

    /// Template it was spawned from.
    pub fn template_id(&self) -> TemplateId {
        self.template_id
    }

    /// Map it lives on.
    pub fn spot_id(&self) -> SpotId {
        self.spot_id
    }

    /// Its map object.
    pub fn object_id(&self) -> WorldObjectId {
        self.object_id
    }

    /// Hit points.
    pub fn hp(&self) -> Hp {
        self.hp
    }

    /// Mana.
    pub fn mp(&self) -> Mp {
        self.mp
    }

    /// Combat stats.
    pub fn stats(&self) -> BaseStats {
        self.stats
    }

    /// Alive or dead.
    pub fn status(&self) -> MonsterStatus {
        self.status
    }

    /// Spawn point.
    pub fn home(&self) -> Coordinate {
        self.home
    }

    /// Whoever landed the killing blow.
    pub fn killer_id(&self) -> Option<WorldObjectId> {
        self.killer_id
    }

    /// Whether the monster is alive.
    pub fn is_alive(&self) -> bool {
        self.status == MonsterStatus::Alive
    }

    /// Fraction of hit points left.
    pub fn hp_percentage(&self) -> f64 {
        self.hp.percentage()
    }

    /// Ticks since spawn.
    pub fn age(&self, current_tick: WorldTick) -> u64 {
        current_tick.since(self.spawned_at)
    }

    /// All skills by slot.
    pub fn skills(&self) -> &[SkillSpec] {
        &self.skills
    }

    /// The skill in `slot`.
    pub fn skill(&self, slot: usize) -> CombatResult<&SkillSpec> {
        self.skills.get(slot).ok_or(CombatError::SkillNotFound {
            monster_id: self.id,
            slot,
        })
    }

    /// Whether `slot` is off cooldown.
    pub fn is_skill_ready(&self, slot: usize, current_tick: WorldTick) -> bool {
        self.ready_at.get(&slot).is_none_or(|ready| *ready <= current_tick)
    }

    /// Slots that are off cooldown and affordable, in slot order.
    pub fn available_slots(&self, current_tick: WorldTick) -> Vec<usize> {
        self.skills
            .iter()
            .enumerate()
            .filter(|(slot, skill)| self.is_skill_ready(*slot, current_tick) && self.mp.can_afford(skill.mp_cost))
            .map(|(slot, _)| slot)
            .collect()
    }

    /// Spend mana, start the cooldown and record `SkillUsed`.
    pub fn use_skill(
        &mut self,
        slot: usize,
        target_id: Option<WorldObjectId>,
        current_tick: WorldTick,
    ) -> CombatResult<SkillSpec> {
        if !self.is_alive() {
            return Err(CombatError::MonsterDead(self.id));
        }
        let skill = self.skill(slot)?.clone();
        if let Some(ready_at) = self.ready_at.get(&slot) {
            if *ready_at > current_tick {
                return Err(CombatError::SkillOnCooldown {
                    monster_id: self.id,
                    slot,
                    ready_at: *ready_at,
                });
            }
        }
        self.mp = self.mp.spent(skill.mp_cost).ok_or(CombatError::InsufficientMp {
            monster_id: self.id,
            required: skill.mp_cost,
            available: self.mp.current(),
        })?;
        if skill.cooldown_ticks > 0 {
            self.ready_at.insert(slot, current_tick.plus(skill.cooldown_ticks));
        }
        debug!(monster = %self.id, skill = %skill.name, "skill used");
        self.events.push(WorldEventKind::SkillUsed {
            spot_id: self.spot_id,
            monster_id: self.id,
            object_id: self.object_id,
            skill: skill.name.clone(),
            target_id,
        });
        Ok(skill)
    }

    /// Take damage at `position`. Records `MonsterDamaged`, and `MonsterDied`
    /// when hit points run out.
    pub fn apply_damage(
        &mut self,
        amount: u32,
        critical: bool,
        attacker_id: WorldObjectId,
        position: Coordinate,
    ) -> CombatResult<DamageApplied> {
        if !self.is_alive() {
            return Err(CombatError::MonsterDead(self.id));
        }
        self.hp = self.hp.damaged(amount);
        self.events.push(WorldEventKind::MonsterDamaged {
            spot_id: self.spot_id,
            monster_id: self.id,
            object_id: self.object_id,
            attacker_id,
            damage: amount,
            critical,
            remaining_hp: self.hp.current(),
        });
        let died = self.hp.is_depleted();
        if died {
            self.status = MonsterStatus::Dead;
            self.killer_id = Some(attacker_id);
            debug!(monster = %self.id, killer = %attacker_id, "monster died");
            self.events.push(WorldEventKind::MonsterDied {
                spot_id: self.spot_id,
                monster_id: self.id,
                object_id: self.object_id,
                killer_id: Some(attacker_id),
                coordinate: position,
            });
        }
        Ok(DamageApplied {
            remaining_hp: self.hp.current(),
            died,
        })
    }

    /// Restore mana.
    pub fn regenerate_mp(&mut self, amount: u32) {
        if self.is_alive() {
            self.mp = self.mp.regenerated(amount);
        }
    }

    /// Buffered events.
    pub fn get_events(&self) -> &[WorldEventKind] {
        &self.events
    }

    /// Drain buffered events.
    pub fn take_events(&mut self) -> Vec<WorldEventKind> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use gw_core::Race;

    use super::*;
    use crate::skill::HitBoxSpec;

    fn template() -> MonsterTemplate {
        let fireball = SkillSpec {
            name: "fireball".into(),
            range: 5,
            mp_cost: 4,
            cooldown_ticks: 3,
            cast_ticks: 1,
            hit_boxes: vec![HitBoxSpec::projectile(2.0, 4)],
        };
        MonsterTemplate::new(TemplateId::new(1).unwrap(), "imp", Race::Goblin, 20)
            .with_mp(6)
            .with_skills(vec![SkillSpec::basic_attack(), fireball])
    }

    fn imp() -> Monster {
        Monster::spawn(
            MonsterId::new(1).unwrap(),
            &template(),
            SpotId::new(1).unwrap(),
            WorldObjectId::new(10).unwrap(),
            Coordinate::planar(3, 3).unwrap(),
            WorldTick(5),
        )
    }

    #[test]
    fn spawn_records_event() {
        let mut m = imp();
        assert!(m.is_alive());
        assert_eq!(m.hp().current(), 20);
        assert_eq!(m.age(WorldTick(8)), 3);
        let events = m.take_events();
        assert!(matches!(events[0], WorldEventKind::MonsterSpawned { .. }));
        assert!(m.get_events().is_empty());
    }

    #[test]
    fn skill_cooldown_and_mp() {
        let mut m = imp();
        let skill = m.use_skill(1, None, WorldTick(10)).unwrap();
        assert_eq!(skill.name, "fireball");
        assert_eq!(m.mp().current(), 2);

        let err = m.use_skill(1, None, WorldTick(11)).unwrap_err();
        assert!(matches!(err, CombatError::SkillOnCooldown { ready_at: WorldTick(13), .. }));

        let err = m.use_skill(1, None, WorldTick(13)).unwrap_err();
        assert!(matches!(err, CombatError::InsufficientMp { required: 4, available: 2, .. }));
        assert_eq!(err.kind(), gw_core::ErrorKind::BusinessRule);

        assert_eq!(m.available_slots(WorldTick(13)), vec![0]);
        m.regenerate_mp(2);
        assert_eq!(m.available_slots(WorldTick(13)), vec![0, 1]);
    }

    #[test]
    fn unknown_slot() {
        let mut m = imp();
        assert!(matches!(m.use_skill(7, None, WorldTick(1)), Err(CombatError::SkillNotFound { slot: 7, .. })));
    }

    #[test]
    fn damage_until_death() {
        let mut m = imp();
        m.take_events();
        let attacker = WorldObjectId::new(2).unwrap();
        let at = Coordinate::planar(3, 3).unwrap();
        let first = m.apply_damage(15, false, attacker, at).unwrap();
        assert_eq!(first, DamageApplied { remaining_hp: 5, died: false });
        assert!((m.hp_percentage() - 0.25).abs() < 1e-9);

        let second = m.apply_damage(9, true, attacker, at).unwrap();
        assert!(second.died);
        assert_eq!(m.status(), MonsterStatus::Dead);
        assert_eq!(m.killer_id(), Some(attacker));
        assert_eq!(m.take_events().len(), 3);

        assert!(matches!(m.apply_damage(1, false, attacker, at), Err(CombatError::MonsterDead(_))));
        assert!(matches!(m.use_skill(0, None, WorldTick(20)), Err(CombatError::MonsterDead(_))));
    }
}
