use gw_core::{BaseStats, Coordinate, Direction, HitBoxId, SpotId, WorldObjectId, WorldTick};

use super::aggregate::{HitBoxAggregate, HitBoxSpawn, HitBoxVelocity};
use crate::error::{CombatError, CombatResult};
use crate::skill::{HitBoxOrigin, HitBoxSpec, SkillSpec};

/// The circumstances of one skill use.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillCast {
    /// Map of the caster.
    pub spot_id: SpotId,
    /// Caster's object.
    pub caster_id: WorldObjectId,
    /// Caster's cell.
    pub caster_position: Coordinate,
    /// Caster's facing, used when there is no target.
    pub caster_direction: Direction,
    /// Target cell, if any.
    pub target_position: Option<Coordinate>,
    /// Caster stats at cast time.
    pub attacker_stats: Option<BaseStats>,
    /// Extra power from enrage.
    pub power_bonus: f64,
    /// Tick of the cast.
    pub current_tick: WorldTick,
}

/// Builds hit box aggregates from skill specs.
#[derive(Debug, Clone, Copy, Default)]
pub struct HitBoxFactory;

impl HitBoxFactory {
    /// Create every hit box of `skill`, consuming one id from `ids` per hit box.
    ///
    /// `ids` is a batch from the repository and must match the hit box count.
    pub fn create_for_skill(
        skill: &SkillSpec,
        cast: &SkillCast,
        ids: Vec<HitBoxId>,
    ) -> CombatResult<Vec<HitBoxAggregate>> {
        if ids.len() != skill.hit_boxes.len() {
            return Err(CombatError::IdBatchMismatch {
                expected: skill.hit_boxes.len(),
                got: ids.len(),
            });
        }
        skill
            .hit_boxes
            .iter()
            .zip(ids)
            .map(|(spec, id)| Self::create(id, &skill.name, spec, cast))
            .collect()
    }

    /// Create one hit box from `spec`.
    pub fn create(id: HitBoxId, skill_name: &str, spec: &HitBoxSpec, cast: &SkillCast) -> CombatResult<HitBoxAggregate> {
        let (origin, velocity) = match spec.origin {
            HitBoxOrigin::AtTarget => {
                let target = cast
                    .target_position
                    .ok_or_else(|| CombatError::MissingTarget(skill_name.to_string()))?;
                (target, HitBoxVelocity::zero())
            }
            HitBoxOrigin::FromCaster => (cast.caster_position, Self::aim(spec.speed, cast)?),
        };

        HitBoxAggregate::create(HitBoxSpawn {
            id,
            spot_id: cast.spot_id,
            owner_id: cast.caster_id,
            shape: spec.shape.clone(),
            origin,
            velocity,
            start_tick: cast.current_tick,
            activation_tick: cast.current_tick.plus(spec.activation_delay),
            duration: spec.duration,
            power_multiplier: spec.power_multiplier * (1.0 + cast.power_bonus),
            attacker_stats: cast.attacker_stats,
            obstacle_policy: spec.obstacle_policy,
            target_policy: spec.target_policy,
            capability: spec.capability,
            rehit_interval: spec.rehit_interval,
        })
    }

    /// Velocity of `speed` cells per tick from the caster toward the target,
    /// or along the caster's facing when there is none.
    fn aim(speed: f64, cast: &SkillCast) -> CombatResult<HitBoxVelocity> {
        if speed == 0.0 {
            return Ok(HitBoxVelocity::zero());
        }
        let (dx, dy, dz) = match cast.target_position {
            Some(target) if target != cast.caster_position => (
                f64::from(target.x() - cast.caster_position.x()),
                f64::from(target.y() - cast.caster_position.y()),
                f64::from(target.z() - cast.caster_position.z()),
            ),
            _ => {
                let (dx, dy, dz) = cast.caster_direction.delta();
                (f64::from(dx), f64::from(dy), f64::from(dz))
            }
        };
        // Normalise on the dominant axis so `speed` is the substep-relevant magnitude.
        let scale = dx.abs().max(dy.abs()).max(dz.abs());
        HitBoxVelocity::new(dx / scale * speed, dy / scale * speed, dz / scale * speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hitbox::HitBoxShape;

    fn cast(target: Option<Coordinate>) -> SkillCast {
        SkillCast {
            spot_id: SpotId::new(1).unwrap(),
            caster_id: WorldObjectId::new(1).unwrap(),
            caster_position: Coordinate::planar(2, 2).unwrap(),
            caster_direction: Direction::East,
            target_position: target,
            attacker_stats: Some(BaseStats::default()),
            power_bonus: 0.0,
            current_tick: WorldTick(10),
        }
    }

    fn ids(n: u64) -> Vec<HitBoxId> {
        (1..=n).map(|i| HitBoxId::new(i).unwrap()).collect()
    }

    #[test]
    fn melee_lands_on_target() {
        let target = Coordinate::planar(3, 2).unwrap();
        let boxes = HitBoxFactory::create_for_skill(&SkillSpec::basic_attack(), &cast(Some(target)), ids(1)).unwrap();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].coordinate(), target);
        assert_eq!(boxes[0].start_tick(), WorldTick(10));
        assert!(boxes[0].velocity().is_stationary());
    }

    #[test]
    fn melee_without_target_fails() {
        let err = HitBoxFactory::create_for_skill(&SkillSpec::basic_attack(), &cast(None), ids(1)).unwrap_err();
        assert!(matches!(err, CombatError::MissingTarget(_)));
    }

    #[test]
    fn projectile_aims_at_target() {
        let skill = SkillSpec {
            name: "bolt".into(),
            range: 6,
            mp_cost: 0,
            cooldown_ticks: 0,
            cast_ticks: 0,
            hit_boxes: vec![HitBoxSpec::projectile(2.0, 4).with_delay(1)],
        };
        let target = Coordinate::planar(6, 4).unwrap();
        let boxes = HitBoxFactory::create_for_skill(&skill, &cast(Some(target)), ids(1)).unwrap();
        let v = boxes[0].velocity();
        assert_eq!(v.dx, 2.0);
        assert_eq!(v.dy, 1.0);
        assert_eq!(boxes[0].activation_tick(), WorldTick(11));
        assert_eq!(boxes[0].coordinate(), Coordinate::planar(2, 2).unwrap());
    }

    #[test]
    fn projectile_without_target_follows_facing() {
        let skill = SkillSpec {
            name: "bolt".into(),
            range: 6,
            mp_cost: 0,
            cooldown_ticks: 0,
            cast_ticks: 0,
            hit_boxes: vec![HitBoxSpec::projectile(1.0, 4)],
        };
        let boxes = HitBoxFactory::create_for_skill(&skill, &cast(None), ids(1)).unwrap();
        assert_eq!(boxes[0].velocity().dx, 1.0);
        assert_eq!(boxes[0].velocity().dy, 0.0);
    }

    #[test]
    fn batch_size_must_match() {
        let skill = SkillSpec {
            name: "double".into(),
            range: 1,
            mp_cost: 0,
            cooldown_ticks: 0,
            cast_ticks: 0,
            hit_boxes: vec![HitBoxSpec::melee(), HitBoxSpec::area(HitBoxShape::cross(1), 3, None)],
        };
        let target = Some(Coordinate::planar(3, 2).unwrap());
        assert!(matches!(
            HitBoxFactory::create_for_skill(&skill, &cast(target), ids(1)),
            Err(CombatError::IdBatchMismatch { expected: 2, got: 1 })
        ));
        let boxes = HitBoxFactory::create_for_skill(&skill, &cast(target), ids(2)).unwrap();
        assert_eq!(boxes[1].id(), HitBoxId::new(2).unwrap());
    }

    #[test]
    fn enrage_bonus_scales_power() {
        let mut c = cast(Some(Coordinate::planar(3, 2).unwrap()));
        c.power_bonus = 0.5;
        let boxes = HitBoxFactory::create_for_skill(&SkillSpec::basic_attack(), &c, ids(1)).unwrap();
        assert_eq!(boxes[0].power_multiplier(), 1.5);
    }
}
