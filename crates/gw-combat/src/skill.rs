//! Skill definitions and the hit boxes they spawn.

use gw_core::MovementCapability;
use serde::{Deserialize, Serialize};

use crate::hitbox::{HitBoxShape, ObstacleCollisionPolicy, TargetCollisionPolicy};

/// Where a skill's hit box appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitBoxOrigin {
    /// On the target's cell.
    AtTarget,
    /// On the caster's cell, flying toward the target.
    FromCaster,
}

/// Template of one hit box spawned by a skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitBoxSpec {
    /// Covered cells.
    pub shape: HitBoxShape,
    /// Spawn point.
    pub origin: HitBoxOrigin,
    /// Cells per tick toward the target; 0 for stationary areas.
    #[serde(default)]
    pub speed: f64,
    /// Lifetime in ticks.
    pub duration: u64,
    /// Ticks between creation and the first collision check.
    #[serde(default)]
    pub activation_delay: u64,
    /// Damage scaling.
    #[serde(default = "one")]
    pub power_multiplier: f64,
    /// Obstacle behaviour.
    #[serde(default)]
    pub obstacle_policy: ObstacleCollisionPolicy,
    /// Target behaviour.
    #[serde(default)]
    pub target_policy: TargetCollisionPolicy,
    /// Terrain the hit box can cross.
    #[serde(default = "MovementCapability::projectile")]
    pub capability: MovementCapability,
    /// Clear the hit registry every N ticks.
    #[serde(default)]
    pub rehit_interval: Option<u64>,
}

fn one() -> f64 {
    1.0
}

impl HitBoxSpec {
    /// A one-tick strike on the target's cell.
    pub fn melee() -> Self {
        Self {
            shape: HitBoxShape::single_cell(),
            origin: HitBoxOrigin::AtTarget,
            speed: 0.0,
            duration: 1,
            activation_delay: 0,
            power_multiplier: 1.0,
            obstacle_policy: ObstacleCollisionPolicy::Deactivate,
            target_policy: TargetCollisionPolicy::KeepActive,
            capability: MovementCapability::projectile(),
            rehit_interval: None,
        }
    }

    /// A single-cell projectile that stops at the first target.
    pub fn projectile(speed: f64, duration: u64) -> Self {
        Self {
            origin: HitBoxOrigin::FromCaster,
            speed,
            duration,
            target_policy: TargetCollisionPolicy::Deactivate,
            ..Self::melee()
        }
    }

    /// A stationary area on the target that may hit repeatedly.
    pub fn area(shape: HitBoxShape, duration: u64, rehit_interval: Option<u64>) -> Self {
        Self {
            shape,
            duration,
            obstacle_policy: ObstacleCollisionPolicy::PassThrough,
            rehit_interval,
            ..Self::melee()
        }
    }

    /// Same spec with a different power.
    pub fn with_power(mut self, power_multiplier: f64) -> Self {
        self.power_multiplier = power_multiplier;
        self
    }

    /// Same spec with a delayed activation.
    pub fn with_delay(mut self, ticks: u64) -> Self {
        self.activation_delay = ticks;
        self
    }
}

/// A usable skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillSpec {
    /// Display name.
    pub name: String,
    /// Maximum Chebyshev distance to the target.
    pub range: u32,
    /// Mana cost.
    #[serde(default)]
    pub mp_cost: u32,
    /// Ticks before the skill can be used again.
    #[serde(default)]
    pub cooldown_ticks: u64,
    /// Ticks the caster is busy after using it.
    #[serde(default)]
    pub cast_ticks: u64,
    /// Hit boxes spawned on use.
    pub hit_boxes: Vec<HitBoxSpec>,
}

impl SkillSpec {
    /// A free adjacent melee strike.
    pub fn basic_attack() -> Self {
        Self {
            name: "attack".into(),
            range: 1,
            mp_cost: 0,
            cooldown_ticks: 1,
            cast_ticks: 1,
            hit_boxes: vec![HitBoxSpec::melee()],
        }
    }

    /// Whether a target `distance` cells away is in range.
    pub fn in_range(&self, distance: u32) -> bool {
        distance <= self.range
    }
}
