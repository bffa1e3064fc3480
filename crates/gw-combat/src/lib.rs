//! Combat for Gitterwelt.
//!
//! Provides hit boxes (shaped attack volumes with substep collision
//! against terrain and actors), skills that spawn them, damage rolls,
//! threat tracking, and the monster aggregate with its templates and
//! spawn tables.

pub mod aggro;
pub mod damage;
pub mod error;
pub mod hitbox;
pub mod monster;
pub mod skill;

pub use aggro::{AggroEntry, AggroMemoryPolicy, AggroTable};
pub use damage::{DamageCalculator, DamageInput, DamageResult};
pub use error::{CombatError, CombatResult};
pub use hitbox::{
    CollisionBudget, CollisionOutcome, CollisionReport, Deferral, HitBoxAggregate, HitBoxCollisionDomainService,
    HitBoxConfig, HitBoxConfigService, HitBoxFactory, HitBoxShape, HitBoxSpawn, HitBoxVelocity,
    ObstacleCollisionPolicy, PrecisePosition, RelativeCoordinate, SkillCast, TargetCollisionPolicy,
};
pub use monster::{
    BehaviorProfile, DamageApplied, GrowthStage, GrowthStageDefinition, LootEntry, Monster,
    MonsterStatus, MonsterTemplate, SpawnEntry, SpawnTable, TargetPriority,
};
pub use skill::{HitBoxOrigin, HitBoxSpec, SkillSpec};
