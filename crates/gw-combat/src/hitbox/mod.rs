//! Hit boxes: shaped, possibly moving attack volumes.
//!
//! A hit box is created by [`HitBoxFactory`] when a skill is used, then
//! advanced and collision-tested every tick by
//! [`HitBoxCollisionDomainService`] until its duration elapses or a
//! collision policy ends it.

/// The hit box aggregate and its value objects.
pub mod aggregate;
/// Movement and collision under a per-tick check budget.
pub mod collision;
/// Substep bands and the collision budget.
pub mod config;
/// Hit boxes from skill use.
pub mod factory;
/// Relative cell footprints.
pub mod shape;

pub use aggregate::{
    Deferral, HitBoxAggregate, HitBoxSpawn, HitBoxVelocity, ObstacleCollisionPolicy, PrecisePosition,
    TargetCollisionPolicy,
};
pub use collision::{CollisionBudget, CollisionOutcome, CollisionReport, HitBoxCollisionDomainService};
pub use config::{HitBoxConfig, HitBoxConfigService};
pub use factory::{HitBoxFactory, SkillCast};
pub use shape::{HitBoxShape, RelativeCoordinate};
