//! Core types for Gitterwelt: the shared vocabulary of the simulation.
//!
//! This crate defines the value objects every other crate speaks in:
//! identifiers, grid coordinates and areas, terrain and movement rules,
//! combat stats, and the domain-event envelope. It has no notion of maps,
//! hit boxes or behaviour; those live in the crates layered on top.

/// Areas (sets of coordinates) used by gateways and spawn tables.
pub mod area;
/// Grid coordinates and compass directions.
pub mod coordinate;
/// Error taxonomy shared by all crates.
pub mod error;
/// Domain events and their envelope.
pub mod event;
/// Typed identifiers and the world tick.
pub mod id;
/// Enums shared across bounded contexts (behaviour states, dispositions, weather, races).
pub mod state;
/// Hit points, mana and combat stats.
pub mod stats;
/// Terrain types, movement capability and movement cost.
pub mod terrain;

/// Re-export of [`area::Area`].
pub use area::Area;
/// Re-exports of coordinate types.
pub use coordinate::{Coordinate, Direction};
/// Re-export error types.
pub use error::{CoreError, CoreResult, ErrorKind};
/// Re-export event types.
pub use event::{DomainEvent, EventType, HitBoxEndReason, WorldEventKind};
/// Re-export identifier types.
pub use id::{
    GatewayId, HitBoxId, ItemId, MonsterId, PackId, SpotId, TemplateId, WeatherZoneId,
    WorldObjectId, WorldTick,
};
/// Re-export shared enums.
pub use state::{BehaviorState, Disposition, Race, WeatherType};
/// Re-export stats value objects.
pub use stats::{BaseStats, Hp, Mp};
/// Re-export terrain types.
pub use terrain::{MovementCapability, MovementCost, TerrainType};
