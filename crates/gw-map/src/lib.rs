//! Physical maps for Gitterwelt.
//!
//! A [`PhysicalMapAggregate`] owns one spot's tile grid, the objects placed
//! on it and its gateways, and buffers the events its operations raise.
//! Around it sit the stateless services that read maps: line of sight,
//! pathfinding, weather evolution and gateway transition checks.

/// Map error type.
pub mod error;
/// Gateways between spots.
pub mod gateway;
/// Line rasterisation and visibility.
pub mod geometry;
/// The map aggregate.
pub mod map;
/// World objects and components.
pub mod object;
/// A* pathfinding and path smoothing.
pub mod pathfinding;
/// Map tiles.
pub mod tile;
/// Gateway transition conditions.
pub mod transition;
/// Weather zones and the weather transition table.
pub mod weather;

pub use error::{MapError, MapResult};
pub use gateway::Gateway;
pub use geometry::MapGeometryService;
pub use map::{InteractionOutcome, PhysicalMapAggregate};
pub use object::{
    ActorComponent, AutonomousBehaviorComponent, ChestComponent, DoorComponent,
    GroundItemComponent, HarvestableComponent, InteractableComponent, InteractionType,
    ObjectComponent, ObjectType, WorldObject,
};
pub use pathfinding::{AStarStrategy, PathOptions, PathSearch, PathfindingService, PathfindingStrategy};
pub use tile::Tile;
pub use transition::{
    TransitionCondition, TransitionConditionService, TransitionContext, TransitionDecision,
    TransitionPolicy, TransitionPolicyRepository, TransitionRelationChecker,
};
pub use weather::{WeatherSimulationService, WeatherZone};
