use gw_core::{Coordinate, CoreError, ErrorKind, GatewayId, SpotId, WeatherType, WorldObjectId};

/// Alias for `Result<T, MapError>`.
pub type MapResult<T> = Result<T, MapError>;

/// Errors raised by map operations, pathfinding and weather.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapError {
    /// A value object failed validation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The grid description is malformed.
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    /// No tile exists at the coordinate.
    #[error("{spot_id} has no tile at {coordinate}")]
    TileNotFound {
        /// The map.
        spot_id: SpotId,
        /// The missing cell.
        coordinate: Coordinate,
    },

    /// The object is not on this map.
    #[error("{object_id} not found on {spot_id}")]
    ObjectNotFound {
        /// The map.
        spot_id: SpotId,
        /// The missing object.
        object_id: WorldObjectId,
    },

    /// An object with this id is already on the map.
    #[error("{0} already exists on the map")]
    DuplicateObject(WorldObjectId),

    /// A gateway with this id is already on the map.
    #[error("{0} already exists on the map")]
    DuplicateGateway(GatewayId),

    /// A blocking object already stands on the coordinate.
    #[error("{coordinate} is occupied by {occupant}")]
    Occupied {
        /// The contested cell.
        coordinate: Coordinate,
        /// The blocking object there.
        occupant: WorldObjectId,
    },

    /// The mover cannot enter the tile.
    #[error("{object_id} cannot enter {coordinate}")]
    Impassable {
        /// The mover.
        object_id: WorldObjectId,
        /// The refused cell.
        coordinate: Coordinate,
    },

    /// A step must go to a neighbouring cell.
    #[error("{from} and {to} are not adjacent")]
    NotAdjacent {
        /// Origin.
        from: Coordinate,
        /// Requested destination.
        to: Coordinate,
    },

    /// The step would leave the grid.
    #[error("moving from {0} leaves the grid")]
    OutOfBounds(Coordinate),

    /// The object has no actor component.
    #[error("{0} is not an actor")]
    NotActor(WorldObjectId),

    /// The object offers no interaction.
    #[error("{0} cannot be interacted with")]
    NotInteractable(WorldObjectId),

    /// The actor is too far from the interaction target.
    #[error("{actor} is out of reach of {target}")]
    OutOfReach {
        /// Interacting actor.
        actor: WorldObjectId,
        /// Target object.
        target: WorldObjectId,
    },

    /// The chest was already emptied.
    #[error("chest {0} is already open")]
    ChestAlreadyOpened(WorldObjectId),

    /// The resource node has no yields left.
    #[error("resource {0} is depleted")]
    ResourceDepleted(WorldObjectId),

    /// A door cannot close on an occupied cell.
    #[error("door {0} is obstructed")]
    DoorObstructed(WorldObjectId),

    /// The path request itself is unusable.
    #[error("invalid path request: {0}")]
    InvalidPathRequest(String),

    /// The search finished without reaching the goal.
    #[error("no path from {start} to {goal}")]
    PathNotFound {
        /// Start cell.
        start: Coordinate,
        /// Goal cell.
        goal: Coordinate,
    },

    /// The weather table does not allow the change.
    #[error("weather cannot change from {from} to {to}")]
    InvalidWeatherTransition {
        /// Current weather.
        from: WeatherType,
        /// Requested weather.
        to: WeatherType,
    },
}

impl MapError {
    /// The taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Core(e) => e.kind(),
            Self::InvalidGrid(_) => ErrorKind::Validation,
            Self::TileNotFound { .. } | Self::ObjectNotFound { .. } => ErrorKind::NotFound,
            Self::DuplicateObject(_) | Self::DuplicateGateway(_) => ErrorKind::State,
            Self::ChestAlreadyOpened(_) | Self::ResourceDepleted(_) => ErrorKind::State,
            Self::Occupied { .. }
            | Self::Impassable { .. }
            | Self::NotAdjacent { .. }
            | Self::OutOfBounds(_)
            | Self::NotActor(_)
            | Self::NotInteractable(_)
            | Self::OutOfReach { .. }
            | Self::DoorObstructed(_)
            | Self::InvalidPathRequest(_)
            | Self::PathNotFound { .. }
            | Self::InvalidWeatherTransition { .. } => ErrorKind::BusinessRule,
        }
    }
}
