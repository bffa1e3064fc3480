use gw_combat::CombatError;
use gw_core::{CoreError, ErrorKind, WorldObjectId};
use gw_map::MapError;

/// Alias for `Result<T, BehaviorError>`.
pub type BehaviorResult<T> = Result<T, BehaviorError>;

/// Errors raised while observing or deciding.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BehaviorError {
    /// A value object failed validation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A map lookup failed.
    #[error(transparent)]
    Map(#[from] MapError),

    /// A combat rule was violated.
    #[error(transparent)]
    Combat(#[from] CombatError),

    /// The object has no actor component.
    #[error("{0} is not an actor")]
    NotActor(WorldObjectId),

    /// The object has no autonomous behaviour.
    #[error("{0} has no autonomous behaviour")]
    NotAutonomous(WorldObjectId),
}

impl BehaviorError {
    /// The taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Core(e) => e.kind(),
            Self::Map(e) => e.kind(),
            Self::Combat(e) => e.kind(),
            Self::NotActor(_) | Self::NotAutonomous(_) => ErrorKind::State,
        }
    }
}
