//! Error types for the combat layer.

use gw_core::{CoreError, ErrorKind, HitBoxId, MonsterId, WorldTick};
use gw_map::MapError;

/// Errors that can occur during combat operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CombatError {
    /// A value object failed validation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A map operation failed.
    #[error(transparent)]
    Map(#[from] MapError),

    /// A hit box was described with invalid parameters.
    #[error("invalid hit box: {0}")]
    InvalidHitBox(String),

    /// A shape has no cells or bad dimensions.
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// A configuration value is out of range.
    #[error("invalid combat config: {0}")]
    InvalidConfig(String),

    /// The hit box no longer takes part in collisions.
    #[error("hit box {0} is inactive")]
    HitBoxInactive(HitBoxId),

    /// The monster is dead.
    #[error("monster {0} is dead")]
    MonsterDead(MonsterId),

    /// The monster has no skill in that slot.
    #[error("monster {monster_id} has no skill in slot {slot}")]
    SkillNotFound {
        /// The monster.
        monster_id: MonsterId,
        /// Requested slot.
        slot: usize,
    },

    /// The skill is still cooling down.
    #[error("skill slot {slot} of {monster_id} is ready at {ready_at}")]
    SkillOnCooldown {
        /// The monster.
        monster_id: MonsterId,
        /// Requested slot.
        slot: usize,
        /// First tick the skill can be used again.
        ready_at: WorldTick,
    },

    /// Not enough mana for the skill.
    #[error("{monster_id} needs {required} mp but has {available}")]
    InsufficientMp {
        /// The monster.
        monster_id: MonsterId,
        /// Cost of the skill.
        required: u32,
        /// Mana available.
        available: u32,
    },

    /// A skill needs a target position that was not supplied.
    #[error("skill '{0}' needs a target")]
    MissingTarget(String),

    /// The id batch does not match the number of hit boxes to create.
    #[error("expected {expected} hit box ids, got {got}")]
    IdBatchMismatch {
        /// Hit boxes to create.
        expected: usize,
        /// Ids supplied.
        got: usize,
    },
}

impl CombatError {
    /// The taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Core(e) => e.kind(),
            Self::Map(e) => e.kind(),
            Self::InvalidHitBox(_)
            | Self::InvalidShape(_)
            | Self::InvalidConfig(_)
            | Self::IdBatchMismatch { .. } => ErrorKind::Validation,
            Self::HitBoxInactive(_) | Self::MonsterDead(_) => ErrorKind::State,
            Self::SkillNotFound { .. } => ErrorKind::NotFound,
            Self::SkillOnCooldown { .. } | Self::InsufficientMp { .. } | Self::MissingTarget(_) => {
                ErrorKind::BusinessRule
            }
        }
    }
}

/// Convenience result type for combat operations.
pub type CombatResult<T> = Result<T, CombatError>;
