use gw_behavior::BehaviorError;
use gw_combat::CombatError;
use gw_core::{CoreError, ErrorKind, MonsterId, SpotId, TemplateId};
use gw_map::MapError;

/// Alias for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;

/// Errors that can occur during simulation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    /// A value object failed validation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A map operation failed.
    #[error(transparent)]
    Map(#[from] MapError),

    /// A combat operation failed.
    #[error(transparent)]
    Combat(#[from] CombatError),

    /// Perception or behaviour failed.
    #[error(transparent)]
    Behavior(#[from] BehaviorError),

    /// No map is stored for the spot.
    #[error("no map stored for {0}")]
    MapNotFound(SpotId),

    /// No monster with this id.
    #[error("monster {0} not found")]
    MonsterNotFound(MonsterId),

    /// No template with this id.
    #[error("template {0} not found")]
    TemplateNotFound(TemplateId),

    /// `begin` was called inside an open transaction.
    #[error("a transaction is already open")]
    TransactionActive,

    /// `commit` was called without an open transaction.
    #[error("no transaction is open")]
    NoTransaction,

    /// An unanticipated failure caught at a handler or system boundary.
    #[error("{context}: {source}")]
    System {
        /// Where it was caught.
        context: String,
        /// The original error.
        source: Box<SimError>,
    },
}

impl SimError {
    /// Wrap `source` as a system error unless it is an expected domain failure.
    pub fn system(context: impl Into<String>, source: SimError) -> Self {
        if source.kind().is_recoverable() || matches!(source, Self::System { .. }) {
            return source;
        }
        Self::System {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// The taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Core(e) => e.kind(),
            Self::Map(e) => e.kind(),
            Self::Combat(e) => e.kind(),
            Self::Behavior(e) => e.kind(),
            Self::MapNotFound(_) | Self::MonsterNotFound(_) | Self::TemplateNotFound(_) => ErrorKind::NotFound,
            Self::TransactionActive | Self::NoTransaction => ErrorKind::State,
            Self::System { .. } => ErrorKind::System,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_wraps_only_unexpected_errors() {
        let spot = SpotId::new(3).unwrap();
        let stale = SimError::system("hit handler", SimError::MapNotFound(spot));
        assert_eq!(stale, SimError::MapNotFound(spot));

        let broken = SimError::system("hit handler", CoreError::validation("bad id").into());
        assert_eq!(broken.kind(), ErrorKind::System);
        assert_eq!(broken.to_string(), "hit handler: validation error: bad id");

        let again = SimError::system("outer", broken.clone());
        assert_eq!(again, broken);
    }
}
