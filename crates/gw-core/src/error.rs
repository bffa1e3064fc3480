/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Coarse classification of every error raised in the simulation.
///
/// Callers use it to decide whether to skip the failing unit of work
/// (`BusinessRule`, `State`, `NotFound`), reject input (`Validation`) or
/// surface the failure unchanged (`System`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A value object was malformed at construction.
    Validation,
    /// A domain rule refused the operation (insufficient MP, illegal transition).
    BusinessRule,
    /// The aggregate is in the wrong state for the operation.
    State,
    /// A referenced aggregate or object no longer exists.
    NotFound,
    /// An unanticipated failure.
    System,
}

impl ErrorKind {
    /// Returns true for failures a tick loop may skip and continue past.
    pub fn is_recoverable(self) -> bool {
        matches!(self, Self::BusinessRule | Self::State | Self::NotFound)
    }
}

/// Errors raised while building core value objects.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    /// A value object was constructed from invalid input.
    #[error("validation error: {0}")]
    Validation(String),
}

impl CoreError {
    /// Build a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// The taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
        }
    }
}
