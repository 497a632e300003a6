use thiserror::Error;

/// Failures reported by the simulation core
///
/// Every failure is logged where it is detected; callers are free to drop the error
/// and carry on, the operation that produced it has already been abandoned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TankError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl TankError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::warn!("{}", message);
        TankError::InvalidArgument(message)
    }
}
