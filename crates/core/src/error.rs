use thiserror::Error;

use crate::UserId;

#[derive(Error, Debug)]
pub enum RotaError {
    #[error("participant {0} is already on the roster")]
    AlreadyExists(UserId),

    #[error("participant {0} is not on the roster")]
    NotFound(UserId),

    #[error("vacation start date is after the end date")]
    InvalidRange,

    #[error("vacation overlaps an existing interval")]
    Overlap,

    #[error("vacation index {0} is out of range")]
    OutOfRange(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl RotaError {
    /// Whether this error is a user-facing validation rejection, as opposed
    /// to a persistence failure that must not be reported as success.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RotaError::AlreadyExists(_)
                | RotaError::NotFound(_)
                | RotaError::InvalidRange
                | RotaError::Overlap
                | RotaError::OutOfRange(_)
        )
    }
}
