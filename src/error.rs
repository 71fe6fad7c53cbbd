use thiserror::Error;

use crate::model::BucketId;

/// Why a well-formed action had no effect on the current state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("the {capacity}L bucket is already full")]
    AlreadyFull { capacity: u32 },
    #[error("the {capacity}L bucket is already empty")]
    AlreadyEmpty { capacity: u32 },
    #[error("the source bucket ({capacity}L) is empty")]
    SourceEmpty { capacity: u32 },
    #[error("the destination bucket ({capacity}L) is already full")]
    DestinationFull { capacity: u32 },
    #[error("cannot pour the {capacity}L bucket into itself")]
    SameBucket { capacity: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("invalid bucket: {0}")]
    InvalidBucketReference(BucketId),
    #[error("invalid difficulty: {0:?}")]
    InvalidPreset(String),
    #[error("{0}")]
    NoOpRejection(Rejection),
    #[error("invalid puzzle configuration: {0}")]
    InvalidConfiguration(String),
}

impl GameError {
    /// True when the action was valid but simply had nothing to do.
    pub fn is_no_op(&self) -> bool {
        matches!(self, GameError::NoOpRejection(_))
    }
}

impl From<Rejection> for GameError {
    fn from(rejection: Rejection) -> Self {
        GameError::NoOpRejection(rejection)
    }
}

pub type GameResult<T> = Result<T, GameError>;
