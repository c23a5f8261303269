use wtstat_core::error::StoreError;
use wtstat_core::mission::TransitionError;
use wtstat_core::quota::Rejection;
use wtstat_core::types::MissionId;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Refused before any mission was created.
    #[error("Rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Mission not found: {0}")]
    MissionNotFound(MissionId),

    /// A terminal status was already written for this mission.
    #[error("Mission {0} is already finalized")]
    AlreadyFinalized(MissionId),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl EngineError {
    /// The rejection carried by this error, if it is one.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}
