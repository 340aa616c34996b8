//! Domain-level error taxonomy for slalom.

use slalom_state::StorageError;

use super::class::{Gender, RacerClass};

/// Slalom domain errors.
///
/// Every variant except `Storage` is raised before any write, so the store is
/// left unchanged.
#[derive(Debug, thiserror::Error)]
pub enum SlalomError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("{gender} {class} is full (limit {limit})")]
    CapacityExceeded {
        gender: Gender,
        class: RacerClass,
        limit: usize,
    },

    #[error("racer {racer_id} is provisional and can only be Provisional or DNS")]
    ProvisionalLocked { racer_id: String },

    #[error("race {race_id} is locked")]
    RaceLocked { race_id: String },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("racer {racer_id} is already on the {team_id} roster for race {race_id}")]
    DuplicateEntry {
        race_id: String,
        team_id: String,
        racer_id: String,
    },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SlalomError {
    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        SlalomError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Result type for slalom domain operations.
pub type Result<T> = std::result::Result<T, SlalomError>;
