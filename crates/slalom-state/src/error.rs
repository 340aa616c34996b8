//! Error types for slalom-state

use thiserror::Error;

use crate::storage_traits::Collection;

/// Errors that can occur in the persistence layer
#[derive(Error, Debug)]
pub enum StorageError {
    /// A conditional put did not hold (record existed / was missing)
    #[error("condition failed on {collection}/{partition}/{sort}")]
    ConditionFailed {
        collection: Collection,
        partition: String,
        sort: String,
    },

    /// Database connection error
    #[error("database connection failed: {0}")]
    Connection(String),

    /// Backend query or write error
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Document body could not be encoded or decoded
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Schema setup error
    #[error("schema setup failed: {0}")]
    SchemaSetup(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<surrealdb::Error> for StorageError {
    fn from(err: surrealdb::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_failed_names_the_key() {
        let err = StorageError::ConditionFailed {
            collection: Collection::Roster,
            partition: "race-1#team-1".to_string(),
            sort: "racer-9".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("roster"));
        assert!(msg.contains("race-1#team-1"));
        assert!(msg.contains("racer-9"));
    }

    #[test]
    fn serde_errors_convert() {
        let bad = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err: StorageError = bad.into();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
