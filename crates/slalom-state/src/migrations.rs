//! SurrealDB schema initialization
//!
//! All record families share one `documents` table keyed by
//! `(collection, partition, sort_key)`.

use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::storage_traits::StorageResult;

/// Initialize the `documents` table in SurrealDB
///
/// Schema:
/// ```text
/// TABLE documents {
///   collection:  STRING
///   partition:   STRING
///   sort_key:    STRING
///   body:        OBJECT (flexible)
/// }
/// ```
///
/// Constraints:
/// - `(collection, partition, sort_key)` is unique
///
/// Safe to call multiple times (idempotent).
pub async fn init_schema(db: &Surreal<Any>) -> StorageResult<()> {
    info!("Initializing slalom SurrealDB schema");
    debug!("Initializing documents table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS documents SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS collection ON documents TYPE string;
        DEFINE FIELD IF NOT EXISTS partition ON documents TYPE string;
        DEFINE FIELD IF NOT EXISTS sort_key ON documents TYPE string;
        DEFINE FIELD IF NOT EXISTS body ON documents FLEXIBLE TYPE object;

        DEFINE INDEX IF NOT EXISTS idx_document_key ON TABLE documents
            COLUMNS collection, partition, sort_key UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_document_partition ON TABLE documents
            COLUMNS collection, partition;
    "#;

    db.query(sql)
        .await
        .map_err(|e| StorageError::SchemaSetup(e.to_string()))?
        .check()
        .map_err(|e| StorageError::SchemaSetup(e.to_string()))?;

    info!("slalom schema initialization complete");
    Ok(())
}
