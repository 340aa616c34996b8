//! Storage trait definitions for slalom
//!
//! The store is a partitioned document store:
//! - every record lives in a `Collection`
//! - records are addressed by `(partition, sort)` keys
//! - a partition can be range-queried in ascending sort order, one page at a time
//!
//! There are no multi-record transactions. Each `put` is atomic on its own and
//! may carry a `PutCondition`. In-memory fakes are provided for testing via the
//! `fakes` module.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Default number of documents returned per page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Record families known to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Teams,
    Racers,
    Races,
    Roster,
    StartList,
    Results,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Teams => "teams",
            Collection::Racers => "racers",
            Collection::Races => "races",
            Collection::Roster => "roster",
            Collection::StartList => "start_list",
            Collection::Results => "results",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite key of a stored record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub partition: String,
    pub sort: String,
}

impl RecordKey {
    pub fn new(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: sort.into(),
        }
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.partition, self.sort)
    }
}

/// A stored record: key plus JSON body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub key: RecordKey,
    pub body: serde_json::Value,
}

impl Document {
    /// Encode a serializable value as a document body.
    pub fn encode<T: Serialize>(key: RecordKey, value: &T) -> StorageResult<Self> {
        Ok(Self {
            key,
            body: serde_json::to_value(value)?,
        })
    }

    /// Decode the body into a typed record.
    pub fn decode<T: DeserializeOwned>(&self) -> StorageResult<T> {
        Ok(serde_json::from_value(self.body.clone())?)
    }
}

/// Precondition attached to a put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PutCondition {
    /// Unconditional upsert.
    #[default]
    Always,
    /// Fails with `ConditionFailed` if a record with the key exists.
    MustNotExist,
    /// Fails with `ConditionFailed` if no record with the key exists.
    MustExist,
}

/// Cursor-based page request. `after` is the last sort key of the previous page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub after: Option<String>,
    pub limit: usize,
}

impl PageRequest {
    pub fn first(limit: usize) -> Self {
        Self {
            after: None,
            limit: limit.max(1),
        }
    }

    pub fn after(cursor: impl Into<String>, limit: usize) -> Self {
        Self {
            after: Some(cursor.into()),
            limit: limit.max(1),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

/// One page of a partition query.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub documents: Vec<Document>,
    /// Cursor for the next page, `None` when the partition is exhausted.
    pub next: Option<String>,
}

/// Partitioned document store.
///
/// Guarantees:
/// - `put` replaces the whole body of the keyed record.
/// - `query` returns documents of one partition in ascending sort-key order.
/// - `delete` of an absent key is a no-op.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a record by key.
    async fn get(&self, collection: Collection, key: &RecordKey)
        -> StorageResult<Option<Document>>;

    /// Write a record, honouring `condition`.
    async fn put(
        &self,
        collection: Collection,
        document: Document,
        condition: PutCondition,
    ) -> StorageResult<()>;

    /// Delete a record by key. No-op if absent.
    async fn delete(&self, collection: Collection, key: &RecordKey) -> StorageResult<()>;

    /// Range-query one partition.
    async fn query(
        &self,
        collection: Collection,
        partition: &str,
        page: PageRequest,
    ) -> StorageResult<Page>;

    /// Drain every page of a partition.
    async fn query_all(
        &self,
        collection: Collection,
        partition: &str,
        page_size: usize,
    ) -> StorageResult<Vec<Document>> {
        let mut out = Vec::new();
        let mut request = PageRequest::first(page_size);
        loop {
            let page = self.query(collection, partition, request).await?;
            out.extend(page.documents);
            match page.next {
                Some(cursor) => request = PageRequest::after(cursor, page_size),
                None => break,
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl<S> DocumentStore for std::sync::Arc<S>
where
    S: DocumentStore + ?Sized,
{
    async fn get(
        &self,
        collection: Collection,
        key: &RecordKey,
    ) -> StorageResult<Option<Document>> {
        (**self).get(collection, key).await
    }

    async fn put(
        &self,
        collection: Collection,
        document: Document,
        condition: PutCondition,
    ) -> StorageResult<()> {
        (**self).put(collection, document, condition).await
    }

    async fn delete(&self, collection: Collection, key: &RecordKey) -> StorageResult<()> {
        (**self).delete(collection, key).await
    }

    async fn query(
        &self,
        collection: Collection,
        partition: &str,
        page: PageRequest,
    ) -> StorageResult<Page> {
        (**self).query(collection, partition, page).await
    }
}
