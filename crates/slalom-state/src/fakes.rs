//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemoryDocumentStore` that satisfies the `DocumentStore` contract
//! without any external dependencies.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::storage_traits::*;

type Slot = (Collection, String, String);

/// In-memory document store backed by a `BTreeMap<(collection, partition, sort), body>`.
///
/// The ordered map gives partition range queries for free.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    docs: Mutex<BTreeMap<Slot, serde_json::Value>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored documents across all collections.
    pub fn len(&self) -> usize {
        self.docs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn slot(collection: Collection, key: &RecordKey) -> Slot {
    (collection, key.partition.clone(), key.sort.clone())
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(
        &self,
        collection: Collection,
        key: &RecordKey,
    ) -> StorageResult<Option<Document>> {
        let docs = self.docs.lock().unwrap();
        Ok(docs.get(&slot(collection, key)).map(|body| Document {
            key: key.clone(),
            body: body.clone(),
        }))
    }

    async fn put(
        &self,
        collection: Collection,
        document: Document,
        condition: PutCondition,
    ) -> StorageResult<()> {
        let mut docs = self.docs.lock().unwrap();
        let slot = slot(collection, &document.key);
        let exists = docs.contains_key(&slot);
        let violated = match condition {
            PutCondition::Always => false,
            PutCondition::MustNotExist => exists,
            PutCondition::MustExist => !exists,
        };
        if violated {
            return Err(StorageError::ConditionFailed {
                collection,
                partition: document.key.partition,
                sort: document.key.sort,
            });
        }
        docs.insert(slot, document.body);
        Ok(())
    }

    async fn delete(&self, collection: Collection, key: &RecordKey) -> StorageResult<()> {
        let mut docs = self.docs.lock().unwrap();
        docs.remove(&slot(collection, key));
        Ok(())
    }

    async fn query(
        &self,
        collection: Collection,
        partition: &str,
        page: PageRequest,
    ) -> StorageResult<Page> {
        let docs = self.docs.lock().unwrap();
        let lower = match &page.after {
            Some(cursor) => Bound::Excluded((collection, partition.to_string(), cursor.clone())),
            None => Bound::Included((collection, partition.to_string(), String::new())),
        };

        let mut documents: Vec<Document> = docs
            .range((lower, Bound::Unbounded))
            .take_while(|((c, p, _), _)| *c == collection && p == partition)
            .take(page.limit + 1)
            .map(|((_, p, s), body)| Document {
                key: RecordKey::new(p.clone(), s.clone()),
                body: body.clone(),
            })
            .collect();

        // One extra row tells us whether another page exists.
        let next = if documents.len() > page.limit {
            documents.truncate(page.limit);
            documents.last().map(|d| d.key.sort.clone())
        } else {
            None
        };

        Ok(Page { documents, next })
    }
}
