//! SurrealDB-backed DocumentStore implementation
//!
//! Every record is one row of the `documents` table. The JSON body is stored
//! as a flexible object and converted to/from `storage_traits::Document` at the
//! boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::{Database, Root};
use surrealdb::Surreal;
use tracing::{debug, info, instrument};

use crate::config::{StoreConfig, DEFAULT_DATABASE, DEFAULT_LOCAL_PATH, DEFAULT_NAMESPACE};
use crate::error::StorageError;
use crate::migrations;
use crate::storage_traits::{
    Collection, Document, DocumentStore, Page, PageRequest, PutCondition, RecordKey,
    StorageResult,
};

/// Row shape of the `documents` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DbDocument {
    collection: String,
    partition: String,
    sort_key: String,
    body: serde_json::Value,
}

impl DbDocument {
    fn from_document(collection: Collection, document: Document) -> Self {
        Self {
            collection: collection.as_str().to_string(),
            partition: document.key.partition,
            sort_key: document.key.sort,
            body: document.body,
        }
    }

    fn into_document(self) -> Document {
        Document {
            key: RecordKey::new(self.partition, self.sort_key),
            body: self.body,
        }
    }
}

const SELECT_ONE: &str = "SELECT collection, partition, sort_key, body FROM documents \
     WHERE collection = $c AND partition = $p AND sort_key = $s";

/// SurrealDB-backed implementation of [`DocumentStore`].
#[derive(Clone)]
pub struct SurrealDocumentStore {
    db: Surreal<Any>,
}

impl SurrealDocumentStore {
    /// Create an in-memory instance for testing.
    ///
    /// Connects to `mem://`, selects `slalom/main`, and runs `init_schema`.
    pub async fn in_memory() -> StorageResult<Self> {
        Self::connect_url("mem://").await
    }

    /// Connect to an unauthenticated URL (`mem://`, `surrealkv://path`, `ws://host`).
    #[instrument(skip_all, fields(url = %url))]
    pub async fn connect_url(url: &str) -> StorageResult<Self> {
        let db = surrealdb::engine::any::connect(url)
            .await
            .map_err(|e| StorageError::Connection(format!("Failed to connect to {url}: {e}")))?;

        db.use_ns(DEFAULT_NAMESPACE)
            .use_db(DEFAULT_DATABASE)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        migrations::init_schema(&db).await?;
        info!("SurrealDocumentStore connected ({})", url);
        Ok(Self { db })
    }

    /// Connect with credentials.
    #[instrument(
        skip(config),
        fields(
            endpoint = %config.endpoint,
            namespace = %config.namespace,
            database = %config.database
        )
    )]
    pub async fn connect(config: &StoreConfig) -> StorageResult<Self> {
        let db = surrealdb::engine::any::connect(&config.endpoint)
            .await
            .map_err(|e| {
                StorageError::Connection(format!("Failed to connect to {}: {e}", config.endpoint))
            })?;

        if config.is_root {
            db.signin(Root {
                username: &config.username,
                password: &config.password,
            })
            .await
            .map_err(|e| StorageError::Connection(format!("Root auth failed: {e}")))?;
        } else {
            db.signin(Database {
                namespace: &config.namespace,
                database: &config.database,
                username: &config.username,
                password: &config.password,
            })
            .await
            .map_err(|e| StorageError::Connection(format!("DB auth failed: {e}")))?;
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        migrations::init_schema(&db).await?;
        info!("SurrealDocumentStore connected (authenticated)");
        Ok(Self { db })
    }

    /// Create from environment variables.
    ///
    /// Resolution order:
    /// 1. `StoreConfig::from_env()` (SURREALDB_ENDPOINT + credentials)
    /// 2. `SURREALDB_URL`
    /// 3. local persistence in `.slalom/db`
    pub async fn from_env() -> StorageResult<Self> {
        if let Ok(config) = StoreConfig::from_env() {
            return Self::connect(&config).await;
        }

        if let Ok(url) = std::env::var("SURREALDB_URL") {
            return Self::connect_url(&url).await;
        }

        std::fs::create_dir_all(DEFAULT_LOCAL_PATH).map_err(|e| {
            StorageError::Connection(format!(
                "Failed to create database directory {}: {}",
                DEFAULT_LOCAL_PATH, e
            ))
        })?;
        let url = format!("surrealkv://{}", DEFAULT_LOCAL_PATH);
        info!(
            "No endpoint or SURREALDB_URL found, using local persistence: {}",
            url
        );
        Self::connect_url(&url).await
    }

    // -- private helpers -----------------------------------------------------

    async fn fetch_row(
        &self,
        collection: Collection,
        key: &RecordKey,
    ) -> StorageResult<Option<DbDocument>> {
        let mut res = self
            .db
            .query(SELECT_ONE)
            .bind(("c", collection.as_str()))
            .bind(("p", key.partition.clone()))
            .bind(("s", key.sort.clone()))
            .await?;

        let rows: Vec<DbDocument> = res.take(0)?;
        Ok(rows.into_iter().next())
    }

    fn condition_failed(collection: Collection, key: RecordKey) -> StorageError {
        StorageError::ConditionFailed {
            collection,
            partition: key.partition,
            sort: key.sort,
        }
    }
}

#[async_trait]
impl DocumentStore for SurrealDocumentStore {
    async fn get(
        &self,
        collection: Collection,
        key: &RecordKey,
    ) -> StorageResult<Option<Document>> {
        Ok(self
            .fetch_row(collection, key)
            .await?
            .map(DbDocument::into_document))
    }

    async fn put(
        &self,
        collection: Collection,
        document: Document,
        condition: PutCondition,
    ) -> StorageResult<()> {
        let key = document.key.clone();
        debug!(collection = %collection, key = %key, ?condition, "put document");

        match condition {
            PutCondition::Always => {
                let row = DbDocument::from_document(collection, document);
                self.db
                    .query(
                        "BEGIN TRANSACTION; \
                         DELETE documents WHERE collection = $c AND partition = $p AND sort_key = $s; \
                         CREATE documents CONTENT $row; \
                         COMMIT TRANSACTION;",
                    )
                    .bind(("c", collection.as_str()))
                    .bind(("p", key.partition))
                    .bind(("s", key.sort))
                    .bind(("row", row))
                    .await?
                    .check()?;
            }
            PutCondition::MustNotExist => {
                if self.fetch_row(collection, &key).await?.is_some() {
                    return Err(Self::condition_failed(collection, key));
                }
                let row = DbDocument::from_document(collection, document);
                // The unique index rejects a concurrent writer that slipped in.
                self.db
                    .query("CREATE documents CONTENT $row")
                    .bind(("row", row))
                    .await?
                    .check()
                    .map_err(|_| Self::condition_failed(collection, key))?;
            }
            PutCondition::MustExist => {
                if self.fetch_row(collection, &key).await?.is_none() {
                    return Err(Self::condition_failed(collection, key));
                }
                self.db
                    .query(
                        "UPDATE documents SET body = $body \
                         WHERE collection = $c AND partition = $p AND sort_key = $s",
                    )
                    .bind(("body", document.body))
                    .bind(("c", collection.as_str()))
                    .bind(("p", key.partition))
                    .bind(("s", key.sort))
                    .await?
                    .check()?;
            }
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, key: &RecordKey) -> StorageResult<()> {
        self.db
            .query("DELETE documents WHERE collection = $c AND partition = $p AND sort_key = $s")
            .bind(("c", collection.as_str()))
            .bind(("p", key.partition.clone()))
            .bind(("s", key.sort.clone()))
            .await?
            .check()?;
        Ok(())
    }

    async fn query(
        &self,
        collection: Collection,
        partition: &str,
        page: PageRequest,
    ) -> StorageResult<Page> {
        // Fetch one extra row to learn whether another page exists.
        let fetch = page.limit + 1;
        let mut res = match &page.after {
            Some(cursor) => {
                let sql = format!(
                    "SELECT collection, partition, sort_key, body FROM documents \
                     WHERE collection = $c AND partition = $p AND sort_key > $after \
                     ORDER BY sort_key ASC LIMIT {fetch}"
                );
                self.db
                    .query(sql)
                    .bind(("c", collection.as_str()))
                    .bind(("p", partition.to_string()))
                    .bind(("after", cursor.clone()))
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT collection, partition, sort_key, body FROM documents \
                     WHERE collection = $c AND partition = $p \
                     ORDER BY sort_key ASC LIMIT {fetch}"
                );
                self.db
                    .query(sql)
                    .bind(("c", collection.as_str()))
                    .bind(("p", partition.to_string()))
                    .await?
            }
        };

        let rows: Vec<DbDocument> = res.take(0)?;
        let mut documents: Vec<Document> =
            rows.into_iter().map(DbDocument::into_document).collect();

        let next = if documents.len() > page.limit {
            documents.truncate(page.limit);
            documents.last().map(|d| d.key.sort.clone())
        } else {
            None
        };

        Ok(Page { documents, next })
    }
}
