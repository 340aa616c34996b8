//! Slalom-State: document-store persistence for slalom
//!
//! This crate provides the persistence layer for rosters, start lists and
//! results. Records are JSON documents addressed by `(collection, partition,
//! sort)` keys, mirroring a key/value store with partition range queries.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: per-record atomic writes and ordered partition scans. There are no
//! multi-record transactions; callers sequence their own writes.
//!
//! ## Key Components
//!
//! - `DocumentStore`: backend-agnostic async trait
//! - `MemoryDocumentStore`: in-memory fake for tests
//! - `SurrealDocumentStore`: SurrealDB backend (mem, surrealkv, or remote)

pub mod config;
mod error;
pub mod fakes;
mod migrations;
pub mod storage_traits;
pub mod surreal_store;

pub use config::StoreConfig;
pub use error::StorageError;
pub use storage_traits::{
    Collection, Document, DocumentStore, Page, PageRequest, PutCondition, RecordKey,
    StorageResult, DEFAULT_PAGE_SIZE,
};
pub use surreal_store::SurrealDocumentStore;
