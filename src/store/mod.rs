//! Single-slot feed cache store
//!
//! The store keeps at most one snapshot of the feed. Every operation runs on a
//! private worker thread that owns the SQLite connection, so operations are
//! applied one at a time in the order they were submitted. Writes happen inside
//! a single transaction that is either committed whole or rolled back.

mod config;
mod feed_store;
mod repository;
pub mod schema;

pub use config::StoreConfig;
pub use feed_store::FeedCacheStore;
pub use repository::{CacheRepository, EmptySlot};

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{CachedFeed, LocalFeedImage};

/// Errors produced while opening or using a feed store
#[derive(Debug, Error)]
pub enum FeedStoreError {
    /// No record schema is registered under the requested model name
    #[error("record schema '{model_name}' not found")]
    SchemaNotFound { model_name: String },

    /// The storage engine could not open or prepare the store file
    #[error("cannot initialize store at {}: {source}", path.display())]
    StoreInitialization {
        path: PathBuf,
        #[source]
        source: InitError,
    },

    /// A read or write against an opened store failed
    #[error("storage access failed: {0}")]
    StorageAccess(#[from] rusqlite::Error),

    /// The worker that runs store operations is no longer running
    #[error("feed store execution context has shut down")]
    ExecutionContextClosed,
}

/// Why a store could not be initialized
#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("store schema version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: i64, supported: i64 },

    #[error("cannot start worker thread: {0}")]
    Worker(#[from] std::io::Error),
}

/// Outcome of a retrieval
#[derive(Debug)]
pub enum CacheState {
    /// No snapshot is stored
    Empty,
    /// The stored snapshot
    Found(CachedFeed),
    /// The store could not be read
    Failure(FeedStoreError),
}

impl CacheState {
    pub fn is_empty(&self) -> bool {
        matches!(self, CacheState::Empty)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, CacheState::Failure(_))
    }

    /// Returns the snapshot if one was found
    pub fn found(&self) -> Option<&CachedFeed> {
        match self {
            CacheState::Found(cached) => Some(cached),
            _ => None,
        }
    }

    pub fn into_result(self) -> Result<Option<CachedFeed>, FeedStoreError> {
        match self {
            CacheState::Empty => Ok(None),
            CacheState::Found(cached) => Ok(Some(cached)),
            CacheState::Failure(error) => Err(error),
        }
    }
}

impl From<Result<Option<CachedFeed>, FeedStoreError>> for CacheState {
    fn from(result: Result<Option<CachedFeed>, FeedStoreError>) -> Self {
        match result {
            Ok(None) => CacheState::Empty,
            Ok(Some(cached)) => CacheState::Found(cached),
            Err(error) => CacheState::Failure(error),
        }
    }
}

/// The contract a feed loader depends on
///
/// Implementations must apply operations in the order they are called and
/// resolve each call exactly once.
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// Reads the current snapshot without modifying the store
    async fn retrieve(&self) -> CacheState;

    /// Replaces the stored snapshot with `feed` captured at `timestamp`
    async fn insert(
        &self,
        feed: &[LocalFeedImage],
        timestamp: DateTime<Utc>,
    ) -> Result<(), FeedStoreError>;

    /// Removes the stored snapshot, succeeding if there is none
    async fn delete(&self) -> Result<(), FeedStoreError>;
}
