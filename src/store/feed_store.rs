//! SQLite-backed feed store running on a private worker thread

use std::future::Future;
use std::thread;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::repository::CacheRepository;
use super::schema::{self, RecordSchema};
use super::{CacheState, FeedStore, FeedStoreError, InitError, StoreConfig};
use crate::model::{CacheRecord, FeedImageRecord, LocalFeedImage};

/// A unit of work executed on the store's worker thread
type Job = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

/// Persistent single-slot cache for the feed
///
/// The SQLite connection is owned by a dedicated worker thread. `retrieve`,
/// `insert` and `delete` enqueue their work as soon as they are called and
/// return a future for the outcome, so operations run in call order even if
/// the returned futures are awaited in a different order. Dropping a returned
/// future does not cancel the operation.
pub struct FeedCacheStore {
    jobs: mpsc::UnboundedSender<Job>,
    worker: thread::JoinHandle<()>,
}

impl FeedCacheStore {
    /// Opens the store described by `config`, creating the file if needed
    ///
    /// # Errors
    /// * `SchemaNotFound` if `config.model_name` names no known record schema
    /// * `StoreInitialization` if the file cannot be opened or prepared
    pub fn open(config: StoreConfig) -> Result<Self, FeedStoreError> {
        let schema = schema::resolve(&config.model_name)?;
        let conn = open_connection(&config, schema).map_err(|source| {
            FeedStoreError::StoreInitialization {
                path: config.store_path.clone(),
                source,
            }
        })?;

        let (jobs, queue) = mpsc::unbounded_channel();
        let worker = thread::Builder::new()
            .name("feed-cache-store".to_string())
            .spawn(move || run_worker(conn, queue))
            .map_err(|e| FeedStoreError::StoreInitialization {
                path: config.store_path.clone(),
                source: InitError::Worker(e),
            })?;

        info!(path = %config.store_path.display(), model = schema.model_name, "feed store opened");
        Ok(Self { jobs, worker })
    }

    /// Reads the current snapshot
    pub fn retrieve(&self) -> impl Future<Output = CacheState> + Send + 'static {
        let pending = self.submit(|conn| {
            // Read inside a transaction so the slot and its images come from one snapshot
            let tx = conn.transaction()?;
            let record = CacheRepository::new(&tx).find()?;
            Ok(record.map(CacheRecord::into_cached_feed))
        });

        async move {
            let state = CacheState::from(pending.await);
            if let CacheState::Failure(error) = &state {
                warn!(%error, "feed cache retrieval failed");
            }
            state
        }
    }

    /// Replaces the stored snapshot with `feed` at `timestamp`
    ///
    /// The previous snapshot is removed and the new one written in a single
    /// transaction. On failure the transaction is rolled back, leaving the
    /// previous snapshot in place.
    pub fn insert(
        &self,
        feed: &[LocalFeedImage],
        timestamp: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), FeedStoreError>> + Send + 'static {
        let images: Vec<FeedImageRecord> = feed.iter().map(FeedImageRecord::from).collect();

        self.submit(move |conn| {
            in_change_set(conn, "insert", |repository| {
                debug!(images = images.len(), %timestamp, "replacing cached feed");
                repository
                    .get_or_create_unique_slot()?
                    .populate(&images, timestamp)
            })
        })
    }

    /// Removes the stored snapshot; succeeds when there is none
    pub fn delete(&self) -> impl Future<Output = Result<(), FeedStoreError>> + Send + 'static {
        self.submit(|conn| {
            in_change_set(conn, "delete", |repository| {
                let removed = repository.delete_existing()?;
                debug!(removed, "deleted cached feed");
                Ok(())
            })
        })
    }

    /// Stops accepting work, waits for queued operations to finish and closes the store
    pub async fn shutdown(self) -> Result<(), FeedStoreError> {
        let Self { jobs, worker } = self;
        drop(jobs);

        let joined = tokio::task::spawn_blocking(move || worker.join())
            .await
            .map_err(|_| FeedStoreError::ExecutionContextClosed)?;
        joined.map_err(|_| FeedStoreError::ExecutionContextClosed)?;

        info!("feed store closed");
        Ok(())
    }

    /// Queues `operation` on the worker and returns a future for its result
    fn submit<T, F>(
        &self,
        operation: F,
    ) -> impl Future<Output = Result<T, FeedStoreError>> + Send + 'static
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, FeedStoreError> + Send + 'static,
    {
        let (done, outcome) = oneshot::channel();
        let job: Job = Box::new(move |conn| {
            // The caller may have stopped waiting; the operation still ran
            let _ = done.send(operation(conn));
        });
        let queued = self.jobs.send(job).is_ok();

        async move {
            if !queued {
                return Err(FeedStoreError::ExecutionContextClosed);
            }
            outcome
                .await
                .unwrap_or(Err(FeedStoreError::ExecutionContextClosed))
        }
    }
}

#[async_trait]
impl FeedStore for FeedCacheStore {
    async fn retrieve(&self) -> CacheState {
        FeedCacheStore::retrieve(self).await
    }

    async fn insert(
        &self,
        feed: &[LocalFeedImage],
        timestamp: DateTime<Utc>,
    ) -> Result<(), FeedStoreError> {
        FeedCacheStore::insert(self, feed, timestamp).await
    }

    async fn delete(&self) -> Result<(), FeedStoreError> {
        FeedCacheStore::delete(self).await
    }
}

fn open_connection(config: &StoreConfig, schema: &RecordSchema) -> Result<Connection, InitError> {
    let conn = Connection::open(&config.store_path)?;
    conn.busy_timeout(config.busy_timeout)?;
    // Locks taken by this connection are held until it closes
    let locking_mode: String =
        conn.pragma_update_and_check(None, "locking_mode", "EXCLUSIVE", |row| row.get(0))?;
    conn.pragma_update(None, "foreign_keys", true)?;
    let journal_mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    schema.apply(&conn)?;

    // Take the write lock now so a second store on the same file fails to open
    conn.execute_batch("BEGIN IMMEDIATE; COMMIT;")?;
    debug!(
        locking_mode = %locking_mode,
        journal_mode = %journal_mode,
        "store connection configured"
    );
    Ok(conn)
}

fn run_worker(mut conn: Connection, mut queue: mpsc::UnboundedReceiver<Job>) {
    while let Some(job) = queue.blocking_recv() {
        job(&mut conn);
    }
    debug!("feed store worker stopped");
}

/// Runs `change` inside one write transaction, committing on success and rolling back on error
fn in_change_set<F>(
    conn: &mut Connection,
    operation: &str,
    change: F,
) -> Result<(), FeedStoreError>
where
    F: FnOnce(&CacheRepository<'_>) -> Result<(), FeedStoreError>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let result = change(&CacheRepository::new(&tx));

    match result {
        Ok(()) => tx.commit().map_err(|error| {
            // A failed commit leaves the transaction open; dropping it rolls back
            warn!(operation, %error, "commit failed; change set discarded");
            FeedStoreError::from(error)
        }),
        Err(error) => {
            warn!(operation, %error, "rolling back change set");
            if let Err(rollback_error) = tx.rollback() {
                warn!(operation, error = %rollback_error, "rollback failed");
            }
            Err(error)
        }
    }
}
