//! Cache Store Module
//!
//! Main cache handle: reads go straight to the shared map under a read lock,
//! writes are queued to the store's single writer task.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot, watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, CacheStats, Expiration, StatsCounters};
use crate::config::{Config, DEFAULT_WRITE_QUEUE_CAPACITY};
use crate::error::{CacheError, Result};
use crate::tasks::spawn_cleanup_task;
use crate::tasks::writer::{spawn_writer, Command, Mutation, Precondition, SharedEntries};

/// State shared by every handle to one store.
#[derive(Debug)]
struct StoreInner {
    /// Key-value storage, mutated only by the writer task
    entries: SharedEntries,
    /// Write queue feeding the writer task
    commands: mpsc::Sender<Command>,
    /// Writer task handle, taken on shutdown
    writer: Mutex<Option<JoinHandle<()>>>,
    /// Signals background tasks to stop
    shutdown_tx: watch::Sender<bool>,
    /// Performance statistics
    stats: Arc<StatsCounters>,
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        // Dropping `commands` closes the queue and ends the writer task.
        let _ = self.shutdown_tx.send_replace(true);
    }
}

// == Cache Store ==
/// In-process key-value cache with per-entry expiration.
///
/// Cloning a `CacheStore` creates another handle to the same entries. Every
/// mutation is funneled through one writer task, so writes are applied in the
/// order they were submitted. `set` and `delete` return once the write is
/// queued, not once it is applied; use [`CacheStore::flush`] to wait for it.
///
/// The writer task stops on [`CacheStore::shutdown`] or when the last handle
/// is dropped.
#[derive(Debug, Clone)]
pub struct CacheStore {
    inner: Arc<StoreInner>,
}

/// Non-owning handle used by background tasks.
#[derive(Debug, Clone)]
pub(crate) struct WeakCacheStore {
    inner: Weak<StoreInner>,
}

impl WeakCacheStore {
    pub(crate) fn upgrade(&self) -> Option<CacheStore> {
        self.inner.upgrade().map(|inner| CacheStore { inner })
    }
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new store with the given default expiration.
    ///
    /// A zero `default_expiration` means entries written with
    /// `Expiration::Default` never expire.
    ///
    /// # Panics
    /// Panics if called outside of a Tokio runtime, which hosts the writer task.
    pub fn new(default_expiration: Duration) -> Self {
        Self::with_queue_capacity(default_expiration, DEFAULT_WRITE_QUEUE_CAPACITY)
    }

    /// Creates a new store whose write queue holds at most `capacity` commands.
    ///
    /// # Panics
    /// Panics if called outside of a Tokio runtime.
    pub fn with_queue_capacity(default_expiration: Duration, capacity: usize) -> Self {
        let default_expiration = if default_expiration.is_zero() {
            Expiration::Never
        } else {
            Expiration::After(default_expiration)
        };

        let entries: SharedEntries = Arc::new(RwLock::new(HashMap::new()));
        let stats = Arc::new(StatsCounters::new());
        let (commands, receiver) = mpsc::channel(capacity.max(1));
        let (shutdown_tx, _) = watch::channel(false);

        let writer = spawn_writer(
            entries.clone(),
            stats.clone(),
            default_expiration,
            receiver,
        );

        Self {
            inner: Arc::new(StoreInner {
                entries,
                commands,
                writer: Mutex::new(Some(writer)),
                shutdown_tx,
                stats,
            }),
        }
    }

    /// Creates a new store from configuration.
    ///
    /// Starts the background sweeper when `cleanup_interval` is non-zero.
    pub fn from_config(config: &Config) -> Self {
        let store =
            Self::with_queue_capacity(config.default_expiration, config.write_queue_capacity);

        if !config.cleanup_interval.is_zero() {
            spawn_cleanup_task(&store, config.cleanup_interval);
        }

        store
    }

    // == Set ==
    /// Stores a value, replacing any existing entry for the key.
    ///
    /// The write is queued; it is applied by the writer task after every
    /// write submitted before it.
    pub async fn set(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
        expiration: impl Into<Expiration>,
    ) {
        self.submit(Mutation::Set {
            key: key.into(),
            value: value.into(),
            expiration: expiration.into(),
        })
        .await;
    }

    // == Add ==
    /// Stores a value only if no live entry exists for the key.
    ///
    /// An expired entry counts as absent.
    pub async fn add(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
        expiration: impl Into<Expiration>,
    ) -> Result<()> {
        let key = key.into();
        if self.lookup(&key).await.is_some() {
            return Err(CacheError::AlreadyExists(key));
        }

        self.commit(key, value.into(), expiration.into(), Precondition::Absent)
            .await
    }

    // == Replace ==
    /// Stores a value only if a live entry already exists for the key.
    pub async fn replace(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
        expiration: impl Into<Expiration>,
    ) -> Result<()> {
        let key = key.into();
        if self.lookup(&key).await.is_none() {
            return Err(CacheError::NotFound(key));
        }

        self.commit(key, value.into(), expiration.into(), Precondition::Present)
            .await
    }

    // == Get ==
    /// Retrieves a live value by key.
    ///
    /// Expired entries are never returned; their removal is queued.
    pub async fn get(&self, key: &str) -> Option<String> {
        let value = self.lookup(key).await;

        if value.is_some() {
            self.inner.stats.record_hit();
        } else {
            self.inner.stats.record_miss();
        }

        value
    }

    // == TTL ==
    /// Returns the remaining lifetime of a live entry.
    ///
    /// # Returns
    /// - `None` if no live entry exists for the key
    /// - `Some(None)` if the entry never expires
    /// - `Some(Some(remaining))` otherwise
    pub async fn ttl(&self, key: &str) -> Option<Option<Duration>> {
        self.read_live(key, CacheEntry::ttl_remaining).await
    }

    // == Delete ==
    /// Removes an entry. Does nothing if the key is absent.
    pub async fn delete(&self, key: impl Into<String>) {
        self.submit(Mutation::Delete { key: key.into() }).await;
    }

    // == Delete Expired ==
    /// Queues the removal of every expired entry.
    ///
    /// Returns the number of expired entries found.
    pub async fn delete_expired(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<String> = {
            let entries = self.inner.entries.read().await;
            entries
                .iter()
                .filter(|(_, entry)| entry.is_expired_at(now))
                .map(|(key, _)| key.clone())
                .collect()
        };

        // Read guard is released before sending: a full queue would otherwise
        // block against the writer waiting for the write lock.
        let count = expired.len();
        for key in expired {
            self.submit(Mutation::Evict { key }).await;
        }

        self.inner.stats.record_sweep();
        debug!(count, "Queued evictions for expired entries");
        count
    }

    // == Item Count ==
    /// Returns the number of entries in the cache.
    ///
    /// This may include entries that have expired but have not yet been
    /// removed.
    pub async fn item_count(&self) -> usize {
        self.inner.entries.read().await.len()
    }

    // == Flush ==
    /// Waits until every write submitted before this call has been applied.
    pub async fn flush(&self) {
        let (reply, applied) = oneshot::channel();
        if self.submit(Command::Flush(reply)).await {
            let _ = applied.await;
        }
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let total_entries = self.item_count().await;
        self.inner.stats.snapshot(total_entries)
    }

    // == Shutdown ==
    /// Stops the writer task after it applies the writes queued so far.
    ///
    /// Writes submitted afterwards through any handle are dropped.
    pub async fn shutdown(&self) {
        let _ = self.inner.shutdown_tx.send_replace(true);
        self.submit(Command::Shutdown).await;

        let writer = self
            .inner
            .writer
            .lock()
            .ok()
            .and_then(|mut writer| writer.take());

        if let Some(writer) = writer {
            if let Err(err) = writer.await {
                warn!(error = %err, "Cache writer task ended abnormally");
            }
            info!("Cache store shut down");
        }
    }

    pub(crate) fn downgrade(&self) -> WeakCacheStore {
        WeakCacheStore {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub(crate) fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.inner.shutdown_tx.subscribe()
    }

    /// Reads a live value, queueing eviction of an expired one.
    async fn lookup(&self, key: &str) -> Option<String> {
        self.read_live(key, |entry| entry.value.clone()).await
    }

    /// Projects a live entry through `read`. An expired entry is never
    /// projected; its eviction is queued once the read guard is released.
    async fn read_live<T>(&self, key: &str, read: impl FnOnce(&CacheEntry) -> T) -> Option<T> {
        let found = {
            let entries = self.inner.entries.read().await;
            entries
                .get(key)
                .map(|entry| (!entry.is_expired()).then(|| read(entry)))
        };

        match found {
            Some(Some(value)) => Some(value),
            Some(None) => {
                self.submit(Mutation::Evict {
                    key: key.to_string(),
                })
                .await;
                None
            }
            None => None,
        }
    }

    /// Queues a conditional write and waits for the writer's verdict.
    async fn commit(
        &self,
        key: String,
        value: String,
        expiration: Expiration,
        precondition: Precondition,
    ) -> Result<()> {
        let (reply, outcome) = oneshot::channel();
        self.inner
            .commands
            .send(Command::Mutate(Mutation::SetIf {
                key,
                value,
                expiration,
                precondition,
                reply,
            }))
            .await
            .map_err(|_| CacheError::Closed)?;

        outcome.await.map_err(|_| CacheError::Closed)?
    }

    /// Hands a command to the writer task. Returns false if it has stopped.
    async fn submit(&self, command: impl Into<Command>) -> bool {
        match self.inner.commands.send(command.into()).await {
            Ok(()) => true,
            Err(mpsc::error::SendError(command)) => {
                warn!(?command, "Cache writer has stopped, dropping command");
                false
            }
        }
    }
}
