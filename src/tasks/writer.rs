//! Cache Writer Task
//!
//! The single consumer of the write queue and the only code path that mutates
//! the shared entry map. Commands are applied strictly in delivery order, each
//! under the write half of the lock the read path shares.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{CacheEntry, Expiration, StatsCounters};
use crate::error::{CacheError, Result};

/// Entry map shared between the writer task and every reader.
pub(crate) type SharedEntries = Arc<RwLock<HashMap<String, CacheEntry>>>;

// == Precondition ==
/// Precondition a conditional write re-checks before committing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Precondition {
    /// No live entry may occupy the key
    Absent,
    /// A live entry must occupy the key
    Present,
}

// == Mutation ==
/// A change to the entry map, applied under the write lock.
#[derive(Debug)]
pub(crate) enum Mutation {
    /// Insert or overwrite an entry
    Set {
        key: String,
        value: String,
        expiration: Expiration,
    },
    /// Remove an entry if present
    Delete { key: String },
    /// Remove an entry only if it is still expired when applied
    Evict { key: String },
    /// Insert or overwrite if the precondition still holds, reporting back
    SetIf {
        key: String,
        value: String,
        expiration: Expiration,
        precondition: Precondition,
        reply: oneshot::Sender<Result<()>>,
    },
}

// == Command ==
/// A message submitted to the writer task.
#[derive(Debug)]
pub(crate) enum Command {
    /// Apply a mutation
    Mutate(Mutation),
    /// Resolves once every earlier command has been applied
    Flush(oneshot::Sender<()>),
    /// Stops the writer; later commands are discarded
    Shutdown,
}

impl From<Mutation> for Command {
    fn from(mutation: Mutation) -> Self {
        Command::Mutate(mutation)
    }
}

/// Spawns the writer task for one store.
///
/// The task runs until it receives `Command::Shutdown` or every sender is
/// dropped.
pub(crate) fn spawn_writer(
    entries: SharedEntries,
    stats: Arc<StatsCounters>,
    default_expiration: Expiration,
    mut commands: mpsc::Receiver<Command>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(?default_expiration, "Starting cache writer task");

        while let Some(command) = commands.recv().await {
            match command {
                Command::Flush(reply) => {
                    let _ = reply.send(());
                }
                Command::Shutdown => {
                    debug!("Writer received shutdown");
                    break;
                }
                Command::Mutate(mutation) => {
                    let mut guard = entries.write().await;
                    apply(&mut guard, mutation, default_expiration, &stats);
                }
            }
        }

        info!("Cache writer task stopped");
    })
}

// == Apply ==
/// Applies one mutation to the map. Caller holds the write lock.
fn apply(
    entries: &mut HashMap<String, CacheEntry>,
    mutation: Mutation,
    default_expiration: Expiration,
    stats: &StatsCounters,
) {
    let now = Instant::now();

    match mutation {
        Mutation::Set {
            key,
            value,
            expiration,
        } => {
            let expires_at = expiration.deadline(default_expiration, now);
            entries.insert(key, CacheEntry::new(value, expires_at));
            stats.record_write();
        }
        Mutation::Delete { key } => {
            if entries.remove(&key).is_some() {
                debug!(key = %key, "Deleted entry");
            }
            stats.record_write();
        }
        Mutation::Evict { key } => {
            // A newer write may have replaced the expired entry since the
            // eviction was queued.
            if entries.get(&key).is_some_and(|entry| entry.is_expired_at(now)) {
                entries.remove(&key);
                stats.record_eviction();
                debug!(key = %key, "Evicted expired entry");
            }
        }
        Mutation::SetIf {
            key,
            value,
            expiration,
            precondition,
            reply,
        } => {
            let live = entries
                .get(&key)
                .is_some_and(|entry| !entry.is_expired_at(now));

            let outcome = match (precondition, live) {
                (Precondition::Absent, true) => Err(CacheError::AlreadyExists(key)),
                (Precondition::Present, false) => Err(CacheError::NotFound(key)),
                _ => {
                    let expires_at = expiration.deadline(default_expiration, now);
                    entries.insert(key, CacheEntry::new(value, expires_at));
                    stats.record_write();
                    Ok(())
                }
            };

            let _ = reply.send(outcome);
        }
    }
}
