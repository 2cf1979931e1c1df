//! Expiration Sweep Task
//!
//! Background task that periodically queues the removal of expired entries.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns a background task that calls [`CacheStore::delete_expired`] every
/// `interval`.
///
/// The task holds only a weak reference to the store: it stops when the store
/// is shut down or when its last handle is dropped. The returned handle can
/// also be aborted directly.
///
/// # Example
/// ```ignore
/// let store = CacheStore::new(Duration::from_secs(300));
/// let sweeper = spawn_cleanup_task(&store, Duration::from_secs(1));
/// // Later:
/// store.shutdown().await;
/// ```
pub fn spawn_cleanup_task(store: &CacheStore, interval: Duration) -> JoinHandle<()> {
    let weak = store.downgrade();
    let mut shutdown_rx = store.shutdown_signal();

    tokio::spawn(async move {
        // A store shut down before the task started never signals `changed()`
        if *shutdown_rx.borrow_and_update() {
            debug!("Store already shut down, sweep task not started");
            return;
        }

        info!(?interval, "Starting expiration sweep task");

        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some(store) = weak.upgrade() else {
                        break;
                    };

                    let queued = store.delete_expired().await;
                    if queued > 0 {
                        info!("Expiration sweep: queued {} evictions", queued);
                    } else {
                        debug!("Expiration sweep: no expired entries found");
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Expiration sweep task stopped");
    })
}
