//! ttl_cache - load driver
//!
//! Runs a concurrent read/write workload against one cache store and reports
//! the resulting statistics as JSON.

use std::time::{Duration, Instant};

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ttl_cache::config::env_or;
use ttl_cache::{CacheStore, Config, Expiration};

/// Distinct keys touched by the workload
const KEY_SPACE: usize = 64;

/// Entry point for the load driver.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache store (and sweeper, if configured)
/// 4. Run the workload until it completes or a shutdown signal arrives
/// 5. Sweep, log statistics and shut the store down
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttl_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ttl_cache load driver");

    let config = Config::from_env();
    let workers: usize = env_or("WORKERS", 8);
    let operations: usize = env_or("OPERATIONS", 10_000);
    info!(
        "Configuration loaded: default_expiration={:?}, cleanup_interval={:?}, queue_capacity={}, workers={}, operations={}",
        config.default_expiration,
        config.cleanup_interval,
        config.write_queue_capacity,
        workers,
        operations
    );

    let store = CacheStore::from_config(&config);
    let started = Instant::now();

    let workload = tokio::spawn(run_workload(store.clone(), workers, operations));
    tokio::select! {
        result = workload => {
            result.context("workload task failed")?;
            info!("Workload finished in {:?}", started.elapsed());
        }
        _ = shutdown_signal() => {
            warn!("Workload interrupted after {:?}", started.elapsed());
        }
    }

    let queued = store.delete_expired().await;
    store.flush().await;
    info!("Final sweep queued {} evictions", queued);

    let stats = store.stats().await;
    let report = serde_json::to_string_pretty(&stats).context("failed to serialize statistics")?;
    info!("Cache statistics:\n{}", report);

    store.shutdown().await;
    info!("Load driver shutdown complete");
    Ok(())
}

/// Spreads `operations` mixed cache calls over `workers` tasks.
async fn run_workload(store: CacheStore, workers: usize, operations: usize) {
    let per_worker = operations / workers.max(1);

    let handles: Vec<_> = (0..workers)
        .map(|worker| {
            let store = store.clone();
            tokio::spawn(async move {
                for op in 0..per_worker {
                    let key = format!("key:{}", (worker * per_worker + op) % KEY_SPACE);
                    let value = format!("{}-{}", worker, op);

                    match op % 6 {
                        0 => store.set(key, value, Expiration::Default).await,
                        1 => store.set(key, value, Duration::from_millis(20)).await,
                        2 => {
                            let _ = store.add(key, value, Expiration::Never).await;
                        }
                        3 => {
                            let _ = store.replace(key, value, Expiration::Default).await;
                        }
                        4 => store.delete(key).await,
                        _ => {
                            store.get(&key).await;
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        if let Err(err) = handle.await {
            warn!(error = %err, "Workload worker failed");
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
