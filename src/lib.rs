//! ttl_cache - An in-process key-value cache
//!
//! Stores string values with optional per-entry expiration. Reads go straight
//! to a shared map; every write is applied by a single writer task.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{CacheStats, CacheStore, Expiration};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_cleanup_task;
