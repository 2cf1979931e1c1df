//! Cache Module
//!
//! Provides the in-memory store with per-entry expiration.

mod entry;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{CacheEntry, Expiration};
pub use stats::CacheStats;
pub(crate) use stats::StatsCounters;
pub use store::CacheStore;
