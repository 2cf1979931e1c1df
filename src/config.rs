//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::time::Duration;

/// Default capacity of the write queue feeding the writer task
pub const DEFAULT_WRITE_QUEUE_CAPACITY: usize = 1024;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Expiration applied to writes that ask for the store default.
    /// Zero means entries never expire by default.
    pub default_expiration: Duration,
    /// Interval between background sweeps. Zero disables the sweeper.
    pub cleanup_interval: Duration,
    /// Number of write commands that can wait for the writer task
    pub write_queue_capacity: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_EXPIRATION_MS` - Default expiration in milliseconds (default: 0, never)
    /// - `CLEANUP_INTERVAL_MS` - Sweep frequency in milliseconds (default: 0, disabled)
    /// - `WRITE_QUEUE_CAPACITY` - Pending write capacity (default: 1024)
    pub fn from_env() -> Self {
        Self {
            default_expiration: Duration::from_millis(env_or("DEFAULT_EXPIRATION_MS", 0)),
            cleanup_interval: Duration::from_millis(env_or("CLEANUP_INTERVAL_MS", 0)),
            write_queue_capacity: env_or("WRITE_QUEUE_CAPACITY", DEFAULT_WRITE_QUEUE_CAPACITY)
                .max(1),
        }
    }

    /// Sets the default expiration.
    pub fn with_default_expiration(mut self, default_expiration: Duration) -> Self {
        self.default_expiration = default_expiration;
        self
    }

    /// Sets the background sweep interval.
    pub fn with_cleanup_interval(mut self, cleanup_interval: Duration) -> Self {
        self.cleanup_interval = cleanup_interval;
        self
    }

    /// Sets the write queue capacity (at least 1).
    pub fn with_write_queue_capacity(mut self, capacity: usize) -> Self {
        self.write_queue_capacity = capacity.max(1);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_expiration: Duration::ZERO,
            cleanup_interval: Duration::ZERO,
            write_queue_capacity: DEFAULT_WRITE_QUEUE_CAPACITY,
        }
    }
}

/// Parses an environment variable, falling back to `default` when unset or invalid.
pub fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
