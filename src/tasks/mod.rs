//! Background Tasks Module
//!
//! Tasks spawned alongside each cache store.
//!
//! # Tasks
//! - Writer: applies every mutation, one command at a time
//! - Expiration sweep: queues removal of expired entries at a fixed interval

mod cleanup;
pub(crate) mod writer;

pub use cleanup::spawn_cleanup_task;
