//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Errors returned by the conditional write operations.
///
/// Nothing is rolled back when one of these is returned: the precondition
/// failed before any state was changed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// `add` found a live entry under the key
    #[error("Item {0} already exists")]
    AlreadyExists(String),

    /// `replace` found no live entry under the key
    #[error("Item {0} doesn't exist")]
    NotFound(String),

    /// The writer task has stopped and can no longer commit writes
    #[error("Cache is shut down")]
    Closed,
}

impl CacheError {
    /// Returns the key the error refers to, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            CacheError::AlreadyExists(key) | CacheError::NotFound(key) => Some(key),
            CacheError::Closed => None,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_key() {
        assert_eq!(
            CacheError::AlreadyExists("foo".to_string()).to_string(),
            "Item foo already exists"
        );
        assert_eq!(
            CacheError::NotFound("bar".to_string()).to_string(),
            "Item bar doesn't exist"
        );
    }

    #[test]
    fn test_error_key_accessor() {
        assert_eq!(CacheError::AlreadyExists("k".to_string()).key(), Some("k"));
        assert_eq!(CacheError::NotFound("k".to_string()).key(), Some("k"));
        assert_eq!(CacheError::Closed.key(), None);
    }
}
