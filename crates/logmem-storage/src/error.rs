//! Error types for logmem-storage
//!
//! All variants are recoverable at the session boundary: the server reports
//! them to the client in a `FAILED:` reply and keeps the store in its
//! last-known-good state. The rendered message is the `<reason>` text the
//! client sees.

use thiserror::Error;

/// Errors that can occur in store and registry operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing file could not be opened or the mapping could not be
    /// established
    #[error("cannot initialize log store: {0}")]
    Init(String),

    /// Growing the mapped region failed; the pending append was not applied
    #[error("log store is full: {0}")]
    Full(String),

    /// Syncing the mapped bytes to the backing file failed
    #[error("flush failed: {0}")]
    Flush(String),

    /// No cache is registered under the given service name
    #[error("cache not found: {0}")]
    NotFound(String),

    /// The registry already holds its maximum number of named caches
    #[error("no free cache slots")]
    RegistryFull,
}

impl StorageError {
    /// Create a new Init error
    pub fn init(message: impl Into<String>) -> Self {
        Self::Init(message.into())
    }

    /// Create a new NotFound error
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_the_cache() {
        let err = StorageError::not_found("svc1");
        assert!(matches!(err, StorageError::NotFound(_)));
        assert!(err.to_string().contains("svc1"));
    }

    #[test]
    fn test_registry_full_message() {
        assert_eq!(StorageError::RegistryFull.to_string(), "no free cache slots");
    }
}
