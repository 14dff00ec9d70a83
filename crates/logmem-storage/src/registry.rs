//! Named cache registry
//!
//! Process-wide table resolving service names to shared [`CacheEntry`]
//! handles. The table sits behind one explicit reader/writer gate, held only
//! for table operations; each entry carries its own lock serializing every
//! mutating store operation, since growth remaps the backing region and a
//! concurrent append during a resize would corrupt state.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use logmem_core::DEFAULT_MAX_CACHES;

use crate::error::StorageError;
use crate::mapped::MappedLogStore;

/// Configuration for a [`CacheRegistry`]
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Directory holding one backing file per service name
    pub log_dir: PathBuf,
    /// Maximum number of distinct named caches
    pub max_entries: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logmem-logs"),
            max_entries: DEFAULT_MAX_CACHES,
        }
    }
}

impl RegistryConfig {
    /// Create a configuration with a custom log directory
    pub fn with_log_dir(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            max_entries: DEFAULT_MAX_CACHES,
        }
    }

    /// Set the maximum number of named caches
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }
}

/// One named cache: the service name plus its store behind the per-entry
/// exclusion lock
///
/// An entry may be shared by every session bound to the same name; the lock
/// serializes their appends, growths, and flushes.
#[derive(Debug)]
pub struct CacheEntry {
    name: String,
    store: Mutex<MappedLogStore>,
}

impl CacheEntry {
    /// The service name this cache belongs to
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The store, behind the per-entry lock
    pub fn store(&self) -> &Mutex<MappedLogStore> {
        &self.store
    }

    /// A stable snapshot of `(bytes_written, log_count)`, captured while
    /// briefly holding the per-entry lock
    pub async fn stats(&self) -> (usize, usize) {
        let store = self.store.lock().await;
        (store.bytes_written(), store.log_count())
    }
}

/// Name-to-store resolution and lifecycle ownership of all stores
pub struct CacheRegistry {
    config: RegistryConfig,
    /// The single gate serializing table lookups, inserts, and removals
    entries: RwLock<HashMap<String, Arc<CacheEntry>>>,
}

impl CacheRegistry {
    /// Create a registry, ensuring the log directory exists
    pub fn new(config: RegistryConfig) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&config.log_dir)
            .map_err(|e| StorageError::init(format!("{}: {e}", config.log_dir.display())))?;

        info!(
            log_dir = %config.log_dir.display(),
            max_entries = config.max_entries,
            "Cache registry initialized"
        );

        Ok(Self {
            config,
            entries: RwLock::new(HashMap::new()),
        })
    }

    /// Return the entry registered under `name`, creating it if absent
    ///
    /// Existing entries are shared: a second session binding the same name
    /// gets the same `Arc`. Creation fails with
    /// [`StorageError::RegistryFull`] once the table is at capacity; already
    /// registered names keep resolving.
    #[instrument(skip(self))]
    pub async fn resolve_or_create(&self, name: &str) -> Result<Arc<CacheEntry>, StorageError> {
        validate_service_name(name)?;

        if let Some(entry) = self.entries.read().await.get(name) {
            return Ok(Arc::clone(entry));
        }

        let mut entries = self.entries.write().await;
        // Re-check under the write gate: another session may have created
        // the entry between the two lock acquisitions.
        if let Some(entry) = entries.get(name) {
            return Ok(Arc::clone(entry));
        }

        if entries.len() >= self.config.max_entries {
            warn!(name, "Registry at capacity, rejecting new cache");
            return Err(StorageError::RegistryFull);
        }

        let store = MappedLogStore::open(&self.config.log_dir, name)?;
        let entry = Arc::new(CacheEntry {
            name: name.to_string(),
            store: Mutex::new(store),
        });
        entries.insert(name.to_string(), Arc::clone(&entry));

        debug!(name, entries = entries.len(), "Created cache entry");
        Ok(entry)
    }

    /// Pure lookup, no side effects
    pub async fn find(&self, name: &str) -> Option<Arc<CacheEntry>> {
        self.entries.read().await.get(name).map(Arc::clone)
    }

    /// Remove the entry registered under `name`, making the name available
    /// for reuse
    ///
    /// The store is flushed for durability once the table gate is released;
    /// a flush failure at this point is logged, not returned, matching the
    /// never-fail contract of release. The mapping itself unmaps when the
    /// last session holding the entry drops it. The backing file persists.
    #[instrument(skip(self))]
    pub async fn remove(&self, name: &str) -> Result<(), StorageError> {
        let entry = self
            .entries
            .write()
            .await
            .remove(name)
            .ok_or_else(|| StorageError::not_found(name))?;

        if let Err(e) = entry.store.lock().await.flush() {
            warn!(name, error = %e, "Flush on remove failed");
        }

        debug!(name, "Removed cache entry");
        Ok(())
    }

    /// Number of registered caches
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether no caches are registered
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// The registry's configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

/// Service names become file names; reject anything that could escape the
/// log directory before it reaches the filesystem.
fn validate_service_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
    {
        return Err(StorageError::init("invalid service name"));
    }
    Ok(())
}
