//! # Logmem Storage
//!
//! Storage layer for the logmem log-caching service.
//!
//! Each service name owns a [`MappedLogStore`]: a growable memory mapping
//! over a per-service backing file, holding fixed-size log records. The
//! [`CacheRegistry`] resolves service names to shared [`CacheEntry`] handles
//! with lookup-or-create semantics and bounded capacity.
//!
//! ## Example
//!
//! ```rust,ignore
//! use logmem_core::LogLine;
//! use logmem_storage::{CacheRegistry, RegistryConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = CacheRegistry::new(RegistryConfig::default()).unwrap();
//!     let entry = registry.resolve_or_create("svc1").await.unwrap();
//!
//!     let mut store = entry.store().lock().await;
//!     store.append(&LogLine::new("2024-01-01T00:00:00", "hello")).unwrap();
//!     store.flush().unwrap();
//! }
//! ```

pub mod error;
pub mod mapped;
pub mod registry;

// Re-exports
pub use error::StorageError;
pub use mapped::MappedLogStore;
pub use registry::{CacheEntry, CacheRegistry, RegistryConfig};
