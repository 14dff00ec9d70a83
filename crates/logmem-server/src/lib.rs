//! # Logmem Server
//!
//! The network-facing half of the logmem log-caching service: a TCP listener
//! that spawns one [`Session`] task per client connection. Each session
//! authenticates against a named cache, parses fixed-format commands, and
//! dispatches them to the shared [`CacheRegistry`](logmem_storage::CacheRegistry).
//!
//! The protocol is strictly request/reply: one frame in, one logical reply
//! out (GETLOGS streams its record frames as part of that reply).

pub mod config;
pub mod listener;
pub mod session;

// Re-exports
pub use config::ServerConfig;
pub use listener::Listener;
pub use session::{Session, SessionError};
