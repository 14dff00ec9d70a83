//! # Logmem Core
//!
//! Shared protocol types for the logmem log-caching service.
//!
//! This crate defines the wire-level vocabulary spoken between clients and
//! the server: the fixed-size [`LogLine`] record, the command table and
//! parser, frame encoding helpers, and the protocol error taxonomy. It has
//! no I/O of its own; the storage and server crates build on it.

pub mod command;
pub mod error;
pub mod logline;
pub mod wire;

// Re-exports
pub use command::{Command, OpCode};
pub use error::ProtocolError;
pub use logline::LogLine;

/// Maximum size of a reply frame, and of one serialized log record.
pub const LINE_SIZE: usize = 256;

/// Maximum size of a request frame.
pub const COMMAND_SIZE: usize = 300;

/// Fixed width of a record's timestamp field.
pub const TIME_SIZE: usize = 20;

/// Fixed width of a record's message field.
pub const MESSAGE_SIZE: usize = LINE_SIZE - TIME_SIZE;

/// Size of one serialized [`LogLine`] record.
pub const RECORD_SIZE: usize = TIME_SIZE + MESSAGE_SIZE;

/// Minimum initial capacity of a fresh store, in pages.
pub const INIT_PAGES: usize = 2;

/// Headroom pages added over an existing file on open, and on every grow.
pub const GROWTH_PAGES: usize = 2;

/// Maximum number of distinct named caches the registry will hold.
pub const DEFAULT_MAX_CACHES: usize = 64;

/// Timestamp format used in the STAT reply (19 characters, fits `TIME_SIZE`).
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// A record must be transmittable in a single reply frame.
const _: () = assert!(RECORD_SIZE <= LINE_SIZE);
