//! Configuration for the logmem server

use std::net::SocketAddr;
use std::path::PathBuf;

use logmem_core::DEFAULT_MAX_CACHES;

/// Default listen address when none is given.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:2999";

/// Configuration for a server instance
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listener binds to
    pub listen: SocketAddr,
    /// Directory holding one backing file per service name
    pub log_dir: PathBuf,
    /// Maximum number of distinct named caches
    pub max_caches: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // The literal parses; there is no fallible path here.
            listen: DEFAULT_LISTEN_ADDR.parse().unwrap(),
            log_dir: PathBuf::from("logmem-logs"),
            max_caches: DEFAULT_MAX_CACHES,
        }
    }
}

impl ServerConfig {
    /// Create a configuration with a custom log directory
    pub fn with_log_dir(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            ..Self::default()
        }
    }

    /// Set the listen address
    pub fn with_listen(mut self, listen: SocketAddr) -> Self {
        self.listen = listen;
        self
    }

    /// Set the maximum number of named caches
    pub fn with_max_caches(mut self, max_caches: usize) -> Self {
        self.max_caches = max_caches;
        self
    }
}
