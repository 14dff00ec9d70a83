//! Entry point for the logmem server binary.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use logmem_core::DEFAULT_MAX_CACHES;
use logmem_server::config::DEFAULT_LISTEN_ADDR;
use logmem_server::{Listener, ServerConfig};
use logmem_storage::{CacheRegistry, RegistryConfig};

/// Multi-tenant log-caching service
#[derive(Debug, Parser)]
#[command(name = "logmem-server", version)]
struct Cli {
    /// Directory holding one backing file per service name
    #[arg(default_value = "logmem-logs")]
    log_dir: PathBuf,

    /// Address to listen on
    #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
    listen: SocketAddr,

    /// Maximum number of distinct named caches
    #[arg(long, default_value_t = DEFAULT_MAX_CACHES)]
    max_caches: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::with_log_dir(cli.log_dir)
        .with_listen(cli.listen)
        .with_max_caches(cli.max_caches);

    let registry = CacheRegistry::new(
        RegistryConfig::with_log_dir(&config.log_dir).with_max_entries(config.max_caches),
    )
    .with_context(|| format!("initializing log directory {}", config.log_dir.display()))?;

    let listener = Listener::bind(config.listen, Arc::new(registry))
        .await
        .with_context(|| format!("binding {}", config.listen))?;

    tokio::select! {
        _ = listener.serve() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
    }

    Ok(())
}
