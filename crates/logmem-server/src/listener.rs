//! TCP listener
//!
//! Accepts connections and spawns one independent session task per client,
//! so a slow or idle client never stalls the others. Sessions share nothing
//! but the registry, whose operations are internally synchronized.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use logmem_storage::CacheRegistry;

use crate::session::Session;

/// Accepts client connections for a shared cache registry
pub struct Listener {
    inner: TcpListener,
    registry: Arc<CacheRegistry>,
}

impl Listener {
    /// Bind the listen socket
    pub async fn bind(addr: SocketAddr, registry: Arc<CacheRegistry>) -> std::io::Result<Self> {
        let inner = TcpListener::bind(addr).await?;
        info!(addr = %inner.local_addr()?, "Listening");
        Ok(Self { inner, registry })
    }

    /// The bound address; useful when binding port 0
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Accept connections forever, one session task each
    ///
    /// Accept errors are transient (connection reset during handshake, fd
    /// pressure); they are logged and the loop keeps serving.
    pub async fn serve(self) {
        loop {
            match self.inner.accept().await {
                Ok((stream, peer)) => {
                    info!(%peer, "Client connected");
                    let session = Session::new(stream, peer, Arc::clone(&self.registry));
                    tokio::spawn(session.run());
                }
                Err(e) => warn!(error = %e, "Accept failed"),
            }
        }
    }
}
