//! TCP accept loop
//!
//! Binds the listening socket and spawns one supervisor task per client.

use crate::config::ServerConfig;
use crate::socks::handle_socks5_on_stream;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// A bound SOCKS5 server
pub struct Server {
    listener: TcpListener,
    config: Arc<ServerConfig>,
}

impl Server {
    /// Bind the listening socket on `config.listen_addr`
    pub async fn bind(config: Arc<ServerConfig>) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr)
            .await
            .with_context(|| format!("Failed to bind {}", config.listen_addr))?;

        Ok(Server { listener, config })
    }

    /// Address the listener is actually bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .with_context(|| "Failed to read listener address")
    }

    /// Accept connections until a shutdown signal arrives
    ///
    /// Connections already accepted keep running after shutdown.
    pub async fn serve(self, mut shutdown_rx: broadcast::Receiver<bool>) -> Result<()> {
        info!("SOCKS5 server listening on {}", self.local_addr()?);

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => self.spawn_connection(stream, peer),
                        Err(e) => error!("Failed to accept connection: {}", e),
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        Ok(())
    }

    fn spawn_connection(&self, stream: tokio::net::TcpStream, peer: SocketAddr) {
        info!("Accepted connection from {}", peer);

        if let Err(e) = stream.set_nodelay(true) {
            debug!("Failed to set TCP_NODELAY for {}: {}", peer, e);
        }

        let config = Arc::clone(&self.config);
        tokio::spawn(async move {
            match handle_socks5_on_stream(stream, peer, &config).await {
                Ok(()) => info!("Connection from {} closed", peer),
                Err(e) => warn!("Connection from {} closed with error: {:#}", peer, e),
            }
        });
    }
}
