//! Main SOCKS5 handler
//!
//! This module provides the per-connection entry point. It orchestrates
//! authentication, command parsing and request handling.

use crate::config::ServerConfig;
use crate::error::Socks5Error;
use crate::socks::auth::authenticate;
use crate::socks::command::parse_command;
use crate::socks::tcp_relay::handle_tcp_connect;
use crate::socks::types::{SocksCommand, TargetAddr};
use crate::socks::udp::handle_udp_associate;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

/// Handle SOCKS5 protocol on a client stream
///
/// # Protocol Flow
///
/// 1. Authentication negotiation
/// 2. Username/password authentication (if selected)
/// 3. Command parsing
/// 4. Command execution (CONNECT or UDP ASSOCIATE)
///
/// Steps 1 to 3 must complete within the configured handshake timeout.
/// The stream is dropped, and so closed, on every return path.
///
/// # Arguments
///
/// * `stream` - The accepted client stream
/// * `peer` - The client's address, used for logging
/// * `config` - Server configuration
pub async fn handle_socks5_on_stream<S>(
    mut stream: S,
    peer: SocketAddr,
    config: &ServerConfig,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (command, target_addr) = negotiate(&mut stream, config)
        .await
        .with_context(|| format!("SOCKS5 handshake with {} failed", peer))?;

    info!("SOCKS5 {} request from {} to {}", command, peer, target_addr);

    match command {
        SocksCommand::Connect => {
            let (sent, received) =
                handle_tcp_connect(stream, &target_addr, config.connect_timeout())
                    .await
                    .with_context(|| format!("CONNECT to {} failed", target_addr))?;

            info!(
                "Session {} -> {} closed: {} bytes sent, {} bytes received",
                peer, target_addr, sent, received
            );
        }
        SocksCommand::UdpAssociate => {
            handle_udp_associate(stream, &target_addr)
                .await
                .with_context(|| format!("UDP ASSOCIATE for {} failed", peer))?;
        }
    }

    Ok(())
}

/// Run method negotiation, authentication and request parsing
async fn negotiate<S>(
    stream: &mut S,
    config: &ServerConfig,
) -> Result<(SocksCommand, TargetAddr), Socks5Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let timeout = config.handshake_timeout();

    let handshake = async {
        let auth_method = authenticate(stream, &config.credentials).await?;
        debug!("Authentication completed with method: {:?}", auth_method);

        parse_command(stream).await
    };

    tokio::time::timeout(timeout, handshake)
        .await
        .map_err(|_| Socks5Error::Timeout(format!("handshake not completed in {:?}", timeout)))?
}
