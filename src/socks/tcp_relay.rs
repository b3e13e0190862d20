//! TCP relay for SOCKS5 CONNECT command
//!
//! Handles TCP CONNECT requests by establishing a connection to the target
//! and relaying data bidirectionally.

use crate::error::Socks5Error;
use crate::socks::types::TargetAddr;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info};

/// Handle TCP CONNECT command
///
/// This function:
/// 1. Resolves and dials the target within `connect_timeout`
/// 2. Relays data bidirectionally between client and target
///
/// The success reply has already been written by the request parser.
///
/// # Returns
///
/// Bytes copied client->target and target->client
pub async fn handle_tcp_connect<S>(
    client_stream: S,
    target_addr: &TargetAddr,
    connect_timeout: Duration,
) -> Result<(u64, u64), Socks5Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let target_stream = connect_target(target_addr, connect_timeout).await?;

    info!("SOCKS5 tunnel established to {}", target_addr);

    relay_tcp(client_stream, target_stream).await
}

/// Resolve and connect to the target, bounded by `timeout`
pub async fn connect_target(
    target_addr: &TargetAddr,
    timeout: Duration,
) -> Result<TcpStream, Socks5Error> {
    let dial = async {
        let socket_addr = target_addr.resolve().await?;
        debug!("Connecting to target: {}", socket_addr);
        TcpStream::connect(socket_addr).await
    };

    let result = match tokio::time::timeout(timeout, dial).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("connect timed out after {:?}", timeout),
        )),
    };

    result.map_err(|source| Socks5Error::UpstreamDial {
        target: target_addr.to_string(),
        source,
    })
}

const CLIENT_TO_TARGET: &str = "client->target";
const TARGET_TO_CLIENT: &str = "target->client";

/// Relay data bidirectionally between client and target
///
/// When one direction reaches EOF, the write half of its destination is
/// shut down so the peer sees EOF while the other direction keeps flowing.
/// When one direction fails, the other is dropped and both streams close.
///
/// # Returns
///
/// Bytes copied client->target and target->client
pub async fn relay_tcp<C, T>(client: C, target: T) -> Result<(u64, u64), Socks5Error>
where
    C: AsyncRead + AsyncWrite + Unpin,
    T: AsyncRead + AsyncWrite + Unpin,
{
    let (mut client_read, mut client_write) = tokio::io::split(client);
    let (mut target_read, mut target_write) = tokio::io::split(target);

    let client_to_target = async {
        let result = tokio::io::copy(&mut client_read, &mut target_write).await;
        if let Err(e) = target_write.shutdown().await {
            debug!("{} shutdown error: {}", CLIENT_TO_TARGET, e);
        }
        result.map_err(|source| Socks5Error::Relay {
            direction: CLIENT_TO_TARGET,
            source,
        })
    };

    let target_to_client = async {
        let result = tokio::io::copy(&mut target_read, &mut client_write).await;
        if let Err(e) = client_write.shutdown().await {
            debug!("{} shutdown error: {}", TARGET_TO_CLIENT, e);
        }
        result.map_err(|source| Socks5Error::Relay {
            direction: TARGET_TO_CLIENT,
            source,
        })
    };

    tokio::pin!(client_to_target);
    tokio::pin!(target_to_client);

    // An error in either direction returns early, dropping the other copy
    let (sent, received) = tokio::select! {
        sent = &mut client_to_target => {
            let sent = sent?;
            debug!("{} finished: {} bytes", CLIENT_TO_TARGET, sent);
            (sent, target_to_client.await?)
        }
        received = &mut target_to_client => {
            let received = received?;
            debug!("{} finished: {} bytes", TARGET_TO_CLIENT, received);
            (client_to_target.await?, received)
        }
    };

    Ok((sent, received))
}
