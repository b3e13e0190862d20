//! UDP ASSOCIATE handler
//!
//! Implements the UDP ASSOCIATE command for SOCKS5.

use super::forwarder::forward_datagram;
use super::packet::parse_udp_packet;
use crate::error::Socks5ReplyCode;
use crate::socks::command::{build_reply, send_success};
use crate::socks::consts::MAX_UDP_PACKET;
use crate::socks::types::TargetAddr;
use anyhow::{Context, Result};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

/// Handle UDP ASSOCIATE command
///
/// # Protocol Flow
///
/// 1. Client sends UDP ASSOCIATE with expected DST.ADDR and DST.PORT
/// 2. Server binds a relay socket and replies with `0.0.0.0` and its port
/// 3. Datagrams sent to the relay socket are forwarded to their destination
/// 4. When the TCP connection closes, the UDP association ends
///
/// # Arguments
///
/// * `control_stream` - The TCP control connection
/// * `client_hint` - The client's indicated address (ignored)
pub async fn handle_udp_associate<S>(mut control_stream: S, client_hint: &TargetAddr) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    debug!("UDP ASSOCIATE client hint: {}", client_hint);

    let association = UdpAssociation::open(&mut control_stream).await?;
    association.serve(control_stream).await
}

/// A bound relay socket serving one control connection
pub struct UdpAssociation {
    socket: UdpSocket,
    bind_addr: SocketAddr,
}

impl UdpAssociation {
    /// Bind the relay socket and write the association reply
    ///
    /// On bind failure a general-failure reply is written instead.
    pub async fn open<S>(control_stream: &mut S) -> Result<Self>
    where
        S: AsyncWrite + Unpin,
    {
        let unspecified = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0);

        let bound = match UdpSocket::bind(unspecified).await {
            Ok(socket) => socket.local_addr().map(|addr| (socket, addr)),
            Err(e) => Err(e),
        };

        let (socket, bind_addr) = match bound {
            Ok(bound) => bound,
            Err(e) => {
                build_reply(control_stream, Socks5ReplyCode::GeneralFailure, None).await?;
                return Err(e).context("Failed to bind UDP relay socket");
            }
        };

        // Only the port is disclosed; the address stays unspecified
        let reply_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), bind_addr.port());
        send_success(control_stream, Some(reply_addr)).await?;

        info!("UDP ASSOCIATE established on {}", bind_addr);

        Ok(UdpAssociation { socket, bind_addr })
    }

    /// Local address of the relay socket
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Relay datagrams until the control stream closes or the socket fails
    pub async fn serve<S>(self, control_stream: S) -> Result<()>
    where
        S: AsyncRead + Unpin,
    {
        let result = tokio::select! {
            result = self.relay_datagrams() => result,
            _ = monitor_control_stream(control_stream) => Ok(()),
        };

        info!("UDP ASSOCIATE session on {} ended", self.bind_addr);
        result
    }

    async fn relay_datagrams(&self) -> Result<()> {
        let mut buf = vec![0u8; MAX_UDP_PACKET];

        loop {
            let (len, peer) = self
                .socket
                .recv_from(&mut buf)
                .await
                .context("UDP relay receive failed")?;

            let packet = match parse_udp_packet(&buf[..len]) {
                Ok(packet) => packet,
                Err(e) => {
                    warn!("Dropping datagram from {}: {}", peer, e);
                    continue;
                }
            };

            if packet.frag != 0 {
                debug!("Ignoring FRAG {} on datagram from {}", packet.frag, peer);
            }

            match forward_datagram(&packet).await {
                Ok(target) => debug!(
                    "Forwarded {} bytes from {} to {} ({})",
                    packet.data.len(),
                    peer,
                    packet.addr,
                    target
                ),
                Err(e) => warn!("Failed to forward datagram to {}: {}", packet.addr, e),
            }
        }
    }
}

/// Monitor the control stream for closure
///
/// The UDP association terminates when the TCP control connection closes.
async fn monitor_control_stream<S>(mut stream: S)
where
    S: AsyncRead + Unpin,
{
    let mut buf = [0u8; 1];

    loop {
        match stream.read(&mut buf).await {
            Ok(0) => {
                debug!("Control stream closed, terminating UDP association");
                break;
            }
            Ok(_) => {
                warn!("Unexpected data on UDP control stream");
            }
            Err(e) => {
                debug!("Control stream error: {}", e);
                break;
            }
        }
    }
}
