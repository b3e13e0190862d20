//! UDP forwarder for SOCKS5
//!
//! Sends a decoded datagram payload to its destination.

use crate::socks::udp::packet::UdpPacket;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::UdpSocket;

/// Forward a packet's payload to its destination
///
/// Uses a one-shot socket of the destination's address family that is
/// connected, used for a single send and then dropped. Nothing is read
/// back from the destination.
pub async fn forward_datagram(packet: &UdpPacket) -> io::Result<SocketAddr> {
    let target = packet.addr.resolve().await?;

    let socket = UdpSocket::bind(unspecified_for(&target)).await?;
    socket.connect(target).await?;
    socket.send(&packet.data).await?;

    Ok(target)
}

fn unspecified_for(target: &SocketAddr) -> SocketAddr {
    let ip = match target {
        SocketAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        SocketAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
    };
    SocketAddr::new(ip, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socks::types::TargetAddr;
    use bytes::Bytes;
    use std::time::Duration;

    #[test]
    fn test_unspecified_for_family() {
        let v4: SocketAddr = "127.0.0.1:53".parse().unwrap();
        let v6: SocketAddr = "[::1]:53".parse().unwrap();

        assert_eq!(unspecified_for(&v4), "0.0.0.0:0".parse().unwrap());
        assert_eq!(unspecified_for(&v6), "[::]:0".parse().unwrap());
    }

    #[tokio::test]
    async fn test_forward_datagram_delivers_payload() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = receiver.local_addr().unwrap();

        let packet = UdpPacket {
            frag: 0,
            addr: TargetAddr::from(target),
            data: Bytes::from_static(b"ping"),
        };

        let sent_to = forward_datagram(&packet).await.unwrap();
        assert_eq!(sent_to, target);

        let mut buf = [0u8; 64];
        let (n, _) = tokio::time::timeout(Duration::from_secs(1), receiver.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf[..n], b"ping");
    }

    #[tokio::test]
    async fn test_forward_datagram_to_localhost_domain() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = receiver.local_addr().unwrap().port();

        let packet = UdpPacket {
            frag: 0,
            addr: TargetAddr::domain("127.0.0.1", port),
            data: Bytes::from_static(b"by-name"),
        };

        forward_datagram(&packet).await.unwrap();

        let mut buf = [0u8; 64];
        let (n, _) = tokio::time::timeout(Duration::from_secs(1), receiver.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf[..n], b"by-name");
    }
}
