//! SOCKS5 type definitions
//!
//! Defines the core types used in SOCKS5 protocol handling, including the
//! address codec shared by the request parser and the UDP relay.

use super::consts::*;
use crate::error::Socks5Error;
use bytes::{Buf, BufMut, BytesMut};
use std::fmt;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::io::{AsyncRead, AsyncReadExt};

/// SOCKS5 command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocksCommand {
    /// TCP CONNECT - establish a TCP connection to target
    Connect,
    /// UDP ASSOCIATE - establish UDP relay
    UdpAssociate,
}

impl SocksCommand {
    /// Parse a command byte into SocksCommand
    ///
    /// BIND is deliberately absent: it is answered as unsupported.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            SOCKS5_CMD_TCP_CONNECT => Some(SocksCommand::Connect),
            SOCKS5_CMD_UDP_ASSOCIATE => Some(SocksCommand::UdpAssociate),
            _ => None,
        }
    }
}

impl fmt::Display for SocksCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocksCommand::Connect => write!(f, "CONNECT"),
            SocksCommand::UdpAssociate => write!(f, "UDP ASSOCIATE"),
        }
    }
}

/// Target address for SOCKS5 requests
///
/// Represents the destination address in a SOCKS5 request or UDP datagram.
/// Can be an IP address (v4 or v6) or a domain name. The variant fixes the
/// wire length of the address field: 4, 16 or 1+N bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetAddr {
    /// IP address with port
    Ip(SocketAddr),
    /// Domain name with port
    Domain(String, u16),
}

impl TargetAddr {
    /// Create a new TargetAddr from an IPv4 address and port
    pub fn ipv4(ip: Ipv4Addr, port: u16) -> Self {
        TargetAddr::Ip(SocketAddr::new(IpAddr::V4(ip), port))
    }

    /// Create a new TargetAddr from an IPv6 address and port
    pub fn ipv6(ip: Ipv6Addr, port: u16) -> Self {
        TargetAddr::Ip(SocketAddr::new(IpAddr::V6(ip), port))
    }

    /// Create a new TargetAddr from a domain name and port
    pub fn domain(domain: impl Into<String>, port: u16) -> Self {
        TargetAddr::Domain(domain.into(), port)
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        match self {
            TargetAddr::Ip(addr) => addr.port(),
            TargetAddr::Domain(_, port) => *port,
        }
    }

    /// Get the address type byte for SOCKS5 protocol
    pub fn addr_type(&self) -> u8 {
        match self {
            TargetAddr::Ip(SocketAddr::V4(_)) => SOCKS5_ADDR_TYPE_IPV4,
            TargetAddr::Ip(SocketAddr::V6(_)) => SOCKS5_ADDR_TYPE_IPV6,
            TargetAddr::Domain(_, _) => SOCKS5_ADDR_TYPE_DOMAIN,
        }
    }

    /// Read an address and port from a stream
    ///
    /// The address type byte has already been consumed by the caller.
    /// Reads exactly the number of bytes the address type dictates.
    pub async fn read_from<S>(stream: &mut S, addr_type: u8) -> Result<Self, Socks5Error>
    where
        S: AsyncRead + Unpin,
    {
        let addr = match addr_type {
            SOCKS5_ADDR_TYPE_IPV4 => {
                let mut ip = [0u8; 4];
                stream.read_exact(&mut ip).await.map_err(Socks5Error::Read)?;
                let port = read_port(stream).await?;
                TargetAddr::ipv4(Ipv4Addr::from(ip), port)
            }

            SOCKS5_ADDR_TYPE_DOMAIN => {
                let len = stream.read_u8().await.map_err(Socks5Error::Read)? as usize;
                let mut domain = vec![0u8; len];
                stream
                    .read_exact(&mut domain)
                    .await
                    .map_err(Socks5Error::Read)?;
                let port = read_port(stream).await?;
                TargetAddr::Domain(domain_from_bytes(domain)?, port)
            }

            SOCKS5_ADDR_TYPE_IPV6 => {
                let mut ip = [0u8; 16];
                stream.read_exact(&mut ip).await.map_err(Socks5Error::Read)?;
                let port = read_port(stream).await?;
                TargetAddr::ipv6(Ipv6Addr::from(ip), port)
            }

            other => return Err(Socks5Error::AddressTypeNotSupported(other)),
        };

        Ok(addr)
    }

    /// Decode an address and port from a buffer
    ///
    /// `buf` starts right after the address type byte. Returns the address
    /// and the number of bytes it occupied. Truncated input is reported as
    /// a malformed datagram.
    pub fn decode(addr_type: u8, data: &[u8]) -> Result<(Self, usize), Socks5Error> {
        let mut buf = data;

        let addr = match addr_type {
            SOCKS5_ADDR_TYPE_IPV4 => {
                ensure_len(buf, 4 + 2, "IPv4 address")?;
                let ip = Ipv4Addr::new(buf[0], buf[1], buf[2], buf[3]);
                buf.advance(4);
                TargetAddr::ipv4(ip, buf.get_u16())
            }

            SOCKS5_ADDR_TYPE_DOMAIN => {
                ensure_len(buf, 1, "domain length")?;
                let len = buf.get_u8() as usize;
                ensure_len(buf, len + 2, "domain name")?;
                let domain = domain_from_bytes(buf[..len].to_vec())?;
                buf.advance(len);
                TargetAddr::Domain(domain, buf.get_u16())
            }

            SOCKS5_ADDR_TYPE_IPV6 => {
                ensure_len(buf, 16 + 2, "IPv6 address")?;
                let mut ip = [0u8; 16];
                buf.copy_to_slice(&mut ip);
                TargetAddr::ipv6(Ipv6Addr::from(ip), buf.get_u16())
            }

            other => return Err(Socks5Error::AddressTypeNotSupported(other)),
        };

        Ok((addr, data.len() - buf.len()))
    }

    /// Encode the address type, address and port into `buf`
    ///
    /// Fails for domain names that do not fit the single length byte.
    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), Socks5Error> {
        if let TargetAddr::Domain(domain, _) = self {
            if domain.len() > MAX_DOMAIN_LEN {
                return Err(Socks5Error::DomainTooLong(domain.len()));
            }
        }

        buf.put_u8(self.addr_type());

        match self {
            TargetAddr::Ip(SocketAddr::V4(addr)) => buf.put_slice(&addr.ip().octets()),
            TargetAddr::Ip(SocketAddr::V6(addr)) => buf.put_slice(&addr.ip().octets()),
            TargetAddr::Domain(domain, _) => {
                buf.put_u8(domain.len() as u8);
                buf.put_slice(domain.as_bytes());
            }
        }
        buf.put_u16(self.port());

        Ok(())
    }

    /// Serialize the address to bytes for SOCKS5 protocol
    pub fn to_bytes(&self) -> Result<Vec<u8>, Socks5Error> {
        let mut buf = BytesMut::with_capacity(1 + 1 + MAX_DOMAIN_LEN + 2);
        self.encode(&mut buf)?;
        Ok(buf.to_vec())
    }

    /// Resolve the address to a SocketAddr
    ///
    /// For IP addresses, this returns immediately.
    /// For domain names, this performs DNS resolution.
    pub async fn resolve(&self) -> io::Result<SocketAddr> {
        match self {
            TargetAddr::Ip(addr) => Ok(*addr),
            TargetAddr::Domain(domain, port) => tokio::net::lookup_host((domain.as_str(), *port))
                .await?
                .next()
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("No addresses found for domain: {}", domain),
                    )
                }),
        }
    }
}

impl fmt::Display for TargetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetAddr::Ip(addr) => write!(f, "{}", addr),
            TargetAddr::Domain(domain, port) => write!(f, "{}:{}", domain, port),
        }
    }
}

impl From<SocketAddr> for TargetAddr {
    fn from(addr: SocketAddr) -> Self {
        TargetAddr::Ip(addr)
    }
}

impl Default for TargetAddr {
    fn default() -> Self {
        TargetAddr::Ip(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0))
    }
}

async fn read_port<S>(stream: &mut S) -> Result<u16, Socks5Error>
where
    S: AsyncRead + Unpin,
{
    stream.read_u16().await.map_err(Socks5Error::Read)
}

fn domain_from_bytes(bytes: Vec<u8>) -> Result<String, Socks5Error> {
    String::from_utf8(bytes)
        .map_err(|e| Socks5Error::InvalidDomain(String::from_utf8_lossy(e.as_bytes()).into_owned()))
}

fn ensure_len(buf: &[u8], needed: usize, what: &str) -> Result<(), Socks5Error> {
    if buf.len() < needed {
        return Err(Socks5Error::MalformedDatagram(format!(
            "{} needs {} bytes, {} left",
            what,
            needed,
            buf.len()
        )));
    }
    Ok(())
}
