//! UDP packet decoding for SOCKS5
//!
//! Handles the encapsulation format for UDP packets in SOCKS5.

use crate::error::Socks5Error;
use crate::socks::consts::*;
use crate::socks::types::TargetAddr;
use bytes::Bytes;

/// UDP packet structure for SOCKS5
///
/// # UDP Request Format
///
/// ```text
/// +----+------+------+----------+----------+----------+
/// |RSV | FRAG | ATYP | DST.ADDR | DST.PORT |   DATA   |
/// +----+------+------+----------+----------+----------+
/// | 2  |  1   |  1   | Variable |    2     | Variable |
/// +----+------+------+----------+----------+----------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpPacket {
    /// Fragment number, carried but not acted upon
    pub frag: u8,
    /// Destination address
    pub addr: TargetAddr,
    /// Packet payload
    pub data: Bytes,
}

/// Parse a UDP request datagram
///
/// RSV and FRAG are not validated. Datagrams shorter than the smallest
/// possible header are rejected outright; the payload is everything after
/// the decoded address and port.
pub fn parse_udp_packet(data: &[u8]) -> Result<UdpPacket, Socks5Error> {
    if data.len() < MIN_UDP_DATAGRAM_LEN {
        return Err(Socks5Error::MalformedDatagram(format!(
            "datagram too short: {} bytes",
            data.len()
        )));
    }

    let frag = data[2];
    let atyp = data[3];

    let (addr, consumed) = TargetAddr::decode(atyp, &data[UDP_HEADER_ADDR_OFFSET..])?;
    let payload = &data[UDP_HEADER_ADDR_OFFSET + consumed..];

    Ok(UdpPacket {
        frag,
        addr,
        data: Bytes::copy_from_slice(payload),
    })
}
