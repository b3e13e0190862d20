//! SOCKS5 reply builder
//!
//! Constructs SOCKS5 reply messages.

use crate::error::{Socks5Error, Socks5ReplyCode};
use crate::socks::consts::*;
use crate::socks::types::TargetAddr;
use bytes::{BufMut, BytesMut};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Placeholder bound address reported when the real one is not disclosed
const UNSPECIFIED_BIND: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0);

/// Build and send a SOCKS5 reply
///
/// # SOCKS5 Reply Format
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
///
/// # Arguments
///
/// * `stream` - The stream to write to
/// * `reply_code` - The reply status code
/// * `bind_addr` - The bound address (optional, defaults to 0.0.0.0:0)
pub async fn build_reply<S>(
    stream: &mut S,
    reply_code: Socks5ReplyCode,
    bind_addr: Option<SocketAddr>,
) -> Result<(), Socks5Error>
where
    S: AsyncWrite + Unpin,
{
    let reply = encode_reply(reply_code, bind_addr)?;

    stream.write_all(&reply).await.map_err(Socks5Error::Write)?;
    stream.flush().await.map_err(Socks5Error::Write)
}

/// Build a success reply
pub async fn send_success<S>(stream: &mut S, bind_addr: Option<SocketAddr>) -> Result<(), Socks5Error>
where
    S: AsyncWrite + Unpin,
{
    build_reply(stream, Socks5ReplyCode::Succeeded, bind_addr).await
}

/// Build a "command not supported" reply
pub async fn send_command_not_supported<S>(stream: &mut S) -> Result<(), Socks5Error>
where
    S: AsyncWrite + Unpin,
{
    build_reply(stream, Socks5ReplyCode::CommandNotSupported, None).await
}

/// Build an "address type not supported" reply
pub async fn send_address_type_not_supported<S>(stream: &mut S) -> Result<(), Socks5Error>
where
    S: AsyncWrite + Unpin,
{
    build_reply(stream, Socks5ReplyCode::AddressTypeNotSupported, None).await
}

fn encode_reply(
    reply_code: Socks5ReplyCode,
    bind_addr: Option<SocketAddr>,
) -> Result<BytesMut, Socks5Error> {
    let bind_addr = TargetAddr::from(bind_addr.unwrap_or(UNSPECIFIED_BIND));

    let mut reply = BytesMut::with_capacity(3 + 1 + 16 + 2);
    reply.put_u8(SOCKS5_VERSION);
    reply.put_u8(reply_code.into());
    reply.put_u8(SOCKS5_RESERVED);
    bind_addr.encode(&mut reply)?;

    Ok(reply)
}
