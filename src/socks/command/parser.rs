//! SOCKS5 command parser
//!
//! Parses SOCKS5 command requests from the client.

use super::reply::{send_address_type_not_supported, send_command_not_supported, send_success};
use crate::error::Socks5Error;
use crate::socks::consts::*;
use crate::socks::types::{SocksCommand, TargetAddr};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

/// Parse a SOCKS5 command from the stream
///
/// # SOCKS5 Request Format
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
///
/// For CONNECT the success reply (bound address `0.0.0.0:0`) is written
/// before returning, i.e. before the target is dialed. UDP ASSOCIATE
/// returns the client's hint address; its reply is written by the relay.
/// Unsupported commands and address types are answered with `0x07` and
/// `0x08` replies respectively before failing.
///
/// # Returns
///
/// A tuple of (command, target_address)
pub async fn parse_command<S>(stream: &mut S) -> Result<(SocksCommand, TargetAddr), Socks5Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    // Read: VER CMD RSV ATYP
    let mut header = [0u8; 4];
    stream
        .read_exact(&mut header)
        .await
        .map_err(Socks5Error::Read)?;

    let version = header[0];
    let cmd_byte = header[1];
    let addr_type = header[3];

    if version != SOCKS5_VERSION {
        return Err(Socks5Error::UnsupportedVersion(version));
    }

    let Some(command) = SocksCommand::from_byte(cmd_byte) else {
        send_command_not_supported(stream).await?;
        return Err(Socks5Error::CommandNotSupported(cmd_byte));
    };

    let target_addr = match TargetAddr::read_from(stream, addr_type).await {
        Ok(addr) => addr,
        Err(e @ Socks5Error::AddressTypeNotSupported(_)) => {
            send_address_type_not_supported(stream).await?;
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    tracing::debug!("Parsed SOCKS5 command: {} to {}", command, target_addr);

    if command == SocksCommand::Connect {
        send_success(stream, None).await?;
    }

    Ok((command, target_addr))
}
