//! SOCKS5 authentication module
//!
//! Handles authentication negotiation and username/password authentication.

mod password;

pub use password::PasswordAuth;

use super::consts::*;
use crate::config::Credentials;
use crate::error::Socks5Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Authentication method types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// No authentication required
    None,
    /// Username/password authentication
    Password,
}

impl AuthMethod {
    /// Convert to SOCKS5 method byte
    pub fn to_byte(self) -> u8 {
        match self {
            AuthMethod::None => SOCKS5_AUTH_METHOD_NONE,
            AuthMethod::Password => SOCKS5_AUTH_METHOD_PASSWORD,
        }
    }

    /// Parse from SOCKS5 method byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            SOCKS5_AUTH_METHOD_NONE => Some(AuthMethod::None),
            SOCKS5_AUTH_METHOD_PASSWORD => Some(AuthMethod::Password),
            _ => None,
        }
    }
}

/// Perform method negotiation and, when selected, password authentication
///
/// # Arguments
///
/// * `stream` - The client stream
/// * `credentials` - The configured username/password
///
/// # Returns
///
/// The negotiated authentication method if successful
pub async fn authenticate<S>(
    stream: &mut S,
    credentials: &Credentials,
) -> Result<AuthMethod, Socks5Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let method = negotiate_method(stream).await?;

    if method == AuthMethod::Password {
        PasswordAuth::authenticate(stream, credentials).await?;
    }

    Ok(method)
}

/// Read the client's method offer, pick one and reply
///
/// # Protocol
///
/// ```text
/// +----+----------+----------+        +----+--------+
/// |VER | NMETHODS | METHODS  |   ->   |VER | METHOD |
/// +----+----------+----------+        +----+--------+
/// | 1  |    1     | 1 to 255 |        | 1  |   1    |
/// +----+----------+----------+        +----+--------+
/// ```
///
/// The two reply bytes are written even when nothing is acceptable; the
/// method byte is then `0xFF` and the call fails.
pub async fn negotiate_method<S>(stream: &mut S) -> Result<AuthMethod, Socks5Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = [0u8; 2];
    stream.read_exact(&mut buf).await.map_err(Socks5Error::Read)?;

    let version = buf[0];
    let num_methods = buf[1];

    if version != SOCKS5_VERSION {
        return Err(Socks5Error::UnsupportedVersion(version));
    }

    let mut methods = vec![0u8; num_methods as usize];
    stream
        .read_exact(&mut methods)
        .await
        .map_err(Socks5Error::Read)?;

    debug!("Client offered methods: {:?}", methods);

    let selected_method = select_auth_method(&methods);

    stream
        .write_all(&[
            SOCKS5_VERSION,
            selected_method
                .map(|m| m.to_byte())
                .unwrap_or(SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE),
        ])
        .await
        .map_err(Socks5Error::Write)?;
    stream.flush().await.map_err(Socks5Error::Write)?;

    selected_method.ok_or(Socks5Error::NoAcceptableMethod)
}

/// Select the authentication method from the offered list
///
/// Username/password wins whenever offered, regardless of offer order;
/// otherwise no-auth is accepted.
fn select_auth_method(methods: &[u8]) -> Option<AuthMethod> {
    const PREFERRED_METHODS: [AuthMethod; 2] = [AuthMethod::Password, AuthMethod::None];

    let offered: Vec<AuthMethod> = methods
        .iter()
        .copied()
        .filter_map(AuthMethod::from_byte)
        .collect();

    PREFERRED_METHODS
        .into_iter()
        .find(|preferred| offered.contains(preferred))
}
