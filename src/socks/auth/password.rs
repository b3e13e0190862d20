//! Username/password authentication handler
//!
//! Implements RFC 1929 username/password authentication for SOCKS5.

use crate::config::Credentials;
use crate::error::Socks5Error;
use crate::socks::consts::{
    SOCKS5_AUTH_STATUS_FAILURE, SOCKS5_AUTH_STATUS_SUCCESS, SOCKS5_AUTH_VERSION,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Username/password authentication handler
pub struct PasswordAuth;

impl PasswordAuth {
    /// Perform username/password authentication
    ///
    /// # Protocol
    ///
    /// Client sends:
    /// ```text
    /// +----+------+----------+------+----------+
    /// |VER | ULEN |  UNAME   | PLEN |  PASSWD  |
    /// +----+------+----------+------+----------+
    /// | 1  |  1   | 1 to 255 |  1   | 1 to 255 |
    /// +----+------+----------+------+----------+
    /// ```
    ///
    /// Server responds:
    /// ```text
    /// +----+--------+
    /// |VER | STATUS |
    /// +----+--------+
    /// | 1  |   1    |
    /// +----+--------+
    /// ```
    ///
    /// The whole request is read before anything is written back.
    pub async fn authenticate<S>(
        stream: &mut S,
        credentials: &Credentials,
    ) -> Result<(), Socks5Error>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        // Read version and username length
        let mut buf = [0u8; 2];
        stream.read_exact(&mut buf).await.map_err(Socks5Error::Read)?;

        let version = buf[0];
        let username_len = buf[1] as usize;

        if version != SOCKS5_AUTH_VERSION {
            return Err(Socks5Error::UnsupportedAuthVersion(version));
        }

        let mut username = vec![0u8; username_len];
        stream
            .read_exact(&mut username)
            .await
            .map_err(Socks5Error::Read)?;

        let password_len = stream.read_u8().await.map_err(Socks5Error::Read)? as usize;
        let mut password = vec![0u8; password_len];
        stream
            .read_exact(&mut password)
            .await
            .map_err(Socks5Error::Read)?;

        if verify(credentials, &username, &password) {
            send_auth_result(stream, SOCKS5_AUTH_STATUS_SUCCESS).await?;
            tracing::debug!(
                "Authentication successful for user: {}",
                String::from_utf8_lossy(&username)
            );
            Ok(())
        } else {
            send_auth_result(stream, SOCKS5_AUTH_STATUS_FAILURE).await?;
            tracing::warn!(
                "Authentication failed for user: {}",
                String::from_utf8_lossy(&username)
            );
            Err(Socks5Error::AuthFailed)
        }
    }
}

/// Check both fields without short-circuiting on the first mismatch
fn verify(credentials: &Credentials, username: &[u8], password: &[u8]) -> bool {
    let username_matches = constant_time_compare(username, credentials.username.as_bytes());
    let password_matches = constant_time_compare(password, credentials.password.as_bytes());

    username_matches & password_matches
}

/// Constant-time comparison for byte slices
///
/// Runtime depends only on the lengths, not on where the contents differ.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }

    result == 0
}

/// Send authentication result to client
async fn send_auth_result<S: AsyncWrite + Unpin>(
    stream: &mut S,
    status: u8,
) -> Result<(), Socks5Error> {
    stream
        .write_all(&[SOCKS5_AUTH_VERSION, status])
        .await
        .map_err(Socks5Error::Write)?;
    stream.flush().await.map_err(Socks5Error::Write)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    fn create_auth_request(username: &str, password: &str) -> Vec<u8> {
        let mut request = Vec::new();
        request.push(SOCKS5_AUTH_VERSION);
        request.push(username.len() as u8);
        request.extend_from_slice(username.as_bytes());
        request.push(password.len() as u8);
        request.extend_from_slice(password.as_bytes());
        request
    }

    async fn run_auth(request: &[u8]) -> (Result<(), Socks5Error>, Vec<u8>) {
        let (mut client, mut server) = duplex(1024);
        client.write_all(request).await.unwrap();

        let credentials = Credentials::new("user", "pass");
        let result = PasswordAuth::authenticate(&mut server, &credentials).await;
        drop(server);

        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();
        (result, reply)
    }

    #[test]
    fn test_create_auth_request_format() {
        let request = create_auth_request("admin", "secret123");

        assert_eq!(request[0], SOCKS5_AUTH_VERSION);
        assert_eq!(request[1], 5);
        assert_eq!(&request[2..7], b"admin");
        assert_eq!(request[7], 9);
        assert_eq!(&request[8..17], b"secret123");
    }

    #[tokio::test]
    async fn test_authenticate_right_right() {
        let (result, reply) = run_auth(&create_auth_request("user", "pass")).await;
        assert!(result.is_ok());
        assert_eq!(reply, vec![0x01, 0x00]);
    }

    #[tokio::test]
    async fn test_authenticate_right_wrong() {
        let (result, reply) = run_auth(&create_auth_request("user", "wrong")).await;
        assert!(matches!(result, Err(Socks5Error::AuthFailed)));
        assert_eq!(reply, vec![0x01, 0xFF]);
    }

    #[tokio::test]
    async fn test_authenticate_wrong_right() {
        let (result, reply) = run_auth(&create_auth_request("other", "pass")).await;
        assert!(matches!(result, Err(Socks5Error::AuthFailed)));
        assert_eq!(reply, vec![0x01, 0xFF]);
    }

    #[tokio::test]
    async fn test_authenticate_wrong_wrong() {
        let (result, reply) = run_auth(&create_auth_request("other", "wrong")).await;
        assert!(matches!(result, Err(Socks5Error::AuthFailed)));
        assert_eq!(reply, vec![0x01, 0xFF]);
    }

    #[tokio::test]
    async fn test_authenticate_empty_fields_are_compared() {
        let (result, reply) = run_auth(&create_auth_request("", "")).await;
        assert!(matches!(result, Err(Socks5Error::AuthFailed)));
        assert_eq!(reply, vec![0x01, 0xFF]);
    }

    #[tokio::test]
    async fn test_authenticate_invalid_version() {
        let mut request = create_auth_request("user", "pass");
        request[0] = 0x05;

        let (result, reply) = run_auth(&request).await;
        assert!(matches!(
            result,
            Err(Socks5Error::UnsupportedAuthVersion(0x05))
        ));
        assert!(reply.is_empty());
    }

    #[tokio::test]
    async fn test_authenticate_truncated_password() {
        let (mut client, mut server) = duplex(1024);
        let request = create_auth_request("user", "pass");
        client.write_all(&request[..request.len() - 2]).await.unwrap();
        drop(client);

        let credentials = Credentials::new("user", "pass");
        let result = PasswordAuth::authenticate(&mut server, &credentials).await;
        assert!(matches!(result, Err(Socks5Error::Read(_))));
    }

    #[test]
    fn test_constant_time_compare_equal() {
        assert!(constant_time_compare(b"hello", b"hello"));
        assert!(constant_time_compare(b"", b""));
    }

    #[test]
    fn test_constant_time_compare_not_equal() {
        assert!(!constant_time_compare(b"hello", b"world"));
        assert!(!constant_time_compare(b"hello", b"hell"));
        assert!(!constant_time_compare(b"", b"a"));
    }
}
