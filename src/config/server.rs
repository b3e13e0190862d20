//! Server configuration types
//!
//! Defines the configuration structures for the SOCKS5 server.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Longest username or password representable in RFC 1929 (one length byte)
const MAX_CREDENTIAL_LEN: usize = 255;

/// Default listen address
fn default_listen_addr() -> String {
    "0.0.0.0:1080".to_string()
}

/// Default handshake timeout in seconds
fn default_handshake_timeout() -> u64 {
    10
}

/// Default upstream connect timeout in seconds
fn default_connect_timeout() -> u64 {
    10
}

/// Root server configuration
///
/// Loaded once at startup and shared read-only by every connection.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listen address (e.g., "0.0.0.0:1080")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Log file path; logs go to stdout when unset
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Seconds allowed for negotiation, authentication and request parsing
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout: u64,

    /// Seconds allowed for dialing the upstream target
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Username/password credentials
    pub credentials: Credentials,
}

/// Username/password pair checked during RFC 1929 sub-negotiation
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Expected username
    pub username: String,

    /// Expected password
    pub password: String,
}

impl Credentials {
    /// Create a new credential pair
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Keep the password out of log lines.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl ServerConfig {
    /// Create a configuration with default timeouts and no log file
    pub fn new(listen_addr: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            log_file: None,
            handshake_timeout: default_handshake_timeout(),
            connect_timeout: default_connect_timeout(),
            credentials,
        }
    }

    /// Handshake timeout as a Duration
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout)
    }

    /// Connect timeout as a Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.trim().is_empty() {
            return Err("listen_addr must not be empty".to_string());
        }
        if self.credentials.username.len() > MAX_CREDENTIAL_LEN {
            return Err(format!(
                "username is {} bytes, at most {} are supported",
                self.credentials.username.len(),
                MAX_CREDENTIAL_LEN
            ));
        }
        if self.credentials.password.len() > MAX_CREDENTIAL_LEN {
            return Err(format!(
                "password is {} bytes, at most {} are supported",
                self.credentials.password.len(),
                MAX_CREDENTIAL_LEN
            ));
        }
        if self.handshake_timeout == 0 || self.connect_timeout == 0 {
            return Err("timeouts must be at least one second".to_string());
        }
        Ok(())
    }
}
