//! Error types for Socksgate
//!
//! This module defines all custom error types used throughout the application.

use std::io;
use thiserror::Error;

/// Main error type for Socksgate operations
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Log sink setup error
    #[error("Logging error: {0}")]
    Logging(String),
}

/// SOCKS5 specific errors
#[derive(Error, Debug)]
pub enum Socks5Error {
    /// Unsupported SOCKS version
    #[error("Unsupported SOCKS version: {0}")]
    UnsupportedVersion(u8),

    /// No acceptable authentication method
    #[error("No acceptable authentication method")]
    NoAcceptableMethod,

    /// Unsupported username/password sub-negotiation version
    #[error("Unsupported auth version: {0}")]
    UnsupportedAuthVersion(u8),

    /// Authentication failed
    #[error("Authentication failed")]
    AuthFailed,

    /// Command not supported
    #[error("Command not supported: {0}")]
    CommandNotSupported(u8),

    /// Address type not supported
    #[error("Address type not supported: {0}")]
    AddressTypeNotSupported(u8),

    /// Domain name bytes are not valid UTF-8
    #[error("Invalid domain name: {0}")]
    InvalidDomain(String),

    /// Domain name does not fit in the single length byte
    #[error("Domain name too long: {0} bytes (max 255)")]
    DomainTooLong(usize),

    /// Dialing the requested target failed
    #[error("Failed to connect to {target}: {source}")]
    UpstreamDial {
        /// Target as requested by the client
        target: String,
        /// Underlying connect error
        #[source]
        source: io::Error,
    },

    /// Copying between client and target failed
    #[error("Relay error ({direction}): {source}")]
    Relay {
        /// Which copy direction failed
        direction: &'static str,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Reading from the client connection failed
    #[error("Read error: {0}")]
    Read(#[source] io::Error),

    /// Writing to the client connection failed
    #[error("Write error: {0}")]
    Write(#[source] io::Error),

    /// UDP datagram could not be decoded
    #[error("Malformed datagram: {0}")]
    MalformedDatagram(String),

    /// A bounded operation did not finish in time
    #[error("Timeout: {0}")]
    Timeout(String),
}

/// Reply codes for SOCKS5 protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Socks5ReplyCode {
    /// Command succeeded
    Succeeded = 0x00,
    /// General SOCKS server failure
    GeneralFailure = 0x01,
    /// Connection not allowed by ruleset
    ConnectionNotAllowed = 0x02,
    /// Network unreachable
    NetworkUnreachable = 0x03,
    /// Host unreachable
    HostUnreachable = 0x04,
    /// Connection refused
    ConnectionRefused = 0x05,
    /// TTL expired
    TtlExpired = 0x06,
    /// Command not supported
    CommandNotSupported = 0x07,
    /// Address type not supported
    AddressTypeNotSupported = 0x08,
}

impl From<Socks5ReplyCode> for u8 {
    fn from(code: Socks5ReplyCode) -> Self {
        code as u8
    }
}
