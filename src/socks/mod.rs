//! SOCKS5 module for Socksgate
//!
//! This module implements the SOCKS5 protocol (RFC 1928) with
//! username/password authentication (RFC 1929), TCP CONNECT and a
//! forward-only UDP ASSOCIATE relay.

mod auth;
mod command;
mod consts;
mod handler;
mod tcp_relay;
mod types;
mod udp;

pub use auth::{authenticate, negotiate_method, AuthMethod, PasswordAuth};
pub use command::{build_reply, parse_command};
pub use consts::*;
pub use handler::handle_socks5_on_stream;
pub use tcp_relay::{connect_target, handle_tcp_connect, relay_tcp};
pub use types::{SocksCommand, TargetAddr};
pub use udp::{forward_datagram, handle_udp_associate, parse_udp_packet, UdpAssociation, UdpPacket};
