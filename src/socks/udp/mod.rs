//! UDP ASSOCIATE module for SOCKS5
//!
//! Handles UDP ASSOCIATE requests. Relaying is forward-only: payloads are
//! delivered to their destination and nothing is sent back to the client.

mod associate;
mod forwarder;
mod packet;

pub use associate::{handle_udp_associate, UdpAssociation};
pub use forwarder::forward_datagram;
pub use packet::{parse_udp_packet, UdpPacket};
