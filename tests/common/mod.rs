//! Test utilities for Socksgate
//!
//! This module provides common test utilities used across integration tests.

#![allow(dead_code)]

use socksgate::config::{Credentials, ServerConfig};
use socksgate::server::Server;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "s3cret";

/// A server running in the background for the duration of a test
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown_tx: broadcast::Sender<bool>,
}

impl TestServer {
    /// Bind on an ephemeral loopback port and start serving
    pub async fn start() -> Self {
        let config = ServerConfig::new("127.0.0.1:0", Credentials::new(USERNAME, PASSWORD));
        let server = Server::bind(Arc::new(config)).await.unwrap();
        let addr = server.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        tokio::spawn(server.serve(shutdown_rx));

        TestServer { addr, shutdown_tx }
    }

    /// Open a raw TCP connection to the server
    pub async fn connect(&self) -> TcpStream {
        TcpStream::connect(self.addr).await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Create a test TCP listener on an available port
pub async fn create_test_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Run method negotiation offering `methods`, returning the selected byte
pub async fn negotiate(stream: &mut TcpStream, methods: &[u8]) -> u8 {
    let mut greeting = vec![0x05, methods.len() as u8];
    greeting.extend_from_slice(methods);
    stream.write_all(&greeting).await.unwrap();

    let mut reply = [0u8; 2];
    stream.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply[0], 0x05);
    reply[1]
}

/// Run the RFC 1929 sub-negotiation, returning the status byte
pub async fn send_credentials(stream: &mut TcpStream, username: &str, password: &str) -> u8 {
    let mut request = vec![0x01, username.len() as u8];
    request.extend_from_slice(username.as_bytes());
    request.push(password.len() as u8);
    request.extend_from_slice(password.as_bytes());
    stream.write_all(&request).await.unwrap();

    let mut reply = [0u8; 2];
    stream.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply[0], 0x01);
    reply[1]
}

/// Encode a request for `cmd` towards an IPv4 target
pub fn ipv4_request(cmd: u8, target: SocketAddr) -> Vec<u8> {
    let SocketAddr::V4(target) = target else {
        panic!("IPv4 target expected");
    };

    let mut request = vec![0x05, cmd, 0x00, 0x01];
    request.extend_from_slice(&target.ip().octets());
    request.extend_from_slice(&target.port().to_be_bytes());
    request
}

/// Read a 10-byte IPv4 reply
pub async fn read_reply(stream: &mut TcpStream) -> [u8; 10] {
    let mut reply = [0u8; 10];
    stream.read_exact(&mut reply).await.unwrap();
    reply
}

/// Encode a UDP request datagram towards an IPv4 target
pub fn ipv4_datagram(target: SocketAddr, payload: &[u8]) -> Vec<u8> {
    let mut datagram = vec![0x00, 0x00, 0x00];
    datagram.extend_from_slice(&ipv4_request(0, target)[3..]);
    datagram.extend_from_slice(payload);
    datagram
}
