//! End-to-end tests against a running server on a loopback port

mod common;

use common::*;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UdpSocket;

const SUCCESS_PLACEHOLDER: [u8; 10] = [0x05, 0x00, 0x00, 0x01, 0, 0, 0, 0, 0, 0];

#[tokio::test]
async fn test_connect_without_auth_relays_both_ways() {
    let server = TestServer::start().await;
    let (listener, target) = create_test_listener().await;

    let upstream = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4];
        socket.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");
        socket.write_all(b"pong").await.unwrap();
    });

    let mut client = server.connect().await;
    assert_eq!(negotiate(&mut client, &[0x00]).await, 0x00);

    client.write_all(&ipv4_request(0x01, target)).await.unwrap();
    assert_eq!(read_reply(&mut client).await, SUCCESS_PLACEHOLDER);

    client.write_all(b"ping").await.unwrap();
    let mut buf = [0u8; 4];
    client.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"pong");

    upstream.await.unwrap();

    // Upstream closed its side; the proxy must pass the EOF on
    let mut rest = Vec::new();
    tokio::time::timeout(Duration::from_secs(2), client.read_to_end(&mut rest))
        .await
        .unwrap()
        .unwrap();
    assert!(rest.is_empty());
}

#[tokio::test]
async fn test_connect_with_password_auth() {
    let server = TestServer::start().await;
    let (listener, target) = create_test_listener().await;

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        socket.write_all(b"hello").await.unwrap();
    });

    let mut client = server.connect().await;
    assert_eq!(negotiate(&mut client, &[0x00, 0x02]).await, 0x02);
    assert_eq!(send_credentials(&mut client, USERNAME, PASSWORD).await, 0x00);

    client.write_all(&ipv4_request(0x01, target)).await.unwrap();
    assert_eq!(read_reply(&mut client).await, SUCCESS_PLACEHOLDER);

    let mut buf = [0u8; 5];
    client.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"hello");
}

#[tokio::test]
async fn test_password_preferred_regardless_of_offer_order() {
    let server = TestServer::start().await;

    let mut client = server.connect().await;
    assert_eq!(negotiate(&mut client, &[0x02, 0x00]).await, 0x02);
}

#[tokio::test]
async fn test_rejected_credentials_close_connection() {
    let server = TestServer::start().await;

    for (username, password) in [(USERNAME, "wrong"), ("mallory", PASSWORD), ("mallory", "wrong")] {
        let mut client = server.connect().await;
        assert_eq!(negotiate(&mut client, &[0x02]).await, 0x02);
        assert_eq!(send_credentials(&mut client, username, password).await, 0xFF);

        let mut rest = Vec::new();
        tokio::time::timeout(Duration::from_secs(2), client.read_to_end(&mut rest))
            .await
            .unwrap()
            .unwrap();
        assert!(rest.is_empty());
    }
}

#[tokio::test]
async fn test_no_acceptable_method() {
    let server = TestServer::start().await;

    let mut client = server.connect().await;
    assert_eq!(negotiate(&mut client, &[0x01]).await, 0xFF);

    let mut rest = Vec::new();
    tokio::time::timeout(Duration::from_secs(2), client.read_to_end(&mut rest))
        .await
        .unwrap()
        .unwrap();
    assert!(rest.is_empty());
}

#[tokio::test]
async fn test_bind_command_not_supported() {
    let server = TestServer::start().await;
    let target: SocketAddr = "127.0.0.1:80".parse().unwrap();

    let mut client = server.connect().await;
    negotiate(&mut client, &[0x00]).await;
    client.write_all(&ipv4_request(0x02, target)).await.unwrap();

    let reply = read_reply(&mut client).await;
    assert_eq!(reply[1], 0x07);
}

#[tokio::test]
async fn test_udp_associate_forwards_and_survives_short_datagram() {
    let server = TestServer::start().await;

    let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let destination = receiver.local_addr().unwrap();

    let mut control = server.connect().await;
    negotiate(&mut control, &[0x00]).await;
    control
        .write_all(&ipv4_request(0x03, "0.0.0.0:0".parse().unwrap()))
        .await
        .unwrap();

    let reply = read_reply(&mut control).await;
    assert_eq!(&reply[..8], &SUCCESS_PLACEHOLDER[..8]);
    let relay_port = u16::from_be_bytes([reply[8], reply[9]]);
    assert_ne!(relay_port, 0);

    let relay = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), relay_port);
    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    let mut buf = [0u8; 128];

    sender
        .send_to(&ipv4_datagram(destination, b"first"), relay)
        .await
        .unwrap();
    let (n, _) = tokio::time::timeout(Duration::from_secs(2), receiver.recv_from(&mut buf))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&buf[..n], b"first");

    // Too short to carry a header; dropped without ending the association
    sender.send_to(&[0, 0, 0, 1, 127], relay).await.unwrap();

    sender
        .send_to(&ipv4_datagram(destination, b"second"), relay)
        .await
        .unwrap();
    let (n, _) = tokio::time::timeout(Duration::from_secs(2), receiver.recv_from(&mut buf))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&buf[..n], b"second");
}

#[tokio::test]
async fn test_dial_failure_closes_after_success_reply() {
    let server = TestServer::start().await;
    let (listener, target) = create_test_listener().await;
    drop(listener);

    let mut client = server.connect().await;
    negotiate(&mut client, &[0x00]).await;
    client.write_all(&ipv4_request(0x01, target)).await.unwrap();

    // Success is reported before the dial is attempted
    assert_eq!(read_reply(&mut client).await, SUCCESS_PLACEHOLDER);

    let mut rest = Vec::new();
    let result = tokio::time::timeout(Duration::from_secs(2), client.read_to_end(&mut rest))
        .await
        .unwrap();
    assert!(result.is_err() || rest.is_empty());
}
