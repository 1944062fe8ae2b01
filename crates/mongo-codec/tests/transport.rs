//! Transport behaviour over in-memory streams.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::time::Duration;

use mongo_codec::{CodecError, Transport};
use mongo_protocol::{HEADER_SIZE, OpCode, OpQuery, OpReply};
use mongo_types::doc;
use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

const TIMEOUT: Duration = Duration::from_millis(200);

// ============================================================================
// Send / receive
// ============================================================================

#[tokio::test]
async fn test_send_writes_whole_message() {
    let (client, mut server) = duplex(4096);
    let mut transport = Transport::new(client, TIMEOUT);

    let message = OpQuery::command("admin", doc! { "ping" => 1 }).encode(1).unwrap();
    transport.send(message.clone()).await.unwrap();

    let mut received = vec![0u8; message.len()];
    server.read_exact(&mut received).await.unwrap();
    assert_eq!(received, message.to_vec());
}

#[tokio::test]
async fn test_receive_reassembles_split_frame() {
    let (client, mut server) = duplex(4096);
    let mut transport = Transport::new(client, Duration::from_secs(2));

    let reply = OpReply::new(0, vec![doc! { "ok" => 1.0 }]).encode(9, 1).unwrap();
    let (first, second) = reply.split_at(HEADER_SIZE + 3);
    let first = first.to_vec();
    let second = second.to_vec();

    let writer = tokio::spawn(async move {
        server.write_all(&first).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        server.write_all(&second).await.unwrap();
        server
    });

    let frame = transport.receive().await.unwrap();
    assert_eq!(frame.header.op_code, OpCode::Reply);
    assert_eq!(frame.header.response_to, 1);
    assert_eq!(frame.total_size(), reply.len());
    let _server = writer.await.unwrap();
}

// ============================================================================
// Failure policy
// ============================================================================

#[tokio::test]
async fn test_timeout_closes_transport() {
    let (client, _server) = duplex(4096);
    let mut transport = Transport::new(client, Duration::from_millis(50));

    let err = transport.receive().await.unwrap_err();
    assert!(matches!(err, CodecError::Timeout(_)));
    assert!(transport.is_closed());

    let message = OpQuery::command("admin", doc! { "ping" => 1 }).encode(2).unwrap();
    let err = transport.send(message).await.unwrap_err();
    assert!(matches!(err, CodecError::ConnectionClosed));
}

#[tokio::test]
async fn test_timeout_covers_header_and_body() {
    let (client, mut server) = duplex(4096);
    let mut transport = Transport::new(client, Duration::from_millis(150));

    let reply = OpReply::new(0, vec![doc! { "ok" => 1.0 }]).encode(9, 1).unwrap();
    let header = reply[..HEADER_SIZE].to_vec();

    // header arrives promptly, body never does
    server.write_all(&header).await.unwrap();
    let started = std::time::Instant::now();
    let err = transport.receive().await.unwrap_err();
    assert!(err.is_timeout());
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_peer_close_is_reported() {
    let (client, server) = duplex(4096);
    let mut transport = Transport::new(client, TIMEOUT);
    drop(server);

    let err = transport.receive().await.unwrap_err();
    assert!(matches!(err, CodecError::PeerClosed | CodecError::Io(_)));
    assert!(transport.is_closed());
}

#[tokio::test]
async fn test_invalid_header_closes_transport() {
    let (client, mut server) = duplex(4096);
    let mut transport = Transport::new(client, TIMEOUT);

    let mut bogus = Vec::new();
    bogus.extend_from_slice(&4i32.to_le_bytes());
    bogus.extend_from_slice(&[0u8; 12]);
    server.write_all(&bogus).await.unwrap();

    let err = transport.receive().await.unwrap_err();
    assert!(matches!(err, CodecError::Protocol(_)));
    assert!(transport.is_closed());
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let (client, _server) = duplex(64);
    let mut transport = Transport::new(client, TIMEOUT);
    transport.close().await;
    transport.close().await;
    assert!(transport.is_closed());
    assert!(matches!(
        transport.receive().await,
        Err(CodecError::ConnectionClosed)
    ));
}

#[tokio::test]
async fn test_abandoned_receive_closes_transport() {
    let (client, _server) = duplex(4096);
    let mut transport = Transport::new(client, Duration::from_secs(5));

    // Drop the receive future before it completes
    let abandoned = tokio::time::timeout(Duration::from_millis(20), transport.receive()).await;
    assert!(abandoned.is_err());

    assert!(transport.is_closed());
    assert!(matches!(
        transport.receive().await,
        Err(CodecError::ConnectionClosed)
    ));
}
