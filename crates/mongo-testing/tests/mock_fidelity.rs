//! Mock server fidelity tests.
//!
//! These tests talk to the mock server with raw protocol messages, without
//! the client crate, to check that its framing and reply flags look like a
//! real server's.
//!
//! ```bash
//! cargo test -p mongo-testing --test mock_fidelity
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::time::Duration;

use mongo_codec::Transport;
use mongo_protocol::{OpCode, OpGetMore, OpKillCursors, OpQuery, OpReply};
use mongo_testing::{MockMongoServer, MockResponse, RecordedOp};
use mongo_types::{Document, doc};

async fn connect(server: &MockMongoServer) -> Transport {
    Transport::connect(server.addr(), Duration::from_secs(5), Duration::from_secs(5))
        .await
        .expect("connect to mock server")
}

async fn round_trip(transport: &mut Transport, request_id: i32, message: bytes::Bytes) -> OpReply {
    transport.send(message).await.unwrap();
    let frame = transport.receive().await.unwrap();
    assert_eq!(frame.header.op_code, OpCode::Reply);
    assert_eq!(frame.header.response_to, request_id);
    OpReply::decode_body(&frame.body).unwrap()
}

fn numbered(count: i32) -> Vec<Document> {
    (0..count).map(|n| doc! { "_id" => n }).collect()
}

// =============================================================================
// Server Structure
// =============================================================================

#[tokio::test]
async fn test_mock_server_starts_and_listens() {
    let server = MockMongoServer::builder()
        .build()
        .await
        .expect("Server should start");

    assert!(server.port() > 0, "Should have valid port");
    assert_eq!(server.host(), "127.0.0.1", "Should listen on localhost");
    assert_eq!(server.connection_count().await, 0, "Should start with no connections");

    server.stop();
}

#[tokio::test]
async fn test_multiple_mock_servers() {
    let first = MockMongoServer::builder().build().await.unwrap();
    let second = MockMongoServer::builder().build().await.unwrap();
    assert_ne!(first.port(), second.port());
}

#[tokio::test]
async fn test_connection_count_tracks_clients() {
    let server = MockMongoServer::builder().build().await.unwrap();
    let mut transport = connect(&server).await;

    // A round trip guarantees the server task registered the connection
    let query = OpQuery::command("admin", doc! { "ping" => 1 });
    round_trip(&mut transport, 1, query.encode(1).unwrap()).await;
    assert_eq!(server.connection_count().await, 1);

    transport.close().await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(server.connection_count().await, 0);
}

// =============================================================================
// Commands
// =============================================================================

#[tokio::test]
async fn test_handshake_reply_shape() {
    let server = MockMongoServer::builder().build().await.unwrap();
    let mut transport = connect(&server).await;

    let query = OpQuery::command("admin", doc! { "isMaster" => 1 });
    let reply = round_trip(&mut transport, 7, query.encode(7).unwrap()).await;

    assert_eq!(reply.cursor_id, 0);
    assert_eq!(reply.documents.len(), 1);
    let hello = &reply.documents[0];
    assert_eq!(hello.get_bool("ismaster"), Some(true));
    assert!(hello.get_i32("maxWireVersion").is_some());
    assert_eq!(hello.get_f64("ok"), Some(1.0));
}

#[tokio::test]
async fn test_scripted_command_is_case_insensitive() {
    let server = MockMongoServer::builder()
        .with_command("buildInfo", MockResponse::ok(doc! { "version" => "3.6.23" }))
        .build()
        .await
        .unwrap();
    let mut transport = connect(&server).await;

    let query = OpQuery::command("admin", doc! { "buildinfo" => 1 });
    let reply = round_trip(&mut transport, 1, query.encode(1).unwrap()).await;
    assert_eq!(reply.documents[0].get_str("version"), Some("3.6.23"));
}

#[tokio::test]
async fn test_unknown_command_is_ok_zero() {
    let server = MockMongoServer::builder().build().await.unwrap();
    let mut transport = connect(&server).await;

    let query = OpQuery::command("admin", doc! { "frobnicate" => 1 });
    let reply = round_trip(&mut transport, 1, query.encode(1).unwrap()).await;
    assert!(!reply.is_query_failure());
    assert_eq!(reply.documents[0].get_f64("ok"), Some(0.0));
    assert_eq!(reply.documents[0].get_i32("code"), Some(59));
}

#[tokio::test]
async fn test_query_failure_sets_flag() {
    let server = MockMongoServer::builder()
        .with_query_response("test.broken", MockResponse::query_failure("bad $where", 2))
        .build()
        .await
        .unwrap();
    let mut transport = connect(&server).await;

    let query = OpQuery::new("test.broken", doc! {}, 0);
    let reply = round_trip(&mut transport, 1, query.encode(1).unwrap()).await;
    assert!(reply.is_query_failure());
    assert_eq!(reply.documents[0].get_str("$err"), Some("bad $where"));
}

// =============================================================================
// Cursors
// =============================================================================

#[tokio::test]
async fn test_cursor_batches_and_exhaustion() {
    let server = MockMongoServer::builder()
        .with_collection("test.items", numbered(5))
        .build()
        .await
        .unwrap();
    let mut transport = connect(&server).await;

    let query = OpQuery::new("test.items", doc! {}, 2);
    let first = round_trip(&mut transport, 1, query.encode(1).unwrap()).await;
    assert_eq!(first.documents.len(), 2);
    assert_ne!(first.cursor_id, 0);

    let get_more = OpGetMore::new("test.items", first.cursor_id, 2);
    let second = round_trip(&mut transport, 2, get_more.encode(2).unwrap()).await;
    assert_eq!(second.documents.len(), 2);

    let get_more = OpGetMore::new("test.items", first.cursor_id, 2);
    let last = round_trip(&mut transport, 3, get_more.encode(3).unwrap()).await;
    assert_eq!(last.documents.len(), 1);
    assert_eq!(last.cursor_id, 0);
}

#[tokio::test]
async fn test_negative_number_to_return_closes_cursor() {
    let server = MockMongoServer::builder()
        .with_collection("test.items", numbered(10))
        .build()
        .await
        .unwrap();
    let mut transport = connect(&server).await;

    let query = OpQuery::new("test.items", doc! {}, -3);
    let reply = round_trip(&mut transport, 1, query.encode(1).unwrap()).await;
    assert_eq!(reply.documents.len(), 3);
    assert_eq!(reply.cursor_id, 0);
}

#[tokio::test]
async fn test_unknown_cursor_reports_not_found() {
    let server = MockMongoServer::builder().build().await.unwrap();
    let mut transport = connect(&server).await;

    let get_more = OpGetMore::new("test.items", 424_242, 10);
    let reply = round_trip(&mut transport, 1, get_more.encode(1).unwrap()).await;
    assert!(reply.is_cursor_not_found());
    assert!(reply.documents.is_empty());
}

#[tokio::test]
async fn test_kill_cursors_has_no_reply() {
    let server = MockMongoServer::builder()
        .with_collection("test.items", numbered(5))
        .build()
        .await
        .unwrap();
    let mut transport = connect(&server).await;

    let query = OpQuery::new("test.items", doc! {}, 2);
    let first = round_trip(&mut transport, 1, query.encode(1).unwrap()).await;

    let kill = OpKillCursors::new(vec![first.cursor_id]);
    transport.send(kill.encode(2).unwrap()).await.unwrap();

    // The next reply on the wire answers the get-more, so kill-cursors sent
    // nothing back; the killed cursor is gone
    let get_more = OpGetMore::new("test.items", first.cursor_id, 2);
    let reply = round_trip(&mut transport, 3, get_more.encode(3).unwrap()).await;
    assert!(reply.is_cursor_not_found());

    let recorded = server.recorded().await;
    assert!(recorded.iter().any(|op| matches!(
        op,
        RecordedOp::KillCursors { cursor_ids } if cursor_ids == &vec![first.cursor_id]
    )));
}

#[tokio::test]
async fn test_cursors_are_per_connection() {
    let server = MockMongoServer::builder()
        .with_collection("test.items", numbered(5))
        .build()
        .await
        .unwrap();
    let mut owner = connect(&server).await;
    let mut other = connect(&server).await;

    let query = OpQuery::new("test.items", doc! {}, 2);
    let first = round_trip(&mut owner, 1, query.encode(1).unwrap()).await;

    let get_more = OpGetMore::new("test.items", first.cursor_id, 2);
    let reply = round_trip(&mut other, 1, get_more.encode(1).unwrap()).await;
    assert!(reply.is_cursor_not_found());
}
