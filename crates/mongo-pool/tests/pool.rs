//! Pool behavior against the in-process mock server.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::time::Duration;

use mongo_client::{Config, doc};
use mongo_driver_pool::{Pool, PoolConfig, PoolError};
use mongo_testing::{MockMongoServer, MockResponse};

async fn handshakes(server: &MockMongoServer) -> usize {
    server
        .recorded()
        .await
        .iter()
        .filter(|op| op.command_name() == Some("isMaster"))
        .count()
}

async fn pings(server: &MockMongoServer) -> usize {
    server
        .recorded()
        .await
        .iter()
        .filter(|op| op.command_name() == Some("ping"))
        .count()
}

fn client_config(server: &MockMongoServer) -> Config {
    Config::new().host(server.host()).port(server.port())
}

// ============================================================================
// Creation
// ============================================================================

#[tokio::test]
async fn test_min_connections_opened_up_front() {
    let server = MockMongoServer::builder().build().await.unwrap();
    let pool = Pool::builder()
        .client_config(client_config(&server))
        .pool_config(PoolConfig::new().min_connections(2).max_connections(4))
        .build()
        .await
        .unwrap();

    assert_eq!(handshakes(&server).await, 2);
    let status = pool.status();
    assert_eq!(status.available, 2);
    assert_eq!(status.in_use, 0);
    assert_eq!(status.total, 2);
    assert_eq!(status.max, 4);
}

#[tokio::test]
async fn test_unreachable_server_fails_creation() {
    let server = MockMongoServer::builder().build().await.unwrap();
    let config = client_config(&server).connect_timeout(Duration::from_millis(500));
    server.stop();
    drop(server);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = Pool::builder()
        .client_config(config)
        .min_connections(1)
        .build()
        .await
        .unwrap_err();
    assert!(matches!(err, PoolError::ConnectionCreation(_)));
    assert!(err.is_transient());
}

// ============================================================================
// Checkout and return
// ============================================================================

#[tokio::test]
async fn test_returned_connection_is_reused() {
    let server = MockMongoServer::builder().build().await.unwrap();
    let pool = Pool::builder()
        .client_config(client_config(&server))
        .pool_config(PoolConfig::new().min_connections(0).test_on_checkout(false))
        .build()
        .await
        .unwrap();

    {
        let mut conn = pool.get().await.unwrap();
        conn.ping().await.unwrap();
        assert_eq!(pool.status().in_use, 1);
    }
    assert_eq!(pool.status().available, 1);

    let mut conn = pool.get().await.unwrap();
    conn.ping().await.unwrap();
    assert_eq!(handshakes(&server).await, 1);
}

#[tokio::test]
async fn test_checkout_ping_when_enabled() {
    let server = MockMongoServer::builder().build().await.unwrap();
    let pool = Pool::builder()
        .client_config(client_config(&server))
        .pool_config(PoolConfig::new().min_connections(1).test_on_checkout(true))
        .build()
        .await
        .unwrap();

    let conn = pool.get().await.unwrap();
    drop(conn);
    assert_eq!(pings(&server).await, 1);
}

#[tokio::test]
async fn test_custom_health_check_command() {
    let server = MockMongoServer::builder()
        .with_command("buildInfo", MockResponse::ok(doc! { "version" => "3.6.23" }))
        .build()
        .await
        .unwrap();
    let pool = Pool::builder()
        .client_config(client_config(&server))
        .pool_config(
            PoolConfig::new()
                .min_connections(1)
                .health_check_command(doc! { "buildInfo" => 1 }),
        )
        .build()
        .await
        .unwrap();

    drop(pool.get().await.unwrap());

    let recorded = server.recorded().await;
    let build_infos = recorded
        .iter()
        .filter(|op| op.command_name() == Some("buildInfo"))
        .count();
    assert_eq!(build_infos, 1);
    assert_eq!(pings(&server).await, 0);
}

#[tokio::test]
async fn test_unhealthy_connection_replaced() {
    let server = MockMongoServer::builder()
        .with_command("ping", MockResponse::command_error(13, "not authorized"))
        .build()
        .await
        .unwrap();
    let pool = Pool::builder()
        .client_config(client_config(&server))
        .pool_config(PoolConfig::new().min_connections(1).test_on_checkout(true))
        .build()
        .await
        .unwrap();

    let conn = pool.get().await.unwrap();
    assert!(!conn.is_closed());
    // The idle connection failed its ping, so a fresh one was opened
    assert_eq!(handshakes(&server).await, 2);
    assert_eq!(pool.status().total, 1);
}

#[tokio::test]
async fn test_cancelled_health_check_releases_slot() {
    let server = MockMongoServer::builder()
        .with_command("ping", MockResponse::Silent)
        .build()
        .await
        .unwrap();
    let pool = Pool::builder()
        .client_config(client_config(&server))
        .pool_config(PoolConfig::new().min_connections(1).test_on_checkout(true))
        .build()
        .await
        .unwrap();
    assert_eq!(pool.status().total, 1);

    // The ping never gets an answer, so the checkout is abandoned mid-check
    let abandoned = tokio::time::timeout(Duration::from_millis(100), pool.get()).await;
    assert!(abandoned.is_err());

    let status = pool.status();
    assert_eq!(status.total, 0);
    assert_eq!(status.in_use, 0);
    assert_eq!(status.available, 0);
}

#[tokio::test]
async fn test_closed_connection_not_returned() {
    let server = MockMongoServer::builder().build().await.unwrap();
    let pool = Pool::builder()
        .client_config(client_config(&server))
        .pool_config(PoolConfig::new().min_connections(0))
        .build()
        .await
        .unwrap();

    {
        let mut conn = pool.get().await.unwrap();
        conn.close().await;
    }
    let status = pool.status();
    assert_eq!(status.available, 0);
    assert_eq!(status.total, 0);

    let mut conn = pool.get().await.unwrap();
    conn.ping().await.unwrap();
    assert_eq!(handshakes(&server).await, 2);
}

#[tokio::test]
async fn test_expired_idle_connection_discarded() {
    let server = MockMongoServer::builder().build().await.unwrap();
    let pool = Pool::builder()
        .client_config(client_config(&server))
        .pool_config(
            PoolConfig::new()
                .min_connections(1)
                .idle_timeout(Duration::from_millis(20))
                .test_on_checkout(false),
        )
        .build()
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    let _conn = pool.get().await.unwrap();
    assert_eq!(handshakes(&server).await, 2);
    assert_eq!(pool.status().total, 1);
}

#[tokio::test]
async fn test_detach_frees_slot() {
    let server = MockMongoServer::builder().build().await.unwrap();
    let pool = Pool::builder()
        .client_config(client_config(&server))
        .pool_config(PoolConfig::new().min_connections(0).max_connections(1))
        .build()
        .await
        .unwrap();

    let mut client = pool.get().await.unwrap().detach().unwrap();
    client.ping().await.unwrap();
    assert_eq!(pool.status().total, 0);

    let _conn = pool.get().await.unwrap();
    assert_eq!(pool.status().total, 1);
}

// ============================================================================
// Limits
// ============================================================================

#[tokio::test]
async fn test_max_connections_times_out() {
    let server = MockMongoServer::builder().build().await.unwrap();
    let pool = Pool::builder()
        .client_config(client_config(&server))
        .pool_config(
            PoolConfig::new()
                .min_connections(0)
                .max_connections(1)
                .acquire_timeout(Duration::from_millis(100)),
        )
        .build()
        .await
        .unwrap();

    let _held = pool.get().await.unwrap();
    let err = pool.get().await.unwrap_err();
    assert!(matches!(err, PoolError::AcquisitionTimeout(_)));
}

#[tokio::test]
async fn test_waiter_gets_returned_connection() {
    let server = MockMongoServer::builder().build().await.unwrap();
    let pool = Pool::builder()
        .client_config(client_config(&server))
        .pool_config(
            PoolConfig::new()
                .min_connections(0)
                .max_connections(1)
                .test_on_checkout(false)
                .acquire_timeout(Duration::from_secs(5)),
        )
        .build()
        .await
        .unwrap();

    let held = pool.get().await.unwrap();
    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move {
            let mut conn = pool.get().await?;
            conn.ping().await.map_err(PoolError::UnhealthyConnection)?;
            Ok::<_, PoolError>(())
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    drop(held);
    waiter.await.unwrap().unwrap();
    assert_eq!(handshakes(&server).await, 1);
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test]
async fn test_closed_pool_rejects_checkout() {
    let server = MockMongoServer::builder().build().await.unwrap();
    let pool = Pool::builder()
        .client_config(client_config(&server))
        .pool_config(PoolConfig::new().min_connections(1))
        .build()
        .await
        .unwrap();

    pool.close().await;
    pool.close().await;
    assert!(pool.is_closed());
    assert_eq!(pool.status().total, 0);
    assert!(matches!(pool.get().await.unwrap_err(), PoolError::PoolClosed));
}

#[tokio::test]
async fn test_connection_returned_after_close_is_dropped() {
    let server = MockMongoServer::builder().build().await.unwrap();
    let pool = Pool::builder()
        .client_config(client_config(&server))
        .pool_config(PoolConfig::new().min_connections(0))
        .build()
        .await
        .unwrap();

    let conn = pool.get().await.unwrap();
    pool.close().await;
    drop(conn);

    let status = pool.status();
    assert_eq!(status.available, 0);
    assert_eq!(status.total, 0);
}
