//! # mongo-testing
//!
//! Test infrastructure for MongoDB driver development.
//!
//! This crate provides a mock wire-protocol server for unit tests and
//! testcontainers support for integration tests against a real server.
//!
//! ## Features
//!
//! - Mock server speaking `OP_QUERY` / `OP_REPLY` (no Docker required)
//! - In-memory collections with server-side cursors
//! - Scripted failures: silence, corrupt replies, mismatched response ids
//! - MongoDB container management via testcontainers
//!
//! ## Mock Server Example
//!
//! ```rust,ignore
//! use mongo_testing::mock_server::MockMongoServer;
//! use mongo_testing::fixtures::people;
//!
//! #[tokio::test]
//! async fn test_with_mock_server() {
//!     let server = MockMongoServer::builder()
//!         .with_collection("test.people", people(250))
//!         .build()
//!         .await
//!         .unwrap();
//!
//!     // Connect your client to server.addr()
//! }
//! ```
//!
//! ## Container Example
//!
//! ```rust,ignore
//! use mongo_testing::MongoContainer;
//! use testcontainers::runners::AsyncRunner;
//!
//! #[tokio::test]
//! async fn test_with_real_server() {
//!     let container = MongoContainer::default().start().await.unwrap();
//!     let port = container.get_host_port_ipv4(27017).await.unwrap();
//!     // Connect to localhost:port...
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod container;
pub mod fixtures;
pub mod mock_server;

pub use container::MongoContainer;
pub use mock_server::{
    MockMongoServer, MockResponse, MockServerBuilder, MockServerConfig, MockServerError,
    RecordedOp,
};
