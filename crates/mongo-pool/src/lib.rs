//! # mongo-driver-pool
//!
//! Connection pool for the legacy-protocol MongoDB client.
//!
//! A [`mongo_client::Client`] runs one request at a time. The pool hands out
//! exclusive clients to concurrent tasks and takes them back when the
//! borrower is done.
//!
//! ## Features
//!
//! - A semaphore caps open connections at `max_connections`
//! - Idle and lifetime limits are checked when a connection is checked out
//! - A health-check command (`{ping: 1}` unless configured) runs on checkout
//! - Connections whose transport closed are discarded, never reused
//!
//! ## Example
//!
//! ```rust,ignore
//! use mongo_client::Config;
//! use mongo_driver_pool::{Pool, PoolConfig};
//!
//! let pool = Pool::builder()
//!     .client_config(Config::from_connection_string("mongodb://localhost/app")?)
//!     .pool_config(PoolConfig::new().max_connections(20))
//!     .build()
//!     .await?;
//!
//! let mut client = pool.get().await?;
//! client.ping().await?;
//! // Dropping `client` puts it back in the idle queue
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod pool;

pub use config::PoolConfig;
pub use error::PoolError;
pub use lifecycle::ConnectionLifecycle;
pub use pool::{Pool, PoolBuilder, PoolStatus, PooledConnection};
