//! Errors raised by the pool.

use std::time::Duration;

use thiserror::Error;

/// Failure to build the pool or check out a connection.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PoolError {
    /// No slot freed up within `acquire_timeout`.
    #[error("no connection available after {0:?}")]
    AcquisitionTimeout(Duration),

    /// [`Pool::close`](crate::Pool::close) was called.
    #[error("connection pool closed")]
    PoolClosed,

    /// Opening a new connection failed.
    #[error("could not open pooled connection: {0}")]
    ConnectionCreation(#[source] mongo_client::Error),

    /// The health-check command failed.
    #[error("pooled connection failed its health check: {0}")]
    UnhealthyConnection(#[source] mongo_client::Error),

    /// [`PoolConfig`](crate::PoolConfig) rejected.
    #[error("invalid pool configuration: {0}")]
    Configuration(String),
}

impl PoolError {
    /// Whether retrying `get` later may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::AcquisitionTimeout(_) => true,
            Self::ConnectionCreation(e) | Self::UnhealthyConnection(e) => e.is_transient(),
            Self::PoolClosed | Self::Configuration(_) => false,
        }
    }
}
