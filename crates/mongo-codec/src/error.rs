//! Codec and transport error types.

use std::net::SocketAddr;
use std::time::Duration;

use mongo_protocol::ProtocolError;
use thiserror::Error;

/// Errors raised by framing and by the transport.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TCP connect failed.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// Endpoint that was dialled.
        addr: SocketAddr,
        /// Cause.
        #[source]
        source: std::io::Error,
    },

    /// TCP connect did not complete in time.
    #[error("connect to {addr} timed out after {timeout:?}")]
    ConnectTimeout {
        /// Endpoint that was dialled.
        addr: SocketAddr,
        /// Deadline that elapsed.
        timeout: Duration,
    },

    /// Frame header is malformed or declares an unacceptable length.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Frame exceeds the configured maximum.
    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge {
        /// Frame size.
        size: usize,
        /// Limit in force.
        max: usize,
    },

    /// Transport is closed, either explicitly or after an earlier failure.
    #[error("connection closed")]
    ConnectionClosed,

    /// Peer closed the stream.
    #[error("connection closed by peer")]
    PeerClosed,

    /// Send or receive deadline elapsed.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
}

impl CodecError {
    /// Returns true for deadline expiry.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::ConnectTimeout { .. })
    }
}
