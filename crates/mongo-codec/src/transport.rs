//! Deadline-bounded framed transport.
//!
//! A [`Transport`] owns one byte stream and moves whole messages across it.
//! Any failure, elapsed deadline or abandoned operation leaves the transport
//! closed; every later call fails with [`CodecError::ConnectionClosed`]
//! rather than touching a stream whose framing state is unknown.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use crate::error::CodecError;
use crate::frame_codec::{Frame, MessageCodec};

/// A framed, deadline-bounded connection to one peer.
pub struct Transport<T = TcpStream>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    framed: Option<Framed<T, MessageCodec>>,
    io_timeout: Duration,
    /// Set while a send or receive is in flight. Still set at the start of
    /// the next call means the previous future was dropped mid-operation.
    in_flight: bool,
}

impl Transport<TcpStream> {
    /// Open a TCP connection to `addr`.
    ///
    /// `connect_timeout` bounds the TCP handshake; `io_timeout` bounds each
    /// later send and receive.
    pub async fn connect(
        addr: SocketAddr,
        connect_timeout: Duration,
        io_timeout: Duration,
    ) -> Result<Self, CodecError> {
        tracing::debug!(%addr, ?connect_timeout, "opening TCP connection");

        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| CodecError::ConnectTimeout {
                addr,
                timeout: connect_timeout,
            })?
            .map_err(|source| CodecError::Connect { addr, source })?;

        // Request/reply traffic is latency bound
        stream.set_nodelay(true)?;

        Ok(Self::new(stream, io_timeout))
    }
}

impl<T> Transport<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already-connected stream.
    pub fn new(io: T, io_timeout: Duration) -> Self {
        Self::with_codec(io, MessageCodec::new(), io_timeout)
    }

    /// Wrap a stream with a custom codec.
    pub fn with_codec(io: T, codec: MessageCodec, io_timeout: Duration) -> Self {
        Self {
            framed: Some(Framed::new(io, codec)),
            io_timeout,
            in_flight: false,
        }
    }

    /// Deadline applied to each send and receive.
    #[must_use]
    pub fn io_timeout(&self) -> Duration {
        self.io_timeout
    }

    /// Change the deadline applied to later operations.
    pub fn set_io_timeout(&mut self, timeout: Duration) {
        self.io_timeout = timeout;
    }

    /// Whether the transport has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.framed.is_none() || self.in_flight
    }

    fn begin(&mut self) -> Result<(), CodecError> {
        if self.in_flight {
            tracing::warn!("previous operation was abandoned mid-flight; closing transport");
            self.framed = None;
            self.in_flight = false;
        }
        if self.framed.is_none() {
            return Err(CodecError::ConnectionClosed);
        }
        self.in_flight = true;
        Ok(())
    }

    fn fail(&mut self, error: CodecError) -> CodecError {
        tracing::debug!(%error, "transport failed; closing");
        self.framed = None;
        self.in_flight = false;
        error
    }

    /// Write one complete message and flush it.
    ///
    /// Nothing is resent after a failure; the transport is closed instead.
    pub async fn send(&mut self, message: Bytes) -> Result<(), CodecError> {
        self.begin()?;
        let timeout = self.io_timeout;
        let Some(framed) = self.framed.as_mut() else {
            return Err(CodecError::ConnectionClosed);
        };

        let result = tokio::time::timeout(timeout, framed.send(message)).await;
        match result {
            Ok(Ok(())) => {
                self.in_flight = false;
                Ok(())
            }
            Ok(Err(e)) => Err(self.fail(e)),
            Err(_) => Err(self.fail(CodecError::Timeout(timeout))),
        }
    }

    /// Read exactly one message.
    ///
    /// A single deadline covers both the header and the body.
    pub async fn receive(&mut self) -> Result<Frame, CodecError> {
        self.begin()?;
        let timeout = self.io_timeout;
        let Some(framed) = self.framed.as_mut() else {
            return Err(CodecError::ConnectionClosed);
        };

        let result = tokio::time::timeout(timeout, framed.next()).await;
        match result {
            Ok(Some(Ok(frame))) => {
                self.in_flight = false;
                Ok(frame)
            }
            Ok(Some(Err(e))) => Err(self.fail(e)),
            Ok(None) => Err(self.fail(CodecError::PeerClosed)),
            Err(_) => Err(self.fail(CodecError::Timeout(timeout))),
        }
    }

    /// Close the transport. Calling this more than once is harmless.
    pub async fn close(&mut self) {
        self.in_flight = false;
        if let Some(framed) = self.framed.take() {
            let mut io = framed.into_inner();
            // Best effort: the peer may already be gone
            if let Err(e) = io.shutdown().await {
                tracing::trace!(error = %e, "shutdown after close failed");
            }
        }
    }
}

impl<T> fmt::Debug for Transport<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("closed", &self.is_closed())
            .field("io_timeout", &self.io_timeout)
            .finish()
    }
}
