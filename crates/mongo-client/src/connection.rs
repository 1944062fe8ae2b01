//! Request/reply round trips over one transport.
//!
//! A [`Connection`] numbers its requests, matches each reply to the request
//! that produced it and turns reply flags into errors. It never pipelines:
//! one request is outstanding at a time, enforced by `&mut self`.

use std::fmt;

use mongo_codec::{Frame, Transport};
use mongo_protocol::{
    Namespace, OpCode, OpGetMore, OpKillCursors, OpQuery, OpReply, ProtocolError, QueryFlags,
    validate_database_name,
};
use mongo_types::Document;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::error::{Error, Result};

/// One reply's worth of documents plus the cursor to continue from.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Documents in server order.
    pub documents: Vec<Document>,
    /// Server cursor id; 0 when the result set is exhausted.
    pub cursor_id: i64,
}

/// Per-query wire options.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Documents to skip.
    pub skip: i32,
    /// Documents per batch; 0 lets the server choose, negative asks for a
    /// single batch and no cursor.
    pub batch_size: i32,
    /// Fields to return.
    pub projection: Option<Document>,
    /// Query flags.
    pub flags: QueryFlags,
}

/// A numbered request/reply channel to one server.
pub struct Connection<T = TcpStream>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    transport: Transport<T>,
    next_request_id: i32,
    /// Cursors dropped while open; killed before the next request.
    pending_kills: Vec<i64>,
}

impl<T> Connection<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a transport.
    pub fn new(transport: Transport<T>) -> Self {
        Self {
            transport,
            next_request_id: 1,
            pending_kills: Vec::new(),
        }
    }

    /// Whether the underlying transport is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.transport.is_closed()
    }

    /// Close the transport. Queued cursor kills are discarded; the server
    /// reaps cursors of closed connections itself.
    pub async fn close(&mut self) {
        self.pending_kills.clear();
        self.transport.close().await;
    }

    fn allocate_request_id(&mut self) -> i32 {
        let id = self.next_request_id;
        self.next_request_id = id.wrapping_add(1);
        id
    }

    /// Remember a cursor to kill before the next request.
    pub(crate) fn queue_kill(&mut self, cursor_id: i64) {
        if cursor_id != 0 && !self.is_closed() {
            self.pending_kills.push(cursor_id);
        }
    }

    /// Number of cursor kills waiting to be sent.
    #[must_use]
    pub fn pending_kill_count(&self) -> usize {
        self.pending_kills.len()
    }

    async fn flush_pending_kills(&mut self) -> Result<()> {
        if self.pending_kills.is_empty() {
            return Ok(());
        }
        let ids = std::mem::take(&mut self.pending_kills);
        tracing::debug!(count = ids.len(), "killing abandoned cursors");
        self.kill_cursors(ids).await
    }

    /// Run a command against `<db>.$cmd` and return the first reply document.
    ///
    /// The `ok` field is not inspected here; see
    /// [`Client::run_command`](crate::Client::run_command).
    pub async fn send_command(&mut self, db: &str, command: Document) -> Result<Document> {
        validate_database_name(db)?;
        let query = OpQuery::command(db, command);
        tracing::debug!(
            db,
            command = query.command_name().unwrap_or_default(),
            "sending command"
        );
        let reply = self.round_trip(&query).await?;
        reply
            .documents
            .into_iter()
            .next()
            .ok_or_else(|| Error::CorruptData {
                offset: 0,
                reason: "command reply contained no document".into(),
            })
    }

    /// Start a query and return its first batch.
    pub async fn send_query(
        &mut self,
        namespace: &Namespace,
        filter: Document,
        options: &QueryOptions,
    ) -> Result<Batch> {
        let query = OpQuery::new(namespace.to_string(), filter, options.batch_size)
            .with_skip(options.skip)
            .with_projection(options.projection.clone())
            .with_flags(options.flags);
        tracing::debug!(ns = %namespace, batch_size = options.batch_size, "sending query");
        let reply = self.round_trip(&query).await?;
        Ok(Batch {
            documents: reply.documents,
            cursor_id: reply.cursor_id,
        })
    }

    /// Fetch the next batch of an open cursor.
    ///
    /// A cursor the server no longer knows is a protocol error and closes
    /// the connection; the request is never retried.
    pub async fn send_get_more(
        &mut self,
        namespace: &Namespace,
        cursor_id: i64,
        batch_size: i32,
    ) -> Result<Batch> {
        self.flush_pending_kills().await?;
        let request_id = self.allocate_request_id();
        let message = OpGetMore::new(namespace.to_string(), cursor_id, batch_size).encode(request_id)?;
        tracing::debug!(ns = %namespace, cursor_id, request_id, "sending get-more");
        self.transport.send(message).await?;
        let reply = self.receive_reply(request_id).await?;

        if reply.is_cursor_not_found() {
            tracing::warn!(cursor_id, "server reported cursor not found; closing connection");
            self.transport.close().await;
            return Err(Error::Protocol(format!("cursor {cursor_id} not found on server")));
        }
        if reply.is_query_failure() {
            return Err(command_error(&reply));
        }
        Ok(Batch {
            documents: reply.documents,
            cursor_id: reply.cursor_id,
        })
    }

    /// Tell the server to discard cursors. No reply is expected.
    pub async fn kill_cursors(&mut self, cursor_ids: Vec<i64>) -> Result<()> {
        if cursor_ids.is_empty() {
            return Ok(());
        }
        let request_id = self.allocate_request_id();
        let message = OpKillCursors::new(cursor_ids).encode(request_id)?;
        self.transport.send(message).await?;
        Ok(())
    }

    async fn round_trip(&mut self, query: &OpQuery) -> Result<OpReply> {
        self.flush_pending_kills().await?;
        let request_id = self.allocate_request_id();
        let message = query.encode(request_id)?;
        tracing::trace!(request_id, size = message.len(), "sending query message");
        self.transport.send(message).await?;

        let reply = self.receive_reply(request_id).await?;
        if reply.is_query_failure() {
            return Err(command_error(&reply));
        }
        Ok(reply)
    }

    /// Receive one reply and check it answers `request_id`.
    async fn receive_reply(&mut self, request_id: i32) -> Result<OpReply> {
        let frame: Frame = self.transport.receive().await?;
        tracing::trace!(
            request_id,
            response_to = frame.header.response_to,
            size = frame.total_size(),
            "received message"
        );

        if frame.header.op_code != OpCode::Reply {
            self.transport.close().await;
            return Err(ProtocolError::UnexpectedOpCode {
                expected: OpCode::Reply.name(),
                actual: frame.header.op_code.name(),
            }
            .into());
        }
        if frame.header.response_to != request_id {
            tracing::warn!(
                request_id,
                response_to = frame.header.response_to,
                "reply does not answer the outstanding request; closing connection"
            );
            self.transport.close().await;
            return Err(Error::Protocol(format!(
                "reply is for request {} but request {request_id} is outstanding",
                frame.header.response_to
            )));
        }

        match OpReply::decode_body(&frame.body) {
            Ok(reply) => Ok(reply),
            // Framing is intact, so bad documents leave the connection usable
            Err(e)
                if e.is_corrupt_document()
                    || matches!(e, ProtocolError::ReplyCountMismatch { .. }) =>
            {
                Err(e.into())
            }
            Err(e) => {
                self.transport.close().await;
                Err(Error::Protocol(e.to_string()))
            }
        }
    }
}

impl Connection<TcpStream> {
    /// Open a TCP connection to `endpoint`.
    pub async fn connect(
        endpoint: &crate::Endpoint,
        connect_timeout: std::time::Duration,
    ) -> Result<Self> {
        let transport =
            Transport::connect(endpoint.address(), connect_timeout, endpoint.timeout()).await?;
        Ok(Self::new(transport))
    }
}

impl<T> fmt::Debug for Connection<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("transport", &self.transport)
            .field("next_request_id", &self.next_request_id)
            .field("pending_kills", &self.pending_kills.len())
            .finish()
    }
}

/// Turn a query-failure reply into a server error.
fn command_error(reply: &OpReply) -> Error {
    let doc = reply.documents.first();
    let message = doc
        .and_then(|d| d.get_str("$err").or_else(|| d.get_str("errmsg")))
        .unwrap_or("query failed")
        .to_string();
    let code = doc.and_then(|d| d.get_i32("code")).unwrap_or(0);
    Error::Command { code, message }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_request_ids_wrap() {
        let (client, _server) = tokio::io::duplex(64);
        let mut conn = Connection::new(Transport::new(client, Duration::from_secs(1)));
        conn.next_request_id = i32::MAX;
        assert_eq!(conn.allocate_request_id(), i32::MAX);
        assert_eq!(conn.allocate_request_id(), i32::MIN);
        assert_eq!(conn.allocate_request_id(), i32::MIN + 1);
    }

    #[test]
    fn test_command_error_from_failure_reply() {
        let reply = OpReply::query_failure("bad query", 2);
        match command_error(&reply) {
            Error::Command { code, message } => {
                assert_eq!(code, 2);
                assert_eq!(message, "bad query");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
