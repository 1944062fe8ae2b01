//! Server-side cursors and client-side iteration.
//!
//! ## States
//!
//! ```text
//! Open       -- batch may be empty, server cursor id non-zero
//! Exhausting -- server cursor id is 0, documents remain in the batch
//! Closed     -- nothing left; next() returns None forever
//! ```
//!
//! A get-more is issued only when the batch is empty and the cursor id is
//! non-zero. A cursor dropped while open queues a kill on its connection,
//! sent before the next request.

use std::collections::VecDeque;

use futures_core::Stream;
use mongo_protocol::Namespace;
use mongo_types::{Document, TypeError, Value};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::connection::{Batch, Connection};
use crate::error::{Error, Result};
use crate::record::{FromDocument, MappingOptions};

/// Cursor lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// More documents may come from the server.
    Open,
    /// The server is done; documents remain in the local batch.
    Exhausting,
    /// Nothing remains.
    Closed,
}

/// Iterator over a result set larger than one reply.
///
/// Borrows its connection mutably, so the connection cannot be used for
/// anything else while the cursor is alive.
pub struct Cursor<'a, T = TcpStream>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    connection: &'a mut Connection<T>,
    namespace: Namespace,
    cursor_id: i64,
    batch: VecDeque<Document>,
    batch_size: i32,
    limit: Option<usize>,
    returned: usize,
    mapping: MappingOptions,
    state: CursorState,
}

impl<'a, T> Cursor<'a, T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Create a cursor from the first batch of a query.
    pub fn new(
        connection: &'a mut Connection<T>,
        namespace: Namespace,
        first: Batch,
        batch_size: i32,
    ) -> Self {
        let state = if first.cursor_id != 0 {
            CursorState::Open
        } else if first.documents.is_empty() {
            CursorState::Closed
        } else {
            CursorState::Exhausting
        };
        Self {
            connection,
            namespace,
            cursor_id: first.cursor_id,
            batch: first.documents.into(),
            batch_size,
            limit: None,
            returned: 0,
            mapping: MappingOptions::default(),
            state,
        }
    }

    /// Create a cursor from a command reply of the shape
    /// `{cursor: {id, ns, firstBatch}}`.
    ///
    /// The cursor continues with get-more on the namespace the server
    /// reported.
    pub fn from_command_reply(
        connection: &'a mut Connection<T>,
        reply: &Document,
        batch_size: i32,
    ) -> Result<Self> {
        let cursor = reply
            .get_document("cursor")
            .ok_or_else(|| Error::Type(TypeError::MissingField("cursor".into())))?;
        let cursor_id = cursor
            .get_i64("id")
            .ok_or_else(|| Error::Type(TypeError::MissingField("cursor.id".into())))?;
        let ns = cursor
            .get_str("ns")
            .ok_or_else(|| Error::Type(TypeError::MissingField("cursor.ns".into())))?;
        let namespace = Namespace::parse(ns)?;

        let documents = cursor
            .get_array("firstBatch")
            .unwrap_or_default()
            .iter()
            .map(|value| match value {
                Value::Document(doc) => Ok(doc.clone()),
                other => Err(Error::Type(TypeError::TypeMismatch {
                    expected: "document",
                    actual: other.type_name().to_string(),
                })),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(
            connection,
            namespace,
            Batch {
                documents,
                cursor_id,
            },
            batch_size,
        ))
    }

    /// Stop after `limit` documents, killing the server cursor if it is
    /// still open at that point. A limit of 0 means no limit.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }

    /// Set the options used by [`Cursor::next_record`].
    #[must_use]
    pub fn with_mapping(mut self, mapping: MappingOptions) -> Self {
        self.mapping = mapping;
        self
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Server cursor id; 0 once the server side is exhausted.
    #[must_use]
    pub fn id(&self) -> i64 {
        self.cursor_id
    }

    /// Namespace get-more requests are sent to.
    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Documents buffered locally.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.batch.len()
    }

    fn limit_reached(&self) -> bool {
        self.limit.is_some_and(|limit| self.returned >= limit)
    }

    fn next_batch_size(&self) -> i32 {
        match self.limit {
            Some(limit) => {
                let remaining = i32::try_from(limit - self.returned).unwrap_or(i32::MAX);
                if self.batch_size > 0 {
                    self.batch_size.min(remaining)
                } else {
                    remaining
                }
            }
            None => self.batch_size,
        }
    }

    /// Next document, fetching another batch from the server when needed.
    ///
    /// Returns `Ok(None)` once the result set is exhausted; after that every
    /// call returns `Ok(None)` without touching the connection.
    pub async fn next(&mut self) -> Result<Option<Document>> {
        loop {
            if self.state == CursorState::Closed {
                return Ok(None);
            }
            if self.limit_reached() {
                self.close().await;
                return Ok(None);
            }
            if let Some(document) = self.batch.pop_front() {
                self.returned += 1;
                if self.batch.is_empty() && self.cursor_id == 0 {
                    self.state = CursorState::Closed;
                }
                return Ok(Some(document));
            }
            if self.cursor_id == 0 {
                self.state = CursorState::Closed;
                return Ok(None);
            }

            let batch_size = self.next_batch_size();
            let batch = match self
                .connection
                .send_get_more(&self.namespace, self.cursor_id, batch_size)
                .await
            {
                Ok(batch) => batch,
                Err(e) => {
                    // The server cursor is unusable after any get-more failure
                    self.cursor_id = 0;
                    self.state = CursorState::Closed;
                    return Err(e);
                }
            };

            tracing::trace!(
                cursor_id = batch.cursor_id,
                documents = batch.documents.len(),
                "received batch"
            );
            self.cursor_id = batch.cursor_id;
            self.batch.extend(batch.documents);
            if self.cursor_id == 0 {
                self.state = if self.batch.is_empty() {
                    CursorState::Closed
                } else {
                    CursorState::Exhausting
                };
            }
        }
    }

    /// Next document mapped onto a record type.
    pub async fn next_record<R: FromDocument>(&mut self) -> Result<Option<R>> {
        match self.next().await? {
            Some(document) => Ok(Some(R::from_document(document, self.mapping)?)),
            None => Ok(None),
        }
    }

    /// Drain the cursor into a vector.
    pub async fn try_collect(mut self) -> Result<Vec<Document>> {
        let mut documents = Vec::with_capacity(self.batch.len());
        while let Some(document) = self.next().await? {
            documents.push(document);
        }
        Ok(documents)
    }

    /// Close the cursor, asking the server to discard it if still open.
    ///
    /// Failure to notify the server is logged, not returned.
    pub async fn close(&mut self) {
        let cursor_id = std::mem::take(&mut self.cursor_id);
        self.batch.clear();
        self.state = CursorState::Closed;

        if cursor_id != 0 && !self.connection.is_closed() {
            if let Err(e) = self.connection.kill_cursors(vec![cursor_id]).await {
                tracing::warn!(cursor_id, error = %e, "failed to kill cursor");
            }
        }
    }

    /// Adapt the cursor into a [`Stream`].
    pub fn into_stream(self) -> impl Stream<Item = Result<Document>> + 'a
    where
        T: 'a,
    {
        futures_util::stream::try_unfold(self, |mut cursor| async move {
            Ok(cursor.next().await?.map(|document| (document, cursor)))
        })
    }
}

impl<T> Drop for Cursor<'_, T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    fn drop(&mut self) {
        if self.cursor_id != 0 {
            tracing::debug!(cursor_id = self.cursor_id, "cursor dropped while open");
            self.connection.queue_kill(self.cursor_id);
        }
    }
}

impl<T> std::fmt::Debug for Cursor<'_, T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("namespace", &self.namespace)
            .field("cursor_id", &self.cursor_id)
            .field("buffered", &self.batch.len())
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mongo_codec::Transport;
    use mongo_types::doc;
    use std::time::Duration;

    fn connection() -> Connection<tokio::io::DuplexStream> {
        let (client, _server) = tokio::io::duplex(64);
        Connection::new(Transport::new(client, Duration::from_secs(1)))
    }

    fn ns() -> Namespace {
        Namespace::new("test", "people").unwrap()
    }

    #[tokio::test]
    async fn test_single_batch_needs_no_server() {
        let mut conn = connection();
        let batch = Batch {
            documents: vec![doc! { "n" => 1 }, doc! { "n" => 2 }],
            cursor_id: 0,
        };
        let mut cursor = Cursor::new(&mut conn, ns(), batch, 0);
        assert_eq!(cursor.state(), CursorState::Exhausting);
        assert_eq!(cursor.next().await.unwrap().unwrap().get_i32("n"), Some(1));
        assert_eq!(cursor.next().await.unwrap().unwrap().get_i32("n"), Some(2));
        assert_eq!(cursor.state(), CursorState::Closed);
        assert!(cursor.next().await.unwrap().is_none());
        assert!(cursor.next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_final_batch_is_closed() {
        let mut conn = connection();
        let batch = Batch {
            documents: Vec::new(),
            cursor_id: 0,
        };
        let mut cursor = Cursor::new(&mut conn, ns(), batch, 0);
        assert_eq!(cursor.state(), CursorState::Closed);
        assert!(cursor.next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_limit_stops_early() {
        let mut conn = connection();
        let batch = Batch {
            documents: vec![doc! { "n" => 1 }, doc! { "n" => 2 }, doc! { "n" => 3 }],
            cursor_id: 0,
        };
        let cursor = Cursor::new(&mut conn, ns(), batch, 0).with_limit(2);
        assert_eq!(cursor.try_collect().await.unwrap().len(), 2);
    }

    #[test]
    fn test_next_batch_size_respects_limit() {
        let mut conn = connection();
        let batch = Batch {
            documents: Vec::new(),
            cursor_id: 5,
        };
        let mut cursor = Cursor::new(&mut conn, ns(), batch, 100).with_limit(30);
        assert_eq!(cursor.next_batch_size(), 30);
        cursor.returned = 25;
        assert_eq!(cursor.next_batch_size(), 5);
        cursor.limit = None;
        assert_eq!(cursor.next_batch_size(), 100);
        // Forget the fake cursor id so drop queues nothing
        cursor.cursor_id = 0;
    }

    #[test]
    fn test_from_command_reply() {
        let mut conn = connection();
        let reply = doc! {
            "cursor" => doc! {
                "id" => 0i64,
                "ns" => "test.$cmd.listCollections",
                "firstBatch" => vec![Value::from(doc! { "name" => "people" })],
            },
            "ok" => 1.0,
        };
        let cursor = Cursor::from_command_reply(&mut conn, &reply, 0).unwrap();
        assert_eq!(cursor.namespace().db, "test");
        assert_eq!(cursor.buffered(), 1);
        assert_eq!(cursor.state(), CursorState::Exhausting);
    }

    #[test]
    fn test_from_command_reply_requires_cursor() {
        let mut conn = connection();
        let err = Cursor::from_command_reply(&mut conn, &doc! { "ok" => 1.0 }, 0).unwrap_err();
        assert!(matches!(err, Error::Type(TypeError::MissingField(_))));
    }

    #[test]
    fn test_drop_queues_kill() {
        let mut conn = connection();
        {
            let batch = Batch {
                documents: Vec::new(),
                cursor_id: 42,
            };
            let _cursor = Cursor::new(&mut conn, ns(), batch, 0);
        }
        assert_eq!(conn.pending_kill_count(), 1);
    }
}
