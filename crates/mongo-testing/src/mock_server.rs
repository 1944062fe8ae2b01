//! Mock wire-protocol server for unit testing.
//!
//! This module provides a mock MongoDB server that speaks the legacy
//! `OP_QUERY` / `OP_GET_MORE` / `OP_KILL_CURSORS` protocol over real TCP,
//! so clients can be tested without a database instance.
//!
//! ## Features
//!
//! - Built-in answers for `isMaster`, `ping` and the authentication commands
//! - In-memory collections with simple equality filters, server-side
//!   cursors and the `insert` / `update` / `delete` / `count` / `drop`
//!   commands
//! - Scripted responses per command name, per query namespace and per
//!   get-more cursor id, including misbehaviour (silence, wrong
//!   response-to, corrupt bodies, disconnects)
//! - A log of every request received
//!
//! ## Example
//!
//! ```rust,ignore
//! use mongo_testing::mock_server::{MockMongoServer, MockResponse};
//! use mongo_types::doc;
//!
//! #[tokio::test]
//! async fn test_ping() {
//!     let server = MockMongoServer::builder()
//!         .with_command("buildInfo", MockResponse::ok(doc! { "version" => "3.6.23" }))
//!         .build()
//!         .await
//!         .unwrap();
//!
//!     let addr = server.addr();
//!     // Connect your client to addr...
//! }
//! ```

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use futures_util::{SinkExt, StreamExt};
use mongo_codec::{CodecError, MessageCodec};
use mongo_protocol::{
    HEADER_SIZE, Message, MessageHeader, OpCode, OpGetMore, OpQuery, OpReply, ProtocolError,
};
use mongo_types::{Document, Value, doc};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, broadcast};
use tokio_util::codec::Framed;

/// Error type for mock server operations.
#[derive(Debug, Error)]
pub enum MockServerError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Framing error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Result type for mock server operations.
pub type Result<T> = std::result::Result<T, MockServerError>;

/// How the server answers one request.
#[derive(Clone)]
pub enum MockResponse {
    /// Reply with a single document and no cursor.
    Document(Document),

    /// Reply with a batch of documents and a cursor id.
    Batch {
        /// Documents in the reply.
        documents: Vec<Document>,
        /// Cursor id; 0 means exhausted.
        cursor_id: i64,
    },

    /// Reply flagged query-failure with a `$err` document.
    QueryFailure {
        /// Error message.
        message: String,
        /// Error code.
        code: i32,
    },

    /// Reply flagged cursor-not-found.
    CursorNotFound,

    /// Send nothing; the client is left waiting.
    Silent,

    /// Reply with `document` but a response-to that matches no request.
    MismatchedResponseTo(Document),

    /// Reply with a valid header around arbitrary body bytes.
    RawBody(Bytes),

    /// Close the connection without replying.
    Disconnect,

    /// Compute the response from the request document.
    Custom(Arc<dyn Fn(&Document) -> MockResponse + Send + Sync>),
}

impl fmt::Debug for MockResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document(d) => f.debug_tuple("Document").field(d).finish(),
            Self::Batch {
                documents,
                cursor_id,
            } => f
                .debug_struct("Batch")
                .field("documents", &documents.len())
                .field("cursor_id", cursor_id)
                .finish(),
            Self::QueryFailure { message, code } => f
                .debug_struct("QueryFailure")
                .field("message", message)
                .field("code", code)
                .finish(),
            Self::CursorNotFound => f.write_str("CursorNotFound"),
            Self::Silent => f.write_str("Silent"),
            Self::MismatchedResponseTo(d) => f.debug_tuple("MismatchedResponseTo").field(d).finish(),
            Self::RawBody(data) => f.debug_tuple("RawBody").field(&data.len()).finish(),
            Self::Disconnect => f.write_str("Disconnect"),
            Self::Custom(_) => f.debug_tuple("Custom").field(&"<fn>").finish(),
        }
    }
}

impl MockResponse {
    /// A successful command reply: `document` plus `ok: 1.0`.
    pub fn ok(mut document: Document) -> Self {
        if !document.contains_key("ok") {
            document.insert("ok", 1.0);
        }
        Self::Document(document)
    }

    /// A failed command reply: `{ok: 0, errmsg, code}`.
    pub fn command_error(code: i32, message: impl Into<String>) -> Self {
        Self::Document(doc! {
            "ok" => 0.0,
            "errmsg" => message.into(),
            "code" => code,
        })
    }

    /// A batch with a cursor id.
    pub fn batch(documents: Vec<Document>, cursor_id: i64) -> Self {
        Self::Batch {
            documents,
            cursor_id,
        }
    }

    /// A query-failure reply.
    pub fn query_failure(message: impl Into<String>, code: i32) -> Self {
        Self::QueryFailure {
            message: message.into(),
            code,
        }
    }

    /// A reply whose single document's bytes are `document` with its first
    /// element tag replaced by an unknown one.
    pub fn corrupt_document() -> Self {
        let mut body = BytesMut::new();
        body.put_u32_le(0); // response flags
        body.put_i64_le(0); // cursor id
        body.put_i32_le(0); // starting from
        body.put_i32_le(1); // number returned
        // {"a": <tag 0x42>}
        body.put_i32_le(8);
        body.put_slice(&[0x42, b'a', 0, 0]);
        Self::RawBody(body.freeze())
    }
}

/// A request the server received.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedOp {
    /// `OP_QUERY`, commands included.
    Query {
        /// Request id from the header.
        request_id: i32,
        /// Full collection name.
        namespace: String,
        /// Query or command document.
        query: Document,
        /// Requested batch size.
        number_to_return: i32,
        /// Documents to skip.
        number_to_skip: i32,
    },
    /// `OP_GET_MORE`.
    GetMore {
        /// Request id from the header.
        request_id: i32,
        /// Full collection name.
        namespace: String,
        /// Cursor being continued.
        cursor_id: i64,
        /// Requested batch size.
        number_to_return: i32,
    },
    /// `OP_KILL_CURSORS`.
    KillCursors {
        /// Cursors to discard.
        cursor_ids: Vec<i64>,
    },
}

impl RecordedOp {
    /// Command name, for queries against a `$cmd` namespace.
    #[must_use]
    pub fn command_name(&self) -> Option<&str> {
        match self {
            Self::Query {
                namespace, query, ..
            } if namespace.ends_with(".$cmd") => query.keys().next(),
            _ => None,
        }
    }
}

/// Configuration for the mock server.
#[derive(Debug, Default, Clone)]
pub struct MockServerConfig {
    /// Responses keyed by lower-cased command name.
    commands: HashMap<String, MockResponse>,
    /// Responses for queries keyed by full collection name.
    queries: HashMap<String, MockResponse>,
    /// Responses for get-more keyed by cursor id, used in order.
    get_mores: HashMap<i64, VecDeque<MockResponse>>,
    /// Initial contents of in-memory collections, keyed by namespace.
    collections: HashMap<String, Vec<Document>>,
    /// Batch size when the client asks for the server default.
    default_batch_size: usize,
}

/// Builder for [`MockMongoServer`].
#[derive(Debug)]
pub struct MockServerBuilder {
    config: MockServerConfig,
}

impl MockServerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: MockServerConfig {
                default_batch_size: 101,
                ..MockServerConfig::default()
            },
        }
    }

    /// Answer command `name` (matched case-insensitively) with `response`.
    pub fn with_command(mut self, name: &str, response: MockResponse) -> Self {
        self.config
            .commands
            .insert(name.to_ascii_lowercase(), response);
        self
    }

    /// Answer queries on `namespace` with `response` instead of reading
    /// the in-memory collection.
    pub fn with_query_response(mut self, namespace: impl Into<String>, response: MockResponse) -> Self {
        self.config.queries.insert(namespace.into(), response);
        self
    }

    /// Queue `response` for the next get-more on `cursor_id`.
    pub fn with_get_more_response(mut self, cursor_id: i64, response: MockResponse) -> Self {
        self.config
            .get_mores
            .entry(cursor_id)
            .or_default()
            .push_back(response);
        self
    }

    /// Seed an in-memory collection.
    pub fn with_collection(mut self, namespace: impl Into<String>, documents: Vec<Document>) -> Self {
        self.config.collections.insert(namespace.into(), documents);
        self
    }

    /// Batch size used when the client leaves it to the server.
    pub fn with_default_batch_size(mut self, size: usize) -> Self {
        self.config.default_batch_size = size.max(1);
        self
    }

    /// Build and start the mock server.
    pub async fn build(self) -> Result<MockMongoServer> {
        MockMongoServer::start(self.config).await
    }
}

impl Default for MockServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// State shared by every connection to one server.
#[derive(Debug, Default)]
struct SharedState {
    collections: HashMap<String, Vec<Document>>,
    recorded: Vec<RecordedOp>,
    next_cursor_id: i64,
}

/// A mock MongoDB server for testing.
///
/// Listens on an ephemeral localhost port and serves each connection on
/// its own task until the server is dropped.
pub struct MockMongoServer {
    addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
    state: Arc<Mutex<SharedState>>,
    connection_count: Arc<Mutex<usize>>,
}

impl MockMongoServer {
    /// Create a new builder for the mock server.
    pub fn builder() -> MockServerBuilder {
        MockServerBuilder::new()
    }

    /// Start the mock server on an available port.
    pub async fn start(config: MockServerConfig) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, _) = broadcast::channel(1);
        let state = Arc::new(Mutex::new(SharedState {
            collections: config.collections.clone(),
            recorded: Vec::new(),
            next_cursor_id: 1000,
        }));
        let config = Arc::new(config);
        let connection_count = Arc::new(Mutex::new(0usize));

        let server = Self {
            addr,
            shutdown_tx: shutdown_tx.clone(),
            state: state.clone(),
            connection_count: connection_count.clone(),
        };

        let mut shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _peer_addr)) => {
                                let config = config.clone();
                                let state = state.clone();
                                let count = connection_count.clone();
                                tokio::spawn(async move {
                                    *count.lock().await += 1;
                                    if let Err(e) = handle_connection(stream, config, state).await {
                                        tracing::debug!("mock connection error: {}", e);
                                    }
                                    let mut c = count.lock().await;
                                    *c = c.saturating_sub(1);
                                });
                            }
                            Err(e) => {
                                tracing::error!("accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
        });

        Ok(server)
    }

    /// Get the server's listening address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the host string for connection configuration.
    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    /// Get the port number.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Get the current connection count.
    pub async fn connection_count(&self) -> usize {
        *self.connection_count.lock().await
    }

    /// Every request received so far, across connections.
    pub async fn recorded(&self) -> Vec<RecordedOp> {
        self.state.lock().await.recorded.clone()
    }

    /// Current contents of an in-memory collection.
    pub async fn collection(&self, namespace: &str) -> Vec<Document> {
        self.state
            .lock()
            .await
            .collections
            .get(namespace)
            .cloned()
            .unwrap_or_default()
    }

    /// Stop the server.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

impl Drop for MockMongoServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Per-connection cursor bookkeeping.
#[derive(Default)]
struct ConnectionState {
    get_mores: HashMap<i64, VecDeque<MockResponse>>,
    cursors: HashMap<i64, (String, VecDeque<Document>)>,
    next_request_id: i32,
}

/// Handle a single client connection.
async fn handle_connection(
    stream: TcpStream,
    config: Arc<MockServerConfig>,
    state: Arc<Mutex<SharedState>>,
) -> Result<()> {
    let mut framed = Framed::new(stream, MessageCodec::new());
    let mut conn = ConnectionState {
        get_mores: config.get_mores.clone(),
        ..ConnectionState::default()
    };

    while let Some(frame) = framed.next().await {
        let frame = frame?;
        let request_id = frame.header.request_id;
        let message = Message::decode(&frame.header, &frame.body)?;

        let response = match message {
            Message::Query(query) => {
                record(&state, RecordedOp::Query {
                    request_id,
                    namespace: query.full_collection_name.clone(),
                    query: query.query.clone(),
                    number_to_return: query.number_to_return,
                    number_to_skip: query.number_to_skip,
                })
                .await;
                answer_query(&query, &config, &state, &mut conn).await
            }
            Message::GetMore(get_more) => {
                record(&state, RecordedOp::GetMore {
                    request_id,
                    namespace: get_more.full_collection_name.clone(),
                    cursor_id: get_more.cursor_id,
                    number_to_return: get_more.number_to_return,
                })
                .await;
                answer_get_more(&get_more, &config, &mut conn)
            }
            Message::KillCursors(kill) => {
                for id in &kill.cursor_ids {
                    conn.cursors.remove(id);
                }
                record(&state, RecordedOp::KillCursors {
                    cursor_ids: kill.cursor_ids,
                })
                .await;
                continue;
            }
            Message::Reply(_) => {
                tracing::debug!("client sent OP_REPLY; ignoring");
                continue;
            }
        };

        let response = resolve_custom(response, &frame.body);
        conn.next_request_id = conn.next_request_id.wrapping_add(1);
        let reply_id = conn.next_request_id;

        let bytes = match response {
            MockResponse::Silent => continue,
            MockResponse::Disconnect => break,
            MockResponse::Document(document) => {
                OpReply::new(0, vec![document]).encode(reply_id, request_id)?
            }
            MockResponse::Batch {
                documents,
                cursor_id,
            } => OpReply::new(cursor_id, documents).encode(reply_id, request_id)?,
            MockResponse::QueryFailure { message, code } => {
                OpReply::query_failure(&message, code).encode(reply_id, request_id)?
            }
            MockResponse::CursorNotFound => {
                OpReply::cursor_not_found().encode(reply_id, request_id)?
            }
            MockResponse::MismatchedResponseTo(document) => OpReply::new(0, vec![document])
                .encode(reply_id, request_id.wrapping_add(1000))?,
            MockResponse::RawBody(body) => raw_reply(reply_id, request_id, &body),
            MockResponse::Custom(_) => continue,
        };
        framed.send(bytes).await?;
    }

    Ok(())
}

async fn record(state: &Mutex<SharedState>, op: RecordedOp) {
    state.lock().await.recorded.push(op);
}

/// Custom handlers see the request document; other responses pass through.
fn resolve_custom(response: MockResponse, body: &[u8]) -> MockResponse {
    match response {
        MockResponse::Custom(handler) => {
            let request = OpQuery::decode_body(body)
                .map(|q| q.query)
                .unwrap_or_default();
            handler(&request)
        }
        other => other,
    }
}

fn raw_reply(reply_id: i32, response_to: i32, body: &[u8]) -> Bytes {
    let length = i32::try_from(HEADER_SIZE + body.len()).unwrap_or(i32::MAX);
    let header = MessageHeader::new(OpCode::Reply, reply_id, length).with_response_to(response_to);
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + body.len());
    header.encode(&mut buf);
    buf.put_slice(body);
    buf.freeze()
}

async fn answer_query(
    query: &OpQuery,
    config: &MockServerConfig,
    state: &Mutex<SharedState>,
    conn: &mut ConnectionState,
) -> MockResponse {
    let namespace = query.full_collection_name.as_str();
    if let Some(db) = namespace.strip_suffix(".$cmd") {
        let Some(name) = query.query.keys().next() else {
            return MockResponse::command_error(59, "empty command");
        };
        if let Some(response) = config.commands.get(&name.to_ascii_lowercase()) {
            return response.clone();
        }
        return builtin_command(db, &query.query, state).await;
    }

    if let Some(response) = config.queries.get(namespace) {
        return response.clone();
    }

    let (filter, orderby) = match query.query.get_document("$query") {
        Some(inner) => (inner.clone(), query.query.get_document("$orderby").cloned()),
        None => (query.query.clone(), None),
    };
    let mut matching: Vec<Document> = {
        let state = state.lock().await;
        state
            .collections
            .get(namespace)
            .map(|docs| docs.iter().filter(|d| matches_filter(d, &filter)).cloned().collect())
            .unwrap_or_default()
    };
    if let Some(orderby) = orderby {
        sort_documents(&mut matching, &orderby);
    }

    let skip = usize::try_from(query.number_to_skip).unwrap_or(0);
    let remaining: VecDeque<Document> = matching.into_iter().skip(skip).collect();
    let single_batch = query.number_to_return < 0;
    start_cursor(namespace, remaining, query.number_to_return, single_batch, config, state, conn).await
}

async fn start_cursor(
    namespace: &str,
    mut remaining: VecDeque<Document>,
    number_to_return: i32,
    single_batch: bool,
    config: &MockServerConfig,
    state: &Mutex<SharedState>,
    conn: &mut ConnectionState,
) -> MockResponse {
    let take = batch_len(number_to_return, config.default_batch_size);
    let documents: Vec<Document> = remaining.drain(..take.min(remaining.len())).collect();

    if single_batch || remaining.is_empty() {
        return MockResponse::batch(documents, 0);
    }

    let cursor_id = {
        let mut state = state.lock().await;
        state.next_cursor_id += 1;
        state.next_cursor_id
    };
    conn.cursors
        .insert(cursor_id, (namespace.to_string(), remaining));
    MockResponse::batch(documents, cursor_id)
}

fn batch_len(number_to_return: i32, default: usize) -> usize {
    match number_to_return {
        0 => default,
        n => usize::try_from(n.unsigned_abs()).unwrap_or(default),
    }
}

fn answer_get_more(
    get_more: &OpGetMore,
    config: &MockServerConfig,
    conn: &mut ConnectionState,
) -> MockResponse {
    if let Some(queue) = conn.get_mores.get_mut(&get_more.cursor_id) {
        if let Some(response) = queue.pop_front() {
            return response;
        }
    }

    let Some((namespace, mut remaining)) = conn.cursors.remove(&get_more.cursor_id) else {
        return MockResponse::CursorNotFound;
    };
    if namespace != get_more.full_collection_name {
        return MockResponse::CursorNotFound;
    }

    let take = batch_len(get_more.number_to_return, config.default_batch_size);
    let documents: Vec<Document> = remaining.drain(..take.min(remaining.len())).collect();
    if remaining.is_empty() {
        return MockResponse::batch(documents, 0);
    }
    conn.cursors
        .insert(get_more.cursor_id, (namespace, remaining));
    MockResponse::batch(documents, get_more.cursor_id)
}

/// Answers for commands nobody scripted.
async fn builtin_command(db: &str, command: &Document, state: &Mutex<SharedState>) -> MockResponse {
    let Some((name, value)) = command.iter().next() else {
        return MockResponse::command_error(59, "empty command");
    };
    let collection = value.as_str().map(|c| format!("{db}.{c}"));

    match name.to_ascii_lowercase().as_str() {
        "ismaster" => MockResponse::ok(doc! {
            "ismaster" => true,
            "maxBsonObjectSize" => 16_777_216,
            "maxMessageSizeBytes" => 48_000_000,
            "maxWriteBatchSize" => 1000,
            "maxWireVersion" => 6,
            "minWireVersion" => 0,
        }),
        "ping" | "authenticate" => MockResponse::ok(doc! {}),
        "getnonce" => MockResponse::ok(doc! { "nonce" => "2375531c32080ae8" }),
        "saslstart" | "saslcontinue" => MockResponse::ok(doc! {
            "conversationId" => 1,
            "done" => true,
            "payload" => mongo_types::Binary::new(Bytes::new()),
        }),
        "listdatabases" => {
            let state = state.lock().await;
            let mut names: Vec<&str> = state
                .collections
                .keys()
                .filter_map(|ns| ns.split_once('.').map(|(db, _)| db))
                .collect();
            names.push("admin");
            names.sort_unstable();
            names.dedup();
            let databases: Vec<Value> = names
                .into_iter()
                .map(|name| Value::from(doc! { "name" => name, "sizeOnDisk" => 8192.0, "empty" => false }))
                .collect();
            MockResponse::ok(doc! { "databases" => databases, "totalSize" => 8192.0 })
        }
        "listcollections" => {
            let state = state.lock().await;
            let prefix = format!("{db}.");
            let mut names: Vec<&str> = state
                .collections
                .keys()
                .filter_map(|ns| ns.strip_prefix(prefix.as_str()))
                .collect();
            names.sort_unstable();
            let batch: Vec<Value> = names
                .into_iter()
                .map(|name| Value::from(doc! { "name" => name, "type" => "collection" }))
                .collect();
            MockResponse::ok(doc! {
                "cursor" => doc! {
                    "id" => 0i64,
                    "ns" => format!("{db}.$cmd.listCollections"),
                    "firstBatch" => batch,
                },
            })
        }
        "insert" => {
            let Some(ns) = collection else {
                return MockResponse::command_error(2, "insert requires a collection name");
            };
            let documents: Vec<Document> = command
                .get_array("documents")
                .unwrap_or_default()
                .iter()
                .filter_map(|v| v.as_document().cloned())
                .collect();
            let n = i32::try_from(documents.len()).unwrap_or(i32::MAX);
            state
                .lock()
                .await
                .collections
                .entry(ns)
                .or_default()
                .extend(documents);
            MockResponse::ok(doc! { "n" => n })
        }
        "update" => {
            let Some(ns) = collection else {
                return MockResponse::command_error(2, "update requires a collection name");
            };
            let mut state = state.lock().await;
            let docs = state.collections.entry(ns).or_default();
            let (mut matched, mut modified) = (0i32, 0i32);
            for update in command.get_array("updates").unwrap_or_default() {
                let Some(update) = update.as_document() else { continue };
                let filter = update.get_document("q").cloned().unwrap_or_default();
                let set = update
                    .get_document("u")
                    .and_then(|u| u.get_document("$set"))
                    .cloned()
                    .unwrap_or_default();
                for doc in docs.iter_mut().filter(|d| matches_filter(d, &filter)) {
                    matched += 1;
                    let before = doc.clone();
                    for (key, value) in &set {
                        doc.insert(key, value.clone());
                    }
                    if *doc != before {
                        modified += 1;
                    }
                }
            }
            MockResponse::ok(doc! { "n" => matched, "nModified" => modified })
        }
        "delete" => {
            let Some(ns) = collection else {
                return MockResponse::command_error(2, "delete requires a collection name");
            };
            let mut state = state.lock().await;
            let docs = state.collections.entry(ns).or_default();
            let before = docs.len();
            for delete in command.get_array("deletes").unwrap_or_default() {
                let filter = delete
                    .as_document()
                    .and_then(|d| d.get_document("q"))
                    .cloned()
                    .unwrap_or_default();
                docs.retain(|d| !matches_filter(d, &filter));
            }
            let n = i32::try_from(before - docs.len()).unwrap_or(i32::MAX);
            MockResponse::ok(doc! { "n" => n })
        }
        "count" => {
            let Some(ns) = collection else {
                return MockResponse::command_error(2, "count requires a collection name");
            };
            let filter = command.get_document("query").cloned().unwrap_or_default();
            let state = state.lock().await;
            let n = state
                .collections
                .get(&ns)
                .map_or(0, |docs| docs.iter().filter(|d| matches_filter(d, &filter)).count());
            MockResponse::ok(doc! { "n" => n as f64 })
        }
        "drop" => {
            let Some(ns) = collection else {
                return MockResponse::command_error(2, "drop requires a collection name");
            };
            match state.lock().await.collections.remove(&ns) {
                Some(_) => MockResponse::ok(doc! { "ns" => ns }),
                None => MockResponse::command_error(26, "ns not found"),
            }
        }
        "dropdatabase" => {
            let prefix = format!("{db}.");
            state
                .lock()
                .await
                .collections
                .retain(|ns, _| !ns.starts_with(&prefix));
            MockResponse::ok(doc! { "dropped" => db })
        }
        _ => MockResponse::command_error(59, format!("no such command: '{name}'")),
    }
}

/// Top-level equality match; operator keys are ignored.
fn matches_filter(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .filter(|(key, _)| !key.starts_with('$'))
        .all(|(key, expected)| document.get(key) == Some(expected))
}

/// Sort by the first key of `orderby`, numbers and strings only.
fn sort_documents(documents: &mut [Document], orderby: &Document) {
    let Some((key, direction)) = orderby.iter().next() else {
        return;
    };
    let descending = direction.as_f64().is_some_and(|d| d < 0.0);
    documents.sort_by(|a, b| {
        let ordering = match (a.get(key), b.get(key)) {
            (Some(x), Some(y)) => match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => x.as_str().cmp(&y.as_str()),
            },
            (x, y) => x.is_some().cmp(&y.is_some()),
        };
        if descending { ordering.reverse() } else { ordering }
    });
}
