//! MongoDB client implementation.

use mongo_auth::{AuthError, Credentials, conversation_for};
use mongo_types::{Document, TypeError, Value, doc};

use crate::config::Config;
use crate::connection::Connection;
use crate::database::Database;
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};

/// Database that holds administrative commands.
pub const ADMIN_DATABASE: &str = "admin";

/// Limits the server reported in its `isMaster` handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerInfo {
    /// Whether the server accepts writes.
    pub is_master: bool,
    /// Largest document the server accepts.
    pub max_bson_object_size: i64,
    /// Largest message the server accepts.
    pub max_message_size_bytes: i64,
    /// Newest wire protocol version the server speaks.
    pub max_wire_version: i32,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            is_master: true,
            max_bson_object_size: 16 * 1024 * 1024,
            max_message_size_bytes: 48_000_000,
            max_wire_version: 0,
        }
    }
}

impl ServerInfo {
    fn from_reply(reply: &Document) -> Self {
        let defaults = Self::default();
        Self {
            is_master: reply.get_bool("ismaster").unwrap_or(defaults.is_master),
            max_bson_object_size: reply
                .get_i64("maxBsonObjectSize")
                .unwrap_or(defaults.max_bson_object_size),
            max_message_size_bytes: reply
                .get_i64("maxMessageSizeBytes")
                .unwrap_or(defaults.max_message_size_bytes),
            max_wire_version: reply
                .get_i32("maxWireVersion")
                .unwrap_or(defaults.max_wire_version),
        }
    }
}

/// A connection to one MongoDB server.
///
/// Every operation takes `&mut self`: a client runs one request at a time.
/// Share it behind a mutex or use a pool for concurrent callers.
///
/// # Example
///
/// ```rust,ignore
/// use mongo_client::{Client, Config};
///
/// let mut client = Client::connect(Config::new().host("localhost")).await?;
/// for name in client.list_database_names().await? {
///     println!("{}", name?);
/// }
/// ```
pub struct Client {
    config: Config,
    endpoint: Endpoint,
    connection: Connection,
    server_info: ServerInfo,
}

impl Client {
    /// Resolve the configured host, connect, run the handshake and
    /// authenticate if credentials are configured.
    pub async fn connect(config: Config) -> Result<Self> {
        tracing::info!(host = %config.host, port = config.port, "connecting to MongoDB");
        let endpoint = Endpoint::resolve(&config).await?;
        Self::connect_to(endpoint, config).await
    }

    /// Connect to an already-resolved endpoint.
    pub async fn connect_to(endpoint: Endpoint, config: Config) -> Result<Self> {
        let connection = Connection::connect(&endpoint, config.timeouts.connect_timeout).await?;
        let mut client = Self {
            config,
            endpoint,
            connection,
            server_info: ServerInfo::default(),
        };

        if let Err(e) = client.initialize().await {
            client.connection.close().await;
            return Err(e);
        }

        tracing::info!(
            address = %client.endpoint.address(),
            max_wire_version = client.server_info.max_wire_version,
            "connected"
        );
        Ok(client)
    }

    async fn initialize(&mut self) -> Result<()> {
        self.handshake().await?;
        if let Some(credentials) = self.config.credentials.clone() {
            self.authenticate(&credentials).await?;
        }
        Ok(())
    }

    async fn handshake(&mut self) -> Result<()> {
        let mut metadata = doc! {
            "driver" => doc! {
                "name" => env!("CARGO_PKG_NAME"),
                "version" => env!("CARGO_PKG_VERSION"),
            },
        };
        if let Some(name) = &self.config.application_name {
            metadata.insert("application", doc! { "name" => name.as_str() });
        }

        let reply = self
            .run_command_on(ADMIN_DATABASE, doc! { "isMaster" => 1, "client" => metadata })
            .await?;
        self.server_info = ServerInfo::from_reply(&reply);
        Ok(())
    }

    /// Authenticate this connection.
    ///
    /// Runs the credentials' conversation against their source database. A
    /// rejected step is reported as [`Error::Authentication`].
    pub async fn authenticate(&mut self, credentials: &Credentials) -> Result<()> {
        let mut conversation = conversation_for(credentials)?;
        tracing::debug!(
            user = %credentials.username,
            source = %credentials.source,
            mechanism = %conversation.mechanism(),
            "authenticating"
        );

        let mut command = conversation.start()?;
        loop {
            let reply = match self.run_command_on(&credentials.source, command).await {
                Ok(reply) => reply,
                Err(Error::Command { code, message }) => {
                    return Err(Error::Authentication(AuthError::AuthenticationFailed(
                        format!("{message} (code {code})"),
                    )));
                }
                Err(e) => return Err(e),
            };
            match conversation.step(&reply)? {
                Some(next) => command = next,
                None => break,
            }
        }

        tracing::info!(user = %credentials.username, "authenticated");
        Ok(())
    }

    /// List database names with the `listDatabases` command.
    ///
    /// The returned iterator is one-shot; call again for a fresh listing.
    pub async fn list_database_names(&mut self) -> Result<DatabaseNames> {
        let mut reply = self.run_command(doc! { "listDatabases" => 1 }).await?;
        match reply.remove("databases") {
            Some(Value::Array(entries)) => Ok(DatabaseNames {
                entries: entries.into_iter(),
            }),
            Some(other) => Err(Error::Type(TypeError::TypeMismatch {
                expected: "array",
                actual: other.type_name().to_string(),
            })),
            None => Err(Error::Type(TypeError::MissingField("databases".into()))),
        }
    }

    /// A handle to database `name`.
    ///
    /// No I/O happens here and the name is not checked until the handle is
    /// used; a database that does not exist yet is a valid handle.
    pub fn database(&mut self, name: &str) -> Database<'_> {
        Database::new(self, name)
    }

    /// A handle to the database named in the configuration, if any.
    pub fn default_database(&mut self) -> Option<Database<'_>> {
        let name = self.config.database.clone()?;
        Some(Database::new(self, &name))
    }

    /// Run a command against the `admin` database.
    pub async fn run_command(&mut self, command: Document) -> Result<Document> {
        self.run_command_on(ADMIN_DATABASE, command).await
    }

    /// Run a command against `db`, failing with [`Error::Command`] unless the
    /// server answered `ok: 1`.
    pub async fn run_command_on(&mut self, db: &str, command: Document) -> Result<Document> {
        let reply = self.connection.send_command(db, command).await?;
        check_ok(reply)
    }

    /// Check the server is responsive.
    pub async fn ping(&mut self) -> Result<()> {
        self.run_command(doc! { "ping" => 1 }).await?;
        Ok(())
    }

    /// Close the connection. Calling this more than once is harmless.
    pub async fn close(&mut self) {
        if !self.connection.is_closed() {
            tracing::info!(address = %self.endpoint.address(), "closing connection");
        }
        self.connection.close().await;
    }

    /// Whether the connection is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.connection.is_closed()
    }

    /// Endpoint this client is connected to.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Configuration the client was created with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Limits reported by the server at connect time.
    #[must_use]
    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// The underlying connection, for raw protocol access.
    pub fn connection(&mut self) -> &mut Connection {
        &mut self.connection
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint)
            .field("closed", &self.is_closed())
            .field("server_info", &self.server_info)
            .finish_non_exhaustive()
    }
}

/// Database names from one `listDatabases` call.
///
/// Entries are projected to their `name` lazily, as the iterator advances.
#[derive(Debug)]
pub struct DatabaseNames {
    entries: std::vec::IntoIter<Value>,
}

impl Iterator for DatabaseNames {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.next()?;
        Some(match entry {
            Value::Document(mut doc) => doc.take_as::<String>("name").map_err(Error::from),
            other => Err(Error::Type(TypeError::TypeMismatch {
                expected: "document",
                actual: other.type_name().to_string(),
            })),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl ExactSizeIterator for DatabaseNames {}

/// Fail with [`Error::Command`] unless `reply` carries a truthy `ok`.
pub(crate) fn check_ok(reply: Document) -> Result<Document> {
    let ok = match reply.get("ok") {
        Some(Value::Bool(ok)) => *ok,
        Some(value) => value.as_f64().is_some_and(|ok| ok != 0.0),
        None => false,
    };
    if ok {
        return Ok(reply);
    }
    Err(Error::Command {
        code: reply.get_i32("code").unwrap_or(0),
        message: reply
            .get_str("errmsg")
            .or_else(|| reply.get_str("$err"))
            .unwrap_or("command failed")
            .to_string(),
    })
}
