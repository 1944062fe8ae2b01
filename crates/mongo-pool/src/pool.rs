//! Connection pool implementation.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Instant;

use mongo_client::{Client, Config};
use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::lifecycle::{ConnectionAge, ConnectionLifecycle};

/// A pool of MongoDB clients.
///
/// Cloning a `Pool` is cheap; clones share the same connections.
///
/// # Example
///
/// ```rust,ignore
/// use mongo_driver_pool::{Pool, PoolConfig};
///
/// let pool = Pool::builder()
///     .client_config(client_config)
///     .pool_config(PoolConfig::new().max_connections(4))
///     .build()
///     .await?;
///
/// let mut conn = pool.get().await?;
/// let names: Vec<_> = conn.list_database_names().await?.collect();
/// ```
#[derive(Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    client_config: Config,
    config: PoolConfig,
    semaphore: Arc<Semaphore>,
    idle: Mutex<VecDeque<IdleConnection>>,
    closed: AtomicBool,
    total: AtomicU32,
}

struct IdleConnection {
    client: Client,
    age: ConnectionAge,
}

impl Pool {
    /// Create a new pool builder.
    #[must_use]
    pub fn builder() -> PoolBuilder {
        PoolBuilder::new()
    }

    /// Create a pool and open `min_connections` connections up front.
    pub async fn new(client_config: Config, config: PoolConfig) -> Result<Self, PoolError> {
        config.validate()?;

        let pool = Self {
            inner: Arc::new(PoolInner {
                semaphore: Arc::new(Semaphore::new(config.max_connections as usize)),
                idle: Mutex::new(VecDeque::new()),
                closed: AtomicBool::new(false),
                total: AtomicU32::new(0),
                client_config,
                config,
            }),
        };

        for _ in 0..pool.inner.config.min_connections {
            let client = pool.inner.create_connection().await?;
            pool.inner.idle.lock().push_back(IdleConnection {
                client,
                age: ConnectionAge::new(),
            });
        }

        tracing::info!(
            min = pool.inner.config.min_connections,
            max = pool.inner.config.max_connections,
            "connection pool created"
        );
        Ok(pool)
    }

    /// Check out a connection, waiting up to `acquire_timeout` for one to
    /// become free.
    ///
    /// Idle connections that expired, lost their transport or fail the
    /// checkout health check are discarded and the next one is tried. A new
    /// connection is opened when none is idle.
    pub async fn get(&self) -> Result<PooledConnection, PoolError> {
        if self.is_closed() {
            return Err(PoolError::PoolClosed);
        }

        let timeout = self.inner.config.acquire_timeout;
        let permit = match tokio::time::timeout(
            timeout,
            self.inner.semaphore.clone().acquire_owned(),
        )
        .await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(PoolError::PoolClosed),
            Err(_) => {
                tracing::warn!(?timeout, "timed out waiting for a pooled connection");
                return Err(PoolError::AcquisitionTimeout(timeout));
            }
        };

        while let Some(idle) = self.inner.pop_idle() {
            let IdleConnection { mut client, age } = idle;
            let now = Instant::now();

            if age.is_expired(
                now,
                self.inner.config.max_lifetime,
                self.inner.config.idle_timeout,
            ) {
                tracing::debug!("discarding expired connection");
                self.inner.discard(client).await;
                continue;
            }
            if !client.is_valid() {
                tracing::debug!("discarding closed connection");
                self.inner.discard(client).await;
                continue;
            }
            if self.inner.config.test_on_checkout {
                let command = &self.inner.config.health_check_command;
                // Dropping `get` mid-check drops `client`, so its slot is
                // released unless the check completes
                let release = SlotRelease::new(&self.inner.total);
                let checked = client.health_check(command).await;
                release.defuse();
                if let Err(e) = checked {
                    tracing::warn!(error = %e, "discarding connection that failed its health check");
                    self.inner.discard(client).await;
                    continue;
                }
            }

            return Ok(PooledConnection::new(client, age, self.inner.clone(), permit));
        }

        let client = self.inner.create_connection().await?;
        Ok(PooledConnection::new(
            client,
            ConnectionAge::new(),
            self.inner.clone(),
            permit,
        ))
    }

    /// Current pool occupancy.
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        let available = u32::try_from(self.inner.idle.lock().len()).unwrap_or(u32::MAX);
        let total = self.inner.total.load(Ordering::Acquire);
        PoolStatus {
            available,
            in_use: total.saturating_sub(available),
            total,
            max: self.inner.config.max_connections,
        }
    }

    /// Pool configuration.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// Close the pool.
    ///
    /// Waiters and later `get` calls fail with [`PoolError::PoolClosed`].
    /// Idle connections are closed now; checked-out ones are closed when
    /// they are returned.
    pub async fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.semaphore.close();

        let idle: Vec<IdleConnection> = self.inner.idle.lock().drain(..).collect();
        tracing::info!(idle = idle.len(), "closing connection pool");
        let count = u32::try_from(idle.len()).unwrap_or(u32::MAX);
        self.inner.total.fetch_sub(count, Ordering::AcqRel);
        for mut connection in idle {
            connection.client.close().await;
        }
    }

    /// Whether [`Pool::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("status", &self.status())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl PoolInner {
    async fn create_connection(&self) -> Result<Client, PoolError> {
        let client = Client::connect(self.client_config.clone())
            .await
            .map_err(PoolError::ConnectionCreation)?;
        let total = self.total.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::debug!(total, "opened pooled connection");
        Ok(client)
    }

    fn pop_idle(&self) -> Option<IdleConnection> {
        self.idle.lock().pop_front()
    }

    /// Forget `client` and close it. The count drops before the close is
    /// awaited, so a cancelled caller cannot leak the slot.
    async fn discard(&self, mut client: Client) {
        self.total.fetch_sub(1, Ordering::AcqRel);
        client.close().await;
    }

    /// Take a connection back from a borrower.
    fn checkin(&self, client: Client, mut age: ConnectionAge) {
        if self.closed.load(Ordering::Acquire) || !client.is_valid() {
            // Dropping the client drops its socket.
            self.total.fetch_sub(1, Ordering::AcqRel);
            tracing::debug!("dropping returned connection");
            return;
        }
        age.idle_since = Instant::now();
        self.idle.lock().push_back(IdleConnection { client, age });
    }
}

/// Releases one slot of the open-connection count on drop unless defused.
struct SlotRelease<'a> {
    total: &'a AtomicU32,
    armed: bool,
}

impl<'a> SlotRelease<'a> {
    fn new(total: &'a AtomicU32) -> Self {
        Self { total, armed: true }
    }

    fn defuse(mut self) {
        self.armed = false;
    }
}

impl Drop for SlotRelease<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.total.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

/// Builder for [`Pool`].
#[derive(Debug, Default)]
pub struct PoolBuilder {
    client_config: Option<Config>,
    config: PoolConfig,
}

impl PoolBuilder {
    /// Create a builder with default pool settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration used to open each connection.
    #[must_use]
    pub fn client_config(mut self, config: Config) -> Self {
        self.client_config = Some(config);
        self
    }

    /// Replace the pool settings.
    #[must_use]
    pub fn pool_config(mut self, config: PoolConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the maximum number of connections.
    #[must_use]
    pub fn max_connections(mut self, count: u32) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the minimum number of connections.
    #[must_use]
    pub fn min_connections(mut self, count: u32) -> Self {
        self.config.min_connections = count;
        self
    }

    /// Build the pool.
    pub async fn build(self) -> Result<Pool, PoolError> {
        let client_config = self
            .client_config
            .ok_or_else(|| PoolError::Configuration("client configuration is required".into()))?;
        Pool::new(client_config, self.config).await
    }
}

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Idle connections ready for checkout.
    pub available: u32,
    /// Connections currently checked out.
    pub in_use: u32,
    /// Open connections.
    pub total: u32,
    /// Configured maximum.
    pub max: u32,
}

/// A client checked out of a [`Pool`].
///
/// Dereferences to [`Client`]. Dropping it returns the client to the pool
/// unless its transport closed.
pub struct PooledConnection {
    client: Option<Client>,
    age: ConnectionAge,
    pool: Arc<PoolInner>,
    _permit: OwnedSemaphorePermit,
}

impl PooledConnection {
    fn new(
        client: Client,
        age: ConnectionAge,
        pool: Arc<PoolInner>,
        permit: OwnedSemaphorePermit,
    ) -> Self {
        Self {
            client: Some(client),
            age,
            pool,
            _permit: permit,
        }
    }

    /// Take the client out of the pool permanently.
    ///
    /// The slot it occupied becomes free for a new connection.
    #[must_use]
    pub fn detach(mut self) -> Option<Client> {
        let client = self.client.take()?;
        self.pool.total.fetch_sub(1, Ordering::AcqRel);
        Some(client)
    }
}

impl Deref for PooledConnection {
    type Target = Client;

    #[allow(clippy::expect_used)]
    fn deref(&self) -> &Self::Target {
        self.client
            .as_ref()
            .expect("client is present until drop or detach")
    }
}

impl DerefMut for PooledConnection {
    #[allow(clippy::expect_used)]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.client
            .as_mut()
            .expect("client is present until drop or detach")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            self.pool.checkin(client, self.age);
        }
    }
}

impl std::fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}
