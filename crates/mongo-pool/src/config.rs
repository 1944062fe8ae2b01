//! Pool configuration.

use std::time::Duration;

use mongo_client::{Document, doc};

use crate::error::PoolError;

/// Sizing, expiry and health-check settings for a [`Pool`](crate::Pool).
///
/// Marked `#[non_exhaustive]`; start from [`PoolConfig::new`] and chain
/// the setters.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct PoolConfig {
    /// Connections opened when the pool is built (default: 1).
    pub min_connections: u32,

    /// Upper bound on open connections, idle and checked out (default: 10).
    pub max_connections: u32,

    /// How long `get` waits for a free slot (default: 30s).
    pub acquire_timeout: Duration,

    /// Idle connections older than this are closed at checkout (default: 10min).
    pub idle_timeout: Duration,

    /// Connections older than this are closed at checkout (default: 30min).
    pub max_lifetime: Duration,

    /// Run [`PoolConfig::health_check_command`] before handing out an idle
    /// connection (default: true).
    pub test_on_checkout: bool,

    /// Command sent to `admin` by the checkout health check
    /// (default: `{ping: 1}`).
    pub health_check_command: Document,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: 1,
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(10 * 60),
            max_lifetime: Duration::from_secs(30 * 60),
            test_on_checkout: true,
            health_check_command: doc! { "ping" => 1 },
        }
    }
}

impl PoolConfig {
    /// Settings with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of connections opened up front.
    #[must_use]
    pub fn min_connections(mut self, count: u32) -> Self {
        self.min_connections = count;
        self
    }

    /// Set the upper bound on open connections.
    #[must_use]
    pub fn max_connections(mut self, count: u32) -> Self {
        self.max_connections = count;
        self
    }

    /// Set how long `get` waits for a free slot.
    #[must_use]
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Set how long a connection may sit idle.
    #[must_use]
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set how long a connection may live.
    #[must_use]
    pub fn max_lifetime(mut self, lifetime: Duration) -> Self {
        self.max_lifetime = lifetime;
        self
    }

    /// Turn the checkout health check on or off.
    #[must_use]
    pub fn test_on_checkout(mut self, enabled: bool) -> Self {
        self.test_on_checkout = enabled;
        self
    }

    /// Replace the health-check command.
    #[must_use]
    pub fn health_check_command(mut self, command: Document) -> Self {
        self.health_check_command = command;
        self
    }

    /// Reject settings the pool cannot honour.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.max_connections == 0 {
            return Err(PoolError::Configuration(
                "max_connections must be at least 1".into(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(PoolError::Configuration(format!(
                "min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        if self.health_check_command.is_empty() {
            return Err(PoolError::Configuration(
                "health_check_command must name a command".into(),
            ));
        }
        Ok(())
    }
}
