//! Connection lifecycle management.
//!
//! The pool decides what to do with a connection through this trait, so the
//! checks it runs on checkout and return are defined in one place.

use std::time::{Duration, Instant};

use mongo_client::{Client, Document};

use crate::error::PoolError;

/// Operations the pool needs from a pooled connection.
#[allow(async_fn_in_trait)]
pub trait ConnectionLifecycle: Send {
    /// Round-trip `command` to prove the connection works.
    async fn health_check(&mut self, command: &Document) -> Result<(), PoolError>;

    /// Whether the connection can be used without I/O: its transport is
    /// still open.
    fn is_valid(&self) -> bool;
}

impl ConnectionLifecycle for Client {
    async fn health_check(&mut self, command: &Document) -> Result<(), PoolError> {
        self.run_command(command.clone())
            .await
            .map(drop)
            .map_err(PoolError::UnhealthyConnection)
    }

    fn is_valid(&self) -> bool {
        !self.is_closed()
    }
}

/// Age bookkeeping for one pooled connection.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ConnectionAge {
    pub(crate) created_at: Instant,
    pub(crate) idle_since: Instant,
}

impl ConnectionAge {
    pub(crate) fn new() -> Self {
        let now = Instant::now();
        Self {
            created_at: now,
            idle_since: now,
        }
    }

    /// Whether the connection outlived `max_lifetime` or sat idle longer
    /// than `idle_timeout`.
    pub(crate) fn is_expired(&self, now: Instant, max_lifetime: Duration, idle_timeout: Duration) -> bool {
        now.duration_since(self.created_at) >= max_lifetime
            || now.duration_since(self.idle_since) >= idle_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_connection_not_expired() {
        let age = ConnectionAge::new();
        assert!(!age.is_expired(
            Instant::now(),
            Duration::from_secs(60),
            Duration::from_secs(60)
        ));
    }

    #[test]
    fn test_expiry_by_lifetime_and_idle() {
        let age = ConnectionAge::new();
        let later = age.created_at + Duration::from_secs(120);
        assert!(age.is_expired(later, Duration::from_secs(60), Duration::from_secs(600)));
        assert!(age.is_expired(later, Duration::from_secs(600), Duration::from_secs(60)));
        assert!(!age.is_expired(later, Duration::from_secs(600), Duration::from_secs(600)));
    }
}
