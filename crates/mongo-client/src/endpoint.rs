//! Resolved server endpoint.

use std::net::SocketAddr;
use std::time::Duration;

use crate::config::Config;
use crate::error::{Error, Result};

/// Address and request timeout of the one server a client talks to.
///
/// Resolved once when the client is created and never re-resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    address: SocketAddr,
    timeout: Duration,
}

impl Endpoint {
    /// Create an endpoint from an already-resolved address.
    #[must_use]
    pub fn new(address: SocketAddr, timeout: Duration) -> Self {
        Self { address, timeout }
    }

    /// Resolve the configured host, keeping the first address returned.
    pub async fn resolve(config: &Config) -> Result<Self> {
        let resolution_error = |reason: String| Error::Resolution {
            host: config.host.clone(),
            reason,
        };

        let mut addresses = tokio::net::lookup_host((config.host.as_str(), config.port))
            .await
            .map_err(|e| resolution_error(e.to_string()))?;
        let address = addresses
            .next()
            .ok_or_else(|| resolution_error("no addresses returned".into()))?;

        tracing::debug!(host = %config.host, %address, "resolved endpoint");
        Ok(Self::new(address, config.timeouts.query_timeout))
    }

    /// Socket address.
    #[must_use]
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_ip_literal() {
        let config = Config::new().host("127.0.0.1").port(27999);
        let endpoint = Endpoint::resolve(&config).await.unwrap();
        assert_eq!(endpoint.address(), "127.0.0.1:27999".parse().unwrap());
        assert_eq!(endpoint.timeout(), config.timeouts.query_timeout);
    }

    #[tokio::test]
    async fn test_unresolvable_host() {
        let config = Config::new().host("no-such-host.invalid");
        let err = Endpoint::resolve(&config).await.unwrap_err();
        assert!(matches!(err, Error::Resolution { ref host, .. } if host == "no-such-host.invalid"));
    }
}
