//! Client configuration.

use std::time::Duration;

use mongo_auth::{AuthMechanism, Credentials};
use url::{Host, Url};

use crate::error::{Error, Result};

/// Default server port.
pub const DEFAULT_PORT: u16 = 27017;

/// Default host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Timeout configuration for connection setup and requests.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Time to establish the TCP connection (default: 15s).
    pub connect_timeout: Duration,
    /// Deadline for each send and each complete reply (default: 30s).
    pub query_timeout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            query_timeout: Duration::from_secs(30),
        }
    }
}

impl TimeoutConfig {
    /// Create a new timeout configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the TCP connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }
}

/// Configuration for connecting to a server.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Server hostname or IP address.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Default database for [`Client::default_database`](crate::Client::default_database).
    pub database: Option<String>,

    /// Credentials to authenticate with after connecting.
    pub credentials: Option<Credentials>,

    /// Application name reported in the `isMaster` handshake.
    pub application_name: Option<String>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Keep keys unknown to a record type in its expando field.
    pub expando_properties: bool,

    /// Documents requested per batch; 0 lets the server choose.
    pub batch_size: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database: None,
            credentials: None,
            application_name: None,
            timeouts: TimeoutConfig::default(),
            expando_properties: false,
            batch_size: 0,
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a connection string into configuration.
    ///
    /// The accepted form is
    /// `mongodb://[user:password@]host[:port][/database][?options]`.
    ///
    /// Recognised options (case-insensitive): `connectTimeoutMS`,
    /// `socketTimeoutMS`, `authSource`, `authMechanism`, `appName`,
    /// `expandoProperties` and `batchSize`. Other options are ignored.
    ///
    /// Only a single host is supported.
    pub fn from_connection_string(conn_str: &str) -> Result<Self> {
        let rest = conn_str
            .strip_prefix("mongodb://")
            .ok_or_else(|| Error::Config("connection string must start with mongodb://".into()))?;

        let authority = rest.split(['/', '?']).next().unwrap_or_default();
        let hosts = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
        if hosts.contains(',') {
            return Err(Error::Config(
                "multiple hosts are not supported; connect to a single server".into(),
            ));
        }

        let url = Url::parse(conn_str)
            .map_err(|e| Error::Config(format!("invalid connection string: {e}")))?;

        let mut config = Self::default();

        match url.host() {
            // Brackets belong to the URL syntax, not the address
            Some(Host::Ipv6(addr)) => config.host = addr.to_string(),
            Some(host) if !host.to_string().is_empty() => config.host = host.to_string(),
            _ => return Err(Error::Config("connection string has no host".into())),
        }
        if let Some(port) = url.port() {
            config.port = port;
        }

        let path = url.path().trim_start_matches('/');
        if !path.is_empty() {
            config.database = Some(percent_decode(path)?);
        }

        let mut auth_source: Option<String> = None;
        let mut mechanism: Option<AuthMechanism> = None;

        for (key, value) in url.query_pairs() {
            match key.to_ascii_lowercase().as_str() {
                "connecttimeoutms" => {
                    config.timeouts.connect_timeout = parse_millis(&key, &value)?;
                }
                "sockettimeoutms" => {
                    config.timeouts.query_timeout = parse_millis(&key, &value)?;
                }
                "authsource" => auth_source = Some(value.into_owned()),
                "authmechanism" => {
                    mechanism = Some(value.parse().map_err(|e| Error::Config(format!("{e}")))?);
                }
                "appname" => config.application_name = Some(value.into_owned()),
                "expandoproperties" => {
                    config.expando_properties = parse_bool(&key, &value)?;
                }
                "batchsize" => {
                    config.batch_size = value.parse().map_err(|_| {
                        Error::Config(format!("invalid value for {key}: {value:?}"))
                    })?;
                }
                _ => {
                    tracing::debug!(option = %key, "ignoring unknown connection string option");
                }
            }
        }

        if !url.username().is_empty() {
            let username = percent_decode(url.username())?;
            let password = percent_decode(url.password().unwrap_or_default())?;
            // Users are looked up in the named database unless told otherwise
            let source = auth_source
                .or_else(|| config.database.clone())
                .unwrap_or_else(|| "admin".to_string());
            let mut credentials = Credentials::new(username, password).with_source(source);
            if let Some(mechanism) = mechanism {
                credentials = credentials.with_mechanism(mechanism);
            }
            config.credentials = Some(credentials);
        }

        Ok(config)
    }

    /// Set the host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the default database.
    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the credentials.
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the application name.
    #[must_use]
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    /// Set the TCP connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.connect_timeout = timeout;
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.query_timeout = timeout;
        self
    }

    /// Set the timeout configuration.
    #[must_use]
    pub fn timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Keep keys unknown to record types.
    #[must_use]
    pub fn expando_properties(mut self, enabled: bool) -> Self {
        self.expando_properties = enabled;
        self
    }

    /// Set the default batch size.
    #[must_use]
    pub fn batch_size(mut self, batch_size: i32) -> Self {
        self.batch_size = batch_size;
        self
    }
}

fn parse_millis(key: &str, value: &str) -> Result<Duration> {
    value
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| Error::Config(format!("invalid value for {key}: {value:?}")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(Error::Config(format!("invalid value for {key}: {value:?}"))),
    }
}

/// Decode `%XX` escapes in a user-info or path component.
fn percent_decode(input: &str) -> Result<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes
                .get(i + 1..i + 3)
                .and_then(|h| std::str::from_utf8(h).ok())
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| Error::Config(format!("invalid percent escape in {input:?}")))?;
            out.push(hex);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| Error::Config(format!("{input:?} is not valid UTF-8")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 27017);
        assert_eq!(config.timeouts.query_timeout, Duration::from_secs(30));
        assert_eq!(config.timeouts.connect_timeout, Duration::from_secs(15));
        assert!(!config.expando_properties);
        assert!(config.credentials.is_none());
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("p%40ss%3Aword").unwrap(), "p@ss:word");
        assert_eq!(percent_decode("plain").unwrap(), "plain");
        assert!(percent_decode("bad%2").is_err());
        assert!(percent_decode("bad%zz").is_err());
    }

    #[test]
    fn test_builder() {
        let config = Config::new()
            .host("db.internal")
            .port(27018)
            .database("app")
            .query_timeout(Duration::from_secs(5))
            .expando_properties(true)
            .batch_size(50);
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 27018);
        assert_eq!(config.database.as_deref(), Some("app"));
        assert_eq!(config.timeouts.query_timeout, Duration::from_secs(5));
        assert!(config.expando_properties);
        assert_eq!(config.batch_size, 50);
    }
}
