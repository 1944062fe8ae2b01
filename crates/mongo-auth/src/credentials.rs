//! Credential types for authentication.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::AuthError;

/// Authentication mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum AuthMechanism {
    /// Legacy nonce challenge/response (servers before 3.0 default).
    #[default]
    MongoCr,
    /// SASL PLAIN, typically against an external directory.
    Plain,
}

impl AuthMechanism {
    /// Name as used in connection strings and commands.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MongoCr => "MONGODB-CR",
            Self::Plain => "PLAIN",
        }
    }
}

impl FromStr for AuthMechanism {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MONGODB-CR" => Ok(Self::MongoCr),
            "PLAIN" => Ok(Self::Plain),
            other => Err(AuthError::UnsupportedMethod(other.to_string())),
        }
    }
}

impl fmt::Display for AuthMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Username/password credentials.
///
/// Credentials are designed to minimize copying of sensitive data.
#[derive(Clone)]
pub struct Credentials {
    /// Username.
    pub username: Cow<'static, str>,
    /// Password.
    pub password: Cow<'static, str>,
    /// Database the user is defined in.
    pub source: Cow<'static, str>,
    /// Mechanism used to prove the password.
    pub mechanism: AuthMechanism,
}

impl Credentials {
    /// Create credentials authenticated against the `admin` database.
    pub fn new(
        username: impl Into<Cow<'static, str>>,
        password: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            source: Cow::Borrowed("admin"),
            mechanism: AuthMechanism::default(),
        }
    }

    /// Set the database the user is defined in.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<Cow<'static, str>>) -> Self {
        self.source = source.into();
        self
    }

    /// Set the mechanism.
    #[must_use]
    pub fn with_mechanism(mut self, mechanism: AuthMechanism) -> Self {
        self.mechanism = mechanism;
        self
    }

    /// Reject credentials that can never succeed.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.username.is_empty() {
            return Err(AuthError::InvalidCredentials("username is empty".into()));
        }
        if self.source.is_empty() {
            return Err(AuthError::InvalidCredentials(
                "authentication source is empty".into(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never expose sensitive data in debug output
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("source", &self.source)
            .field("mechanism", &self.mechanism)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::new("alice", "hunter2");
        let debug = format!("{creds:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_defaults() {
        let creds = Credentials::new("u", "p");
        assert_eq!(creds.source, "admin");
        assert_eq!(creds.mechanism, AuthMechanism::MongoCr);
    }

    #[test]
    fn test_mechanism_parse() {
        assert_eq!("plain".parse::<AuthMechanism>().unwrap(), AuthMechanism::Plain);
        assert_eq!(
            "MONGODB-CR".parse::<AuthMechanism>().unwrap(),
            AuthMechanism::MongoCr
        );
        assert!("SCRAM-SHA-1".parse::<AuthMechanism>().is_err());
    }

    #[test]
    fn test_validate() {
        assert!(Credentials::new("", "p").validate().is_err());
        assert!(Credentials::new("u", "p").with_source("").validate().is_err());
        assert!(Credentials::new("u", "").validate().is_ok());
    }
}
