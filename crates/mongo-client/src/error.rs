//! Client error types.

use std::time::Duration;

use mongo_auth::AuthError;
use mongo_codec::CodecError;
use mongo_protocol::ProtocolError;
use mongo_types::TypeError;
use thiserror::Error;

/// Errors that can occur during client operations.
///
/// Variants that leave the connection closed are reported by
/// [`Error::is_connection_fatal`]. After such an error every later
/// operation on the same connection fails with [`Error::Connection`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Host name did not resolve to any address.
    #[error("failed to resolve {host}: {reason}")]
    Resolution {
        /// Host that was looked up.
        host: String,
        /// Resolver message.
        reason: String,
    },

    /// Connect, send or receive failed, the peer hung up, or the connection
    /// was already closed.
    #[error("connection error: {0}")]
    Connection(String),

    /// A deadline elapsed. The connection is closed.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// A fully received message contained malformed document bytes.
    /// The connection stays open.
    #[error("corrupt data at offset {offset}: {reason}")]
    CorruptData {
        /// Byte offset within the document where decoding failed.
        offset: usize,
        /// What was wrong.
        reason: String,
    },

    /// The peer broke the request/reply contract. The connection is closed.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server rejected a command or query.
    #[error("command failed with code {code}: {message}")]
    Command {
        /// Server error code, 0 when the server sent none.
        code: i32,
        /// Server error message.
        message: String,
    },

    /// Authentication failed.
    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A value could not be encoded or mapped to the requested type.
    #[error("type error: {0}")]
    Type(TypeError),

    /// Database or collection name is not acceptable.
    #[error("invalid namespace: {0}")]
    InvalidNamespace(String),
}

impl Error {
    /// Check if this error is transient and may succeed on retry with a
    /// fresh connection.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Connection(_))
    }

    /// Check if this error left the connection closed.
    #[must_use]
    pub fn is_connection_fatal(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::Connection(_) | Self::Protocol(_)
        )
    }

    /// Check if this error indicates the peer violated the wire protocol.
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::Protocol(_) | Self::CorruptData { .. })
    }

    /// Server error code for [`Error::Command`].
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Command { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<TypeError> for Error {
    fn from(e: TypeError) -> Self {
        match e {
            TypeError::CorruptData { offset, reason } => Self::CorruptData { offset, reason },
            other => Self::Type(other),
        }
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        match e {
            ProtocolError::Document(e) => e.into(),
            ProtocolError::InvalidNamespace(name) => Self::InvalidNamespace(name),
            // The frame arrived whole; only its contents disagree
            e @ ProtocolError::ReplyCountMismatch { .. } => Self::CorruptData {
                offset: 0,
                reason: e.to_string(),
            },
            other => Self::Protocol(other.to_string()),
        }
    }
}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::Timeout(timeout) | CodecError::ConnectTimeout { timeout, .. } => {
                Self::Timeout(timeout)
            }
            CodecError::Protocol(e) => Self::Protocol(e.to_string()),
            e @ CodecError::MessageTooLarge { .. } => Self::Protocol(e.to_string()),
            other => Self::Connection(other.to_string()),
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_document_stays_non_fatal() {
        let err: Error = ProtocolError::Document(TypeError::CorruptData {
            offset: 7,
            reason: "bad tag".into(),
        })
        .into();
        assert!(matches!(err, Error::CorruptData { offset: 7, .. }));
        assert!(!err.is_connection_fatal());
        assert!(err.is_protocol_error());
    }

    #[test]
    fn test_codec_mapping() {
        let err: Error = CodecError::Timeout(Duration::from_secs(1)).into();
        assert!(matches!(err, Error::Timeout(_)));
        assert!(err.is_transient());

        let err: Error = CodecError::ConnectionClosed.into();
        assert!(matches!(err, Error::Connection(_)));
        assert!(err.is_connection_fatal());

        let err: Error = CodecError::Protocol(ProtocolError::InvalidOpCode(99)).into();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn test_encode_error_is_type_error() {
        let err: Error = ProtocolError::Document(TypeError::InvalidKey("a\0b".into())).into();
        assert!(matches!(err, Error::Type(_)));
        assert!(!err.is_connection_fatal());
    }

    #[test]
    fn test_command_code() {
        let err = Error::Command {
            code: 13,
            message: "unauthorized".into(),
        };
        assert_eq!(err.code(), Some(13));
        assert!(!err.is_transient());
        assert_eq!(Error::Config("x".into()).code(), None);
    }
}
