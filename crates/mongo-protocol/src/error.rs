//! Protocol-level error types.

use mongo_types::TypeError;
use thiserror::Error;

/// Errors raised while building or parsing wire messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// Not enough bytes to parse the requested structure.
    #[error("incomplete message: expected {expected} bytes, got {actual}")]
    IncompleteMessage {
        /// Bytes required.
        expected: usize,
        /// Bytes available.
        actual: usize,
    },

    /// Opcode is not one this driver speaks.
    #[error("invalid opcode: {0}")]
    InvalidOpCode(i32),

    /// Header declares a length shorter than the header itself.
    #[error("invalid message length: {0}")]
    InvalidMessageLength(i32),

    /// Message exceeds the maximum accepted size.
    #[error("message too large: {length} bytes (max {max})")]
    MessageTooLarge {
        /// Declared or computed length.
        length: usize,
        /// Limit in force.
        max: usize,
    },

    /// Reply header's document count disagrees with the documents present.
    #[error("reply declares {declared} documents but contains {actual}")]
    ReplyCountMismatch {
        /// `numberReturned` from the reply.
        declared: i32,
        /// Documents actually decoded.
        actual: usize,
    },

    /// A message of one kind arrived where another was required.
    #[error("unexpected opcode: expected {expected}, got {actual}")]
    UnexpectedOpCode {
        /// Opcode that was required.
        expected: &'static str,
        /// Opcode that arrived.
        actual: &'static str,
    },

    /// Bytes remain after the last field of a message body.
    #[error("{0} trailing bytes after message body")]
    TrailingBytes(usize),

    /// A C string field is missing its terminator or is not UTF-8.
    #[error("invalid C string in {0}")]
    InvalidCString(&'static str),

    /// Database or collection name is not acceptable.
    #[error("invalid namespace: {0}")]
    InvalidNamespace(String),

    /// An embedded document failed to encode or decode.
    #[error("document error: {0}")]
    Document(#[from] TypeError),
}

impl ProtocolError {
    /// Returns true if the error came from malformed document bytes inside
    /// an otherwise well-formed message.
    #[must_use]
    pub fn is_corrupt_document(&self) -> bool {
        matches!(self, Self::Document(e) if e.is_corrupt_data())
    }
}
