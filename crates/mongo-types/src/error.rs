//! Document and value error types.

use thiserror::Error;

/// Errors that can occur while encoding, decoding or converting documents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// Document bytes are malformed.
    ///
    /// Raised for length prefixes that disagree with the data, unknown
    /// element tags, oversized string/binary lengths and missing
    /// terminators.
    #[error("corrupt document data at offset {offset}: {reason}")]
    CorruptData {
        /// Byte offset (relative to the start of the outermost document).
        offset: usize,
        /// What was wrong.
        reason: String,
    },

    /// Encoded document does not fit a 32-bit signed length prefix.
    #[error("document too large: {size} bytes exceeds the 32-bit length prefix")]
    DocumentTooLarge {
        /// Size the encoding would have had.
        size: usize,
    },

    /// Document nests deeper than the decoder accepts.
    #[error("document nesting exceeds {max} levels")]
    NestingTooDeep {
        /// Deepest nesting allowed.
        max: usize,
    },

    /// Key contains an interior NUL byte and cannot be written as a C string.
    #[error("invalid document key {0:?}: keys must not contain NUL")]
    InvalidKey(String),

    /// Regular expression pattern or options contain an interior NUL byte.
    #[error("invalid regular expression {0:?}: must not contain NUL")]
    InvalidRegex(String),

    /// Value is null when non-null was expected.
    #[error("unexpected null value")]
    UnexpectedNull,

    /// Required key is absent from the document.
    #[error("missing field: {0}")]
    MissingField(String),

    /// Type mismatch during conversion.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type name.
        expected: &'static str,
        /// Actual type name.
        actual: String,
    },

    /// Value is out of range for target type.
    #[error("value out of range for {target_type}")]
    OutOfRange {
        /// Target type name.
        target_type: &'static str,
    },

    /// String is not a valid 24-character hex object id.
    #[error("invalid object id: {0:?}")]
    InvalidObjectId(String),
}

impl TypeError {
    /// Shorthand for building a [`TypeError::CorruptData`].
    pub(crate) fn corrupt(offset: usize, reason: impl Into<String>) -> Self {
        Self::CorruptData {
            offset,
            reason: reason.into(),
        }
    }

    /// Returns true if this error was produced by malformed input bytes.
    #[must_use]
    pub fn is_corrupt_data(&self) -> bool {
        matches!(self, Self::CorruptData { .. })
    }
}
