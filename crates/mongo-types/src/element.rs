//! Element type tags.

/// Tag byte that precedes every element in an encoded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[non_exhaustive]
pub enum ElementType {
    /// 64-bit IEEE 754 floating point.
    Double = 0x01,
    /// UTF-8 string.
    String = 0x02,
    /// Embedded document.
    Document = 0x03,
    /// Array, encoded as a document keyed "0", "1", ...
    Array = 0x04,
    /// Binary data with a subtype byte.
    Binary = 0x05,
    /// 12-byte object identifier.
    ObjectId = 0x07,
    /// Boolean.
    Boolean = 0x08,
    /// UTC datetime, milliseconds since the Unix epoch.
    DateTime = 0x09,
    /// Null.
    Null = 0x0A,
    /// Regular expression (pattern, options).
    Regex = 0x0B,
    /// JavaScript code.
    JavaScript = 0x0D,
    /// 32-bit signed integer.
    Int32 = 0x10,
    /// Internal replication timestamp.
    Timestamp = 0x11,
    /// 64-bit signed integer.
    Int64 = 0x12,
    /// 128-bit IEEE 754-2008 decimal.
    Decimal128 = 0x13,
    /// Max key.
    MaxKey = 0x7F,
    /// Min key.
    MinKey = 0xFF,
}

impl ElementType {
    /// Look up the element type for a tag byte.
    ///
    /// Returns `None` for tags that are unknown or deprecated.
    #[must_use]
    pub const fn from_u8(tag: u8) -> Option<Self> {
        Some(match tag {
            0x01 => Self::Double,
            0x02 => Self::String,
            0x03 => Self::Document,
            0x04 => Self::Array,
            0x05 => Self::Binary,
            0x07 => Self::ObjectId,
            0x08 => Self::Boolean,
            0x09 => Self::DateTime,
            0x0A => Self::Null,
            0x0B => Self::Regex,
            0x0D => Self::JavaScript,
            0x10 => Self::Int32,
            0x11 => Self::Timestamp,
            0x12 => Self::Int64,
            0x13 => Self::Decimal128,
            0x7F => Self::MaxKey,
            0xFF => Self::MinKey,
            _ => return None,
        })
    }

    /// The tag byte for this element type.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_round_trip() {
        for tag in 0u8..=255 {
            if let Some(ty) = ElementType::from_u8(tag) {
                assert_eq!(ty.as_u8(), tag);
            }
        }
    }

    #[test]
    fn test_deprecated_tags_are_unknown() {
        // undefined, DBPointer, symbol, code-with-scope
        for tag in [0x06, 0x0C, 0x0E, 0x0F] {
            assert!(ElementType::from_u8(tag).is_none());
        }
        assert!(ElementType::from_u8(0x00).is_none());
    }
}
