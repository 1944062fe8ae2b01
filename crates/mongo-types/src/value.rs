//! Document value representation.

use std::fmt;

use bytes::Bytes;

use crate::document::Document;
use crate::element::ElementType;
use crate::oid::ObjectId;

/// Binary payload together with its subtype byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binary {
    /// Subtype byte (0x00 generic, 0x04 UUID, 0x80+ user defined).
    pub subtype: u8,
    /// Raw bytes.
    pub bytes: Bytes,
}

impl Binary {
    /// Generic binary subtype.
    pub const GENERIC: u8 = 0x00;

    /// Create a generic binary value.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            subtype: Self::GENERIC,
            bytes: bytes.into(),
        }
    }

    /// Create a binary value with an explicit subtype.
    pub fn with_subtype(subtype: u8, bytes: impl Into<Bytes>) -> Self {
        Self {
            subtype,
            bytes: bytes.into(),
        }
    }
}

/// A value stored under a key of a [`Document`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Null.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit floating point.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// Binary blob with subtype.
    Binary(Binary),
    /// Nested document.
    Document(Document),
    /// Ordered array.
    Array(Vec<Value>),
    /// 12-byte object identifier.
    ObjectId(ObjectId),
    /// UTC datetime in milliseconds since the Unix epoch.
    DateTime(i64),
    /// Internal replication timestamp.
    Timestamp {
        /// Seconds since the Unix epoch.
        time: u32,
        /// Ordinal within the second.
        increment: u32,
    },
    /// Regular expression.
    Regex {
        /// Pattern.
        pattern: String,
        /// Option flags, e.g. `"i"`.
        options: String,
    },
    /// JavaScript code.
    JavaScript(String),
    /// 128-bit decimal, carried as its raw little-endian bytes.
    Decimal128([u8; 16]),
    /// Min key.
    MinKey,
    /// Max key.
    MaxKey,
}

impl Value {
    /// Check if the value is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the value as a bool, if it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as an i32, if it is one.
    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int32(v) => Some(*v),
            Self::Int64(v) => i32::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Get the value as an i64, if it is an integer.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(v) => Some(*v),
            Self::Int32(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Get the value as an f64, if it is numeric.
    ///
    /// Servers answer `ok: 1` as any numeric kind, so integers widen here.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            Self::Int32(v) => Some(f64::from(*v)),
            Self::Int64(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get the value as a string slice, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Get the value as binary, if it is one.
    #[must_use]
    pub fn as_binary(&self) -> Option<&Binary> {
        match self {
            Self::Binary(v) => Some(v),
            _ => None,
        }
    }

    /// Get the value as a nested document, if it is one.
    #[must_use]
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Self::Document(v) => Some(v),
            _ => None,
        }
    }

    /// Get the value as an array, if it is one.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(v) => Some(v),
            _ => None,
        }
    }

    /// Get the value as an object id, if it is one.
    #[must_use]
    pub fn as_object_id(&self) -> Option<ObjectId> {
        match self {
            Self::ObjectId(v) => Some(*v),
            _ => None,
        }
    }

    /// The element tag this value encodes with.
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Null => ElementType::Null,
            Self::Bool(_) => ElementType::Boolean,
            Self::Int32(_) => ElementType::Int32,
            Self::Int64(_) => ElementType::Int64,
            Self::Double(_) => ElementType::Double,
            Self::String(_) => ElementType::String,
            Self::Binary(_) => ElementType::Binary,
            Self::Document(_) => ElementType::Document,
            Self::Array(_) => ElementType::Array,
            Self::ObjectId(_) => ElementType::ObjectId,
            Self::DateTime(_) => ElementType::DateTime,
            Self::Timestamp { .. } => ElementType::Timestamp,
            Self::Regex { .. } => ElementType::Regex,
            Self::JavaScript(_) => ElementType::JavaScript,
            Self::Decimal128(_) => ElementType::Decimal128,
            Self::MinKey => ElementType::MinKey,
            Self::MaxKey => ElementType::MaxKey,
        }
    }

    /// Get the type name as a string.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int32(_) => "int",
            Self::Int64(_) => "long",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Binary(_) => "binData",
            Self::Document(_) => "object",
            Self::Array(_) => "array",
            Self::ObjectId(_) => "objectId",
            Self::DateTime(_) => "date",
            Self::Timestamp { .. } => "timestamp",
            Self::Regex { .. } => "regex",
            Self::JavaScript(_) => "javascript",
            Self::Decimal128(_) => "decimal",
            Self::MinKey => "minKey",
            Self::MaxKey => "maxKey",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "NumberLong({v})"),
            Self::Double(v) => write!(f, "{v:?}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Binary(v) => write!(f, "BinData({}, {} bytes)", v.subtype, v.bytes.len()),
            Self::Document(v) => write!(f, "{v}"),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::ObjectId(v) => write!(f, "ObjectId(\"{v}\")"),
            Self::DateTime(v) => write!(f, "Date({v})"),
            Self::Timestamp { time, increment } => write!(f, "Timestamp({time}, {increment})"),
            Self::Regex { pattern, options } => write!(f, "/{pattern}/{options}"),
            Self::JavaScript(v) => write!(f, "Code({v:?})"),
            Self::Decimal128(_) => f.write_str("NumberDecimal(..)"),
            Self::MinKey => f.write_str("MinKey"),
            Self::MaxKey => f.write_str("MaxKey"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<Binary> for Value {
    fn from(v: Binary) -> Self {
        Self::Binary(v)
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Self::Binary(Binary::new(v))
    }
}

impl From<Document> for Value {
    fn from(v: Document) -> Self {
        Self::Document(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Array(v)
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Self {
        Self::ObjectId(v)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

#[cfg(feature = "chrono")]
impl From<chrono::DateTime<chrono::Utc>> for Value {
    fn from(v: chrono::DateTime<chrono::Utc>) -> Self {
        Self::DateTime(v.timestamp_millis())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_widening() {
        assert_eq!(Value::Int32(7).as_i64(), Some(7));
        assert_eq!(Value::Int64(7).as_i32(), Some(7));
        assert_eq!(Value::Int64(i64::MAX).as_i32(), None);
        assert_eq!(Value::Int32(1).as_f64(), Some(1.0));
        assert_eq!(Value::String("1".into()).as_f64(), None);
    }

    #[test]
    fn test_option_into_value() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::String("x".into()));
    }

    #[test]
    fn test_array_order_matters() {
        let a = Value::Array(vec![Value::Int32(1), Value::Int32(2)]);
        let b = Value::Array(vec![Value::Int32(2), Value::Int32(1)]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int32(3).to_string(), "3");
        assert_eq!(Value::String("a".into()).to_string(), "\"a\"");
        assert_eq!(
            Value::Array(vec![Value::Null, Value::Bool(true)]).to_string(),
            "[null, true]"
        );
    }
}
