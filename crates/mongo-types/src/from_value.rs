//! Trait for converting from document values to Rust types.

use bytes::Bytes;

use crate::document::Document;
use crate::error::TypeError;
use crate::oid::ObjectId;
use crate::value::{Binary, Value};

/// Trait for types that can be converted from document values.
///
/// This trait is implemented for common Rust types to enable type-safe
/// extraction of fields from documents.
pub trait FromValue: Sized {
    /// Convert from a document value to this type.
    fn from_value(value: &Value) -> Result<Self, TypeError>;

    /// Produce a value for a key that is absent from the document.
    ///
    /// Required types fail; `Option<T>` overrides this to yield `None`.
    fn from_missing(key: &str) -> Result<Self, TypeError> {
        Err(TypeError::MissingField(key.to_string()))
    }
}

fn mismatch(expected: &'static str, value: &Value) -> TypeError {
    if value.is_null() {
        TypeError::UnexpectedNull
    } else {
        TypeError::TypeMismatch {
            expected,
            actual: value.type_name().to_string(),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        Ok(value.clone())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        value.as_bool().ok_or_else(|| mismatch("bool", value))
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        match value {
            Value::Int32(v) => Ok(*v),
            Value::Int64(v) => i32::try_from(*v).map_err(|_| TypeError::OutOfRange {
                target_type: "i32",
            }),
            _ => Err(mismatch("i32", value)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        value.as_i64().ok_or_else(|| mismatch("i64", value))
    }
}

impl FromValue for u32 {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        let v = value.as_i64().ok_or_else(|| mismatch("u32", value))?;
        u32::try_from(v).map_err(|_| TypeError::OutOfRange { target_type: "u32" })
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        value.as_f64().ok_or_else(|| mismatch("f64", value))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| mismatch("String", value))
    }
}

impl FromValue for Binary {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        value.as_binary().cloned().ok_or_else(|| mismatch("Binary", value))
    }
}

impl FromValue for Bytes {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        value
            .as_binary()
            .map(|b| b.bytes.clone())
            .ok_or_else(|| mismatch("Bytes", value))
    }
}

impl FromValue for Document {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        value
            .as_document()
            .cloned()
            .ok_or_else(|| mismatch("Document", value))
    }
}

impl FromValue for ObjectId {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        value.as_object_id().ok_or_else(|| mismatch("ObjectId", value))
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        value
            .as_array()
            .ok_or_else(|| mismatch("array", value))?
            .iter()
            .map(T::from_value)
            .collect()
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }

    fn from_missing(_key: &str) -> Result<Self, TypeError> {
        Ok(None)
    }
}

#[cfg(feature = "chrono")]
impl FromValue for chrono::DateTime<chrono::Utc> {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        match value {
            Value::DateTime(ms) => chrono::DateTime::from_timestamp_millis(*ms).ok_or(
                TypeError::OutOfRange {
                    target_type: "DateTime<Utc>",
                },
            ),
            _ => Err(mismatch("DateTime<Utc>", value)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_null_to_option() {
        assert_eq!(Option::<i32>::from_value(&Value::Null).unwrap(), None);
        assert_eq!(
            Option::<i32>::from_value(&Value::Int32(4)).unwrap(),
            Some(4)
        );
    }

    #[test]
    fn test_null_to_required_fails() {
        assert_eq!(
            String::from_value(&Value::Null).unwrap_err(),
            TypeError::UnexpectedNull
        );
    }

    #[test]
    fn test_int_narrowing() {
        assert_eq!(i32::from_value(&Value::Int64(12)).unwrap(), 12);
        assert!(matches!(
            i32::from_value(&Value::Int64(i64::from(i32::MAX) + 1)),
            Err(TypeError::OutOfRange { .. })
        ));
        assert!(u32::from_value(&Value::Int32(-1)).is_err());
    }

    #[test]
    fn test_mismatch_names_types() {
        let err = bool::from_value(&Value::String("yes".into())).unwrap_err();
        assert_eq!(
            err,
            TypeError::TypeMismatch {
                expected: "bool",
                actual: "string".into()
            }
        );
    }

    #[test]
    fn test_vec_of_values() {
        let arr = Value::Array(vec![Value::Int32(1), Value::Int64(2)]);
        assert_eq!(Vec::<i64>::from_value(&arr).unwrap(), vec![1, 2]);
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn test_datetime() {
        let dt = chrono::DateTime::<chrono::Utc>::from_value(&Value::DateTime(1_000)).unwrap();
        assert_eq!(dt.timestamp_millis(), 1_000);
    }
}
