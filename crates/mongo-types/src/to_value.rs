//! Trait for converting Rust types to document values.

use bytes::Bytes;

use crate::document::Document;
use crate::error::TypeError;
use crate::oid::ObjectId;
use crate::value::{Binary, Value};

/// Trait for types that can be stored in a document.
pub trait ToValue {
    /// Convert this value to a document value.
    fn to_value(&self) -> Result<Value, TypeError>;
}

impl ToValue for Value {
    fn to_value(&self) -> Result<Value, TypeError> {
        Ok(self.clone())
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Result<Value, TypeError> {
        Ok(Value::Bool(*self))
    }
}

impl ToValue for i32 {
    fn to_value(&self) -> Result<Value, TypeError> {
        Ok(Value::Int32(*self))
    }
}

impl ToValue for i64 {
    fn to_value(&self) -> Result<Value, TypeError> {
        Ok(Value::Int64(*self))
    }
}

impl ToValue for u32 {
    fn to_value(&self) -> Result<Value, TypeError> {
        Ok(Value::Int64(i64::from(*self)))
    }
}

impl ToValue for u64 {
    fn to_value(&self) -> Result<Value, TypeError> {
        i64::try_from(*self)
            .map(Value::Int64)
            .map_err(|_| TypeError::OutOfRange { target_type: "i64" })
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Result<Value, TypeError> {
        Ok(Value::Double(*self))
    }
}

impl ToValue for str {
    fn to_value(&self) -> Result<Value, TypeError> {
        Ok(Value::String(self.to_owned()))
    }
}

impl ToValue for String {
    fn to_value(&self) -> Result<Value, TypeError> {
        Ok(Value::String(self.clone()))
    }
}

impl ToValue for Binary {
    fn to_value(&self) -> Result<Value, TypeError> {
        Ok(Value::Binary(self.clone()))
    }
}

impl ToValue for Bytes {
    fn to_value(&self) -> Result<Value, TypeError> {
        Ok(Value::Binary(Binary::new(self.clone())))
    }
}

impl ToValue for Document {
    fn to_value(&self) -> Result<Value, TypeError> {
        Ok(Value::Document(self.clone()))
    }
}

impl ToValue for ObjectId {
    fn to_value(&self) -> Result<Value, TypeError> {
        Ok(Value::ObjectId(*self))
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Result<Value, TypeError> {
        self.iter()
            .map(ToValue::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Result<Value, TypeError> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Null),
        }
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Result<Value, TypeError> {
        (*self).to_value()
    }
}

#[cfg(feature = "chrono")]
impl ToValue for chrono::DateTime<chrono::Utc> {
    fn to_value(&self) -> Result<Value, TypeError> {
        Ok(Value::DateTime(self.timestamp_millis()))
    }
}
