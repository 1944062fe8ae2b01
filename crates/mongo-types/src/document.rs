//! Ordered document type.

use std::fmt;

use crate::error::TypeError;
use crate::from_value::FromValue;
use crate::oid::ObjectId;
use crate::value::Value;

/// An ordered mapping from string keys to [`Value`]s.
///
/// Keys are unique and iteration follows insertion order. Overwriting an
/// existing key keeps its original position.
///
/// Equality ignores key order: two documents are equal when they hold the
/// same key set with equal values. Array values still compare in order.
#[derive(Debug, Clone, Default)]
pub struct Document {
    entries: Vec<(String, Value)>,
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty document with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the document has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    /// Look up the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Mutable lookup.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Insert or overwrite a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(idx) => Some(std::mem::replace(&mut self.entries[idx].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Remove `key`, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.position(key).map(|idx| self.entries.remove(idx).1)
    }

    /// Iterate entries in insertion order.
    ///
    /// Each call starts a fresh pass from the first entry.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    /// Iterate keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterate values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Get a string value.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Get an integer value, widening 32-bit integers.
    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    /// Get a 32-bit integer value.
    #[must_use]
    pub fn get_i32(&self, key: &str) -> Option<i32> {
        self.get(key).and_then(Value::as_i32)
    }

    /// Get a numeric value as f64.
    #[must_use]
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    /// Get a bool value.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Get a nested document.
    #[must_use]
    pub fn get_document(&self, key: &str) -> Option<&Document> {
        self.get(key).and_then(Value::as_document)
    }

    /// Get an array.
    #[must_use]
    pub fn get_array(&self, key: &str) -> Option<&[Value]> {
        self.get(key).and_then(Value::as_array)
    }

    /// Get an object id.
    #[must_use]
    pub fn get_object_id(&self, key: &str) -> Option<ObjectId> {
        self.get(key).and_then(Value::as_object_id)
    }

    /// Convert the value under `key` to `T`.
    ///
    /// Absent keys go through [`FromValue::from_missing`], so `Option<T>`
    /// yields `None` while required types fail with
    /// [`TypeError::MissingField`].
    pub fn get_as<T: FromValue>(&self, key: &str) -> Result<T, TypeError> {
        match self.get(key) {
            Some(value) => T::from_value(value),
            None => T::from_missing(key),
        }
    }

    /// Remove and convert the value under `key`.
    pub fn take_as<T: FromValue>(&mut self, key: &str) -> Result<T, TypeError> {
        match self.remove(key) {
            Some(value) => T::from_value(&value),
            None => T::from_missing(key),
        }
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| o == v))
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, " {k:?}: {v}")?;
        }
        if self.entries.is_empty() {
            f.write_str("}")
        } else {
            f.write_str(" }")
        }
    }
}

/// Borrowing iterator over a document's entries.
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    inner: std::slice::Iter<'a, (String, Value)>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k.as_str(), v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a str, &'a Value);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut doc = Document::new();
        doc.extend(iter);
        doc
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Document {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

/// Build a [`Document`] from `key => value` pairs.
///
/// ```
/// use mongo_types::doc;
///
/// let d = doc! { "name" => "alice", "age" => 30 };
/// assert_eq!(d.get_str("name"), Some("alice"));
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::Document::new()
    };
    ( $( $key:expr => $value:expr ),+ $(,)? ) => {{
        let mut document = $crate::Document::new();
        $( document.insert($key, $value); )+
        document
    }};
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn test_insert_preserves_order() {
        let d = doc! { "b" => 1, "a" => 2, "c" => 3 };
        let keys: Vec<_> = d.keys().collect();
        assert_eq!(keys, ["b", "a", "c"]);
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut d = doc! { "a" => 1, "b" => 2 };
        let prev = d.insert("a", "x");
        assert_eq!(prev, Some(Value::Int32(1)));
        assert_eq!(d.len(), 2);
        let keys: Vec<_> = d.keys().collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(d.get_str("a"), Some("x"));
    }

    #[test]
    fn test_get_absent_is_none() {
        let d = doc! { "a" => 1 };
        assert!(d.get("missing").is_none());
    }

    #[test]
    fn test_iteration_is_restartable() {
        let d = doc! { "a" => 1, "b" => 2 };
        let first: Vec<_> = d.iter().map(|(k, _)| k).collect();
        let second: Vec<_> = d.iter().map(|(k, _)| k).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_equality_ignores_key_order() {
        let a = doc! { "x" => 1, "y" => "two" };
        let b = doc! { "y" => "two", "x" => 1 };
        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_detects_value_difference() {
        let a = doc! { "x" => 1 };
        let b = doc! { "x" => 2 };
        assert_ne!(a, b);
        let c = doc! { "x" => 1, "y" => 2 };
        assert_ne!(a, c);
    }

    #[test]
    fn test_remove() {
        let mut d = doc! { "a" => 1, "b" => 2, "c" => 3 };
        assert_eq!(d.remove("b"), Some(Value::Int32(2)));
        let keys: Vec<_> = d.keys().collect();
        assert_eq!(keys, ["a", "c"]);
        assert_eq!(d.remove("b"), None);
    }

    #[test]
    fn test_get_as_missing() {
        let d = doc! { "a" => 1 };
        assert_eq!(d.get_as::<Option<i32>>("b").unwrap(), None);
        assert_eq!(
            d.get_as::<i32>("b").unwrap_err(),
            TypeError::MissingField("b".into())
        );
        assert_eq!(d.get_as::<i64>("a").unwrap(), 1);
    }

    #[test]
    fn test_from_iterator() {
        let d: Document = vec![("a", 1), ("b", 2), ("a", 3)].into_iter().collect();
        assert_eq!(d.len(), 2);
        assert_eq!(d.get_i32("a"), Some(3));
    }

    #[test]
    fn test_display() {
        let d = doc! { "name" => "alice", "n" => doc! {} };
        assert_eq!(d.to_string(), r#"{ "name": "alice", "n": {} }"#);
    }
}
