//! Collection handles and CRUD operations.
//!
//! Reads go through `OP_QUERY` on the collection namespace and return a
//! [`Cursor`]. Writes use the `insert`, `update` and `delete` commands so
//! the server reports write errors in the reply.

use mongo_protocol::{Namespace, QueryFlags};
use mongo_types::{Document, ObjectId, Value, doc};

use crate::client::Client;
use crate::connection::QueryOptions;
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::record::{FromDocument, MappingOptions, ToDocument};

/// Server code for a namespace that does not exist.
const NAMESPACE_NOT_FOUND: i32 = 26;

/// Options for [`Collection::find_with`].
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Documents to skip.
    pub skip: u32,
    /// Stop after this many documents; 0 means no limit.
    pub limit: u32,
    /// Documents per batch; `None` uses the client default.
    pub batch_size: Option<i32>,
    /// Fields to return.
    pub projection: Option<Document>,
    /// Sort order, e.g. `{age: -1}`.
    pub sort: Option<Document>,
    /// Ask the server not to time out an idle cursor.
    pub no_cursor_timeout: bool,
}

impl FindOptions {
    /// Create options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of documents to skip.
    #[must_use]
    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = skip;
        self
    }

    /// Set the maximum number of documents.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Set the batch size.
    #[must_use]
    pub fn batch_size(mut self, batch_size: i32) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Set the projection.
    #[must_use]
    pub fn projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Set the sort order.
    #[must_use]
    pub fn sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Keep the cursor alive on the server while idle.
    #[must_use]
    pub fn no_cursor_timeout(mut self, enabled: bool) -> Self {
        self.no_cursor_timeout = enabled;
        self
    }
}

/// Outcome of [`Collection::update_many`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateResult {
    /// Documents the filter matched.
    pub matched_count: u64,
    /// Documents actually changed.
    pub modified_count: u64,
}

/// A collection within a database.
#[derive(Debug)]
pub struct Collection<'a> {
    client: &'a mut Client,
    db: String,
    name: String,
}

impl<'a> Collection<'a> {
    pub(crate) fn new(client: &'a mut Client, db: &str, name: &str) -> Self {
        Self {
            client,
            db: db.to_string(),
            name: name.to_string(),
        }
    }

    /// Collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the owning database.
    #[must_use]
    pub fn database_name(&self) -> &str {
        &self.db
    }

    /// Validated `db.collection` namespace.
    pub fn namespace(&self) -> Result<Namespace> {
        Ok(Namespace::new(self.db.as_str(), self.name.as_str())?)
    }

    fn mapping(&self) -> MappingOptions {
        MappingOptions::with_expando(self.client.config().expando_properties)
    }

    /// Find documents matching `filter`.
    pub async fn find(&mut self, filter: Document) -> Result<Cursor<'_>> {
        self.find_with(filter, FindOptions::default()).await
    }

    /// Find documents with explicit options.
    pub async fn find_with(&mut self, filter: Document, options: FindOptions) -> Result<Cursor<'_>> {
        let namespace = self.namespace()?;
        let mapping = self.mapping();
        let batch_size = options
            .batch_size
            .unwrap_or(self.client.config().batch_size);
        let limit = i32::try_from(options.limit).unwrap_or(i32::MAX);
        // A negative batch size asks for a single batch of that many
        let batch_len = i32::try_from(batch_size.unsigned_abs()).unwrap_or(i32::MAX);

        // A limit that fits one batch is requested as a single batch
        let number_to_return = match (limit, batch_size) {
            (0, n) => n,
            (l, n) if n == 0 || l <= batch_len => -l,
            (_, n) => n,
        };

        let query = match options.sort {
            Some(sort) => doc! { "$query" => filter, "$orderby" => sort },
            None => filter,
        };
        let mut flags = QueryFlags::empty();
        if options.no_cursor_timeout {
            flags |= QueryFlags::NO_CURSOR_TIMEOUT;
        }
        let query_options = QueryOptions {
            skip: i32::try_from(options.skip).unwrap_or(i32::MAX),
            batch_size: number_to_return,
            projection: options.projection,
            flags,
        };

        let connection = self.client.connection();
        let first = connection.send_query(&namespace, query, &query_options).await?;
        tracing::debug!(
            ns = %namespace,
            cursor_id = first.cursor_id,
            documents = first.documents.len(),
            "query returned first batch"
        );
        Ok(Cursor::new(connection, namespace, first, batch_len)
            .with_limit(options.limit as usize)
            .with_mapping(mapping))
    }

    /// First document matching `filter`.
    pub async fn find_one(&mut self, filter: Document) -> Result<Option<Document>> {
        let mut cursor = self.find_with(filter, FindOptions::new().limit(1)).await?;
        cursor.next().await
    }

    /// First document matching `filter`, mapped onto a record type.
    pub async fn find_one_record<R: FromDocument>(&mut self, filter: Document) -> Result<Option<R>> {
        let mapping = self.mapping();
        match self.find_one(filter).await? {
            Some(document) => Ok(Some(R::from_document(document, mapping)?)),
            None => Ok(None),
        }
    }

    /// Insert one document, assigning an `_id` when it has none.
    ///
    /// Returns the document's `_id`.
    pub async fn insert_one(&mut self, document: Document) -> Result<Value> {
        let mut ids = self.insert_many(vec![document]).await?;
        ids.pop()
            .ok_or_else(|| Error::Protocol("insert returned no id".into()))
    }

    /// Insert documents in order, assigning `_id`s where missing.
    ///
    /// Returns the `_id` of each document.
    pub async fn insert_many(&mut self, documents: Vec<Document>) -> Result<Vec<Value>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::with_capacity(documents.len());
        let documents: Vec<Value> = documents
            .into_iter()
            .map(|document| {
                let document = with_id(document);
                ids.push(document.get("_id").cloned().unwrap_or_default());
                Value::Document(document)
            })
            .collect();

        let count = documents.len();
        let reply = self
            .write_command(doc! {
                "insert" => self.name.as_str(),
                "documents" => documents,
                "ordered" => true,
            })
            .await?;
        tracing::debug!(collection = %self.name, count, inserted = ?reply.get_i64("n"), "inserted documents");
        Ok(ids)
    }

    /// Encode a record and insert it.
    pub async fn insert_record<R: ToDocument>(&mut self, record: &R) -> Result<Value> {
        let document = record.to_document()?;
        self.insert_one(document).await
    }

    /// Apply `update` to every document matching `filter`.
    pub async fn update_many(&mut self, filter: Document, update: Document) -> Result<UpdateResult> {
        let reply = self
            .write_command(doc! {
                "update" => self.name.as_str(),
                "updates" => vec![Value::from(doc! {
                    "q" => filter,
                    "u" => update,
                    "multi" => true,
                    "upsert" => false,
                })],
                "ordered" => true,
            })
            .await?;
        Ok(UpdateResult {
            matched_count: count_field(&reply, "n"),
            modified_count: count_field(&reply, "nModified"),
        })
    }

    /// Delete every document matching `filter`. Returns the number deleted.
    pub async fn delete_many(&mut self, filter: Document) -> Result<u64> {
        let reply = self
            .write_command(doc! {
                "delete" => self.name.as_str(),
                "deletes" => vec![Value::from(doc! { "q" => filter, "limit" => 0 })],
                "ordered" => true,
            })
            .await?;
        Ok(count_field(&reply, "n"))
    }

    /// Count documents matching `filter`.
    pub async fn count_documents(&mut self, filter: Document) -> Result<u64> {
        let reply = self
            .run_command(doc! { "count" => self.name.as_str(), "query" => filter })
            .await?;
        Ok(count_field(&reply, "n"))
    }

    /// Drop the collection. Dropping a collection that does not exist
    /// succeeds.
    pub async fn drop(&mut self) -> Result<()> {
        tracing::info!(ns = %format!("{}.{}", self.db, self.name), "dropping collection");
        match self.run_command(doc! { "drop" => self.name.as_str() }).await {
            Ok(_) => Ok(()),
            Err(Error::Command { code, .. }) if code == NAMESPACE_NOT_FOUND => Ok(()),
            Err(Error::Command { message, .. }) if message == "ns not found" => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn run_command(&mut self, command: Document) -> Result<Document> {
        self.namespace()?;
        self.client.run_command_on(&self.db, command).await
    }

    /// Run a write command and surface the first write error.
    async fn write_command(&mut self, command: Document) -> Result<Document> {
        let reply = self.run_command(command).await?;
        let first_error = reply
            .get_array("writeErrors")
            .and_then(|errors| errors.first())
            .and_then(Value::as_document);
        if let Some(error) = first_error {
            return Err(Error::Command {
                code: error.get_i32("code").unwrap_or(0),
                message: error.get_str("errmsg").unwrap_or("write failed").to_string(),
            });
        }
        if let Some(concern) = reply.get_document("writeConcernError") {
            return Err(Error::Command {
                code: concern.get_i32("code").unwrap_or(0),
                message: concern
                    .get_str("errmsg")
                    .unwrap_or("write concern failed")
                    .to_string(),
            });
        }
        Ok(reply)
    }
}

/// Put a fresh `_id` first when the document has none.
fn with_id(document: Document) -> Document {
    if document.contains_key("_id") {
        return document;
    }
    let mut with_id = Document::with_capacity(document.len() + 1);
    with_id.insert("_id", ObjectId::new());
    with_id.extend(document);
    with_id
}

/// Read a count the server may send as int, long or double.
fn count_field(reply: &Document, key: &str) -> u64 {
    match reply.get(key) {
        Some(Value::Double(n)) if *n >= 0.0 => *n as u64,
        Some(value) => value
            .as_i64()
            .and_then(|n| u64::try_from(n).ok())
            .unwrap_or(0),
        None => 0,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_with_id_assigns_first() {
        let document = with_id(doc! { "name" => "a" });
        assert_eq!(document.keys().collect::<Vec<_>>(), vec!["_id", "name"]);
        assert!(document.get_object_id("_id").is_some());
    }

    #[test]
    fn test_with_id_keeps_existing() {
        let document = with_id(doc! { "name" => "a", "_id" => 7 });
        assert_eq!(document.get_i32("_id"), Some(7));
        assert_eq!(document.len(), 2);
    }

    #[test]
    fn test_count_field_variants() {
        assert_eq!(count_field(&doc! { "n" => 3 }, "n"), 3);
        assert_eq!(count_field(&doc! { "n" => 4i64 }, "n"), 4);
        assert_eq!(count_field(&doc! { "n" => 5.0 }, "n"), 5);
        assert_eq!(count_field(&doc! { "n" => -1 }, "n"), 0);
        assert_eq!(count_field(&doc! {}, "n"), 0);
    }

    #[test]
    fn test_find_options_builder() {
        let options = FindOptions::new()
            .skip(5)
            .limit(10)
            .batch_size(100)
            .sort(doc! { "age" => -1 });
        assert_eq!(options.skip, 5);
        assert_eq!(options.limit, 10);
        assert_eq!(options.batch_size, Some(100));
        assert!(options.sort.is_some());
    }
}
