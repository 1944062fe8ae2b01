//! Test fixture utilities.

use std::sync::atomic::{AtomicU32, Ordering};

use mongo_types::{Document, doc};

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// A name unique within this process, for databases and collections that
/// tests create and drop.
#[must_use]
pub fn unique_name(prefix: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{}_{n}", std::process::id())
}

/// Test database fixture naming the collections a test seeds.
#[derive(Debug, Clone)]
pub struct TestFixture {
    /// Database name.
    pub database: String,
    /// Collections with their initial documents.
    pub collections: Vec<(String, Vec<Document>)>,
}

impl TestFixture {
    /// Create a fixture for a freshly named database.
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        Self {
            database: unique_name(prefix),
            collections: Vec::new(),
        }
    }

    /// Add a collection and its documents.
    #[must_use]
    pub fn with_collection(mut self, name: impl Into<String>, documents: Vec<Document>) -> Self {
        self.collections.push((name.into(), documents));
        self
    }

    /// Full `db.collection` name of `collection`.
    #[must_use]
    pub fn namespace(&self, collection: &str) -> String {
        format!("{}.{collection}", self.database)
    }

    /// `(namespace, documents)` pairs, ready for
    /// [`MockServerBuilder::with_collection`](crate::mock_server::MockServerBuilder::with_collection).
    pub fn namespaced(&self) -> impl Iterator<Item = (String, Vec<Document>)> + '_ {
        self.collections
            .iter()
            .map(|(name, docs)| (self.namespace(name), docs.clone()))
    }
}

/// `count` people with `name`, `age` and `city` fields and integer ids.
#[must_use]
pub fn people(count: i32) -> Vec<Document> {
    const CITIES: [&str; 3] = ["London", "Paris", "Oslo"];
    (0..count)
        .map(|i| {
            doc! {
                "_id" => i,
                "name" => format!("person-{i}"),
                "age" => 20i64 + i64::from(i % 50),
                "city" => CITIES[(i % 3) as usize],
            }
        })
        .collect()
}
