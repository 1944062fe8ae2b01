//! Database and collection namespaces.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ProtocolError;

/// Database names: no path separators, dots, spaces, quotes, `$` or NUL.
static DATABASE_NAME: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r#"^[^/\\. "$*<>:|?\x00]{1,64}$"#).expect("database name pattern is valid")
});

/// Collection names: non-empty, no NUL, may not start with `$`.
static COLLECTION_NAME: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[^$\x00][^\x00]*$").expect("collection name pattern is valid")
});

/// Virtual database that holds externally authenticated users.
pub const EXTERNAL_DATABASE: &str = "$external";

/// Validate a database name.
///
/// [`EXTERNAL_DATABASE`] is the one name allowed to contain `$`.
pub fn validate_database_name(name: &str) -> Result<(), ProtocolError> {
    if name == EXTERNAL_DATABASE || DATABASE_NAME.is_match(name) {
        Ok(())
    } else {
        Err(ProtocolError::InvalidNamespace(format!(
            "invalid database name {name:?}"
        )))
    }
}

/// Validate a collection name.
pub fn validate_collection_name(name: &str) -> Result<(), ProtocolError> {
    if COLLECTION_NAME.is_match(name) {
        Ok(())
    } else {
        Err(ProtocolError::InvalidNamespace(format!(
            "invalid collection name {name:?}"
        )))
    }
}

/// A `database.collection` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    /// Database name.
    pub db: String,
    /// Collection name.
    pub collection: String,
}

impl Namespace {
    /// Create a validated namespace.
    pub fn new(db: impl Into<String>, collection: impl Into<String>) -> Result<Self, ProtocolError> {
        let db = db.into();
        let collection = collection.into();
        validate_database_name(&db)?;
        validate_collection_name(&collection)?;
        Ok(Self { db, collection })
    }

    /// The command pseudo-collection of `db`.
    pub fn command(db: impl Into<String>) -> Self {
        Self {
            db: db.into(),
            collection: "$cmd".to_string(),
        }
    }

    /// Split a full `db.collection` name at its first dot.
    pub fn parse(full_name: &str) -> Result<Self, ProtocolError> {
        match full_name.split_once('.') {
            Some((db, "$cmd")) => {
                validate_database_name(db)?;
                Ok(Self::command(db))
            }
            // Command cursors live in `<db>.$cmd.<command>`
            Some((db, collection)) if collection.starts_with("$cmd.") => {
                validate_database_name(db)?;
                Ok(Self {
                    db: db.to_string(),
                    collection: collection.to_string(),
                })
            }
            Some((db, collection)) => Self::new(db, collection),
            None => Err(ProtocolError::InvalidNamespace(format!(
                "{full_name:?} has no collection part"
            ))),
        }
    }

    /// Whether this is a command namespace.
    #[must_use]
    pub fn is_command(&self) -> bool {
        self.collection == "$cmd"
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.db, self.collection)
    }
}
