//! Mapping between documents and typed records.
//!
//! ## Derive Macro
//!
//! The recommended way to implement these traits is via the derive macros
//! from `mongo-derive`:
//!
//! ```rust,ignore
//! use mongo_client::Document;
//! use mongo_derive::{FromDocument, ToDocument};
//!
//! #[derive(FromDocument, ToDocument)]
//! struct Person {
//!     #[mongo(rename = "_id")]
//!     id: ObjectId,
//!     name: String,
//!     age: Option<i64>,
//!     #[mongo(expando)]
//!     extra: Document,
//! }
//! ```
//!
//! ## Expando fields
//!
//! A record may carry one `Document` field marked `#[mongo(expando)]`. When
//! [`MappingOptions::expando`] is set, keys the record does not declare are
//! collected there while decoding, and written back after the declared
//! fields while encoding. With the option off, unknown keys are dropped.

use mongo_types::{Document, TypeError};

/// Options that govern document-to-record mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MappingOptions {
    /// Keep unknown keys in the record's expando field.
    pub expando: bool,
}

impl MappingOptions {
    /// Options with unknown-key retention switched on or off.
    #[must_use]
    pub const fn with_expando(expando: bool) -> Self {
        Self { expando }
    }
}

/// Types that can be built from a document.
pub trait FromDocument: Sized {
    /// Build a record, consuming the document.
    ///
    /// # Errors
    ///
    /// Returns an error if a required key is missing or a value has the
    /// wrong type.
    fn from_document(document: Document, options: MappingOptions) -> Result<Self, TypeError>;
}

/// Types that can be written as a document.
pub trait ToDocument {
    /// Encode the record, expando entries included.
    fn to_document(&self) -> Result<Document, TypeError>;
}

impl FromDocument for Document {
    fn from_document(document: Document, _options: MappingOptions) -> Result<Self, TypeError> {
        Ok(document)
    }
}

impl ToDocument for Document {
    fn to_document(&self) -> Result<Document, TypeError> {
        Ok(self.clone())
    }
}

/// Merge expando entries into an encoded record.
///
/// Declared fields win over expando entries with the same key.
#[doc(hidden)]
pub fn merge_expando(document: &mut Document, expando: &Document) {
    for (key, value) in expando {
        if !document.contains_key(key) {
            document.insert(key, value.clone());
        }
    }
}

/// Keep what is left of a document after its declared fields were taken.
#[doc(hidden)]
#[must_use]
pub fn take_expando(rest: Document, options: MappingOptions) -> Document {
    if options.expando { rest } else { Document::new() }
}
