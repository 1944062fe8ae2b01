//! # mongo-types
//!
//! Document model and binary document codec.
//!
//! This crate provides the ordered [`Document`] type, the [`Value`] kinds it
//! can hold, and the little-endian binary format documents travel in on the
//! wire. Encoding and decoding are pure functions over byte buffers; no I/O
//! happens here.
//!
//! ## Features
//!
//! - `chrono` (default): convert `chrono::DateTime<Utc>` to and from datetime values
//!
//! ## Type Mappings
//!
//! | Tag    | Value variant          | Rust Type                  |
//! |--------|------------------------|----------------------------|
//! | `0x01` | `Double`               | `f64`                      |
//! | `0x02` | `String`               | `String`                   |
//! | `0x03` | `Document`             | [`Document`]               |
//! | `0x04` | `Array`                | `Vec<T>`                   |
//! | `0x05` | `Binary`               | [`Binary`], `bytes::Bytes` |
//! | `0x07` | `ObjectId`             | [`ObjectId`]               |
//! | `0x08` | `Bool`                 | `bool`                     |
//! | `0x09` | `DateTime`             | `chrono::DateTime<Utc>`    |
//! | `0x0A` | `Null`                 | `Option<T>`                |
//! | `0x10` | `Int32`                | `i32`                      |
//! | `0x12` | `Int64`                | `i64`                      |
//!
//! Regular expressions, JavaScript code, timestamps, 128-bit decimals and
//! the min/max keys are carried as [`Value`] variants so server replies
//! containing them decode without loss.
//!
//! ## Example
//!
//! ```
//! use mongo_types::{doc, decode::from_slice, encode::encode_to_bytes};
//!
//! let original = doc! { "name" => "alice", "age" => 30 };
//! let bytes = encode_to_bytes(&original).unwrap();
//! assert_eq!(from_slice(&bytes).unwrap(), original);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod decode;
pub mod document;
pub mod element;
pub mod encode;
pub mod error;
pub mod from_value;
pub mod oid;
pub mod to_value;
pub mod value;

pub use decode::{decode_document, decode_document_sequence, from_slice};
pub use document::Document;
pub use element::ElementType;
pub use encode::{encode_document, encode_to_bytes};
pub use error::TypeError;
pub use from_value::FromValue;
pub use oid::ObjectId;
pub use to_value::ToValue;
pub use value::{Binary, Value};
