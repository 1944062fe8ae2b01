//! # mongo-client
//!
//! Async MongoDB client over the legacy `OP_QUERY` / `OP_REPLY` wire
//! protocol.
//!
//! This is the primary public API surface of the workspace. It resolves one
//! server endpoint, owns one TCP connection, dispatches commands and exposes
//! cursor-based streaming of results larger than one reply.
//!
//! ## Features
//!
//! - **Async/await**: Built on Tokio; every request carries a deadline
//! - **Cursors**: Lazy batches with get-more, limits, and kill-on-drop
//! - **Typed records**: `FromDocument` / `ToDocument` with expando fields
//! - **Authentication**: `MONGODB-CR` and `PLAIN`
//!
//! ## Connection model
//!
//! ```text
//! Client ──owns──> Connection ──owns──> Transport (TCP, framed)
//!   │                 ▲
//!   └─ database() ─> Database ─ collection() ─> Collection ─ find() ─> Cursor
//! ```
//!
//! Every operation takes `&mut self`, so one request is in flight per
//! connection. A timeout, I/O failure or mismatched reply closes the
//! connection; later calls fail with [`Error::Connection`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use mongo_client::{Client, Config, doc};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_connection_string("mongodb://localhost:27017/app")?;
//!     let mut client = Client::connect(config).await?;
//!
//!     for name in client.list_database_names().await? {
//!         println!("database: {}", name?);
//!     }
//!
//!     let mut db = client.database("app");
//!     let mut people = db.collection("people");
//!     people.insert_one(doc! { "name" => "Ada", "age" => 36i64 }).await?;
//!
//!     let mut cursor = people.find(doc! { "age" => doc! { "$gt" => 30i64 } }).await?;
//!     while let Some(person) = cursor.next().await? {
//!         println!("{person}");
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod collection;
pub mod config;
pub mod connection;
pub mod cursor;
pub mod database;
pub mod endpoint;
pub mod error;
pub mod record;

// Re-export commonly used types
pub use client::{ADMIN_DATABASE, Client, DatabaseNames, ServerInfo};
pub use collection::{Collection, FindOptions, UpdateResult};
pub use config::{Config, TimeoutConfig};
pub use connection::{Batch, Connection, QueryOptions};
pub use cursor::{Cursor, CursorState};
pub use database::Database;
pub use endpoint::Endpoint;
pub use error::{Error, Result};
pub use mongo_auth::{AuthMechanism, Credentials};
pub use mongo_protocol::{Namespace, QueryFlags};
pub use mongo_types::{Binary, Document, FromValue, ObjectId, ToValue, TypeError, Value, doc};
pub use record::{FromDocument, MappingOptions, ToDocument};
